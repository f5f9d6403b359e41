use crate::theme::Chrome;
use ratatui::{
    buffer::Buffer,
    layout::Flex,
    layout::{Alignment, Layout, Rect},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

static TEXT: &[&str] = &[
    "ARROWS, h/j/k/l  Move between days\n",
    "ENTER, SPACE     Pin the day's details (twice to emphasize)\n",
    "0-4              Show only one activity level\n",
    "[, ]             Previous / next period\n",
    "t, T             Next / previous color theme\n",
    "r                Reload contributions\n",
    "ESC              Clear selection\n",
    "?                Show this help\n",
    "q                Quit\n",
    "\n",
    "The mouse can hover, click and double-click days,\n",
    "and click the legend to filter by level.\n",
];

static DISMISS: &str = "Press the Any Key to dismiss.";

/// Popup listing the key bindings
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Chrome);

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chrome = self.0;
        let mut lines = TEXT.iter().map(|&s| Line::raw(s)).collect::<Vec<_>>();
        lines.push(Line::raw(""));
        lines.push(Line::styled(DISMISS, chrome.muted));
        let text = Text::from(lines);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let para = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(Line::styled(" Commands ", chrome.heading))
                    .title_alignment(Alignment::Center),
            )
            .style(chrome.base);
        let [help_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [help_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(help_area);
        let outer_area = Rect {
            x: help_area.x.saturating_sub(1),
            y: help_area.y,
            width: help_area.width.saturating_add(2),
            height: help_area.height,
        };
        Clear.render(outer_area, buf);
        Block::new().style(chrome.base).render(outer_area, buf);
        para.render(help_area, buf);
    }
}
