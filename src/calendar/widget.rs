use super::util::{WeekdayExt, DAYS_IN_WEEK};
use super::view::CalendarView;
use crate::contrib::{fmt_last_active, fmt_long_date};
use crate::level::Level;
use crate::selection::SelectionState;
use crate::source::DayDetail;
use crate::theme::{Chrome, Palette};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
    text::Text,
    widgets::{Paragraph, StatefulWidget, Widget},
};
use time::Date;

/// Columns to the left of everything
const PADDING: u16 = 1;

/// Width of the weekday label column, including its trailing space
const WEEKDAY_LABEL_WIDTH: u16 = 4;

/// Rows whose weekday is labelled, as on GitHub
const LABELLED_ROWS: [usize; 3] = [1, 3, 5];

const CELL: char = '■';
const CELL_MARKED: char = '▣';
const CELL_WIDE: char = '█';
const CELL_WIDE_MARKED: char = '▓';

static LESS: &str = "Less ";
static MORE: &str = " More";

/// Layout switches taken from the user's configuration
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct GridOptions {
    pub(crate) cell_size: u16,
    pub(crate) margin: u16,
    pub(crate) show_total: bool,
    pub(crate) show_month_labels: bool,
    pub(crate) show_weekday_labels: bool,
    pub(crate) show_legend: bool,
}

impl GridOptions {
    fn pitch(self) -> u16 {
        self.cell_size.max(1) + self.margin
    }

    fn glyph(self, marked: bool) -> char {
        match (self.cell_size > 1, marked) {
            (false, false) => CELL,
            (false, true) => CELL_MARKED,
            (true, false) => CELL_WIDE,
            (true, true) => CELL_WIDE_MARKED,
        }
    }
}

/// The day-detail panel's contents
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum DetailSlot {
    Loading(Date),
    Ready(Date, DayDetail),
}

impl DetailSlot {
    pub(crate) fn date(self) -> Date {
        match self {
            DetailSlot::Loading(date) | DetailSlot::Ready(date, _) => date,
        }
    }
}

/// Something under the mouse pointer
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Target {
    Day(Date),
    Level(Level),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct GridArea {
    x: u16,
    y: u16,
    pitch: u16,
    cell_size: u16,
    first_week: usize,
    visible_weeks: usize,
}

/// Where things were drawn on the last render, for mapping mouse positions
/// back to days and legend levels
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct HitMap {
    grid: Option<GridArea>,
    legend: Vec<(Rect, Level)>,
}

impl HitMap {
    pub(crate) fn target_at(&self, view: &CalendarView, x: u16, y: u16) -> Option<Target> {
        if let Some(&(_, level)) = self
            .legend
            .iter()
            .find(|(rect, _)| rect.contains(Position::new(x, y)))
        {
            return Some(Target::Level(level));
        }
        let grid = self.grid?;
        let dx = x.checked_sub(grid.x)?;
        let dy = y.checked_sub(grid.y)?;
        if dx % grid.pitch >= grid.cell_size {
            // In the gap between two weeks
            return None;
        }
        let col = usize::from(dx / grid.pitch);
        let row = usize::from(dy);
        if col >= grid.visible_weeks || row >= DAYS_IN_WEEK {
            return None;
        }
        view.date_at(grid.first_week + col, row).map(Target::Day)
    }
}

/// A heatmap of one period's contributions, with its header, labels,
/// legend and detail panel
#[derive(Clone, Copy, Debug)]
pub(crate) struct Calendar<'a> {
    view: &'a CalendarView,
    selection: &'a SelectionState,
    detail: Option<DetailSlot>,
    palette: Palette,
    chrome: Chrome,
    options: GridOptions,
}

impl<'a> Calendar<'a> {
    pub(crate) fn new(
        view: &'a CalendarView,
        selection: &'a SelectionState,
        palette: Palette,
        chrome: Chrome,
        options: GridOptions,
    ) -> Calendar<'a> {
        Calendar {
            view,
            selection,
            detail: None,
            palette,
            chrome,
            options,
        }
    }

    pub(crate) fn detail(mut self, detail: Option<DetailSlot>) -> Calendar<'a> {
        self.detail = detail;
        self
    }

    fn cell_style(&self, date: Date) -> (char, Style) {
        let level = self.view.level_for(date);
        let mut color = self.palette.color(level);
        if self.selection.is_faded(date, level) {
            color = self.chrome.fade(color);
        }
        let glyph = self.options.glyph(self.selection.is_emphasized(date));
        (glyph, Style::new().fg(color).bg(self.chrome.background))
    }

    fn legend_style(&self, level: Level) -> (char, Style) {
        let mut color = self.palette.color(level);
        let selected = self.selection.selected_level;
        if selected.is_some_and(|sel| sel != level) {
            color = self.chrome.fade(color);
        }
        let glyph = self.options.glyph(selected == Some(level));
        (glyph, Style::new().fg(color).bg(self.chrome.background))
    }
}

impl StatefulWidget for Calendar<'_> {
    type State = HitMap;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut HitMap) {
        *state = HitMap::default();
        buf.set_style(area, self.chrome.base);
        let opts = self.options;
        let pitch = opts.pitch();
        let cell_size = opts.cell_size.max(1);
        let label_width = if opts.show_weekday_labels {
            WEEKDAY_LABEL_WIDTH
        } else {
            0
        };
        let grid_x = PADDING + label_width;

        // Show the most recent weeks when the whole period doesn't fit
        let n_weeks = self.view.weeks().len();
        let fit = usize::from(
            area.width
                .saturating_sub(grid_x)
                .saturating_add(opts.margin)
                / pitch,
        );
        let visible = n_weeks.min(fit);
        let first_week = n_weeks - visible;
        let grid_width = u16::try_from(visible)
            .unwrap_or(u16::MAX)
            .saturating_mul(pitch)
            .saturating_sub(opts.margin);
        let grid_right = grid_x.saturating_add(grid_width);

        let mut canvas = BufferCanvas::new(area, buf);
        let mut y = 0;

        if opts.show_total {
            let header = format!(
                "{} contributions in {}",
                self.view.index().total(),
                self.view.period()
            );
            canvas.mvprint(y, PADDING, header, Some(self.chrome.heading));
            y += 2;
        }

        if opts.show_month_labels {
            let mut next_free = grid_x;
            for label in self.view.labels() {
                let Some(col) = label.week_index.checked_sub(first_week) else {
                    continue;
                };
                let x = grid_x.saturating_add(
                    u16::try_from(col)
                        .unwrap_or(u16::MAX)
                        .saturating_mul(pitch),
                );
                if x < next_free {
                    continue;
                }
                canvas.mvprint(y, x, label.text, Some(self.chrome.muted));
                next_free = x.saturating_add(4);
            }
            y += 1;
        }

        let grid_y = y;
        if opts.show_weekday_labels {
            let weekdays = self.view.week_start().weekdays();
            for row in LABELLED_ROWS {
                let name = weekdays[row].short_name();
                canvas.mvprint(grid_y + row_offset(row), PADDING, name, Some(self.chrome.muted));
            }
        }
        for (col, week) in self.view.weeks()[first_week..].iter().enumerate() {
            let x = grid_x.saturating_add(
                u16::try_from(col)
                    .unwrap_or(u16::MAX)
                    .saturating_mul(pitch),
            );
            for (row, date) in week.days().enumerate() {
                let (glyph, style) = self.cell_style(date);
                for k in 0..cell_size {
                    canvas.mvaddch(grid_y + row_offset(row), x.saturating_add(k), glyph, style);
                }
            }
        }
        state.grid = Some(GridArea {
            x: area.x.saturating_add(grid_x),
            y: area.y.saturating_add(grid_y),
            pitch,
            cell_size,
            first_week,
            visible_weeks: visible,
        });
        y = grid_y + row_offset(DAYS_IN_WEEK) + 1;

        let last = format!(
            "Last contributed on: {}",
            fmt_last_active(self.view.index().last_active_date())
        );
        canvas.mvprint(y, PADDING, last, Some(self.chrome.muted));
        y += 1;

        if opts.show_legend {
            let levels = u16::try_from(Level::ALL.len()).unwrap_or(u16::MAX);
            let swatches = levels * (cell_size + 1) - 1;
            let legend_width = str_width(LESS) + swatches + str_width(MORE);
            let mut x = grid_right.saturating_sub(legend_width).max(PADDING);
            canvas.mvprint(y, x, LESS, Some(self.chrome.muted));
            x += str_width(LESS);
            for level in Level::ALL {
                let (glyph, style) = self.legend_style(level);
                for k in 0..cell_size {
                    canvas.mvaddch(y, x + k, glyph, style);
                }
                state.legend.push((
                    Rect::new(area.x + x, area.y + y, cell_size, 1).intersection(area),
                    level,
                ));
                x += cell_size + 1;
            }
            canvas.mvprint(y, x - 1, MORE, Some(self.chrome.muted));
            y += 1;
        }
        y += 1;

        match self.detail {
            Some(slot) => {
                let date = slot.date();
                canvas.mvprint(y, PADDING, fmt_long_date(date), Some(self.chrome.heading));
                y += 1;
                let count = self.view.count_for(date);
                match slot {
                    DetailSlot::Loading(_) => {
                        canvas.mvprint(y, PADDING, "Loading details…", Some(self.chrome.muted));
                    }
                    DetailSlot::Ready(..) if count == 0 => {
                        canvas.mvprint(
                            y,
                            PADDING,
                            "No activity on this day",
                            Some(self.chrome.muted),
                        );
                    }
                    DetailSlot::Ready(_, detail) => {
                        let total = format!(
                            "{count} total contribution{}",
                            if count == 1 { "" } else { "s" }
                        );
                        canvas.mvprint(y, PADDING, total, Some(self.chrome.base));
                        let parts = format!(
                            "{} commits  {} pull requests  {} merge requests  {} branches  {} pushes",
                            detail.commits,
                            detail.pull_requests,
                            detail.merge_requests,
                            detail.branches_contributed,
                            detail.pushes,
                        );
                        canvas.mvprint(y + 1, PADDING, parts, Some(self.chrome.base));
                    }
                }
            }
            None => {
                if let Some(date) = self.selection.hovered {
                    let count = self.view.count_for(date);
                    let tip = format!(
                        "{count} contribution{} on {}",
                        if count == 1 { "" } else { "s" },
                        fmt_long_date(date)
                    );
                    canvas.mvprint(y, PADDING, tip, Some(self.chrome.muted));
                }
            }
        }
    }
}

fn row_offset(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

fn str_width(s: &str) -> u16 {
    u16::try_from(Text::raw(s).width()).unwrap_or(u16::MAX)
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvaddch(&mut self, y: u16, x: u16, ch: char, style: Style) {
        if y < self.area.height && x < self.area.width {
            if let Some(cell) = self.buf.cell_mut((x + self.area.x, y + self.area.y)) {
                cell.set_char(ch).set_style(style);
            }
        }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Option<Style>) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style.unwrap_or_default());
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Using a Paragraph lets us truncate text that extends beyond the
            // calendar's area, though we need to be sure that the Rect passed
            // to the Paragraph is entirely within the frame lest a panic
            // result.
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DateRange, LabelDedup, Period, WeekStart};
    use crate::contrib::Sample;
    use crate::selection::Event;
    use crate::theme::{Shade, ThemeTable};
    use ratatui::style::Color;
    use time::macros::date;

    const OPTIONS: GridOptions = GridOptions {
        cell_size: 1,
        margin: 1,
        show_total: true,
        show_month_labels: true,
        show_weekday_labels: true,
        show_legend: true,
    };

    fn two_weeks() -> CalendarView {
        CalendarView::new(
            Period::Year(2024),
            DateRange::new(date!(2024 - 03 - 03), date!(2024 - 03 - 16)).unwrap(),
            WeekStart::Sunday,
            LabelDedup::ByName,
            [
                Sample::new(date!(2024 - 03 - 04), 1),
                Sample::new(date!(2024 - 03 - 12), 7),
            ],
        )
        .unwrap()
    }

    fn render(
        view: &CalendarView,
        selection: &SelectionState,
        detail: Option<DetailSlot>,
        options: GridOptions,
        area: Rect,
    ) -> (Buffer, HitMap) {
        let palette = ThemeTable::builtin(Shade::Dark).get("classic");
        let chrome = Chrome::for_shade(Shade::Dark);
        let mut buffer = Buffer::empty(area);
        let mut hits = HitMap::default();
        Calendar::new(view, selection, palette, chrome, options)
            .detail(detail)
            .render(area, &mut buffer, &mut hits);
        (buffer, hits)
    }

    fn lines(buf: &Buffer) -> Vec<String> {
        let area = buf.area;
        (area.top()..area.bottom())
            .map(|y| {
                (area.left()..area.right())
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_owned()
            })
            .collect()
    }

    #[test]
    fn test_render_grid() {
        let view = two_weeks();
        let selection = SelectionState::new();
        let (buffer, _) = render(&view, &selection, None, OPTIONS, Rect::new(0, 0, 40, 14));
        assert_eq!(
            lines(&buffer),
            [
                " 8 contributions in 2024",
                "",
                "",
                "     ■ ■",
                " Mon ■ ■",
                "     ■ ■",
                " Wed ■ ■",
                "     ■ ■",
                " Fri ■ ■",
                "     ■ ■",
                "",
                " Last contributed on: Mar 12th, 2024",
                " Less ■ ■ ■ ■ ■ More",
                "",
            ]
        );
        // 2024-03-04 is Monday of the first week; 2024-03-12 Tuesday of the second
        assert_eq!(buffer[(5, 4)].fg, Color::Rgb(0x0e, 0x44, 0x29));
        assert_eq!(buffer[(7, 5)].fg, Color::Rgb(0x39, 0xd3, 0x53));
        assert_eq!(buffer[(5, 3)].fg, Color::Rgb(0x16, 0x1b, 0x22));
        assert_eq!(buffer[(6, 12)].fg, Color::Rgb(0x16, 0x1b, 0x22));
        assert_eq!(buffer[(14, 12)].fg, Color::Rgb(0x39, 0xd3, 0x53));
    }

    #[test]
    fn test_render_pinned_detail() {
        let view = two_weeks();
        let mut selection = SelectionState::new();
        selection.apply(Event::Click(date!(2024 - 03 - 12)));
        let detail = DetailSlot::Ready(
            date!(2024 - 03 - 12),
            DayDetail {
                commits: 5,
                pull_requests: 1,
                merge_requests: 1,
                pushes: 2,
                branches_contributed: 1,
            },
        );
        let (buffer, _) = render(
            &view,
            &selection,
            Some(detail),
            OPTIONS,
            Rect::new(0, 0, 80, 17),
        );
        assert_eq!(
            lines(&buffer),
            [
                " 8 contributions in 2024",
                "",
                "",
                "     ■ ■",
                " Mon ■ ■",
                "     ■ ▣",
                " Wed ■ ■",
                "     ■ ■",
                " Fri ■ ■",
                "     ■ ■",
                "",
                " Last contributed on: Mar 12th, 2024",
                " Less ■ ■ ■ ■ ■ More",
                "",
                " March 12, 2024",
                " 7 total contributions",
                " 5 commits  1 pull requests  1 merge requests  1 branches  2 pushes",
            ]
        );
        // Everything but the pinned day is faded
        let chrome = Chrome::for_shade(Shade::Dark);
        assert_eq!(buffer[(7, 5)].fg, Color::Rgb(0x39, 0xd3, 0x53));
        assert_eq!(
            buffer[(5, 4)].fg,
            chrome.fade(Color::Rgb(0x0e, 0x44, 0x29))
        );
    }

    #[test]
    fn test_render_loading_and_empty_day() {
        let view = two_weeks();
        let mut selection = SelectionState::new();
        selection.apply(Event::Click(date!(2024 - 03 - 05)));
        let area = Rect::new(0, 0, 60, 16);
        let (buffer, _) = render(
            &view,
            &selection,
            Some(DetailSlot::Loading(date!(2024 - 03 - 05))),
            OPTIONS,
            area,
        );
        assert_eq!(lines(&buffer).last().map(String::as_str), Some(" Loading details…"));
        let (buffer, _) = render(
            &view,
            &selection,
            Some(DetailSlot::Ready(date!(2024 - 03 - 05), DayDetail::default())),
            OPTIONS,
            area,
        );
        assert_eq!(
            lines(&buffer).last().map(String::as_str),
            Some(" No activity on this day")
        );
    }

    #[test]
    fn test_hover_tooltip() {
        let view = two_weeks();
        let mut selection = SelectionState::new();
        selection.apply(Event::Hover(date!(2024 - 03 - 04)));
        let (buffer, _) = render(&view, &selection, None, OPTIONS, Rect::new(0, 0, 60, 15));
        assert_eq!(
            lines(&buffer).last().map(String::as_str),
            Some(" 1 contribution on March 4, 2024")
        );
    }

    #[test]
    fn test_hidden_parts() {
        let view = two_weeks();
        let selection = SelectionState::new();
        let options = GridOptions {
            cell_size: 2,
            margin: 0,
            show_total: false,
            show_month_labels: false,
            show_weekday_labels: false,
            show_legend: false,
        };
        let (buffer, _) = render(&view, &selection, None, options, Rect::new(0, 0, 40, 9));
        assert_eq!(
            lines(&buffer),
            [
                " ████",
                " ████",
                " ████",
                " ████",
                " ████",
                " ████",
                " ████",
                "",
                " Last contributed on: Mar 12th, 2024",
            ]
        );
    }

    #[test]
    fn test_hit_map() {
        let view = two_weeks();
        let selection = SelectionState::new();
        let area = Rect::new(2, 1, 40, 14);
        let (_, hits) = render(&view, &selection, None, OPTIONS, area);
        // Grid starts at column 2 + 1 + 4, row 1 + 3
        assert_eq!(
            hits.target_at(&view, 7, 4),
            Some(Target::Day(date!(2024 - 03 - 03)))
        );
        assert_eq!(hits.target_at(&view, 8, 4), None);
        assert_eq!(
            hits.target_at(&view, 9, 6),
            Some(Target::Day(date!(2024 - 03 - 12)))
        );
        assert_eq!(hits.target_at(&view, 11, 4), None);
        assert_eq!(hits.target_at(&view, 7, 11), None);
        assert_eq!(hits.target_at(&view, 0, 0), None);
        // Legend swatches are on row 1 + 12, after "Less " at column 2 + 1 + 5
        assert_eq!(hits.target_at(&view, 8, 13), Some(Target::Level(Level::None)));
        assert_eq!(
            hits.target_at(&view, 16, 13),
            Some(Target::Level(Level::VeryHigh))
        );
        assert_eq!(hits.target_at(&view, 9, 13), None);
    }

    #[test]
    fn test_narrow_area_shows_latest_weeks() {
        let view = CalendarView::new(
            Period::Year(2024),
            DateRange::year(2024).unwrap(),
            WeekStart::Sunday,
            LabelDedup::ByName,
            [],
        )
        .unwrap();
        let selection = SelectionState::new();
        let area = Rect::new(0, 0, 25, 14);
        let (_, hits) = render(&view, &selection, None, OPTIONS, area);
        // 25 - 5 columns fit ten weeks
        assert_eq!(
            hits.target_at(&view, 5, 3),
            Some(Target::Day(date!(2024 - 10 - 27)))
        );
        assert_eq!(
            hits.target_at(&view, 23, 3),
            Some(Target::Day(date!(2024 - 12 - 29)))
        );
    }
}
