use crate::level::Level;
use time::Date;

/// An interaction that has made it through pacing and should change the
/// selection
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Event {
    Hover(Date),
    Unhover,
    Click(Date),
    DoubleClick(Date),
    ClickLevel(Level),
    Reset,
}

/// What the user is currently pointing at, has pinned, or has filtered by
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub(crate) struct SelectionState {
    pub(crate) hovered: Option<Date>,
    pub(crate) pinned: Option<Date>,
    pub(crate) selected_level: Option<Level>,
    /// Date whose details are being shown
    pub(crate) active_detail: Option<Date>,
    /// Date forced into emphasis by a double click
    pub(crate) highlighted: Option<Date>,
}

impl SelectionState {
    pub(crate) fn new() -> SelectionState {
        SelectionState::default()
    }

    pub(crate) fn apply(&mut self, event: Event) {
        match event {
            Event::Hover(date) => {
                if self.pinned.is_none() {
                    self.hovered = Some(date);
                }
            }
            Event::Unhover => {
                if self.pinned.is_none() {
                    self.hovered = None;
                }
            }
            Event::Click(date) => {
                self.toggle_pin(date);
            }
            Event::DoubleClick(date) => {
                if self.toggle_pin(date) {
                    self.highlighted = Some(date);
                }
            }
            Event::ClickLevel(level) => {
                if self.selected_level == Some(level) {
                    self.selected_level = None;
                } else {
                    *self = SelectionState {
                        selected_level: Some(level),
                        ..SelectionState::default()
                    };
                }
            }
            Event::Reset => *self = SelectionState::default(),
        }
    }

    // Returns `true` if `date` ended up pinned
    fn toggle_pin(&mut self, date: Date) -> bool {
        if self.pinned == Some(date) {
            self.pinned = None;
            self.hovered = None;
            self.active_detail = None;
            self.highlighted = None;
            false
        } else {
            *self = SelectionState {
                hovered: Some(date),
                pinned: Some(date),
                selected_level: None,
                active_detail: Some(date),
                highlighted: None,
            };
            true
        }
    }

    /// Whether a day drawn at `level` should be dimmed to make the current
    /// selection stand out
    pub(crate) fn is_faded(&self, date: Date, level: Level) -> bool {
        self.selected_level.is_some_and(|sel| sel != level)
            || self.pinned.is_some_and(|pin| pin != date)
    }

    pub(crate) fn is_emphasized(&self, date: Date) -> bool {
        [self.pinned, self.hovered, self.highlighted].contains(&Some(date))
    }
}
