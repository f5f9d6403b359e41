//! Rate-limiting of raw pointer interactions before they reach the
//! selection reducer.
//!
//! Every method takes the current time as an argument; nothing in here
//! reads a clock.
use crate::level::Level;
use crate::selection::Event;
use std::time::{Duration, Instant};
use time::Date;

pub(crate) const HOVER_WINDOW: Duration = Duration::from_millis(100);
pub(crate) const CLICK_WINDOW: Duration = Duration::from_millis(200);

/// Leading-edge throttle: the first call in a window passes, calls made
/// while the window is open are dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Throttle {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Throttle {
    pub(crate) fn new(window: Duration) -> Throttle {
        Throttle {
            window,
            last_accepted: None,
        }
    }

    pub(crate) fn admit(&mut self, now: Instant) -> bool {
        let open = self
            .last_accepted
            .is_some_and(|t| now.saturating_duration_since(t) < self.window);
        if !open {
            self.last_accepted = Some(now);
        }
        !open
    }

    pub(crate) fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Trailing-edge debounce: a value fires once no newer value has been
/// pushed for a full window.  Pushing replaces the pending value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Debounce<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub(crate) fn new(window: Duration) -> Debounce<T> {
        Debounce {
            window,
            pending: None,
        }
    }

    pub(crate) fn push(&mut self, value: T, now: Instant) {
        let deadline = now.checked_add(self.window).unwrap_or(now);
        self.pending = Some((value, deadline));
    }

    pub(crate) fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|&(_, deadline)| deadline)
    }

    pub(crate) fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|deadline| deadline <= now) {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.pending = None;
    }
}

/// A pointer or keyboard interaction before pacing
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Interaction {
    Hover(Date),
    Unhover,
    Click(Date),
    ClickLevel(Level),
}

/// Routes interactions through a hover channel (throttled) and a click
/// channel (debounced)
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Pacer {
    hover: Throttle,
    unhover: Throttle,
    clicks: Debounce<Event>,
}

impl Pacer {
    pub(crate) fn new() -> Pacer {
        Pacer::with_windows(HOVER_WINDOW, CLICK_WINDOW)
    }

    pub(crate) fn with_windows(hover: Duration, click: Duration) -> Pacer {
        Pacer {
            hover: Throttle::new(hover),
            unhover: Throttle::new(hover),
            clicks: Debounce::new(click),
        }
    }

    /// Feed in an interaction.  Returns an event to apply immediately, if
    /// any; click events are instead held until [`Pacer::poll`] releases
    /// them.
    pub(crate) fn offer(&mut self, interaction: Interaction, now: Instant) -> Option<Event> {
        match interaction {
            Interaction::Hover(date) => self.hover.admit(now).then_some(Event::Hover(date)),
            Interaction::Unhover => self.unhover.admit(now).then_some(Event::Unhover),
            Interaction::Click(date) => {
                let event = match self.clicks.pending() {
                    Some(&Event::Click(prev)) if prev == date => Event::DoubleClick(date),
                    _ => Event::Click(date),
                };
                self.clicks.push(event, now);
                None
            }
            Interaction::ClickLevel(level) => {
                self.clicks.push(Event::ClickLevel(level), now);
                None
            }
        }
    }

    /// Release a click whose settle window has passed
    pub(crate) fn poll(&mut self, now: Instant) -> Option<Event> {
        self.clicks.poll(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.clicks.deadline()
    }

    /// Drop everything in flight, e.g. when the view is torn down
    pub(crate) fn cancel(&mut self) {
        self.clicks.cancel();
        self.hover.reset();
        self.unhover.reset();
    }
}

impl Default for Pacer {
    fn default() -> Pacer {
        Pacer::new()
    }
}
