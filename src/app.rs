use crate::calendar::{
    n_days_after, n_days_before, Calendar, CalendarView, DateRange, DetailSlot, GridOptions,
    HitMap, LabelDedup, Period, Target, ViewError, WeekStart,
};
use crate::config::Config;
use crate::contrib::Sample;
use crate::help::Help;
use crate::level::Level;
use crate::loader::{Loader, Update};
use crate::pacing::{Interaction, Pacer};
use crate::selection::{Event, SelectionState};
use crate::source::FetchError;
use crate::theme::{Chrome, Palette, Shade, ThemeTable, DEFAULT_THEME};
use anyhow::Context;
use crossterm::event::{
    poll, read, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{StatefulWidget, Widget},
    Terminal,
};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use time::{error::ComponentRange, Date};

/// Longest wait for terminal input before checking on background fetches
/// and pending clicks
const TICK: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub(crate) struct App {
    today: Date,
    week_start: WeekStart,
    dedup: LabelDedup,
    options: GridOptions,
    periods: Vec<Period>,
    period_index: usize,
    view: CalendarView,
    selection: SelectionState,
    pacer: Pacer,
    loader: Loader,
    detail: Option<DetailSlot>,
    themes: ThemeTable,
    theme: String,
    palette: Palette,
    chrome: Chrome,
    problem: Option<Problem>,
    cursor: Option<Date>,
    hits: HitMap,
    state: AppState,
}

impl App {
    pub(crate) fn new(
        config: &Config,
        shade: Shade,
        today: Date,
        loader: Loader,
        initial: Option<Period>,
    ) -> anyhow::Result<App> {
        let mut periods = config.periods(today);
        let period_index = match initial {
            Some(period) => {
                if let Some(i) = periods.iter().position(|&p| p == period) {
                    i
                } else {
                    periods.push(period);
                    periods.len() - 1
                }
            }
            None => 0,
        };
        let period = periods
            .get(period_index)
            .copied()
            .unwrap_or(Period::LastYear);
        let range = period
            .range(today)
            .with_context(|| format!("cannot compute dates for {period}"))?;
        // Nothing is drawn as active until the first fetch lands
        let view = CalendarView::new(
            period,
            range,
            config.week_start,
            config.month_labels,
            Vec::new(),
        )?;
        let themes = config.theme_table(shade)?;
        let theme = if themes.contains(&config.theme) {
            config.theme.clone()
        } else {
            String::from(DEFAULT_THEME)
        };
        let palette = themes.get(&theme);
        Ok(App {
            today,
            week_start: config.week_start,
            dedup: config.month_labels,
            options: grid_options(config),
            periods,
            period_index,
            view,
            selection: SelectionState::new(),
            pacer: Pacer::new(),
            loader,
            detail: None,
            themes,
            theme,
            palette,
            chrome: Chrome::for_shade(shade),
            problem: None,
            cursor: None,
            hits: HitMap::default(),
            state: AppState::Calendar,
        })
    }

    pub(crate) fn run<B: Backend>(mut self, mut terminal: Terminal<B>) -> io::Result<()> {
        self.load()?;
        while !self.quitting() {
            self.draw(&mut terminal)?;
            self.handle_input()?;
            self.tick(Instant::now())?;
        }
        Ok(())
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let timeout = self.next_timeout(Instant::now());
        if !poll(timeout)? {
            return Ok(());
        }
        let event = read()?;
        let now = Instant::now();
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = event.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code, now)? {
                self.beep()?;
            }
        } else if let Some(mouse) = event.as_mouse_event() {
            self.handle_mouse(mouse, now)?;
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    fn next_timeout(&self, now: Instant) -> Duration {
        self.pacer.next_deadline().map_or(TICK, |deadline| {
            deadline.saturating_duration_since(now).min(TICK)
        })
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode, now: Instant) -> io::Result<bool> {
        match self.state {
            AppState::Calendar => match key {
                KeyCode::Char('h') | KeyCode::Left => self.move_cursor(Step::WeekBack),
                KeyCode::Char('l') | KeyCode::Right => self.move_cursor(Step::WeekForward),
                KeyCode::Char('k') | KeyCode::Up => self.move_cursor(Step::DayBack),
                KeyCode::Char('j') | KeyCode::Down => self.move_cursor(Step::DayForward),
                KeyCode::Enter | KeyCode::Char(' ') => {
                    let Some(date) = self.cursor else {
                        return Ok(false);
                    };
                    self.offer(Interaction::Click(date), now)?;
                    Ok(true)
                }
                KeyCode::Char(c @ '0'..='4') => {
                    let Some(level) = c
                        .to_digit(10)
                        .and_then(|d| Level::ALL.into_iter().nth(usize::try_from(d).ok()?))
                    else {
                        return Ok(false);
                    };
                    self.offer(Interaction::ClickLevel(level), now)?;
                    Ok(true)
                }
                KeyCode::Char('[') | KeyCode::PageUp => self.switch_period(false),
                KeyCode::Char(']') | KeyCode::PageDown => self.switch_period(true),
                KeyCode::Char('t') => {
                    self.cycle_theme(true);
                    Ok(true)
                }
                KeyCode::Char('T') => {
                    self.cycle_theme(false);
                    Ok(true)
                }
                KeyCode::Char('r') => {
                    self.load()?;
                    Ok(true)
                }
                KeyCode::Esc => {
                    self.pacer.cancel();
                    self.cursor = None;
                    self.apply(Event::Reset)?;
                    Ok(true)
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    Ok(true)
                }
                KeyCode::Char('q') => {
                    self.state = AppState::Quitting;
                    Ok(true)
                }
                _ => Ok(false),
            },
            AppState::Helping => {
                self.state = AppState::Calendar;
                Ok(true)
            }
            AppState::Quitting => Ok(false),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> io::Result<()> {
        if self.state != AppState::Calendar {
            return Ok(());
        }
        let target = self.hits.target_at(&self.view, mouse.column, mouse.row);
        match (mouse.kind, target) {
            (MouseEventKind::Moved, Some(Target::Day(date))) => {
                if self.selection.hovered != Some(date) {
                    self.offer(Interaction::Hover(date), now)?;
                }
            }
            (MouseEventKind::Moved, _) => {
                if self.selection.hovered.is_some() {
                    self.offer(Interaction::Unhover, now)?;
                }
            }
            (MouseEventKind::Down(MouseButton::Left), Some(Target::Day(date))) => {
                self.cursor = Some(date);
                self.offer(Interaction::Click(date), now)?;
            }
            (MouseEventKind::Down(MouseButton::Left), Some(Target::Level(level))) => {
                self.offer(Interaction::ClickLevel(level), now)?;
            }
            _ => (),
        }
        Ok(())
    }

    /// Release settled clicks and apply finished fetches
    fn tick(&mut self, now: Instant) -> io::Result<()> {
        while let Some(event) = self.pacer.poll(now) {
            self.apply(event)?;
        }
        for update in self.loader.poll(self.selection.active_detail) {
            match update {
                Update::Contributions {
                    period,
                    range,
                    result,
                } => self.receive(period, range, result),
                Update::Detail { date, detail } => {
                    self.detail = Some(DetailSlot::Ready(date, detail));
                }
            }
        }
        Ok(())
    }

    fn offer(&mut self, interaction: Interaction, now: Instant) -> io::Result<()> {
        if let Some(event) = self.pacer.offer(interaction, now) {
            self.apply(event)?;
        }
        Ok(())
    }

    fn apply(&mut self, event: Event) -> io::Result<()> {
        let before = self.selection.active_detail;
        self.selection.apply(event);
        let after = self.selection.active_detail;
        if after != before {
            self.detail = after.map(DetailSlot::Loading);
            if let Some(date) = after {
                self.loader.request_detail(date)?;
            }
        }
        Ok(())
    }

    fn receive(
        &mut self,
        period: Period,
        range: DateRange,
        result: Result<Vec<Sample>, FetchError>,
    ) {
        let built = result.map_err(Problem::from).and_then(|samples| {
            CalendarView::new(period, range, self.week_start, self.dedup, samples)
                .map_err(Problem::from)
        });
        match built {
            Ok(view) => {
                tracing::info!(
                    subject = %self.loader.subject(),
                    %period,
                    days = view.index().len(),
                    total = view.index().total(),
                    "Loaded contributions"
                );
                if self.cursor.is_some_and(|d| !view.range().contains(d)) {
                    self.cursor = None;
                }
                self.view = view;
                self.problem = None;
            }
            Err(problem) => {
                tracing::error!(
                    subject = %self.loader.subject(),
                    error = %problem,
                    "Failed to load contributions"
                );
                self.problem = Some(problem);
            }
        }
    }

    fn load(&mut self) -> io::Result<()> {
        let period = self.current_period();
        match period.range(self.today) {
            Ok(range) => {
                self.problem = None;
                self.loader.request_contributions(period, range)?;
            }
            Err(e) => {
                tracing::error!(%period, error = %e, "Cannot compute date range");
                // Whatever is still in flight is for some other period
                self.loader.abandon_contributions();
                self.problem = Some(Problem::from(e));
            }
        }
        Ok(())
    }

    fn current_period(&self) -> Period {
        self.periods
            .get(self.period_index)
            .copied()
            .unwrap_or(Period::LastYear)
    }

    fn switch_period(&mut self, forwards: bool) -> io::Result<bool> {
        let index = if forwards {
            self.period_index + 1
        } else {
            let Some(i) = self.period_index.checked_sub(1) else {
                return Ok(false);
            };
            i
        };
        if index >= self.periods.len() {
            return Ok(false);
        }
        self.period_index = index;
        self.pacer.cancel();
        self.cursor = None;
        self.apply(Event::Reset)?;
        self.load()?;
        Ok(true)
    }

    fn move_cursor(&mut self, step: Step) -> io::Result<bool> {
        let range = self.view.range();
        let moved = match self.cursor {
            // The first keypress only places the cursor
            None => Some(if range.contains(self.today) {
                self.today
            } else {
                range.end()
            }),
            Some(date) => match step {
                Step::DayBack => n_days_before(date, 1),
                Step::DayForward => n_days_after(date, 1),
                Step::WeekBack => n_days_before(date, 7),
                Step::WeekForward => n_days_after(date, 7),
            },
        };
        match moved {
            Some(date) if range.contains(date) => {
                self.cursor = Some(date);
                // Keyboard movement is already discrete; skip the throttle
                self.apply(Event::Hover(date))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn cycle_theme(&mut self, forwards: bool) {
        self.theme = self.themes.cycle(&self.theme, forwards).to_owned();
        self.palette = self.themes.get(&self.theme);
        tracing::debug!(theme = %self.theme, "Switched theme");
    }

    fn status_line(&self) -> Line<'static> {
        let subject = self.loader.subject();
        if self.loader.is_loading() {
            Line::styled(
                format!(" Loading contributions for {subject}…"),
                self.chrome.muted,
            )
        } else if let Some(problem) = &self.problem {
            let text = match problem {
                Problem::Fetch(e) if e.is_retryable() => format!(" {e} (press r to retry)"),
                Problem::Fetch(FetchError::Authorization(_)) => {
                    format!(" {problem} (is GITHUB_TOKEN set?)")
                }
                _ => format!(" {problem}"),
            };
            Line::styled(text, self.chrome.error)
        } else {
            Line::styled(
                format!(" {subject} · theme: {} · ? for help", self.theme),
                self.chrome.muted,
            )
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, self.chrome.base);
        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
        Calendar::new(
            &self.view,
            &self.selection,
            self.palette,
            self.chrome,
            self.options,
        )
        .detail(self.detail)
        .render(main, buf, &mut self.hits);
        self.status_line().render(status, buf);
        if self.state == AppState::Helping {
            Help(self.chrome).render(area, buf);
        }
    }
}

fn grid_options(config: &Config) -> GridOptions {
    GridOptions {
        cell_size: config.cell_size,
        margin: config.margin,
        show_total: !config.hide_total_count,
        show_month_labels: !config.hide_month_labels,
        show_weekday_labels: !config.hide_weekday_labels,
        show_legend: !config.hide_color_legend,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Quitting,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Step {
    DayBack,
    DayForward,
    WeekBack,
    WeekForward,
}

/// Why the calendar on screen is not the one requested
#[derive(Clone, Debug, Eq, Error, PartialEq)]
enum Problem {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid contribution data: {0}")]
    Data(#[from] ViewError),
    #[error("cannot compute dates: {0}")]
    Range(#[from] ComponentRange),
}
