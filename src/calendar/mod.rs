mod months;
mod util;
mod view;
mod weeks;
mod widget;
pub(crate) use self::months::LabelDedup;
pub(crate) use self::util::{n_days_after, n_days_before, MonthExt, WeekStart};
pub(crate) use self::view::{CalendarView, ViewError};
pub(crate) use self::widget::{Calendar, DetailSlot, GridOptions, HitMap, Target};
use std::fmt;
use std::iter::successors;
use thiserror::Error;
use time::{
    error::ComponentRange, format_description::FormatItem, macros::format_description, Date,
    Month,
};

pub(crate) static YMD_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// An inclusive span of calendar dates with `start <= end`
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub(crate) fn new(start: Date, end: Date) -> Result<DateRange, InvalidRangeError> {
        if start > end {
            Err(InvalidRangeError { start, end })
        } else {
            Ok(DateRange { start, end })
        }
    }

    /// January 1 through December 31 of `year`
    pub(crate) fn year(year: i32) -> Result<DateRange, ComponentRange> {
        Ok(DateRange {
            start: Date::from_calendar_date(year, Month::January, 1)?,
            end: Date::from_calendar_date(year, Month::December, 31)?,
        })
    }

    /// The year leading up to and including `today`.  February 29 maps to
    /// February 28 of the previous year.
    pub(crate) fn last_year(today: Date) -> Result<DateRange, ComponentRange> {
        let prev = today.year() - 1;
        let start = match today.replace_year(prev) {
            Ok(d) => d,
            Err(_) => today.replace_day(28)?.replace_year(prev)?,
        };
        Ok(DateRange { start, end: today })
    }

    pub(crate) fn start(&self) -> Date {
        self.start
    }

    pub(crate) fn end(&self) -> Date {
        self.end
    }

    pub(crate) fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    pub(crate) fn days(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        successors(Some(self.start), |d| d.next_day()).take_while(move |&d| d <= end)
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid date range: {start} is after {end}")]
pub(crate) struct InvalidRangeError {
    start: Date,
    end: Date,
}

/// A span of time the user can pick to view
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Period {
    LastYear,
    Year(i32),
}

impl Period {
    pub(crate) fn range(self, today: Date) -> Result<DateRange, ComponentRange> {
        match self {
            Period::LastYear => DateRange::last_year(today),
            Period::Year(y) => DateRange::year(y),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::LastYear => f.write_str("the last year"),
            Period::Year(y) => write!(f, "{y}"),
        }
    }
}
