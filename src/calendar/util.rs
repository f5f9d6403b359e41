use serde::Deserialize;
use std::fmt;
use std::iter::successors;
use std::str::FromStr;
use thiserror::Error;
use time::{Date, Month, Weekday};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// The weekday on which every grid column begins
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub(crate) fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sunday,
            WeekStart::Monday => Weekday::Monday,
        }
    }

    /// The seven weekdays in grid row order
    pub(crate) fn weekdays(self) -> [Weekday; DAYS_IN_WEEK] {
        let mut wd = self.weekday();
        std::array::from_fn(|_| {
            let this = wd;
            wd = wd.next();
            this
        })
    }
}

impl FromStr for WeekStart {
    type Err = ParseWeekStartError;

    fn from_str(s: &str) -> Result<WeekStart, ParseWeekStartError> {
        match s.to_ascii_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            _ => Err(ParseWeekStartError),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("week start must be \"sunday\" or \"monday\"")]
pub(crate) struct ParseWeekStartError;

pub(crate) trait WeekdayExt {
    /// Row of this weekday in a grid whose weeks begin on `start`
    fn index0(&self, start: WeekStart) -> u8;

    fn short_name(&self) -> &'static str;
}

impl WeekdayExt for Weekday {
    fn index0(&self, start: WeekStart) -> u8 {
        match start {
            WeekStart::Sunday => self.number_days_from_sunday(),
            WeekStart::Monday => self.number_days_from_monday(),
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }
}

pub(crate) trait MonthExt {
    fn short_name(&self) -> &'static str;
}

impl MonthExt for Month {
    fn short_name(&self) -> &'static str {
        match self {
            Month::January => "Jan",
            Month::February => "Feb",
            Month::March => "Mar",
            Month::April => "Apr",
            Month::May => "May",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Aug",
            Month::September => "Sep",
            Month::October => "Oct",
            Month::November => "Nov",
            Month::December => "Dec",
        }
    }
}

/// Seven consecutive dates forming one grid column
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Week([Date; DAYS_IN_WEEK]);

impl Week {
    // Returns `None` if the week would run past the end of time
    pub(super) fn starting(anchor: Date) -> Option<Week> {
        let mut days = [anchor; DAYS_IN_WEEK];
        let mut date = anchor;
        for slot in days.iter_mut().skip(1) {
            date = date.next_day()?;
            *slot = date;
        }
        Some(Week(days))
    }

    pub(crate) fn last(&self) -> Date {
        self.0[DAYS_IN_WEEK - 1]
    }

    pub(crate) fn days(&self) -> impl Iterator<Item = Date> + '_ {
        self.0.iter().copied()
    }

    pub(crate) fn get(&self, row: usize) -> Option<Date> {
        self.0.get(row).copied()
    }

    pub(crate) fn has_month_start(&self) -> bool {
        self.days().any(|d| d.day() == 1)
    }
}

pub(crate) fn n_days_before(date: Date, n: usize) -> Option<Date> {
    successors(Some(date), |d| d.previous_day()).nth(n)
}

pub(crate) fn n_days_after(date: Date, n: usize) -> Option<Date> {
    successors(Some(date), |d| d.next_day()).nth(n)
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Sunday => f.write_str("sunday"),
            WeekStart::Monday => f.write_str("monday"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Weekday::*;

    #[test]
    fn test_starting() {
        let week = Week::starting(date!(2023 - 11 - 12)).unwrap();
        let mut iter = week.days().map(|d| (d.weekday(), d));
        assert_eq!(iter.next(), Some((Sunday, date!(2023 - 11 - 12))));
        assert_eq!(iter.next(), Some((Monday, date!(2023 - 11 - 13))));
        assert_eq!(iter.next(), Some((Tuesday, date!(2023 - 11 - 14))));
        assert_eq!(iter.next(), Some((Wednesday, date!(2023 - 11 - 15))));
        assert_eq!(iter.next(), Some((Thursday, date!(2023 - 11 - 16))));
        assert_eq!(iter.next(), Some((Friday, date!(2023 - 11 - 17))));
        assert_eq!(iter.next(), Some((Saturday, date!(2023 - 11 - 18))));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_starting_across_month() {
        let week = Week::starting(date!(2024 - 02 - 26)).unwrap();
        assert_eq!(week.get(0), Some(date!(2024 - 02 - 26)));
        assert_eq!(week.last(), date!(2024 - 03 - 03));
        assert_eq!(week.get(4), Some(date!(2024 - 03 - 01)));
        assert_eq!(week.get(3), Some(date!(2024 - 02 - 29)));
        assert_eq!(week.get(7), None);
        assert!(week.has_month_start());
    }

    #[test]
    fn test_starting_at_end_of_time() {
        assert_eq!(Week::starting(Date::MAX), None);
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(
            WeekStart::Sunday.weekdays(),
            [Sunday, Monday, Tuesday, Wednesday, Thursday, Friday, Saturday]
        );
        assert_eq!(
            WeekStart::Monday.weekdays(),
            [Monday, Tuesday, Wednesday, Thursday, Friday, Saturday, Sunday]
        );
    }

    #[test]
    fn test_index0() {
        assert_eq!(Sunday.index0(WeekStart::Sunday), 0);
        assert_eq!(Sunday.index0(WeekStart::Monday), 6);
        assert_eq!(Monday.index0(WeekStart::Monday), 0);
        assert_eq!(Saturday.index0(WeekStart::Sunday), 6);
    }

    #[test]
    fn test_parse_week_start() {
        assert_eq!("Monday".parse::<WeekStart>(), Ok(WeekStart::Monday));
        assert_eq!("sun".parse::<WeekStart>(), Ok(WeekStart::Sunday));
        assert_eq!("friday".parse::<WeekStart>(), Err(ParseWeekStartError));
    }

    #[test]
    fn test_n_days() {
        assert_eq!(n_days_before(date!(2024 - 03 - 01), 1), Some(date!(2024 - 02 - 29)));
        assert_eq!(n_days_before(date!(2024 - 03 - 01), 0), Some(date!(2024 - 03 - 01)));
        assert_eq!(n_days_after(date!(2024 - 12 - 30), 3), Some(date!(2025 - 01 - 02)));
        assert_eq!(n_days_before(Date::MIN, 1), None);
    }
}
