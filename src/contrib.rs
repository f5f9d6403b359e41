use crate::calendar::{MonthExt, YMD_FMT};
use crate::level::{InvalidCountError, Level};
use std::collections::hash_map::{Entry, HashMap};
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, Date};

static LONG_DATE_FMT: &[FormatItem<'_>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// One day's contribution count
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Sample {
    pub(crate) date: Date,
    pub(crate) count: u32,
}

impl Sample {
    pub(crate) fn new(date: Date, count: u32) -> Sample {
        Sample { date, count }
    }

    /// Build a sample from the loosely-typed form used on the wire
    pub(crate) fn parse(date: &str, count: i64) -> Result<Sample, SampleError> {
        let date = Date::parse(date, &YMD_FMT).map_err(|source| SampleError::Date {
            value: date.to_owned(),
            source,
        })?;
        Level::classify(count)?;
        // Counts past u32::MAX are all "very high" anyway
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        Ok(Sample { date, count })
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum SampleError {
    #[error("invalid sample date {value:?}")]
    Date {
        value: String,
        source: time::error::Parse,
    },
    #[error(transparent)]
    Count(#[from] InvalidCountError),
}

/// Per-day lookup table over a set of samples
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ContributionIndex {
    counts: HashMap<Date, u32>,
    total: u64,
    last_active: Option<Date>,
}

impl ContributionIndex {
    /// Index `samples`, which may arrive in any order.  Repeating a sample
    /// verbatim is harmless; giving one date two different counts is an
    /// error.
    pub(crate) fn build<I>(samples: I) -> Result<ContributionIndex, DuplicateSampleError>
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut index = ContributionIndex::default();
        for Sample { date, count } in samples {
            match index.counts.entry(date) {
                Entry::Occupied(e) if *e.get() == count => continue,
                Entry::Occupied(e) => {
                    return Err(DuplicateSampleError {
                        date,
                        first: *e.get(),
                        second: count,
                    })
                }
                Entry::Vacant(e) => {
                    e.insert(count);
                }
            }
            index.total += u64::from(count);
            if count > 0 && index.last_active < Some(date) {
                index.last_active = Some(date);
            }
        }
        Ok(index)
    }

    pub(crate) fn count_for(&self, date: Date) -> u32 {
        self.counts.get(&date).copied().unwrap_or_default()
    }

    pub(crate) fn level_for(&self, date: Date) -> Level {
        Level::for_count(self.count_for(date))
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    pub(crate) fn last_active_date(&self) -> Option<Date> {
        self.last_active
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("conflicting contribution counts for {date}: {first} and {second}")]
pub(crate) struct DuplicateSampleError {
    date: Date,
    first: u32,
    second: u32,
}

/// Render a date as e.g. "Mar 10th, 2024" for the "last contributed" line
pub(crate) fn fmt_last_active(date: Option<Date>) -> String {
    let Some(date) = date else {
        return String::from("No contributions found");
    };
    let day = date.day();
    let suffix = match (day % 10, day) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {day}{suffix}, {}", date.month().short_name(), date.year())
}

/// Render a date as e.g. "March 10, 2024"
pub(crate) fn fmt_long_date(date: Date) -> String {
    date.format(&LONG_DATE_FMT).unwrap_or_else(|_| date.to_string())
}
