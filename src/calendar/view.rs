use super::months::{labels_for, LabelDedup, MonthLabel};
use super::util::{Week, WeekStart};
use super::weeks::{weeks_for, OutOfTimeError};
use super::{DateRange, Period};
use crate::contrib::{ContributionIndex, DuplicateSampleError, Sample};
use crate::level::Level;
use thiserror::Error;
use time::Date;

/// Everything needed to draw one period's calendar: the week grid, its
/// month labels, and the contribution lookup table
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CalendarView {
    period: Period,
    range: DateRange,
    week_start: WeekStart,
    weeks: Vec<Week>,
    labels: Vec<MonthLabel>,
    index: ContributionIndex,
}

impl CalendarView {
    pub(crate) fn new<I>(
        period: Period,
        range: DateRange,
        week_start: WeekStart,
        dedup: LabelDedup,
        samples: I,
    ) -> Result<CalendarView, ViewError>
    where
        I: IntoIterator<Item = Sample>,
    {
        let weeks = weeks_for(&range, week_start)?;
        let labels = labels_for(&weeks, dedup);
        let index = ContributionIndex::build(samples)?;
        Ok(CalendarView {
            period,
            range,
            week_start,
            weeks,
            labels,
            index,
        })
    }

    pub(crate) fn period(&self) -> Period {
        self.period
    }

    pub(crate) fn range(&self) -> DateRange {
        self.range
    }

    pub(crate) fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub(crate) fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    pub(crate) fn labels(&self) -> &[MonthLabel] {
        &self.labels
    }

    pub(crate) fn index(&self) -> &ContributionIndex {
        &self.index
    }

    pub(crate) fn count_for(&self, date: Date) -> u32 {
        self.index.count_for(date)
    }

    pub(crate) fn level_for(&self, date: Date) -> Level {
        self.index.level_for(date)
    }

    /// The date drawn at column `week`, row `row`
    pub(crate) fn date_at(&self, week: usize, row: usize) -> Option<Date> {
        self.weeks.get(week)?.get(row)
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum ViewError {
    #[error(transparent)]
    OutOfTime(#[from] OutOfTimeError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateSampleError),
}
