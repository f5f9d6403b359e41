use super::util::{n_days_before, Week, WeekStart, WeekdayExt, DAYS_IN_WEEK};
use super::DateRange;
use thiserror::Error;

/// Lay out `range` as week columns, each beginning on `week_start`.
///
/// The first column starts on the `week_start` day on or before
/// `range.start()` and the last column is the one containing `range.end()`,
/// so the edge columns may include dates outside the range.
pub(crate) fn weeks_for(
    range: &DateRange,
    week_start: WeekStart,
) -> Result<Vec<Week>, OutOfTimeError> {
    let lead = usize::from(range.start().weekday().index0(week_start));
    let mut anchor = n_days_before(range.start(), lead).ok_or(OutOfTimeError)?;
    let span = usize::try_from((range.end() - range.start()).whole_days()).unwrap_or_default();
    let mut weeks = Vec::with_capacity(span / DAYS_IN_WEEK + 2);
    loop {
        let week = Week::starting(anchor).ok_or(OutOfTimeError)?;
        weeks.push(week);
        if week.last() >= range.end() {
            break;
        }
        anchor = week.last().next_day().ok_or(OutOfTimeError)?;
    }
    Ok(weeks)
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("reached the end of time")]
pub(crate) struct OutOfTimeError;
