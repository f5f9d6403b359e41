use super::{is_blank, DataSource, DayDetail, FetchError};
use crate::calendar::DateRange;
use crate::contrib::Sample;
use time::Date;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Made-up but stable data, for trying the program out without a network
/// connection or token.  The same subject and date always produce the same
/// numbers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct DemoSource;

impl DataSource for DemoSource {
    fn fetch_contributions(
        &self,
        subject: &str,
        range: DateRange,
    ) -> Result<Vec<Sample>, FetchError> {
        if is_blank(subject) {
            return Ok(Vec::new());
        }
        Ok(range
            .days()
            .map(|date| Sample::new(date, count_for_roll(roll(subject, date))))
            .collect())
    }

    fn fetch_day_detail(&self, subject: &str, date: Date) -> Result<DayDetail, FetchError> {
        if is_blank(subject) {
            return Ok(DayDetail::default());
        }
        let c = u32::from(date.day() % 10);
        Ok(DayDetail {
            commits: c,
            pull_requests: c / 3,
            merge_requests: c / 4,
            pushes: c.saturating_sub(1),
            branches_contributed: c / 2,
        })
    }
}

/// A number in `0..1000` derived from `subject` and `date`
fn roll(subject: &str, date: Date) -> u32 {
    let hash = subject
        .bytes()
        .chain(date.to_julian_day().to_le_bytes())
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    u32::try_from(hash % 1000).unwrap_or_default()
}

// Most days are empty; busy days get rarer the busier they are
fn count_for_roll(roll: u32) -> u32 {
    match roll {
        986.. => 8,
        961..=985 => 5,
        921..=960 => 3,
        851..=920 => 2,
        651..=850 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_deterministic() {
        let range = DateRange::year(2023).unwrap();
        let a = DemoSource.fetch_contributions("octocat", range).unwrap();
        let b = DemoSource.fetch_contributions("octocat", range).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 365);
        assert!(a.iter().all(|s| range.contains(s.date)));
    }

    #[test]
    fn test_mostly_quiet() {
        let range = DateRange::year(2023).unwrap();
        let samples = DemoSource.fetch_contributions("octocat", range).unwrap();
        let zeros = samples.iter().filter(|s| s.count == 0).count();
        assert!(zeros > 100, "only {zeros} empty days");
        assert!(zeros < 365, "no activity at all");
        assert!(samples.iter().all(|s| [0, 1, 2, 3, 5, 8].contains(&s.count)));
    }

    #[test]
    fn test_subjects_differ() {
        let range = DateRange::year(2023).unwrap();
        let a = DemoSource.fetch_contributions("octocat", range).unwrap();
        let b = DemoSource.fetch_contributions("hubot", range).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_blank_subject() {
        let range = DateRange::year(2023).unwrap();
        assert_eq!(DemoSource.fetch_contributions("  ", range), Ok(Vec::new()));
        assert_eq!(
            DemoSource.fetch_day_detail("", date!(2024 - 03 - 19)),
            Ok(DayDetail::default())
        );
    }

    #[test]
    fn test_count_for_roll() {
        assert_eq!(count_for_roll(0), 0);
        assert_eq!(count_for_roll(650), 0);
        assert_eq!(count_for_roll(651), 1);
        assert_eq!(count_for_roll(851), 2);
        assert_eq!(count_for_roll(921), 3);
        assert_eq!(count_for_roll(961), 5);
        assert_eq!(count_for_roll(986), 8);
        assert_eq!(count_for_roll(999), 8);
    }

    #[test]
    fn test_detail() {
        let detail = DemoSource
            .fetch_day_detail("octocat", date!(2024 - 03 - 19))
            .unwrap();
        assert_eq!(
            detail,
            DayDetail {
                commits: 9,
                pull_requests: 3,
                merge_requests: 2,
                pushes: 8,
                branches_contributed: 4,
            }
        );
        let detail = DemoSource
            .fetch_day_detail("octocat", date!(2024 - 03 - 10))
            .unwrap();
        assert_eq!(detail, DayDetail::default());
    }
}
