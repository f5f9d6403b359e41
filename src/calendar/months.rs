use super::util::{MonthExt, Week};
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;
use time::Month;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct MonthLabel {
    pub(crate) text: &'static str,
    pub(crate) week_index: usize,
}

/// How repeated month names in a grid are collapsed.
///
/// `ByName` keeps only the first occurrence of each month name, which on a
/// grid longer than a year hides the later year's label.  `ByYearMonth`
/// keeps one label per calendar month.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum LabelDedup {
    #[default]
    ByName,
    ByYearMonth,
}

impl FromStr for LabelDedup {
    type Err = ParseLabelDedupError;

    fn from_str(s: &str) -> Result<LabelDedup, ParseLabelDedupError> {
        match s {
            "by-name" => Ok(LabelDedup::ByName),
            "by-year-month" => Ok(LabelDedup::ByYearMonth),
            _ => Err(ParseLabelDedupError),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("month label mode must be \"by-name\" or \"by-year-month\"")]
pub(crate) struct ParseLabelDedupError;

/// Find, for each month whose first day appears in `weeks`, the column
/// containing that day.  Labels come out in column order.
pub(crate) fn labels_for(weeks: &[Week], dedup: LabelDedup) -> Vec<MonthLabel> {
    let mut seen: HashSet<(Option<i32>, Month)> = HashSet::new();
    let mut labels = Vec::new();
    for (week_index, week) in weeks.iter().enumerate() {
        if !week.has_month_start() {
            continue;
        }
        for date in week.days().filter(|d| d.day() == 1) {
            let key = match dedup {
                LabelDedup::ByName => (None, date.month()),
                LabelDedup::ByYearMonth => (Some(date.year()), date.month()),
            };
            if seen.insert(key) {
                labels.push(MonthLabel {
                    text: date.month().short_name(),
                    week_index,
                });
            }
        }
    }
    labels.sort_by_key(|lbl| lbl.week_index);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::util::WeekStart;
    use crate::calendar::weeks::weeks_for;
    use crate::calendar::DateRange;
    use time::macros::date;

    fn year_grid(year: i32, ws: WeekStart) -> Vec<Week> {
        weeks_for(&DateRange::year(year).unwrap(), ws).unwrap()
    }

    #[test]
    fn test_single_year_by_name() {
        let weeks = year_grid(2024, WeekStart::Sunday);
        assert_eq!(weeks.len(), 53);
        let labels = labels_for(&weeks, LabelDedup::ByName);
        let texts = labels.iter().map(|lbl| lbl.text).collect::<Vec<_>>();
        assert_eq!(
            texts,
            [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"
            ]
        );
        assert!(labels.windows(2).all(|w| w[0].week_index < w[1].week_index));
        assert_eq!(labels[0].week_index, 0);
        assert_eq!(labels[1].week_index, 4);
        assert_eq!(labels[2].week_index, 8);
        assert_eq!(labels[11].week_index, 48);
    }

    #[test]
    fn test_single_year_by_year_month() {
        // The last column of 2024 contains 2025-01-01
        let weeks = year_grid(2024, WeekStart::Sunday);
        let labels = labels_for(&weeks, LabelDedup::ByYearMonth);
        assert_eq!(labels.len(), 13);
        assert_eq!(
            labels[12],
            MonthLabel {
                text: "Jan",
                week_index: 52
            }
        );
    }

    #[test]
    fn test_every_year_has_twelve_labels() {
        for year in 2000..2040 {
            for ws in [WeekStart::Sunday, WeekStart::Monday] {
                let labels = labels_for(&year_grid(year, ws), LabelDedup::ByName);
                assert_eq!(labels.len(), 12, "{year} {ws}");
                let names = labels.iter().map(|lbl| lbl.text).collect::<HashSet<_>>();
                assert_eq!(names.len(), 12);
            }
        }
    }

    #[test]
    fn test_multi_year_collision() {
        let r = DateRange::new(date!(2023 - 01 - 01), date!(2024 - 12 - 31)).unwrap();
        let weeks = weeks_for(&r, WeekStart::Sunday).unwrap();
        assert_eq!(labels_for(&weeks, LabelDedup::ByName).len(), 12);
        let labels = labels_for(&weeks, LabelDedup::ByYearMonth);
        assert_eq!(labels.len(), 25);
        assert!(labels.windows(2).all(|w| w[0].week_index <= w[1].week_index));
    }

    #[test]
    fn test_range_without_first_of_month() {
        let r = DateRange::new(date!(2024 - 03 - 10), date!(2024 - 03 - 20)).unwrap();
        let weeks = weeks_for(&r, WeekStart::Sunday).unwrap();
        assert!(labels_for(&weeks, LabelDedup::ByName).is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(labels_for(&[], LabelDedup::ByName).is_empty());
    }

    #[test]
    fn test_parse_dedup() {
        assert_eq!("by-name".parse::<LabelDedup>(), Ok(LabelDedup::ByName));
        assert_eq!(
            "by-year-month".parse::<LabelDedup>(),
            Ok(LabelDedup::ByYearMonth)
        );
        assert_eq!("yearly".parse::<LabelDedup>(), Err(ParseLabelDedupError));
    }
}
