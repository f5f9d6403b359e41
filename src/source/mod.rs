mod demo;
mod file;
mod github;
pub(crate) use self::demo::DemoSource;
pub(crate) use self::file::FileSource;
pub(crate) use self::github::GitHubSource;
use crate::calendar::DateRange;
use crate::contrib::Sample;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use time::Date;

/// Somewhere contribution data can be fetched from.  Calls block, so they
/// are made from worker threads.
pub(crate) trait DataSource: fmt::Debug + Send + Sync {
    /// Fetch the per-day counts for `subject` over `range`.  A blank subject
    /// yields no samples rather than an error.
    fn fetch_contributions(&self, subject: &str, range: DateRange)
        -> Result<Vec<Sample>, FetchError>;

    fn fetch_day_detail(&self, subject: &str, date: Date) -> Result<DayDetail, FetchError>;
}

/// Breakdown of a single day's activity
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DayDetail {
    pub(crate) commits: u32,
    pub(crate) pull_requests: u32,
    pub(crate) merge_requests: u32,
    pub(crate) pushes: u32,
    pub(crate) branches_contributed: u32,
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub(crate) enum FetchError {
    #[error("user {0:?} not found")]
    SubjectNotFound(String),
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("failed to fetch data: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether trying the same request again might succeed
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

fn is_blank(subject: &str) -> bool {
    subject.trim().is_empty()
}

/// Fetch a day's detail, substituting an all-zero record on failure
pub(crate) fn detail_or_zeroed(source: &dyn DataSource, subject: &str, date: Date) -> DayDetail {
    match source.fetch_day_detail(subject, date) {
        Ok(detail) => detail,
        Err(e) => {
            tracing::warn!(%date, "Failed to fetch day detail: {e}");
            DayDetail::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[derive(Debug)]
    struct Failing;

    impl DataSource for Failing {
        fn fetch_contributions(
            &self,
            _subject: &str,
            _range: DateRange,
        ) -> Result<Vec<Sample>, FetchError> {
            Err(FetchError::Transport(String::from("connection reset")))
        }

        fn fetch_day_detail(&self, _subject: &str, _date: Date) -> Result<DayDetail, FetchError> {
            Err(FetchError::Transport(String::from("connection reset")))
        }
    }

    #[test]
    fn test_detail_or_zeroed() {
        assert_eq!(
            detail_or_zeroed(&Failing, "octocat", date!(2024 - 03 - 10)),
            DayDetail::default()
        );
        let detail = detail_or_zeroed(&DemoSource, "octocat", date!(2024 - 03 - 13));
        assert_eq!(detail.commits, 3);
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::Transport(String::from("timeout")).is_retryable());
        assert!(!FetchError::SubjectNotFound(String::from("ghost")).is_retryable());
        assert!(!FetchError::Authorization(String::from("bad token")).is_retryable());
    }

    #[test]
    fn test_day_detail_json() {
        let detail = serde_json::from_str::<DayDetail>(
            r#"{"commits": 4, "pullRequests": 1, "branchesContributed": 2}"#,
        )
        .unwrap();
        assert_eq!(
            detail,
            DayDetail {
                commits: 4,
                pull_requests: 1,
                merge_requests: 0,
                pushes: 0,
                branches_contributed: 2,
            }
        );
    }
}
