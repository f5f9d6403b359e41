use super::{is_blank, DataSource, DayDetail, FetchError};
use crate::calendar::{DateRange, YMD_FMT};
use crate::contrib::Sample;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use time::Date;

pub(crate) const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

static CALENDAR_QUERY: &str = "
query ($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            contributionCount
            date
          }
        }
      }
    }
  }
}";

static DETAIL_QUERY: &str = "
query ($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      totalCommitContributions
      totalPullRequestContributions
      totalPullRequestReviewContributions
      totalRepositoriesWithContributedCommits
      commitContributionsByRepository {
        repository {
          name
        }
      }
    }
  }
}";

/// Fetches contributions from GitHub's GraphQL API
pub(crate) struct GitHubSource {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GitHubSource {
    pub(crate) fn new(token: Option<String>) -> Result<GitHubSource, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(GitHubSource {
            client,
            endpoint: String::from(GITHUB_GRAPHQL_URL),
            token,
        })
    }

    pub(crate) fn with_endpoint(mut self, endpoint: String) -> GitHubSource {
        self.endpoint = endpoint;
        self
    }

    fn query(&self, query: &str, subject: &str, range: DateRange) -> Result<String, FetchError> {
        let body = json!({
            "query": query,
            "variables": variables(subject, range)?,
        });
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!(
            endpoint = %self.endpoint,
            subject,
            start = %range.start(),
            end = %range.end(),
            "Sending GraphQL query"
        );
        let response = request.send().map_err(transport)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Authorization(format!(
                "GitHub returned {status}; check GITHUB_TOKEN"
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!("GitHub returned {status}")));
        }
        response.text().map_err(transport)
    }
}

impl fmt::Debug for GitHubSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSource")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl DataSource for GitHubSource {
    fn fetch_contributions(
        &self,
        subject: &str,
        range: DateRange,
    ) -> Result<Vec<Sample>, FetchError> {
        if is_blank(subject) {
            return Ok(Vec::new());
        }
        let text = self.query(CALENDAR_QUERY, subject, range)?;
        decode_calendar(&text, subject, range)
    }

    fn fetch_day_detail(&self, subject: &str, date: Date) -> Result<DayDetail, FetchError> {
        if is_blank(subject) {
            return Ok(DayDetail::default());
        }
        let range = DateRange::new(date, date).map_err(transport)?;
        let text = self.query(DETAIL_QUERY, subject, range)?;
        decode_detail(&text, subject)
    }
}

/// GraphQL variables for a query over `range`.  GitHub refuses
/// `contributionsCollection` spans of more than a year, so for a range
/// longer than that the earliest day is dropped.
fn variables(subject: &str, range: DateRange) -> Result<Value, FetchError> {
    let floor = DateRange::last_year(range.end())
        .ok()
        .and_then(|r| r.start().next_day());
    let start = floor.map_or(range.start(), |d| d.max(range.start()));
    let from = start.format(&YMD_FMT).map_err(transport)?;
    let to = range.end().format(&YMD_FMT).map_err(transport)?;
    Ok(json!({
        "username": subject,
        "from": format!("{from}T00:00:00Z"),
        "to": format!("{to}T23:59:59Z"),
    }))
}

fn transport<E: ToString>(e: E) -> FetchError {
    FetchError::Transport(e.to_string())
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<UserData<T>>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct UserData<T> {
    user: Option<T>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Collection<T> {
    contributions_collection: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarCollection {
    contribution_calendar: CalendarBody,
}

#[derive(Debug, Deserialize)]
struct CalendarBody {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    contribution_count: i64,
    date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailCollection {
    total_commit_contributions: u32,
    total_pull_request_contributions: u32,
    total_pull_request_review_contributions: u32,
    total_repositories_with_contributed_commits: u32,
    commit_contributions_by_repository: Vec<IgnoredAny>,
}

/// Pull the user object out of a GraphQL response body, classifying
/// failures
fn decode_user<T: DeserializeOwned>(text: &str, subject: &str) -> Result<T, FetchError> {
    let response = serde_json::from_str::<GraphQlResponse<T>>(text)
        .map_err(|e| FetchError::Transport(format!("malformed response from GitHub: {e}")))?;
    if let Some(err) = response.errors.first() {
        return Err(match err.kind.as_deref() {
            Some("NOT_FOUND") => FetchError::SubjectNotFound(subject.to_owned()),
            Some("FORBIDDEN" | "INSUFFICIENT_SCOPES") => {
                FetchError::Authorization(err.message.clone())
            }
            _ => FetchError::Transport(err.message.clone()),
        });
    }
    response
        .data
        .and_then(|data| data.user)
        .ok_or_else(|| FetchError::SubjectNotFound(subject.to_owned()))
}

fn decode_calendar(text: &str, subject: &str, range: DateRange) -> Result<Vec<Sample>, FetchError> {
    let user = decode_user::<Collection<CalendarCollection>>(text, subject)?;
    let mut samples = Vec::new();
    for day in user
        .contributions_collection
        .contribution_calendar
        .weeks
        .into_iter()
        .flat_map(|week| week.contribution_days)
    {
        let sample = Sample::parse(&day.date, day.contribution_count)
            .map_err(|e| FetchError::Transport(format!("invalid day from GitHub: {e}")))?;
        // The calendar is padded out to whole weeks
        if range.contains(sample.date) {
            samples.push(sample);
        }
    }
    tracing::info!(subject, days = samples.len(), "Fetched contribution calendar");
    Ok(samples)
}

fn decode_detail(text: &str, subject: &str) -> Result<DayDetail, FetchError> {
    let coll = decode_user::<Collection<DetailCollection>>(text, subject)?.contributions_collection;
    Ok(DayDetail {
        commits: coll.total_commit_contributions,
        pull_requests: coll.total_pull_request_contributions,
        merge_requests: coll.total_pull_request_review_contributions,
        pushes: u32::try_from(coll.commit_contributions_by_repository.len()).unwrap_or(u32::MAX),
        branches_contributed: coll.total_repositories_with_contributed_commits,
    })
}
