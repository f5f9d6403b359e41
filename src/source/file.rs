use super::{is_blank, DataSource, DayDetail, FetchError};
use crate::calendar::{DateRange, YMD_FMT};
use crate::contrib::Sample;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use time::Date;

/// Reads contribution data from `<dir>/<subject>.json`.
///
/// A file is either a bare array of `{"date": "YYYY-MM-DD", "count": N}`
/// objects or an object with that array under `"contributions"` plus an
/// optional `"details"` map from date to day detail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileSource {
    dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
enum DataFile {
    Bare(Vec<RawSample>),
    Full {
        contributions: Vec<RawSample>,
        #[serde(default)]
        details: HashMap<String, DayDetail>,
    },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct RawSample {
    date: String,
    count: i64,
}

impl FileSource {
    pub(crate) fn new<P: Into<PathBuf>>(dir: P) -> FileSource {
        FileSource { dir: dir.into() }
    }

    fn read(&self, subject: &str) -> Result<DataFile, FetchError> {
        // Subjects name files directly inside `dir`, nowhere else
        if subject.contains(['/', '\\']) || subject.starts_with('.') {
            return Err(FetchError::SubjectNotFound(subject.to_owned()));
        }
        let path = self.dir.join(format!("{subject}.json"));
        tracing::debug!(path = %path.display(), "Reading contribution file");
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::SubjectNotFound(subject.to_owned()),
            ErrorKind::PermissionDenied => {
                FetchError::Authorization(format!("cannot read {}", path.display()))
            }
            _ => FetchError::Transport(format!("failed to read {}: {e}", path.display())),
        })?;
        serde_json::from_str(&content)
            .map_err(|e| FetchError::Transport(format!("invalid data in {}: {e}", path.display())))
    }
}

impl DataSource for FileSource {
    fn fetch_contributions(
        &self,
        subject: &str,
        range: DateRange,
    ) -> Result<Vec<Sample>, FetchError> {
        if is_blank(subject) {
            return Ok(Vec::new());
        }
        let raw = match self.read(subject)? {
            DataFile::Bare(raw) | DataFile::Full { contributions: raw, .. } => raw,
        };
        let mut samples = Vec::with_capacity(raw.len());
        for RawSample { date, count } in raw {
            let sample = Sample::parse(&date, count)
                .map_err(|e| FetchError::Transport(format!("bad sample for {subject}: {e}")))?;
            if range.contains(sample.date) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    fn fetch_day_detail(&self, subject: &str, date: Date) -> Result<DayDetail, FetchError> {
        if is_blank(subject) {
            return Ok(DayDetail::default());
        }
        let DataFile::Full { details, .. } = self.read(subject)? else {
            return Ok(DayDetail::default());
        };
        let key = date
            .format(&YMD_FMT)
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(details.get(&key).copied().unwrap_or_default())
    }
}
