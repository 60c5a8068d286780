use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ReconError;
use crate::model::LogMetadata;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range. `start > end` is a valid, empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both bounds from `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ReconError> {
        Ok(Self::new(
            parse_date("start_date", start)?,
            parse_date("end_date", end)?,
        ))
    }

    /// The range the log was produced for.
    pub fn from_metadata(metadata: &LogMetadata) -> Result<Self, ReconError> {
        Self::parse(&metadata.start_date, &metadata.end_date)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Parse a bucket key. `None` for anything that is not a calendar date.
pub fn parse_bucket_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ReconError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ReconError::DateParse {
        field: field.into(),
        value: value.into(),
    })
}
