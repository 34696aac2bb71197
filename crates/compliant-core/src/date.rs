//! Policy expiration dates.
//!
//! A present expiration value is either a valid ISO-8601 instant or is kept
//! verbatim and flagged invalid. It is never collapsed into "no expiration".
//!
//! Accepted forms:
//!
//! - RFC 3339 with offset or `Z`: `2027-01-01T00:00:00+00:00`
//! - naive date-time, read as UTC: `2027-01-01T12:30:00`, `2027-01-01 12:30:00.5`
//! - date only, read as the last instant of that day in UTC: `2027-01-01`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// An expiration value as supplied on a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyDate {
    Valid { raw: String, at: DateTime<Utc> },
    Invalid { raw: String },
}

impl PolicyDate {
    /// Classify a raw expiration string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match parse_instant(&raw) {
            Some(at) => Self::Valid { raw, at },
            None => Self::Invalid { raw },
        }
    }

    /// The text exactly as supplied.
    pub fn raw(&self) -> &str {
        match self {
            Self::Valid { raw, .. } | Self::Invalid { raw } => raw,
        }
    }

    /// The parsed instant, if the value was valid.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid { at, .. } => Some(*at),
            Self::Invalid { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

impl From<String> for PolicyDate {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<PolicyDate> for String {
    fn from(date: PolicyDate) -> Self {
        match date {
            PolicyDate::Valid { raw, .. } | PolicyDate::Invalid { raw } => raw,
        }
    }
}

/// Parse an ISO-8601 instant in one of the accepted forms.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    // Date-only values cover the whole day, up to the last nanosecond.
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
        .map(|naive| naive.and_utc())
}
