//! Certificate of Insurance records.
//!
//! Submissions arrive loosely typed: limits as numbers or dollar strings,
//! additional insureds as a list or one comma-joined string, empty dates.
//! [`CoiSubmission::into_record`] is the single place those shapes are
//! normalised; evaluation only ever sees a [`CoiRecord`].

use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::amount::AmountValue;
use crate::date::PolicyDate;

/// Structured facts about one certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoiRecord {
    /// Whole dollars; `0` means unknown or none.
    #[serde(default)]
    pub gl_limit_per_occurrence: u64,
    #[serde(default)]
    pub gl_expiration_date: Option<PolicyDate>,
    #[serde(default)]
    pub wc_expiration_date: Option<PolicyDate>,
    #[serde(default)]
    pub additional_insureds: Vec<String>,
}

impl CoiRecord {
    /// Parse and normalise a submitted certificate from JSON.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str::<CoiSubmission>(json)?.into_record()
    }
}

/// Additional insureds as submitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PartyList {
    Joined(String),
    Listed(Vec<String>),
}

impl PartyList {
    /// Trimmed, non-empty names. A joined string is split on commas.
    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::Joined(s) => split_parties(&s),
            Self::Listed(list) => list
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

/// Split a comma-joined list of party names.
pub fn split_parties(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// A certificate as submitted by the surrounding service layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoiSubmission {
    #[serde(
        default,
        alias = "gl_limits_per_occurrence",
        alias = "gl_each_occurrence"
    )]
    pub gl_limit_per_occurrence: Option<AmountValue>,
    #[serde(default)]
    pub gl_expiration_date: Option<String>,
    #[serde(default)]
    pub wc_expiration_date: Option<String>,
    #[serde(default)]
    pub additional_insureds: Option<PartyList>,
}

impl CoiSubmission {
    pub fn into_record(self) -> Result<CoiRecord, CoreError> {
        let gl_limit_per_occurrence = match self.gl_limit_per_occurrence {
            Some(limit) => limit.to_dollars()?,
            None => 0,
        };

        Ok(CoiRecord {
            gl_limit_per_occurrence,
            gl_expiration_date: present_date(self.gl_expiration_date),
            wc_expiration_date: present_date(self.wc_expiration_date),
            additional_insureds: self
                .additional_insureds
                .map(PartyList::into_names)
                .unwrap_or_default(),
        })
    }
}

/// Only a missing, null or empty field is absent. Any other text, whitespace
/// included, is classified and fails closed if it is not a date.
fn present_date(raw: Option<String>) -> Option<PolicyDate> {
    raw.filter(|s| !s.is_empty()).map(PolicyDate::parse)
}
