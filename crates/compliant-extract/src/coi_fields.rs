//! Field extraction from Certificate of Insurance text.
//!
//! Certificates repeat each field verbatim once per slot, so every list is
//! deduplicated (first appearance wins). Dates are collected into one list:
//! certificates do not reliably label which date is effective and which is
//! expiration, so callers should prefer explicit fields when they have them.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

static POLICY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPOL(?:-?[A-Z0-9]+)+").unwrap());

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d[\d,]*(?:\.\d{2})?").unwrap());

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)*\.[A-Za-z]{2,}").unwrap()
});

static CARRIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:INSURER|INSURANCE|COMPANY)[ \t]+[A-Z][ \t]*:[ \t]*([A-Za-z][A-Za-z &.,'-]*)")
        .unwrap()
});

/// Fields recognised on a certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoiFields {
    pub policy_numbers: Vec<String>,
    /// Dollar amounts exactly as printed, e.g. `$2,000,000`.
    pub coverage_limits: Vec<String>,
    /// Every `MM/DD/YYYY` date, effective and expiration alike.
    pub dates: Vec<String>,
    pub carriers: Vec<String>,
    pub emails: Vec<String>,
}

impl CoiFields {
    pub fn is_empty(&self) -> bool {
        self.policy_numbers.is_empty()
            && self.coverage_limits.is_empty()
            && self.dates.is_empty()
            && self.carriers.is_empty()
            && self.emails.is_empty()
    }
}

/// Extract certificate fields from plain text.
pub fn extract_coi_fields(text: &str) -> CoiFields {
    // A policy token needs a digit; this drops the word "POLICY" itself.
    let policy_numbers = unique(
        POLICY_RE
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|s| s.bytes().any(|b| b.is_ascii_digit())),
    );

    let coverage_limits = unique(
        AMOUNT_RE
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(',')),
    );

    let dates = unique(DATE_RE.find_iter(text).map(|m| m.as_str()));

    let emails = unique(EMAIL_RE.find_iter(text).map(|m| m.as_str()));

    let carriers = unique(
        CARRIER_RE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches(',').trim_end())
            .filter(|name| !name.is_empty()),
    );

    let fields = CoiFields {
        policy_numbers,
        coverage_limits,
        dates,
        carriers,
        emails,
    };
    info!(
        policy_numbers = fields.policy_numbers.len(),
        coverage_limits = fields.coverage_limits.len(),
        dates = fields.dates.len(),
        carriers = fields.carriers.len(),
        emails = fields.emails.len(),
        "extracted certificate fields"
    );
    fields
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
