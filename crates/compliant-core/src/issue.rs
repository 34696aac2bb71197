//! Compliance issues and evaluation results.
//!
//! Domain failures are data. Every deficiency the evaluator finds is an
//! [`Issue`] with a fixed `type` tag and a severity; the verdict is derived
//! from whether any issue was recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::requirement::CoverageType;

/// Issue severity. Orders from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Policy whose dates appear on the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyLine {
    #[serde(rename = "General Liability")]
    GeneralLiability,
    #[serde(rename = "Workers Compensation")]
    WorkersCompensation,
}

impl PolicyLine {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralLiability => "General Liability",
            Self::WorkersCompensation => "Workers Compensation",
        }
    }
}

impl fmt::Display for PolicyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The deficiency itself, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    CoverageInsufficient {
        trade: String,
        coverage_type: CoverageType,
        required: u64,
        actual: u64,
    },
    CoverageExpired {
        coverage_type: PolicyLine,
        expiration_date: String,
    },
    InvalidDateFormat {
        coverage_type: PolicyLine,
        value: String,
    },
    MissingAdditionalInsured {
        required_party: String,
        actual_parties: Vec<String>,
    },
    MissingExpirationDate {
        coverage_type: PolicyLine,
    },
}

impl IssueKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::CoverageInsufficient { .. } => "coverage_insufficient",
            Self::CoverageExpired { .. } => "coverage_expired",
            Self::InvalidDateFormat { .. } => "invalid_date_format",
            Self::MissingAdditionalInsured { .. } => "missing_additional_insured",
            Self::MissingExpirationDate { .. } => "missing_expiration_date",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::CoverageExpired { .. } => Severity::Critical,
            Self::CoverageInsufficient { .. }
            | Self::MissingAdditionalInsured { .. }
            | Self::MissingExpirationDate { .. } => Severity::High,
            Self::InvalidDateFormat { .. } => Severity::Medium,
        }
    }

    /// The policy line a date issue refers to.
    pub fn policy_line(&self) -> Option<PolicyLine> {
        match self {
            Self::CoverageExpired { coverage_type, .. }
            | Self::InvalidDateFormat { coverage_type, .. }
            | Self::MissingExpirationDate { coverage_type } => Some(*coverage_type),
            Self::CoverageInsufficient { .. } | Self::MissingAdditionalInsured { .. } => None,
        }
    }
}

/// One deficiency found during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(flatten)]
    pub kind: IssueKind,
    pub severity: Severity,
}

impl Issue {
    pub fn new(kind: IssueKind) -> Self {
        let severity = kind.severity();
        Self { kind, severity }
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    /// One-line description for logs and terminal output.
    pub fn describe(&self) -> String {
        match &self.kind {
            IssueKind::CoverageInsufficient {
                trade,
                required,
                actual,
                ..
            } => format!("{trade}: requires ${required}, certificate shows ${actual}"),
            IssueKind::CoverageExpired {
                coverage_type,
                expiration_date,
            } => format!("{coverage_type} expired {expiration_date}"),
            IssueKind::InvalidDateFormat {
                coverage_type,
                value,
            } => format!("{coverage_type} expiration {value:?} is not a valid date"),
            IssueKind::MissingAdditionalInsured {
                required_party,
                actual_parties,
            } => format!(
                "{required_party} not listed as additional insured (listed: {})",
                if actual_parties.is_empty() {
                    "none".to_string()
                } else {
                    actual_parties.join("; ")
                }
            ),
            IssueKind::MissingExpirationDate { coverage_type } => {
                format!("{coverage_type} expiration date missing")
            }
        }
    }
}

/// Outcome of evaluating one certificate.
///
/// `compliant` and `issues` are authoritative; `summary` is a display string
/// and must not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub compliant: bool,
    pub issues: Vec<Issue>,
    pub summary: String,
}

impl ComplianceResult {
    /// Derive the verdict and summary from the recorded issues.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let compliant = issues.is_empty();
        let summary = format!(
            "{} - {} issues found",
            if compliant { "Compliant" } else { "Non-compliant" },
            issues.len()
        );
        Self {
            compliant,
            issues,
            summary,
        }
    }

    /// Issues ordered most severe first; check order kept within a severity.
    pub fn ranked(&self) -> Vec<&Issue> {
        let mut ranked: Vec<&Issue> = self.issues.iter().collect();
        ranked.sort_by_key(|issue| issue.severity);
        ranked
    }

    /// Issues with the given `type` tag.
    pub fn issues_of<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues
            .iter()
            .filter(move |issue| issue.type_tag() == type_tag)
    }
}
