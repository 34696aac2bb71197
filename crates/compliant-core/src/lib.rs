//! Core types for Compliant: coverage requirements, certificate records,
//! compliance issues, and the normalisation of loosely typed submissions.

pub mod amount;
pub mod coi;
pub mod date;
mod error;
pub mod issue;
pub mod requirement;

pub use amount::parse_dollars;
pub use coi::{CoiRecord, CoiSubmission};
pub use date::PolicyDate;
pub use error::CoreError;
pub use issue::{ComplianceResult, Issue, IssueKind, PolicyLine, Severity};
pub use requirement::{CoverageType, Requirement, SourcePattern, parse_requirements_json};
