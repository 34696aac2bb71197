//! Coverage requirements derived from insurance program documents.
//!
//! Requirements come from two places: the pattern recognisers in
//! `compliant-extract`, and previously stored program records whose field
//! names drifted over time (`gl_per_occurrence`, `limit`, `type`, `pattern`).
//! [`parse_requirements_json`] reconciles the stored shapes into [`Requirement`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CoreError;
use crate::amount::AmountValue;

/// Line of coverage a requirement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    GeneralLiability,
    WorkersComp,
    Auto,
    Umbrella,
    Unclassified,
}

impl CoverageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeneralLiability => "general_liability",
            Self::WorkersComp => "workers_comp",
            Self::Auto => "auto",
            Self::Umbrella => "umbrella",
            Self::Unclassified => "unclassified",
        }
    }

    /// Map a free-form coverage tag onto the known lines.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "general_liability" | "gl" | "cgl" => Self::GeneralLiability,
            "workers_comp" | "workers_compensation" | "wc" => Self::WorkersComp,
            "auto" | "automobile" | "auto_liability" => Self::Auto,
            "umbrella" | "excess" | "umbrella_excess" => Self::Umbrella,
            _ => Self::Unclassified,
        }
    }
}

/// Which recogniser produced a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePattern {
    TierTradeTable,
    PrimeSubcontractor,
    GeneralTier,
    WorkersComp,
    Auto,
    Umbrella,
    /// Entered or stored outside the text recognisers.
    Manual,
}

impl SourcePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TierTradeTable => "tier_trade_table",
            Self::PrimeSubcontractor => "prime_subcontractor",
            Self::GeneralTier => "general_tier",
            Self::WorkersComp => "workers_comp",
            Self::Auto => "auto",
            Self::Umbrella => "umbrella",
            Self::Manual => "manual",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "tier_trade_table" => Self::TierTradeTable,
            "prime_subcontractor" => Self::PrimeSubcontractor,
            "general_tier" => Self::GeneralTier,
            "workers_comp" => Self::WorkersComp,
            "auto" => Self::Auto,
            "umbrella" => Self::Umbrella,
            _ => Self::Manual,
        }
    }
}

/// A single coverage obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub tier: Option<u32>,
    pub trade: Option<String>,
    pub coverage_type: CoverageType,
    /// Whole dollars.
    pub limit_amount: u64,
    pub source_pattern: SourcePattern,
    #[serde(default = "default_true")]
    pub requires_additional_insured: bool,
    #[serde(default)]
    pub additional_insured_party: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Requirement {
    /// A tier/trade-level requirement; these are general-liability limits.
    pub fn tiered(
        tier: u32,
        trade: impl Into<String>,
        limit_amount: u64,
        source_pattern: SourcePattern,
    ) -> Self {
        Self {
            tier: Some(tier),
            trade: Some(trade.into()),
            coverage_type: CoverageType::GeneralLiability,
            limit_amount,
            source_pattern,
            requires_additional_insured: true,
            additional_insured_party: None,
        }
    }

    /// A requirement for a line of coverage with no tier or trade.
    pub fn ancillary(
        coverage_type: CoverageType,
        limit_amount: u64,
        source_pattern: SourcePattern,
    ) -> Self {
        Self {
            tier: None,
            trade: None,
            coverage_type,
            limit_amount,
            source_pattern,
            requires_additional_insured: true,
            additional_insured_party: None,
        }
    }

    pub fn with_additional_insured(mut self, party: impl Into<String>) -> Self {
        self.requires_additional_insured = true;
        self.additional_insured_party = Some(party.into());
        self
    }

    pub fn without_additional_insured(mut self) -> Self {
        self.requires_additional_insured = false;
        self
    }

    /// Whether the limit is compared against the certificate's GL
    /// per-occurrence limit. Untyped requirements are trade-level GL limits.
    pub fn is_general_liability(&self) -> bool {
        matches!(
            self.coverage_type,
            CoverageType::GeneralLiability | CoverageType::Unclassified
        )
    }

    /// Trade name for reporting.
    pub fn trade_label(&self) -> &str {
        self.trade.as_deref().unwrap_or("Unknown")
    }

    /// The party that must appear as additional insured, if one is required
    /// and named.
    pub fn required_party(&self) -> Option<&str> {
        if !self.requires_additional_insured {
            return None;
        }
        self.additional_insured_party
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// ── Stored/legacy input shapes ──

/// A requirement as stored by earlier program records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementSubmission {
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub trade: Option<String>,
    #[serde(default, alias = "type")]
    pub coverage_type: Option<String>,
    #[serde(default, alias = "gl_per_occurrence", alias = "limit")]
    pub limit_amount: Option<AmountValue>,
    #[serde(default, alias = "pattern")]
    pub source_pattern: Option<String>,
    #[serde(default)]
    pub requires_additional_insured: Option<bool>,
    #[serde(default, alias = "additional_insured")]
    pub additional_insured_party: Option<String>,
}

impl RequirementSubmission {
    /// Normalise into a [`Requirement`]. `Ok(None)` when no limit was given.
    pub fn into_requirement(self) -> Result<Option<Requirement>, CoreError> {
        let Some(limit) = self.limit_amount else {
            return Ok(None);
        };
        let limit_amount = limit.to_dollars()?;

        let coverage_type = self
            .coverage_type
            .as_deref()
            .map(CoverageType::from_tag)
            .unwrap_or(CoverageType::Unclassified);
        let source_pattern = self
            .source_pattern
            .as_deref()
            .map(SourcePattern::from_tag)
            .unwrap_or(SourcePattern::Manual);

        Ok(Some(Requirement {
            tier: self.tier,
            trade: self.trade.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            coverage_type,
            limit_amount,
            source_pattern,
            requires_additional_insured: self.requires_additional_insured.unwrap_or(true),
            additional_insured_party: self.additional_insured_party,
        }))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementsDocument {
    Listed(Vec<RequirementSubmission>),
    Wrapped { requirements: Vec<RequirementSubmission> },
}

/// Parse stored requirements from JSON.
///
/// Accepts a bare array or an object with a `requirements` array (the shape
/// the program parser has always returned). Entries without a limit are
/// dropped.
pub fn parse_requirements_json(json: &str) -> Result<Vec<Requirement>, CoreError> {
    let submissions = match serde_json::from_str::<RequirementsDocument>(json)? {
        RequirementsDocument::Listed(list) => list,
        RequirementsDocument::Wrapped { requirements } => requirements,
    };

    let mut out = Vec::with_capacity(submissions.len());
    for (index, submission) in submissions.into_iter().enumerate() {
        match submission.into_requirement()? {
            Some(req) => out.push(req),
            None => warn!(index, "dropping requirement without a limit"),
        }
    }
    Ok(out)
}
