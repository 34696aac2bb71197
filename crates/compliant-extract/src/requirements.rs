//! Coverage requirement recognisers for insurance program documents.
//!
//! Program documents state the same obligations in incompatible layouts:
//!
//! - tier/trade tables: `Tier 1 Electrical $2,000,000`
//! - prime subcontractor clauses: `Prime Subcontractor: $5,000,000`
//! - blanket tier clauses: `All Tier 2 trades: $3,000,000`
//! - ancillary lines: `Workers' Compensation: $1,000,000`, `Auto Liability: ...`,
//!   `Umbrella: ...`
//!
//! Each layout is one [`RequirementPattern`]. The extractor runs every pattern
//! over the whole text and concatenates the results in pattern order, then
//! text order within a pattern. Overlapping matches from different patterns
//! are all kept; deciding between them is a policy question for the caller.

use std::sync::LazyLock;

use compliant_core::{CoverageType, Requirement, SourcePattern, parse_dollars};
use regex::{Captures, Regex};
use tracing::{debug, info};

static TIER_TRADE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Tier\s+(\d+)\s+([^$]+)\$([0-9,]+)").unwrap());

static PRIME_SUB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Prime\s+Subcontractor[:\s]+\$([0-9,]+)").unwrap());

static GENERAL_TIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:All\s+)?Tier\s+(\d+)(?:\s+trades?)?[:\s]+\$([0-9,]+)").unwrap()
});

static WORKERS_COMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Workers?\s*['"’]?\s*Comp(?:ensation)?[:\s]+\$([0-9,]+)"#).unwrap()
});

static AUTO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bAuto(?:mobile)?(?:\s+Liability)?[:\s]+\$([0-9,]+)").unwrap()
});

static UMBRELLA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Umbrella|Excess)(?:\s+Liability)?[:\s]+\$([0-9,]+)").unwrap()
});

/// One recogniser for one document layout.
pub trait RequirementPattern: Send + Sync {
    /// Tag recorded on every requirement this pattern yields.
    fn source(&self) -> SourcePattern;

    /// All requirements this pattern finds, in text order.
    fn extract(&self, text: &str) -> Vec<Requirement>;
}

/// Parse the dollar amount in capture group `idx`. Unparseable amounts drop
/// the match.
fn captured_dollars(caps: &Captures<'_>, idx: usize) -> Option<u64> {
    let raw = caps.get(idx)?.as_str();
    let amount = parse_dollars(raw);
    if amount.is_none() {
        debug!(raw, "skipping match with unparseable amount");
    }
    amount
}

fn captured_tier(caps: &Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|tier| *tier > 0)
}

// ── Tier/trade layouts ──

/// `Tier <N> <trade> $<amount>`; the trade text may span lines.
pub struct TierTradeTable;

impl RequirementPattern for TierTradeTable {
    fn source(&self) -> SourcePattern {
        SourcePattern::TierTradeTable
    }

    fn extract(&self, text: &str) -> Vec<Requirement> {
        TIER_TRADE_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let tier = captured_tier(&caps, 1)?;
                let limit = captured_dollars(&caps, 3)?;
                let trade = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                debug!(pattern = "tier_trade_table", tier, trade, limit, "requirement matched");

                let mut req = Requirement::tiered(tier, trade, limit, self.source());
                if trade.is_empty() {
                    req.trade = None;
                }
                Some(req)
            })
            .collect()
    }
}

/// `Prime Subcontractor: $<amount>`; always tier 1.
pub struct PrimeSubcontractor;

impl RequirementPattern for PrimeSubcontractor {
    fn source(&self) -> SourcePattern {
        SourcePattern::PrimeSubcontractor
    }

    fn extract(&self, text: &str) -> Vec<Requirement> {
        PRIME_SUB_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let limit = captured_dollars(&caps, 1)?;
                debug!(pattern = "prime_subcontractor", limit, "requirement matched");
                Some(Requirement::tiered(1, "Prime Subcontractor", limit, self.source()))
            })
            .collect()
    }
}

/// `[All] Tier <N> [trades]: $<amount>`; applies to every trade in the tier.
pub struct GeneralTier;

impl RequirementPattern for GeneralTier {
    fn source(&self) -> SourcePattern {
        SourcePattern::GeneralTier
    }

    fn extract(&self, text: &str) -> Vec<Requirement> {
        GENERAL_TIER_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let tier = captured_tier(&caps, 1)?;
                let limit = captured_dollars(&caps, 2)?;
                debug!(pattern = "general_tier", tier, limit, "requirement matched");
                Some(Requirement::tiered(
                    tier,
                    format!("Tier {tier} (All Trades)"),
                    limit,
                    self.source(),
                ))
            })
            .collect()
    }
}

// ── Ancillary lines ──

/// `<keyword>: $<amount>` for a non-GL line of coverage.
pub struct AncillaryCoverage {
    coverage_type: CoverageType,
    source: SourcePattern,
    regex: &'static LazyLock<Regex>,
}

impl AncillaryCoverage {
    pub fn workers_comp() -> Self {
        Self {
            coverage_type: CoverageType::WorkersComp,
            source: SourcePattern::WorkersComp,
            regex: &WORKERS_COMP_RE,
        }
    }

    pub fn auto() -> Self {
        Self {
            coverage_type: CoverageType::Auto,
            source: SourcePattern::Auto,
            regex: &AUTO_RE,
        }
    }

    pub fn umbrella() -> Self {
        Self {
            coverage_type: CoverageType::Umbrella,
            source: SourcePattern::Umbrella,
            regex: &UMBRELLA_RE,
        }
    }
}

impl RequirementPattern for AncillaryCoverage {
    fn source(&self) -> SourcePattern {
        self.source
    }

    fn extract(&self, text: &str) -> Vec<Requirement> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| {
                let limit = captured_dollars(&caps, 1)?;
                debug!(pattern = self.source.as_str(), limit, "requirement matched");
                Some(Requirement::ancillary(self.coverage_type, limit, self.source))
            })
            .collect()
    }
}

// ── Extractor ──

/// Ordered list of recognisers applied to the same text.
pub struct RequirementExtractor {
    patterns: Vec<Box<dyn RequirementPattern>>,
}

impl Default for RequirementExtractor {
    fn default() -> Self {
        Self::standard()
    }
}

impl RequirementExtractor {
    /// Extractor over a custom pattern list, run in the given order.
    pub fn new(patterns: Vec<Box<dyn RequirementPattern>>) -> Self {
        Self { patterns }
    }

    /// Tier/trade table, prime subcontractor, general tier, then workers'
    /// comp, auto, and umbrella.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(TierTradeTable),
            Box::new(PrimeSubcontractor),
            Box::new(GeneralTier),
            Box::new(AncillaryCoverage::workers_comp()),
            Box::new(AncillaryCoverage::auto()),
            Box::new(AncillaryCoverage::umbrella()),
        ])
    }

    /// Source tags in run order.
    pub fn sources(&self) -> Vec<SourcePattern> {
        self.patterns.iter().map(|p| p.source()).collect()
    }

    /// Run every pattern and concatenate the results.
    pub fn extract(&self, text: &str) -> Vec<Requirement> {
        let requirements: Vec<Requirement> = self
            .patterns
            .iter()
            .flat_map(|pattern| pattern.extract(text))
            .collect();
        info!(
            count = requirements.len(),
            chars = text.len(),
            "parsed insurance requirements"
        );
        requirements
    }
}

static STANDARD: LazyLock<RequirementExtractor> = LazyLock::new(RequirementExtractor::standard);

/// Extract requirements with the standard pattern set.
pub fn extract_requirements(text: &str) -> Vec<Requirement> {
    STANDARD.extract(text)
}
