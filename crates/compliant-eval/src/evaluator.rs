//! Certificate evaluation.
//!
//! Checks run in a fixed order and never short-circuit: every applicable
//! issue is recorded, and the certificate is compliant only if none were.
//!
//! 1. Coverage sufficiency: GL per-occurrence limit against each GL
//!    requirement (`actual >= required` passes).
//! 2. Expiration, GL then WC: expired once `now` is strictly after the
//!    expiration instant; an unparseable date fails closed.
//! 3. Additional insureds: the required party must appear, case-insensitively,
//!    inside one of the listed names.

use chrono::{DateTime, Utc};
use compliant_core::{
    CoiRecord, ComplianceResult, Issue, IssueKind, PolicyDate, PolicyLine, Requirement,
};
use tracing::{debug, info, warn};

/// Evaluation policy knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Treat an absent GL or WC expiration date as a deficiency
    /// (`missing_expiration_date`). Off by default: absence passes.
    pub require_expiration_dates: bool,
}

/// Stateless compliance evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    options: EvaluatorOptions,
}

impl Evaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EvaluatorOptions {
        self.options
    }

    /// Evaluate a certificate against requirements at reference instant `now`.
    pub fn evaluate(
        &self,
        coi: &CoiRecord,
        requirements: &[Requirement],
        now: DateTime<Utc>,
    ) -> ComplianceResult {
        let mut issues = Vec::new();

        check_coverage(coi, requirements, &mut issues);
        self.check_expiration(
            PolicyLine::GeneralLiability,
            coi.gl_expiration_date.as_ref(),
            now,
            &mut issues,
        );
        self.check_expiration(
            PolicyLine::WorkersCompensation,
            coi.wc_expiration_date.as_ref(),
            now,
            &mut issues,
        );
        check_additional_insureds(coi, requirements, &mut issues);

        let result = ComplianceResult::from_issues(issues);
        info!(
            compliant = result.compliant,
            issues = result.issues.len(),
            requirements = requirements.len(),
            "evaluated certificate"
        );
        result
    }

    /// Evaluate against the system clock, read once.
    pub fn evaluate_now(&self, coi: &CoiRecord, requirements: &[Requirement]) -> ComplianceResult {
        self.evaluate(coi, requirements, Utc::now())
    }

    fn check_expiration(
        &self,
        line: PolicyLine,
        date: Option<&PolicyDate>,
        now: DateTime<Utc>,
        issues: &mut Vec<Issue>,
    ) {
        match date {
            None => {
                if self.options.require_expiration_dates {
                    issues.push(Issue::new(IssueKind::MissingExpirationDate {
                        coverage_type: line,
                    }));
                }
            }
            Some(PolicyDate::Valid { raw, at }) => {
                // Coverage holds through the expiration instant itself.
                if now > *at {
                    debug!(line = line.label(), expiration = %at, %now, "policy expired");
                    issues.push(Issue::new(IssueKind::CoverageExpired {
                        coverage_type: line,
                        expiration_date: raw.clone(),
                    }));
                }
            }
            Some(PolicyDate::Invalid { raw }) => {
                warn!(line = line.label(), value = %raw, "unparseable expiration date");
                issues.push(Issue::new(IssueKind::InvalidDateFormat {
                    coverage_type: line,
                    value: raw.clone(),
                }));
            }
        }
    }
}

fn check_coverage(coi: &CoiRecord, requirements: &[Requirement], issues: &mut Vec<Issue>) {
    let actual = coi.gl_limit_per_occurrence;
    for req in requirements {
        if req.limit_amount == 0 || !req.is_general_liability() {
            continue;
        }
        if actual < req.limit_amount {
            issues.push(Issue::new(IssueKind::CoverageInsufficient {
                trade: req.trade_label().to_string(),
                coverage_type: req.coverage_type,
                required: req.limit_amount,
                actual,
            }));
        }
    }
}

fn check_additional_insureds(
    coi: &CoiRecord,
    requirements: &[Requirement],
    issues: &mut Vec<Issue>,
) {
    let listed: Vec<String> = coi
        .additional_insureds
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    for req in requirements {
        let Some(party) = req.required_party() else {
            continue;
        };
        // The listed name must contain the required party, never the reverse:
        // a broad listed name like "XYZ" must not satisfy "General Contractor XYZ".
        let needle = party.to_lowercase();
        if !listed.iter().any(|name| name.contains(&needle)) {
            issues.push(Issue::new(IssueKind::MissingAdditionalInsured {
                required_party: party.to_string(),
                actual_parties: coi.additional_insureds.clone(),
            }));
        }
    }
}

/// Evaluate with default options at reference instant `now`.
pub fn evaluate(
    coi: &CoiRecord,
    requirements: &[Requirement],
    now: DateTime<Utc>,
) -> ComplianceResult {
    Evaluator::default().evaluate(coi, requirements, now)
}

/// Evaluate with default options against the system clock.
pub fn evaluate_now(coi: &CoiRecord, requirements: &[Requirement]) -> ComplianceResult {
    Evaluator::default().evaluate_now(coi, requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use compliant_core::{CoverageType, Severity, SourcePattern};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 14, 30, 0).unwrap()
    }

    fn coi(limit: u64) -> CoiRecord {
        CoiRecord {
            gl_limit_per_occurrence: limit,
            ..Default::default()
        }
    }

    fn gl_req(trade: &str, limit: u64) -> Requirement {
        Requirement::tiered(1, trade, limit, SourcePattern::TierTradeTable)
    }

    fn date(raw: String) -> Option<PolicyDate> {
        Some(PolicyDate::parse(raw))
    }

    fn tags(result: &ComplianceResult) -> Vec<&'static str> {
        result.issues.iter().map(|i| i.type_tag()).collect()
    }

    // ── Coverage sufficiency ──

    #[test]
    fn insufficient_iff_actual_below_required() {
        let required = 2_000_000;
        for (actual, expect_issue) in [
            (0, true),
            (1_999_999, true),
            (2_000_000, false),
            (2_000_001, false),
            (5_000_000, false),
        ] {
            let result = evaluate(&coi(actual), &[gl_req("Electrical", required)], now());
            assert_eq!(
                result.issues_of("coverage_insufficient").count(),
                usize::from(expect_issue),
                "actual {actual}"
            );
            assert_eq!(result.compliant, !expect_issue, "actual {actual}");
        }
    }

    #[test]
    fn insufficient_issue_carries_the_facts() {
        let result = evaluate(&coi(1_000_000), &[gl_req("Electrical", 2_000_000)], now());
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(
            issue.kind,
            IssueKind::CoverageInsufficient {
                trade: "Electrical".into(),
                coverage_type: CoverageType::GeneralLiability,
                required: 2_000_000,
                actual: 1_000_000,
            }
        );
    }

    #[test]
    fn each_failing_requirement_reported() {
        let reqs = [
            gl_req("Electrical", 2_000_000),
            gl_req("Painting", 500_000),
            gl_req("Roofing", 3_000_000),
        ];
        let result = evaluate(&coi(1_000_000), &reqs, now());
        let trades: Vec<_> = result
            .issues
            .iter()
            .map(|i| match &i.kind {
                IssueKind::CoverageInsufficient { trade, .. } => trade.as_str(),
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(trades, vec!["Electrical", "Roofing"]);
    }

    #[test]
    fn ancillary_and_zero_limits_not_compared_to_gl() {
        let reqs = [
            Requirement::ancillary(CoverageType::Umbrella, 10_000_000, SourcePattern::Umbrella),
            Requirement::ancillary(CoverageType::WorkersComp, 1_000_000, SourcePattern::WorkersComp),
            gl_req("Electrical", 0),
        ];
        let result = evaluate(&coi(0), &reqs, now());
        assert!(result.compliant);
    }

    #[test]
    fn untyped_requirement_is_treated_as_gl() {
        let mut req = gl_req("Framing", 2_000_000);
        req.coverage_type = CoverageType::Unclassified;
        req.trade = None;
        let result = evaluate(&coi(1_000_000), &[req], now());
        match &result.issues[0].kind {
            IssueKind::CoverageInsufficient { trade, .. } => assert_eq!(trade, "Unknown"),
            other => panic!("unexpected issue {other:?}"),
        }
    }

    // ── Expiration ──

    #[test]
    fn gl_expiring_end_of_today_is_compliant() {
        let end_of_day = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap();
        let record = CoiRecord {
            gl_expiration_date: date(end_of_day.to_rfc3339()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(result.compliant, "policy expiring today should be valid");
        assert_eq!(result.issues_of("coverage_expired").count(), 0);
    }

    #[test]
    fn gl_expired_yesterday_is_non_compliant() {
        let yesterday = now() - Duration::days(1);
        let record = CoiRecord {
            gl_expiration_date: date(yesterday.to_rfc3339()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant);
        let expired: Vec<_> = result.issues_of("coverage_expired").collect();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].kind.policy_line(), Some(PolicyLine::GeneralLiability));
        assert_eq!(expired[0].severity, Severity::Critical);
    }

    #[test]
    fn wc_expiring_end_of_today_is_compliant() {
        let record = CoiRecord {
            wc_expiration_date: date("2026-10-16T23:59:59+00:00".into()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(result.compliant, "WC policy expiring today should be valid");
    }

    #[test]
    fn wc_expired_yesterday_is_non_compliant() {
        let yesterday = now() - Duration::days(1);
        let record = CoiRecord {
            wc_expiration_date: date(yesterday.to_rfc3339()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant);
        let expired: Vec<_> = result.issues_of("coverage_expired").collect();
        assert_eq!(expired.len(), 1);
        assert_eq!(
            expired[0].kind.policy_line(),
            Some(PolicyLine::WorkersCompensation)
        );
    }

    #[test]
    fn expiration_at_exact_reference_instant_is_compliant() {
        let record = CoiRecord {
            gl_expiration_date: date(now().to_rfc3339()),
            ..coi(1_000_000)
        };
        assert!(evaluate(&record, &[], now()).compliant);

        let one_second_later = now() + Duration::seconds(1);
        assert!(!evaluate(&record, &[], one_second_later).compliant);
    }

    #[test]
    fn date_only_expiration_covers_that_day() {
        let record = CoiRecord {
            gl_expiration_date: date("2026-10-16".into()),
            ..coi(1_000_000)
        };
        assert!(evaluate(&record, &[], now()).compliant);

        let last_half_second = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap()
            + Duration::milliseconds(500);
        assert!(evaluate(&record, &[], last_half_second).compliant);

        let midnight = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap();
        assert_eq!(tags(&evaluate(&record, &[], midnight)), vec!["coverage_expired"]);

        let next_morning = Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 1).unwrap();
        let result = evaluate(&record, &[], next_morning);
        assert_eq!(tags(&result), vec!["coverage_expired"]);
    }

    #[test]
    fn expired_issue_names_the_supplied_value() {
        let record = CoiRecord {
            gl_expiration_date: date("2026-01-01T00:00:00Z".into()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert_eq!(
            result.issues[0].kind,
            IssueKind::CoverageExpired {
                coverage_type: PolicyLine::GeneralLiability,
                expiration_date: "2026-01-01T00:00:00Z".into(),
            }
        );
    }

    // ── Invalid dates fail closed ──

    #[test]
    fn invalid_gl_date_fails_compliance() {
        let record = CoiRecord {
            gl_expiration_date: date("invalid-date-format".into()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant, "invalid GL date format must fail compliance");
        let invalid: Vec<_> = result.issues_of("invalid_date_format").collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].kind.policy_line(), Some(PolicyLine::GeneralLiability));
        assert_eq!(invalid[0].severity, Severity::Medium);
    }

    #[test]
    fn invalid_wc_date_fails_compliance() {
        let record = CoiRecord {
            wc_expiration_date: date("not-a-real-date".into()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant);
        let invalid: Vec<_> = result.issues_of("invalid_date_format").collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(
            invalid[0].kind.policy_line(),
            Some(PolicyLine::WorkersCompensation)
        );
    }

    #[test]
    fn whitespace_submitted_date_fails_closed() {
        let record = CoiRecord::from_json(
            r#"{"gl_limit_per_occurrence": 1000000, "gl_expiration_date": "   "}"#,
        )
        .unwrap();
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant);
        assert_eq!(tags(&result), vec!["invalid_date_format"]);
    }

    #[test]
    fn both_invalid_dates_yield_two_issues() {
        let record = CoiRecord {
            gl_expiration_date: date("bad-gl-date".into()),
            wc_expiration_date: date("bad-wc-date".into()),
            ..coi(1_000_000)
        };
        let result = evaluate(&record, &[], now());
        assert!(!result.compliant);
        assert_eq!(result.issues_of("invalid_date_format").count(), 2);
    }

    #[test]
    fn valid_future_dates_with_everything_present_pass() {
        let future = (now() + Duration::days(30)).to_rfc3339();
        let record = CoiRecord {
            gl_limit_per_occurrence: 2_000_000,
            gl_expiration_date: date(future.clone()),
            wc_expiration_date: date(future),
            additional_insureds: vec!["General Contractor XYZ, LLC".into()],
        };
        let reqs = [gl_req("Electrical", 2_000_000).with_additional_insured("General Contractor XYZ")];
        let result = evaluate(&record, &reqs, now());
        assert!(result.compliant);
        assert!(result.issues.is_empty());
        assert_eq!(result.summary, "Compliant - 0 issues found");
    }

    // ── Missing expiration policy ──

    #[test]
    fn absent_dates_pass_by_default() {
        let result = evaluate(&coi(1_000_000), &[], now());
        assert!(result.compliant);
    }

    #[test]
    fn absent_dates_flagged_when_required() {
        let evaluator = Evaluator::new(EvaluatorOptions {
            require_expiration_dates: true,
        });
        let record = CoiRecord {
            wc_expiration_date: date("2027-01-01".into()),
            ..coi(1_000_000)
        };
        let result = evaluator.evaluate(&record, &[], now());
        assert!(!result.compliant);
        let missing: Vec<_> = result.issues_of("missing_expiration_date").collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].kind.policy_line(), Some(PolicyLine::GeneralLiability));
        assert_eq!(missing[0].severity, Severity::High);
    }

    // ── Additional insureds ──

    #[test]
    fn required_party_must_appear_inside_listed_name() {
        let req = gl_req("Electrical", 0).with_additional_insured("General Contractor XYZ");

        let narrower = CoiRecord {
            additional_insureds: vec!["Contractor XYZ Inc.".into()],
            ..Default::default()
        };
        let result = evaluate(&narrower, std::slice::from_ref(&req), now());
        assert_eq!(tags(&result), vec!["missing_additional_insured"]);

        let broader = CoiRecord {
            additional_insureds: vec!["Project Owner".into(), "general contractor xyz, llc".into()],
            ..Default::default()
        };
        assert!(evaluate(&broader, &[req], now()).compliant);
    }

    #[test]
    fn missing_insured_issue_lists_actual_parties() {
        let req = gl_req("Electrical", 0).with_additional_insured("Owner LLC");
        let record = CoiRecord {
            additional_insureds: vec!["GC Inc.".into(), "Lender Bank".into()],
            ..Default::default()
        };
        let result = evaluate(&record, &[req], now());
        assert_eq!(
            result.issues[0].kind,
            IssueKind::MissingAdditionalInsured {
                required_party: "Owner LLC".into(),
                actual_parties: vec!["GC Inc.".into(), "Lender Bank".into()],
            }
        );
        assert_eq!(result.issues[0].severity, Severity::High);
    }

    #[test]
    fn unnamed_or_waived_party_not_checked() {
        let reqs = [
            gl_req("Electrical", 0),
            gl_req("Painting", 0)
                .with_additional_insured("Owner LLC")
                .without_additional_insured(),
        ];
        assert!(evaluate(&CoiRecord::default(), &reqs, now()).compliant);
    }

    // ── Whole evaluation ──

    #[test]
    fn all_checks_run_in_order() {
        let record = CoiRecord {
            gl_limit_per_occurrence: 500_000,
            gl_expiration_date: date("2025-12-31T00:00:00Z".into()),
            wc_expiration_date: date("31/12/2027".into()),
            additional_insureds: vec![],
        };
        let reqs = [gl_req("Electrical", 1_000_000).with_additional_insured("Owner LLC")];
        let result = evaluate(&record, &reqs, now());
        assert_eq!(
            tags(&result),
            vec![
                "coverage_insufficient",
                "coverage_expired",
                "invalid_date_format",
                "missing_additional_insured",
            ]
        );
        assert_eq!(result.summary, "Non-compliant - 4 issues found");
        assert_eq!(result.ranked()[0].type_tag(), "coverage_expired");
    }

    #[test]
    fn deterministic_for_fixed_reference_instant() {
        let record = CoiRecord {
            gl_expiration_date: date("2026-10-15T00:00:00Z".into()),
            ..coi(100)
        };
        let reqs = [gl_req("Electrical", 1_000)];
        assert_eq!(evaluate(&record, &reqs, now()), evaluate(&record, &reqs, now()));
    }

    #[test]
    fn parallel_evaluations_need_no_coordination() {
        let record = CoiRecord {
            gl_expiration_date: date("2026-10-15T00:00:00Z".into()),
            ..coi(100)
        };
        let reqs = vec![gl_req("Electrical", 1_000)];
        let expected = evaluate(&record, &reqs, now());

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| evaluate(&record, &reqs, now())))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn evaluate_now_reads_the_clock() {
        let far_future = CoiRecord {
            gl_expiration_date: date("2999-01-01T00:00:00Z".into()),
            wc_expiration_date: date("1999-01-01T00:00:00Z".into()),
            ..coi(1_000_000)
        };
        let result = evaluate_now(&far_future, &[]);
        assert_eq!(tags(&result), vec!["coverage_expired"]);
    }

    // ── End to end through the extractors ──

    #[test]
    fn program_text_and_submission_end_to_end() {
        let program = "Tier 1 Electrical $2,000,000\nUmbrella: $5,000,000";
        let reqs = compliant_extract::extract_requirements(program);
        assert_eq!(reqs.len(), 2);

        let record = CoiRecord::from_json(
            r#"{"gl_limits_per_occurrence": "$1,000,000",
                "gl_expiration_date": "2027-01-01T00:00:00+00:00",
                "additional_insureds": "General Contractor XYZ, Project Owner"}"#,
        )
        .unwrap();

        let result = evaluate(&record, &reqs, now());
        assert_eq!(tags(&result), vec!["coverage_insufficient"]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["compliant"], false);
        assert_eq!(json["issues"][0]["type"], "coverage_insufficient");
        assert_eq!(json["issues"][0]["required"], 2_000_000);
        assert_eq!(json["issues"][0]["actual"], 1_000_000);
    }
}
