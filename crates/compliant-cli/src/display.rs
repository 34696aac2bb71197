//! Terminal rendering for evaluation results.
//!
//! The JSON on stdout is the contract; this table on stderr is for people.

use compliant_core::ComplianceResult;

const SEVERITY_WIDTH: usize = 10;
const TYPE_WIDTH: usize = 28;

/// Render issues most severe first, followed by the summary line.
pub fn render_issue_table(result: &ComplianceResult) -> String {
    let mut out = String::new();
    let verdict = if result.compliant { "PASS" } else { "FAIL" };
    out.push_str(&format!("=== {verdict} ===\n"));

    if !result.issues.is_empty() {
        out.push_str(&format!(
            "  {:<SEVERITY_WIDTH$} {:<TYPE_WIDTH$} {}\n",
            "SEVERITY", "TYPE", "DETAIL"
        ));
        for issue in result.ranked() {
            out.push_str(&format!(
                "  {:<SEVERITY_WIDTH$} {:<TYPE_WIDTH$} {}\n",
                issue.severity.as_str(),
                issue.type_tag(),
                issue.describe()
            ));
        }
    }

    out.push_str(&result.summary);
    out.push('\n');
    out
}

/// Print the issue table to stderr.
pub fn print_issue_table(result: &ComplianceResult) {
    eprint!("{}", render_issue_table(result));
}
