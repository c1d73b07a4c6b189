//! Impact-analysis report.

use std::fmt::Write as _;

use super::{display_path, range_label};
use crate::params::ChangeType;
use crate::schema::{DirectImpact, ImpactAnalysisResponse, IndirectImpact};

/// Render an impact analysis for a hypothetical `change`.
///
/// Sections come in a fixed order: direct impact, indirect impact, affected
/// tests. Within a section, breaking items come first; ties keep input order.
pub fn format_impact(resp: &ImpactAnalysisResponse, change: ChangeType) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Impact Analysis ({change})\n");

    if resp.is_empty() {
        let _ = writeln!(
            out,
            "No impact detected. Nothing in the indexed workspace depends on this \
             symbol, so a {change} should not break other code. Unindexed files and \
             dynamic call sites (reflection, string-based dispatch) are not covered."
        );
        return out;
    }

    if let Some(summary) = &resp.summary {
        let _ = writeln!(
            out,
            "**Files affected:** {} | **Breaking:** {} | **Warnings:** {}\n",
            summary.files_affected, summary.breaking_changes, summary.warnings
        );
    }

    let mut direct: Vec<&DirectImpact> = resp.direct_impact.iter().collect();
    direct.sort_by(|a, b| b.severity.cmp(&a.severity));
    let _ = writeln!(out, "## Direct Impact ({})\n", direct.len());
    if direct.is_empty() {
        let _ = writeln!(out, "_No direct usages are affected._");
    }
    for item in direct {
        let _ = writeln!(
            out,
            "- {} **{}** {} — {}",
            item.severity.marker(),
            item.severity,
            item.kind,
            range_label(&item.uri, &item.range)
        );
    }

    let mut indirect: Vec<&IndirectImpact> = resp.indirect_impact.iter().collect();
    indirect.sort_by(|a, b| b.severity.cmp(&a.severity));
    let _ = writeln!(out, "\n## Indirect Impact ({})\n", indirect.len());
    if indirect.is_empty() {
        let _ = writeln!(out, "_No transitive dependents are affected._");
    }
    for item in indirect {
        let _ = writeln!(
            out,
            "- {} **{}** `{}`",
            item.severity.marker(),
            item.severity,
            display_path(&item.uri)
        );
        if item.path.is_empty() {
            let _ = writeln!(out, "  - path: _not reported_");
        } else {
            let _ = writeln!(out, "  - path: {}", item.path.join(" → "));
        }
    }

    let _ = writeln!(out, "\n## Affected Tests ({})\n", resp.affected_tests.len());
    if resp.affected_tests.is_empty() {
        let _ = writeln!(
            out,
            "_No tests reach this symbol. Consider adding coverage before changing it._"
        );
    }
    for test in &resp.affected_tests {
        let _ = writeln!(
            out,
            "- 🧪 `{}` — `{}`",
            test.test_name,
            display_path(&test.uri)
        );
    }

    out
}
