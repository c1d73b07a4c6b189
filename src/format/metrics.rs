//! Workspace-level reports: parser metrics and reindex confirmation.

use std::fmt::Write as _;

use super::percent_one_decimal;
use crate::schema::metrics::success_rate;
use crate::schema::ParserMetricsResponse;

pub fn format_parser_metrics(resp: &ParserMetricsResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Parser Metrics\n");

    if resp.metrics.is_empty() {
        let _ = writeln!(
            out,
            "No parser metrics available. The language server has not parsed any \
             files yet, or no file matched the requested language."
        );
        return out;
    }

    let _ = writeln!(
        out,
        "| Language | Files | Succeeded | Failed | Success | Entities | Relationships | Avg parse |"
    );
    let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|");
    for m in &resp.metrics {
        let rate = m
            .success_rate()
            .map(percent_one_decimal)
            .unwrap_or_else(|| "n/a".to_string());
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} ms |",
            m.language,
            m.files_attempted,
            m.files_succeeded,
            m.files_failed,
            rate,
            m.total_entities,
            m.total_relationships,
            m.avg_parse_time_ms
        );
    }

    let (attempted, succeeded, failed, entities, rate) = match &resp.totals {
        Some(t) => (
            t.files_attempted,
            t.files_succeeded,
            t.files_failed,
            t.total_entities,
            Some(t.success_rate),
        ),
        None => {
            let attempted: u64 = resp.metrics.iter().map(|m| m.files_attempted).sum();
            let succeeded: u64 = resp.metrics.iter().map(|m| m.files_succeeded).sum();
            (
                attempted,
                succeeded,
                resp.metrics.iter().map(|m| m.files_failed).sum::<u64>(),
                resp.metrics.iter().map(|m| m.total_entities).sum::<u64>(),
                success_rate(succeeded, attempted),
            )
        }
    };

    let _ = writeln!(
        out,
        "\n**Total:** {attempted} files, {succeeded} succeeded, {failed} failed, {entities} entities"
    );
    if let Some(rate) = rate {
        let _ = writeln!(out, "**Success rate:** {}", percent_one_decimal(rate));
    }

    out
}

/// Confirmation for a workspace reindex. The engine returns no data for it.
pub fn format_reindex() -> String {
    "# Workspace Reindexed\n\n\
     Workspace reindexed. The code graph was cleared; each file is parsed \
     again the next time a tool asks about it.\n"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParserMetric, ParserTotals};

    fn metric(language: &str, attempted: u64, succeeded: u64) -> ParserMetric {
        ParserMetric {
            language: language.to_string(),
            files_attempted: attempted,
            files_succeeded: succeeded,
            files_failed: attempted - succeeded,
            total_entities: 10,
            total_relationships: 4,
            total_parse_time_ms: 30,
            avg_parse_time_ms: 10,
        }
    }

    #[test]
    fn test_table_and_computed_totals() {
        let resp = ParserMetricsResponse {
            metrics: vec![metric("rust", 3, 2), metric("python", 0, 0)],
            totals: None,
        };
        let out = format_parser_metrics(&resp);
        assert!(out.contains("| rust | 3 | 2 | 1 | 66.7% | 10 | 4 | 10 ms |"));
        assert!(out.contains("| python | 0 | 0 | 0 | n/a |"));
        assert!(out.contains("**Total:** 3 files, 2 succeeded, 1 failed, 20 entities"));
        assert!(out.contains("**Success rate:** 66.7%"));
    }

    #[test]
    fn test_engine_totals_win() {
        let resp = ParserMetricsResponse {
            metrics: vec![metric("go", 1000, 999)],
            totals: Some(ParserTotals {
                files_attempted: 1000,
                files_succeeded: 999,
                files_failed: 1,
                total_entities: 5000,
                success_rate: 0.999,
            }),
        };
        let out = format_parser_metrics(&resp);
        assert!(out.contains("| go | 1000 | 999 | 1 | 99.9% |"));
        assert!(out.contains("5000 entities"));
        assert!(out.contains("**Success rate:** 99.9%"));
    }

    #[test]
    fn test_empty_is_explained() {
        let out = format_parser_metrics(&ParserMetricsResponse::default());
        assert!(out.contains("No parser metrics available."));
        assert!(!out.contains("| Language |"));
    }

    #[test]
    fn test_reindex_confirmation() {
        let out = format_reindex();
        assert!(out.starts_with("# Workspace Reindexed\n\nWorkspace reindexed."));
        assert!(out.contains("parsed again"));
    }
}
