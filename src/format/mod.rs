//! Formatters: render engine responses as markdown reports.
//!
//! Every formatter is a pure function of its input. None of them ever
//! returns an empty string: an empty or absent result is explained in words.

pub mod call_graph;
pub mod context;
pub mod dependency;
pub mod impact;
pub mod metrics;
pub mod symbol;

pub use call_graph::format_call_graph;
pub use context::{format_ai_context, format_related_tests, MAX_RELATED_SYMBOLS};
pub use dependency::format_dependency_graph;
pub use impact::format_impact;
pub use metrics::{format_parser_metrics, format_reindex};
pub use symbol::{format_symbol_info, MAX_REFERENCES_PER_FILE};

use lsp_types::{Range, Url};

use crate::schema::SourceLocation;

/// Human-readable path for a document URI. Non-file URIs are shown as-is.
pub fn display_path(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| uri.to_string()),
        _ => uri.to_string(),
    }
}

/// `path:line` with a 1-indexed line.
pub fn range_label(uri: &str, range: &Range) -> String {
    format!("{}:{}", display_path(uri), range.start.line + 1)
}

pub fn location_label(location: &SourceLocation) -> String {
    range_label(&location.uri, &location.range)
}

/// Relevance score as a whole percentage, e.g. `0.873` → `"87%"`.
pub fn percent(score: f64) -> String {
    let clamped = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
    format!("{}%", (clamped * 100.0).round() as u32)
}

/// Ratio over large counts, one decimal, e.g. `0.6667` → `"66.7%"`.
pub fn percent_one_decimal(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub(crate) fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}
