//! Parser-metrics response.

use serde::{Deserialize, Serialize};

/// Parsing statistics for one language.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserMetric {
    pub language: String,
    #[serde(default)]
    pub files_attempted: u64,
    #[serde(default)]
    pub files_succeeded: u64,
    #[serde(default)]
    pub files_failed: u64,
    #[serde(default)]
    pub total_entities: u64,
    #[serde(default)]
    pub total_relationships: u64,
    #[serde(default)]
    pub total_parse_time_ms: u64,
    #[serde(default)]
    pub avg_parse_time_ms: u64,
}

impl ParserMetric {
    /// Fraction of attempted files that parsed. `None` when nothing was attempted.
    pub fn success_rate(&self) -> Option<f64> {
        success_rate(self.files_succeeded, self.files_attempted)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserTotals {
    #[serde(default)]
    pub files_attempted: u64,
    #[serde(default)]
    pub files_succeeded: u64,
    #[serde(default)]
    pub files_failed: u64,
    #[serde(default)]
    pub total_entities: u64,
    #[serde(default)]
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserMetricsResponse {
    #[serde(default)]
    pub metrics: Vec<ParserMetric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<ParserTotals>,
}

pub(crate) fn success_rate(succeeded: u64, attempted: u64) -> Option<f64> {
    if attempted == 0 {
        None
    } else {
        Some(succeeded as f64 / attempted as f64)
    }
}
