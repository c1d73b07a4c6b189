//! Impact-analysis response.

use std::fmt;

use lsp_types::Range;
use serde::{Deserialize, Serialize};

/// Three-level severity. Ordering follows display priority:
/// `Breaking > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Breaking,
}

impl Severity {
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Breaking => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "🔵",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Breaking => write!(f, "breaking"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactKind {
    Caller,
    Reference,
    Subclass,
    Implementation,
    #[serde(other)]
    Other,
}

impl fmt::Display for ImpactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactKind::Caller => write!(f, "caller"),
            ImpactKind::Reference => write!(f, "reference"),
            ImpactKind::Subclass => write!(f, "subclass"),
            ImpactKind::Implementation => write!(f, "implementation"),
            ImpactKind::Other => write!(f, "usage"),
        }
    }
}

/// An immediate usage affected by the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectImpact {
    pub uri: String,
    #[serde(default)]
    pub range: Range,
    #[serde(rename = "type")]
    pub kind: ImpactKind,
    pub severity: Severity,
}

/// A transitively affected artifact and the chain that reaches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectImpact {
    pub uri: String,
    #[serde(default)]
    pub path: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedTest {
    pub uri: String,
    pub test_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    #[serde(default)]
    pub files_affected: u32,
    #[serde(default)]
    pub breaking_changes: u32,
    #[serde(default)]
    pub warnings: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysisResponse {
    #[serde(default)]
    pub direct_impact: Vec<DirectImpact>,
    #[serde(default)]
    pub indirect_impact: Vec<IndirectImpact>,
    #[serde(default)]
    pub affected_tests: Vec<AffectedTest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ImpactSummary>,
}

impl ImpactAnalysisResponse {
    pub fn is_empty(&self) -> bool {
        self.direct_impact.is_empty()
            && self.indirect_impact.is_empty()
            && self.affected_tests.is_empty()
    }
}
