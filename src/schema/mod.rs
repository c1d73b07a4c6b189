//! Response schemas: typed shapes of what the CodeGraph engine returns.
//!
//! Pure data. Every record is built by the engine per request, deserialized
//! here, handed to exactly one formatter and dropped.

pub mod context;
pub mod graph;
pub mod impact;
pub mod metrics;
pub mod symbol;

use lsp_types::Range;
use serde::{Deserialize, Serialize};

pub use context::{
    AiContextResponse, ArchitectureInfo, ContextKind, ContextMetadata, DependencyInfo,
    PrimaryContext, RelatedSymbol, Relationship, UsageExample,
};
pub use graph::{
    CallEdge, CallGraphResponse, DependencyEdge, DependencyEdgeKind, DependencyGraphResponse,
    DependencyNode, DependencyNodeKind, FunctionMetrics, FunctionNode,
};
pub use impact::{
    AffectedTest, DirectImpact, ImpactAnalysisResponse, ImpactKind, ImpactSummary,
    IndirectImpact, Severity,
};
pub use metrics::{ParserMetric, ParserMetricsResponse, ParserTotals};
pub use symbol::SymbolInfo;

/// A range inside one source artifact. Lines and columns are 0-indexed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub uri: String,
    #[serde(default)]
    pub range: Range,
}

impl SourceLocation {
    /// 1-indexed line, the way humans count.
    pub fn display_line(&self) -> u32 {
        self.range.start.line + 1
    }
}
