//! Dependency-graph and call-graph responses.

use std::fmt;

use lsp_types::Range;
use serde::{Deserialize, Serialize};

use super::SourceLocation;

// ─── Dependency graph ───────────────────────────────────────────

/// What a dependency-graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyNodeKind {
    Module,
    Package,
    #[default]
    File,
    #[serde(other)]
    Other,
}

impl fmt::Display for DependencyNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyNodeKind::Module => write!(f, "module"),
            DependencyNodeKind::Package => write!(f, "package"),
            DependencyNodeKind::File => write!(f, "file"),
            DependencyNodeKind::Other => write!(f, "other"),
        }
    }
}

/// Kind of a dependency relation. Anything the engine sends that is not
/// import/require/use lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyEdgeKind {
    Import,
    Require,
    Use,
    #[serde(other)]
    Other,
}

impl DependencyEdgeKind {
    /// Import-like edges, the ones listed under "Dependencies".
    pub fn is_dependency(self) -> bool {
        matches!(
            self,
            DependencyEdgeKind::Import | DependencyEdgeKind::Require | DependencyEdgeKind::Use
        )
    }
}

impl fmt::Display for DependencyEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyEdgeKind::Import => write!(f, "import"),
            DependencyEdgeKind::Require => write!(f, "require"),
            DependencyEdgeKind::Use => write!(f, "use"),
            DependencyEdgeKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: DependencyNodeKind,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: DependencyEdgeKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraphResponse {
    #[serde(default)]
    pub nodes: Vec<DependencyNode>,
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
}

impl DependencyGraphResponse {
    pub fn node(&self, id: &str) -> Option<&DependencyNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// ─── Call graph ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetrics {
    #[serde(default)]
    pub complexity: u32,
    #[serde(default)]
    pub lines_of_code: u32,
    #[serde(default)]
    pub call_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub range: Range,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FunctionMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEdge {
    pub from: String,
    pub to: String,
    /// Ordered; the same site may appear more than once.
    #[serde(default)]
    pub call_sites: Vec<SourceLocation>,
    #[serde(default)]
    pub is_recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallGraphResponse {
    /// The function the query is centered on. Absent when nothing callable
    /// was found at the requested position.
    #[serde(default)]
    pub root: Option<FunctionNode>,
    #[serde(default)]
    pub nodes: Vec<FunctionNode>,
    #[serde(default)]
    pub edges: Vec<CallEdge>,
}

impl CallGraphResponse {
    pub fn node(&self, id: &str) -> Option<&FunctionNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_edge_kind_is_tolerated() {
        let resp: DependencyGraphResponse = serde_json::from_value(json!({
            "nodes": [{ "id": "a", "label": "a.ts", "type": "file", "language": "typescript", "uri": "file:///a.ts" }],
            "edges": [
                { "from": "a", "to": "b", "type": "import" },
                { "from": "a", "to": "c", "type": "reexport" }
            ]
        }))
        .unwrap();
        assert_eq!(resp.edges[0].kind, DependencyEdgeKind::Import);
        assert_eq!(resp.edges[1].kind, DependencyEdgeKind::Other);
        assert!(!resp.edges[1].kind.is_dependency());
    }

    #[test]
    fn test_call_graph_without_root() {
        let resp: CallGraphResponse =
            serde_json::from_value(json!({ "root": null, "nodes": [], "edges": [] })).unwrap();
        assert!(resp.root.is_none());

        let resp: CallGraphResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.root.is_none());
        assert!(resp.edges.is_empty());
    }

    #[test]
    fn test_function_node_metrics() {
        let node: FunctionNode = serde_json::from_value(json!({
            "id": "1",
            "name": "parse",
            "signature": "fn parse(s: &str) -> Ast",
            "uri": "file:///p.rs",
            "range": { "start": { "line": 3, "character": 0 }, "end": { "line": 9, "character": 1 } },
            "language": "rust",
            "metrics": { "complexity": 4, "linesOfCode": 7, "callCount": 2 }
        }))
        .unwrap();
        let metrics = node.metrics.unwrap();
        assert_eq!(metrics.lines_of_code, 7);
        assert_eq!(metrics.call_count, 2);
    }
}
