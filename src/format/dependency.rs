//! Dependency-graph report.

use std::fmt::Write as _;

use super::display_path;
use crate::schema::{DependencyEdge, DependencyGraphResponse};

/// Render a dependency graph. `uri` is the file the query was made for.
///
/// Import-like edges (import/require/use) are listed under "Dependencies";
/// every node is listed under "Files/Modules" in the order the engine sent.
pub fn format_dependency_graph(resp: &DependencyGraphResponse, uri: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Dependency Graph\n");
    let _ = writeln!(out, "**File:** `{}`", display_path(uri));

    if resp.nodes.is_empty() && resp.edges.is_empty() {
        let _ = writeln!(
            out,
            "\nNo dependencies found. The file does not import anything the engine \
             could resolve, and nothing in the indexed workspace imports it. If you \
             expected results, make sure the file has been opened or saved so the \
             language server has indexed it, or raise `depth` / set `includeExternal`."
        );
        return out;
    }

    let _ = writeln!(
        out,
        "**Nodes:** {} | **Edges:** {}\n",
        resp.nodes.len(),
        resp.edges.len()
    );

    let dependencies: Vec<&DependencyEdge> =
        resp.edges.iter().filter(|e| e.kind.is_dependency()).collect();

    let _ = writeln!(out, "## Dependencies ({})\n", dependencies.len());
    if dependencies.is_empty() {
        let _ = writeln!(
            out,
            "_No import, require or use relationships in this graph._"
        );
    }
    for edge in &dependencies {
        let _ = writeln!(
            out,
            "- `{}` → `{}` ({})",
            label(resp, &edge.from),
            label(resp, &edge.to),
            edge.kind
        );
    }

    let _ = writeln!(out, "\n## Files/Modules ({})\n", resp.nodes.len());
    if resp.nodes.is_empty() {
        let _ = writeln!(
            out,
            "_The engine returned edges but no node details._"
        );
    }
    for node in &resp.nodes {
        let mut line = format!("- **{}** ({}", node.label, node.kind);
        if !node.language.is_empty() {
            let _ = write!(line, ", {}", node.language);
        }
        line.push(')');
        if !node.uri.is_empty() {
            let _ = write!(line, " — `{}`", display_path(&node.uri));
        }
        let _ = writeln!(out, "{line}");
    }

    out
}

/// Node label for an id, or the raw id when the edge points nowhere.
fn label<'a>(resp: &'a DependencyGraphResponse, id: &'a str) -> &'a str {
    resp.node(id).map(|n| n.label.as_str()).unwrap_or(id)
}
