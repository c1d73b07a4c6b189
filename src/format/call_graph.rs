//! Call-graph report.

use std::fmt::Write as _;

use super::{plural, range_label};
use crate::schema::{CallEdge, CallGraphResponse, FunctionNode};

/// Render a call graph centered on its root.
///
/// Callers are edges whose `to` is the root, callees edges whose `from` is
/// the root. Without a root there is nothing to center on and the report
/// explains why instead.
pub fn format_call_graph(resp: &CallGraphResponse) -> String {
    let Some(root) = &resp.root else {
        return no_function_found();
    };

    let mut out = String::new();
    let _ = writeln!(out, "# Call Graph: `{}`\n", root.name);
    if !root.signature.is_empty() {
        let _ = writeln!(out, "**Signature:** `{}`", root.signature);
    }
    let _ = writeln!(out, "**Location:** {}", range_label(&root.uri, &root.range));
    if !root.language.is_empty() {
        let _ = writeln!(out, "**Language:** {}", root.language);
    }
    if let Some(m) = &root.metrics {
        let _ = writeln!(
            out,
            "**Metrics:** complexity {} · {} · {}",
            m.complexity,
            plural(m.lines_of_code as usize, "line", "lines"),
            plural(m.call_count as usize, "call", "calls"),
        );
    }

    let callers: Vec<&CallEdge> = resp.edges.iter().filter(|e| e.to == root.id).collect();
    let callees: Vec<&CallEdge> = resp.edges.iter().filter(|e| e.from == root.id).collect();

    let _ = writeln!(out, "\n## Callers ({})\n", callers.len());
    if callers.is_empty() {
        let _ = writeln!(
            out,
            "_Nothing in the indexed code calls `{}`._",
            root.name
        );
    }
    for edge in &callers {
        let _ = writeln!(out, "{}", edge_line(resp, &edge.from, edge));
    }

    let _ = writeln!(out, "\n## Callees ({})\n", callees.len());
    if callees.is_empty() {
        let _ = writeln!(
            out,
            "_`{}` does not call any indexed function._",
            root.name
        );
    }
    for edge in &callees {
        let _ = writeln!(out, "{}", edge_line(resp, &edge.to, edge));
    }

    out
}

fn edge_line(resp: &CallGraphResponse, other_id: &str, edge: &CallEdge) -> String {
    let mut line = match resp.node(other_id) {
        Some(node) => function_line(node),
        None => format!("- `{other_id}`"),
    };
    if edge.call_sites.len() > 1 {
        let _ = write!(line, " ({} call sites)", edge.call_sites.len());
    }
    if edge.is_recursive {
        line.push_str(" 🔁 recursive");
    }
    line
}

fn function_line(node: &FunctionNode) -> String {
    format!("- `{}` — {}", node.name, range_label(&node.uri, &node.range))
}

fn no_function_found() -> String {
    "# Call Graph\n\n\
     No function found at this position.\n\n\
     This usually means one of:\n\
     1. The cursor is not on a function definition or call\n\
     2. The file has not been indexed by the language server yet\n\
     3. The position is inside a comment, string or other non-code text\n\n\
     Try:\n\
     - Place the position on a function name and call again\n\
     - Open or save the file so it gets indexed, then retry\n"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FunctionMetrics, SourceLocation};
    use lsp_types::{Position, Range};

    fn function(id: &str, name: &str, line: u32) -> FunctionNode {
        FunctionNode {
            id: id.to_string(),
            name: name.to_string(),
            signature: format!("fn {name}()"),
            uri: "file:///src/lib.rs".to_string(),
            range: Range::new(Position::new(line, 0), Position::new(line + 3, 1)),
            language: "rust".to_string(),
            metrics: None,
        }
    }

    fn call(from: &str, to: &str) -> CallEdge {
        CallEdge {
            from: from.to_string(),
            to: to.to_string(),
            call_sites: vec![SourceLocation::default()],
            is_recursive: false,
        }
    }

    #[test]
    fn test_callers_and_callees_partition() {
        let mut root = function("r", "process", 10);
        root.metrics = Some(FunctionMetrics {
            complexity: 3,
            lines_of_code: 12,
            call_count: 1,
        });
        let resp = CallGraphResponse {
            root: Some(root.clone()),
            nodes: vec![
                root,
                function("a", "main", 1),
                function("b", "handler", 30),
                function("c", "validate", 50),
            ],
            edges: vec![call("a", "r"), call("b", "r"), call("r", "c")],
        };
        let out = format_call_graph(&resp);

        assert!(out.contains("# Call Graph: `process`"));
        assert!(out.contains("**Metrics:** complexity 3 · 12 lines · 1 call"));
        assert!(out.contains("## Callers (2)"));
        assert!(out.contains("## Callees (1)"));

        let callers_at = out.find("## Callers").unwrap();
        let callees_at = out.find("## Callees").unwrap();
        let callers = &out[callers_at..callees_at];
        let callees = &out[callees_at..];
        assert_eq!(callers.matches("\n- ").count(), 2);
        assert!(callers.contains("`main` — /src/lib.rs:2"));
        assert!(callers.contains("`handler`"));
        assert_eq!(callees.matches("\n- ").count(), 1);
        assert!(callees.contains("`validate`"));
    }

    #[test]
    fn test_missing_root_explains() {
        let resp = CallGraphResponse {
            root: None,
            nodes: vec![function("a", "main", 1)],
            edges: vec![call("a", "b")],
        };
        let out = format_call_graph(&resp);
        assert!(out.contains("No function found at this position."));
        assert!(!out.contains("Callers"));
        assert!(!out.contains("Callees"));
    }

    #[test]
    fn test_root_without_edges() {
        let root = function("r", "lonely", 0);
        let resp = CallGraphResponse {
            root: Some(root.clone()),
            nodes: vec![root],
            edges: vec![],
        };
        let out = format_call_graph(&resp);
        assert!(out.contains("## Callers (0)"));
        assert!(out.contains("Nothing in the indexed code calls `lonely`."));
        assert!(out.contains("## Callees (0)"));
    }

    #[test]
    fn test_recursive_and_unknown_nodes() {
        let root = function("r", "walk", 0);
        let mut self_call = call("r", "r");
        self_call.is_recursive = true;
        self_call.call_sites = vec![SourceLocation::default(), SourceLocation::default()];
        let resp = CallGraphResponse {
            root: Some(root.clone()),
            nodes: vec![root],
            edges: vec![self_call, call("ghost", "r")],
        };
        let out = format_call_graph(&resp);
        assert!(out.contains("## Callers (2)"));
        assert!(out.contains("- `ghost`"));
        assert!(out.contains("(2 call sites) 🔁 recursive"));
    }
}
