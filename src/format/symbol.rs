//! Symbol-information report.

use std::fmt::Write as _;

use super::{display_path, location_label, plural};
use crate::schema::{SourceLocation, SymbolInfo};

/// References listed per file before the rest are summarised.
pub const MAX_REFERENCES_PER_FILE: usize = 3;

pub fn format_symbol_info(info: &SymbolInfo) -> String {
    if info.is_empty() {
        return "No information available for the symbol at this position.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "# Symbol Information");

    if let Some(hover) = &info.hover {
        let _ = writeln!(out, "\n## Documentation\n\n{hover}");
    }

    match info.definitions.len() {
        0 => {}
        1 => {
            let _ = writeln!(out, "\n## Definition\n");
            let _ = writeln!(out, "- {}", location_label(&info.definitions[0]));
        }
        n => {
            let _ = writeln!(out, "\n## Definitions ({n})\n");
            for def in &info.definitions {
                let _ = writeln!(out, "- {}", location_label(def));
            }
        }
    }

    if !info.references.is_empty() {
        let groups = group_by_file(&info.references);
        let _ = writeln!(
            out,
            "\n## References ({} in {})\n",
            info.references.len(),
            plural(groups.len(), "file", "files")
        );
        for (uri, refs) in groups {
            let _ = writeln!(out, "**{}**", display_path(uri));
            for r in refs.iter().take(MAX_REFERENCES_PER_FILE) {
                let _ = writeln!(
                    out,
                    "- line {}, col {}",
                    r.range.start.line + 1,
                    r.range.start.character + 1
                );
            }
            if refs.len() > MAX_REFERENCES_PER_FILE {
                let _ = writeln!(
                    out,
                    "- ... and {} more",
                    refs.len() - MAX_REFERENCES_PER_FILE
                );
            }
        }
    }

    out
}

/// Group references by file, files in first-seen order.
fn group_by_file(refs: &[SourceLocation]) -> Vec<(&str, Vec<&SourceLocation>)> {
    let mut groups: Vec<(&str, Vec<&SourceLocation>)> = Vec::new();
    for r in refs {
        match groups.iter_mut().find(|(uri, _)| *uri == r.uri) {
            Some((_, list)) => list.push(r),
            None => groups.push((r.uri.as_str(), vec![r])),
        }
    }
    groups
}
