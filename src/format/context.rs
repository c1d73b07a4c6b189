//! AI-context and related-tests reports.

use std::fmt::Write as _;

use super::{location_label, percent, plural};
use crate::schema::{AiContextResponse, RelatedSymbol};

/// Related symbols shown in an AI-context report. The engine sorts them by
/// relevance already, so this keeps the first ones in input order.
pub const MAX_RELATED_SYMBOLS: usize = 5;

pub fn format_ai_context(resp: &AiContextResponse) -> String {
    let primary = &resp.primary_context;
    let mut out = String::new();

    let _ = writeln!(out, "# AI Context: `{}` ({})\n", primary.name, primary.kind);
    if let Some(meta) = &resp.metadata {
        let _ = writeln!(
            out,
            "_~{} tokens · {} ms_\n",
            meta.total_tokens, meta.query_time
        );
    }
    let _ = writeln!(out, "**Location:** {}\n", location_label(&primary.location));

    if primary.code.trim().is_empty() {
        let _ = writeln!(out, "_Source not available for `{}`._", primary.name);
    } else {
        let _ = writeln!(out, "```{}\n{}\n```", primary.language, primary.code.trim_end());
    }

    let total = resp.related_symbols.len();
    let shown = total.min(MAX_RELATED_SYMBOLS);
    if total > shown {
        let _ = writeln!(out, "\n## Related Symbols (showing {shown} of {total})\n");
    } else {
        let _ = writeln!(out, "\n## Related Symbols ({total})\n");
    }
    if total == 0 {
        let _ = writeln!(
            out,
            "_No related symbols found. `{}` has no indexed callers, callees or type \
             relationships, or the token budget was used up by the primary code._",
            primary.name
        );
    }
    for symbol in resp.related_symbols.iter().take(MAX_RELATED_SYMBOLS) {
        write_related(&mut out, symbol, &primary.language);
    }

    if !resp.dependencies.is_empty() {
        let _ = writeln!(out, "\n## Dependencies ({})\n", resp.dependencies.len());
        for dep in &resp.dependencies {
            if dep.kind.is_empty() {
                let _ = writeln!(out, "- `{}`", dep.name);
            } else {
                let _ = writeln!(out, "- `{}` ({})", dep.name, dep.kind);
            }
        }
    }

    if let Some(examples) = resp.usage_examples.as_ref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "\n## Usage Examples ({})\n", examples.len());
        for example in examples {
            let _ = writeln!(out, "**{}**", location_label(&example.location));
            if let Some(description) = &example.description {
                let _ = writeln!(out, "{description}");
            }
            let _ = writeln!(out, "```{}\n{}\n```", primary.language, example.code.trim_end());
        }
    }

    if let Some(arch) = &resp.architecture {
        let _ = writeln!(out, "\n## Architecture\n");
        let _ = writeln!(out, "**Module:** {}", arch.module);
        if let Some(layer) = &arch.layer {
            let _ = writeln!(out, "**Layer:** {layer}");
        }
        if arch.neighbors.is_empty() {
            let _ = writeln!(out, "**Neighbors:** _none_");
        } else {
            let _ = writeln!(out, "**Neighbors:** {}", arch.neighbors.join(", "));
        }
    }

    out
}

fn write_related(out: &mut String, symbol: &RelatedSymbol, language: &str) {
    let _ = writeln!(
        out,
        "### `{}` ({}, {} relevant)\n",
        symbol.name,
        symbol.relationship,
        percent(symbol.relevance())
    );
    let _ = writeln!(out, "{}", location_label(&symbol.location));
    if !symbol.code.trim().is_empty() {
        let _ = writeln!(out, "```{}\n{}\n```", language, symbol.code.trim_end());
    }
    out.push('\n');
}

/// Render the tests among an AI-context reply's related symbols.
///
/// A related symbol counts as a test when its relationship or its name
/// contains "test", case-insensitively.
pub fn format_related_tests(resp: &AiContextResponse) -> String {
    let name = &resp.primary_context.name;
    let tests: Vec<&RelatedSymbol> = resp
        .related_symbols
        .iter()
        .filter(|s| s.looks_like_test())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "# Related Tests: `{name}`\n");

    if tests.is_empty() {
        let _ = writeln!(
            out,
            "No related tests found for `{name}`.\n\n\
             Possible reasons:\n\
             1. No tests exercise this code yet\n\
             2. The test files have not been indexed by the language server\n\
             3. The tests exist but do not follow a naming convention the engine \
             recognises (`test_*`, `*_test`, `*.spec.*`)"
        );
        return out;
    }

    let _ = writeln!(out, "Found {}:\n", plural(tests.len(), "related test", "related tests"));
    for test in tests {
        let _ = writeln!(
            out,
            "- `{}` ({}, {}) — {}",
            test.name,
            test.relationship,
            percent(test.relevance()),
            location_label(&test.location)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        ArchitectureInfo, ContextKind, ContextMetadata, PrimaryContext, Relationship,
        SourceLocation,
    };

    fn primary() -> PrimaryContext {
        PrimaryContext {
            kind: ContextKind::Function,
            name: "login".to_string(),
            code: "fn login() {}".to_string(),
            language: "rust".to_string(),
            location: SourceLocation {
                uri: "file:///src/auth.rs".to_string(),
                ..Default::default()
            },
        }
    }

    fn related(name: &str, relationship: Relationship, score: f64) -> RelatedSymbol {
        RelatedSymbol {
            name: name.to_string(),
            relationship,
            code: String::new(),
            location: SourceLocation {
                uri: "file:///src/auth.rs".to_string(),
                ..Default::default()
            },
            relevance_score: score,
        }
    }

    fn response(related_symbols: Vec<RelatedSymbol>) -> AiContextResponse {
        AiContextResponse {
            primary_context: primary(),
            related_symbols,
            dependencies: vec![],
            usage_examples: None,
            architecture: None,
            metadata: None,
        }
    }

    #[test]
    fn test_primary_block_first_and_architecture_last() {
        let mut resp = response(vec![related("validate", Relationship::Calls, 0.873)]);
        resp.architecture = Some(ArchitectureInfo {
            module: "auth".to_string(),
            layer: Some("service".to_string()),
            neighbors: vec!["db".to_string(), "http".to_string()],
        });
        resp.metadata = Some(ContextMetadata {
            total_tokens: 120,
            query_time: 4,
        });
        let out = format_ai_context(&resp);

        let code = out.find("```rust\nfn login() {}\n```").unwrap();
        let related_at = out.find("## Related Symbols (1)").unwrap();
        let arch = out.find("## Architecture").unwrap();
        assert!(code < related_at && related_at < arch);
        assert!(out.contains("### `validate` (calls, 87% relevant)"));
        assert!(out.contains("_~120 tokens · 4 ms_"));
        assert!(out.contains("**Neighbors:** db, http"));
        assert!(out.trim_end().ends_with("**Neighbors:** db, http"));
    }

    #[test]
    fn test_related_symbols_truncate_to_five_in_input_order() {
        let symbols = (0..8)
            .map(|i| related(&format!("sym{i}"), Relationship::Uses, 0.1 * i as f64))
            .collect();
        let out = format_ai_context(&response(symbols));

        assert!(out.contains("## Related Symbols (showing 5 of 8)"));
        assert_eq!(out.matches("### `sym").count(), 5);
        for i in 0..5 {
            assert!(out.contains(&format!("### `sym{i}`")));
        }
        assert!(!out.contains("### `sym5`"));
        assert!(out.find("`sym0`").unwrap() < out.find("`sym4`").unwrap());
    }

    #[test]
    fn test_relevance_is_whole_percent() {
        let out = format_ai_context(&response(vec![
            related("a", Relationship::Uses, 0.999),
            related("b", Relationship::Uses, 1.5),
            related("c", Relationship::Uses, -0.3),
        ]));
        assert!(out.contains("(uses, 100% relevant)"));
        assert!(out.contains("### `c` (uses, 0% relevant)"));
        assert!(!out.contains("150%"));
    }

    #[test]
    fn test_empty_related_is_explained() {
        let mut resp = response(vec![]);
        resp.primary_context.code = String::new();
        let out = format_ai_context(&resp);
        assert!(out.contains("_Source not available for `login`._"));
        assert!(out.contains("No related symbols found."));
        assert!(!out.contains("## Architecture"));
    }

    #[test]
    fn test_related_tests_filter() {
        let resp = response(vec![
            related("check_login", Relationship::Tests, 1.0),
            related("validate", Relationship::Calls, 0.9),
            related("LoginTest", Relationship::CalledBy, 0.8),
            related("helper", Relationship::Other("Tested_By".to_string()), 0.5),
        ]);
        let out = format_related_tests(&resp);
        assert!(out.contains("Found 3 related tests:"));
        assert!(out.contains("`check_login` (tests, 100%)"));
        assert!(out.contains("`LoginTest` (called_by, 80%)"));
        assert!(out.contains("`helper` (Tested_By, 50%)"));
        assert!(!out.contains("`validate`"));
    }

    #[test]
    fn test_no_related_tests_is_explained() {
        let resp = response(vec![related("validate", Relationship::Calls, 0.9)]);
        let out = format_related_tests(&resp);
        assert!(out.contains("No related tests found for `login`."));
        assert!(out.contains("1. No tests exercise this code yet"));
        assert!(out.contains("2. The test files have not been indexed"));
        assert!(out.contains("3. The tests exist but do not follow"));
    }
}
