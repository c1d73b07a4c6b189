//! Symbol information assembled from standard LSP hover, definition and
//! references replies.

use lsp_types::{GotoDefinitionResponse, Hover, HoverContents, Location, MarkedString};
use serde::{Deserialize, Serialize};

use super::SourceLocation;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Documentation / hover text, already flattened to markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
    #[serde(default)]
    pub definitions: Vec<SourceLocation>,
    #[serde(default)]
    pub references: Vec<SourceLocation>,
}

impl SymbolInfo {
    pub fn from_lsp(
        hover: Option<Hover>,
        definition: Option<GotoDefinitionResponse>,
        references: Option<Vec<Location>>,
    ) -> Self {
        Self {
            hover: hover.and_then(hover_text),
            definitions: definition.map(definition_locations).unwrap_or_default(),
            references: references
                .unwrap_or_default()
                .into_iter()
                .map(SourceLocation::from)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hover.is_none() && self.definitions.is_empty() && self.references.is_empty()
    }
}

impl From<Location> for SourceLocation {
    fn from(loc: Location) -> Self {
        Self {
            uri: loc.uri.to_string(),
            range: loc.range,
        }
    }
}

fn marked_string_text(s: MarkedString) -> String {
    match s {
        MarkedString::String(text) => text,
        MarkedString::LanguageString(ls) => format!("```{}\n{}\n```", ls.language, ls.value),
    }
}

fn hover_text(hover: Hover) -> Option<String> {
    let text = match hover.contents {
        HoverContents::Scalar(s) => marked_string_text(s),
        HoverContents::Array(items) => items
            .into_iter()
            .map(marked_string_text)
            .collect::<Vec<_>>()
            .join("\n\n"),
        HoverContents::Markup(markup) => markup.value,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn definition_locations(resp: GotoDefinitionResponse) -> Vec<SourceLocation> {
    match resp {
        GotoDefinitionResponse::Scalar(loc) => vec![loc.into()],
        GotoDefinitionResponse::Array(locs) => locs.into_iter().map(SourceLocation::from).collect(),
        GotoDefinitionResponse::Link(links) => links
            .into_iter()
            .map(|link| SourceLocation {
                uri: link.target_uri.to_string(),
                range: link.target_selection_range,
            })
            .collect(),
    }
}
