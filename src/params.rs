//! Caller input records and the defaulting step.
//!
//! Tool arguments arrive as partial records (`*Input`, every option is an
//! `Option`). `resolve` applies [`ToolDefaults`] and produces the complete
//! request that goes over the wire. Default policy lives only here.

use std::fmt;
use std::path::Path;

use lsp_types::{Position, Url};
use serde::{Deserialize, Serialize};

// ─── Option enums ───────────────────────────────────────────────

/// Traversal direction for dependency-graph queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyDirection {
    Imports,
    ImportedBy,
    #[default]
    Both,
}

/// Traversal direction for call-graph queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallDirection {
    Callers,
    Callees,
    #[default]
    Both,
}

/// What the agent wants to do with the code; steers AI-context selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    #[default]
    Explain,
    Modify,
    Debug,
    Test,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Explain => write!(f, "explain"),
            Intent::Modify => write!(f, "modify"),
            Intent::Debug => write!(f, "debug"),
            Intent::Test => write!(f, "test"),
        }
    }
}

/// Hypothetical change used for impact analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    #[default]
    Modify,
    Delete,
    Rename,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Modify => write!(f, "modify"),
            ChangeType::Delete => write!(f, "delete"),
            ChangeType::Rename => write!(f, "rename"),
        }
    }
}

// ─── Defaults ───────────────────────────────────────────────────

/// Default values applied to every partial input.
///
/// Loaded from the `[defaults]` table of the config file; any key left out
/// keeps the built-in value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    pub depth: u32,
    pub include_external: bool,
    pub dependency_direction: DependencyDirection,
    pub call_direction: CallDirection,
    pub character: u32,
    pub intent: Intent,
    pub max_tokens: u32,
    pub change_type: ChangeType,
    /// Line used by find-related-tests when the caller gives none.
    pub tests_line: u32,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            depth: 3,
            include_external: false,
            dependency_direction: DependencyDirection::Both,
            call_direction: CallDirection::Both,
            character: 0,
            intent: Intent::Explain,
            max_tokens: 4000,
            change_type: ChangeType::Modify,
            tests_line: 0,
        }
    }
}

// ─── Partial inputs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraphInput {
    pub uri: String,
    pub depth: Option<u32>,
    pub include_external: Option<bool>,
    pub direction: Option<DependencyDirection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallGraphInput {
    pub uri: String,
    pub line: u32,
    pub character: Option<u32>,
    pub depth: Option<u32>,
    pub direction: Option<CallDirection>,
    pub include_external: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactInput {
    pub uri: String,
    pub line: u32,
    pub character: Option<u32>,
    pub change_type: Option<ChangeType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContextInput {
    pub uri: String,
    pub line: u32,
    pub character: Option<u32>,
    pub intent: Option<Intent>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTestsInput {
    pub uri: String,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfoInput {
    pub uri: String,
    pub line: u32,
    pub character: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserMetricsInput {
    pub language: Option<String>,
}

// ─── Complete requests (wire shape) ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyGraphRequest {
    pub uri: String,
    pub depth: u32,
    pub include_external: bool,
    pub direction: DependencyDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallGraphRequest {
    pub uri: String,
    pub position: Position,
    pub depth: u32,
    pub direction: CallDirection,
    pub include_external: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactRequest {
    pub uri: String,
    pub position: Position,
    pub analysis_type: ChangeType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContextRequest {
    pub uri: String,
    pub position: Position,
    pub context_type: Intent,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRequest {
    pub uri: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserMetricsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

// ─── Defaulting ─────────────────────────────────────────────────

impl DependencyGraphInput {
    pub fn resolve(self, defaults: &ToolDefaults) -> DependencyGraphRequest {
        DependencyGraphRequest {
            uri: self.uri,
            depth: self.depth.unwrap_or(defaults.depth),
            include_external: self.include_external.unwrap_or(defaults.include_external),
            direction: self.direction.unwrap_or(defaults.dependency_direction),
        }
    }
}

impl CallGraphInput {
    pub fn resolve(self, defaults: &ToolDefaults) -> CallGraphRequest {
        CallGraphRequest {
            uri: self.uri,
            position: Position::new(self.line, self.character.unwrap_or(defaults.character)),
            depth: self.depth.unwrap_or(defaults.depth),
            direction: self.direction.unwrap_or(defaults.call_direction),
            include_external: self.include_external.unwrap_or(defaults.include_external),
        }
    }
}

impl ImpactInput {
    pub fn resolve(self, defaults: &ToolDefaults) -> ImpactRequest {
        ImpactRequest {
            uri: self.uri,
            position: Position::new(self.line, self.character.unwrap_or(defaults.character)),
            analysis_type: self.change_type.unwrap_or(defaults.change_type),
        }
    }
}

impl AiContextInput {
    pub fn resolve(self, defaults: &ToolDefaults) -> AiContextRequest {
        AiContextRequest {
            uri: self.uri,
            position: Position::new(self.line, self.character.unwrap_or(defaults.character)),
            context_type: self.intent.unwrap_or(defaults.intent),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}

impl RelatedTestsInput {
    /// Related tests are an AI-context query with the `test` intent.
    pub fn resolve(self, defaults: &ToolDefaults) -> AiContextRequest {
        AiContextRequest {
            uri: self.uri,
            position: Position::new(self.line.unwrap_or(defaults.tests_line), defaults.character),
            context_type: Intent::Test,
            max_tokens: defaults.max_tokens,
        }
    }
}

impl SymbolInfoInput {
    pub fn resolve(self, defaults: &ToolDefaults) -> SymbolRequest {
        SymbolRequest {
            uri: self.uri,
            position: Position::new(self.line, self.character.unwrap_or(defaults.character)),
        }
    }
}

impl ParserMetricsInput {
    pub fn resolve(self) -> ParserMetricsRequest {
        ParserMetricsRequest {
            language: self.language.filter(|l| !l.trim().is_empty()),
        }
    }
}

/// Turn whatever the caller passed as `uri` into a document URI.
///
/// Anything with a scheme is kept as-is. Plain paths become `file://` URIs;
/// relative ones are resolved against `root`.
pub fn normalize_uri(raw: &str, root: &Path) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains("://") {
        return Some(raw.to_string());
    }
    let path = Path::new(raw);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    Url::from_file_path(&absolute).ok().map(|u| u.to_string())
}
