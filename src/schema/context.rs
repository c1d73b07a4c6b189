//! AI-context response: the code unit an agent is focused on plus the
//! symbols around it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    #[default]
    Function,
    Class,
    Module,
    #[serde(other)]
    Other,
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKind::Function => write!(f, "function"),
            ContextKind::Class => write!(f, "class"),
            ContextKind::Module => write!(f, "module"),
            ContextKind::Other => write!(f, "symbol"),
        }
    }
}

/// How a related symbol connects to the primary context.
///
/// Unknown labels are kept verbatim so filters on the label still see them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relationship {
    Calls,
    CalledBy,
    Uses,
    UsedBy,
    Inherits,
    Implements,
    Tests,
    Similar,
    Other(String),
}

impl Relationship {
    pub fn as_str(&self) -> &str {
        match self {
            Relationship::Calls => "calls",
            Relationship::CalledBy => "called_by",
            Relationship::Uses => "uses",
            Relationship::UsedBy => "used_by",
            Relationship::Inherits => "inherits",
            Relationship::Implements => "implements",
            Relationship::Tests => "tests",
            Relationship::Similar => "similar",
            Relationship::Other(label) => label,
        }
    }
}

impl From<String> for Relationship {
    fn from(label: String) -> Self {
        match label.as_str() {
            "calls" => Relationship::Calls,
            "called_by" => Relationship::CalledBy,
            "uses" => Relationship::Uses,
            "used_by" => Relationship::UsedBy,
            "inherits" => Relationship::Inherits,
            "implements" => Relationship::Implements,
            "tests" => Relationship::Tests,
            "similar" => Relationship::Similar,
            _ => Relationship::Other(label),
        }
    }
}

impl From<Relationship> for String {
    fn from(rel: Relationship) -> Self {
        rel.as_str().to_string()
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryContext {
    #[serde(rename = "type", default)]
    pub kind: ContextKind,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedSymbol {
    pub name: String,
    pub relationship: Relationship,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default)]
    pub relevance_score: f64,
}

impl RelatedSymbol {
    /// Relevance clamped to `[0, 1]`. NaN counts as 0.
    pub fn relevance(&self) -> f64 {
        if self.relevance_score.is_nan() {
            0.0
        } else {
            self.relevance_score.clamp(0.0, 1.0)
        }
    }

    /// True when the relationship label or the name mentions "test".
    pub fn looks_like_test(&self) -> bool {
        self.relationship.as_str().to_lowercase().contains("test")
            || self.name.to_lowercase().contains("test")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageExample {
    pub code: String,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureInfo {
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default)]
    pub neighbors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    #[serde(default)]
    pub total_tokens: u64,
    /// Milliseconds the engine spent on the query.
    #[serde(default)]
    pub query_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContextResponse {
    pub primary_context: PrimaryContext,
    #[serde(default)]
    pub related_symbols: Vec<RelatedSymbol>,
    #[serde(default)]
    pub dependencies: Vec<DependencyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_examples: Option<Vec<UsageExample>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<ArchitectureInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContextMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbol(name: &str, relationship: &str, score: f64) -> RelatedSymbol {
        RelatedSymbol {
            name: name.to_string(),
            relationship: Relationship::from(relationship.to_string()),
            code: String::new(),
            location: SourceLocation::default(),
            relevance_score: score,
        }
    }

    #[test]
    fn test_relationship_roundtrips_unknown_labels() {
        let rel: Relationship = serde_json::from_value(json!("tested_by")).unwrap();
        assert_eq!(rel, Relationship::Other("tested_by".to_string()));
        assert_eq!(serde_json::to_value(&rel).unwrap(), json!("tested_by"));

        let rel: Relationship = serde_json::from_value(json!("called_by")).unwrap();
        assert_eq!(rel, Relationship::CalledBy);
    }

    #[test]
    fn test_relevance_clamps() {
        assert_eq!(symbol("a", "uses", 0.873).relevance(), 0.873);
        assert_eq!(symbol("a", "uses", 1.7).relevance(), 1.0);
        assert_eq!(symbol("a", "uses", -0.2).relevance(), 0.0);
        assert_eq!(symbol("a", "uses", f64::NAN).relevance(), 0.0);
    }

    #[test]
    fn test_looks_like_test() {
        assert!(symbol("check_login", "tests", 1.0).looks_like_test());
        assert!(symbol("TestLogin", "called_by", 1.0).looks_like_test());
        assert!(symbol("x", "TESTED_BY", 1.0).looks_like_test());
        assert!(!symbol("login", "calls", 1.0).looks_like_test());
    }

    #[test]
    fn test_deserialize_engine_reply() {
        let resp: AiContextResponse = serde_json::from_value(json!({
            "primaryContext": {
                "type": "function",
                "name": "login",
                "code": "fn login() {}",
                "language": "rust",
                "location": {
                    "uri": "file:///auth.rs",
                    "range": { "start": { "line": 0, "character": 0 }, "end": { "line": 0, "character": 13 } }
                }
            },
            "relatedSymbols": [],
            "dependencies": [{ "name": "validate", "type": "calls", "code": null }],
            "usageExamples": null,
            "architecture": { "module": "auth", "layer": null, "neighbors": ["db"] },
            "metadata": { "totalTokens": 12, "queryTime": 3 }
        }))
        .unwrap();
        assert_eq!(resp.primary_context.kind, ContextKind::Function);
        assert_eq!(resp.dependencies[0].kind, "calls");
        assert!(resp.usage_examples.is_none());
        assert_eq!(resp.architecture.unwrap().neighbors, vec!["db".to_string()]);
    }
}
