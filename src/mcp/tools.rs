//! MCP tool façade — maps tool calls to analysis-engine requests.
//!
//! Every call returns a single text block. Bad arguments, engine errors and
//! cancellations come back as a diagnostic report with `isError` set; nothing
//! is ever raised to the caller.

use std::path::PathBuf;
use std::sync::Arc;

use lsp_types::Position;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{ToolDefinition, ToolsCallResult};
use crate::error::DispatchError;
use crate::format::{
    display_path, format_ai_context, format_call_graph, format_dependency_graph, format_impact,
    format_parser_metrics, format_reindex, format_related_tests, format_symbol_info,
};
use crate::lsp::{AnalysisEngine, CancelSignal};
use crate::params::{
    normalize_uri, AiContextInput, AiContextRequest, CallGraphInput, CallGraphRequest,
    DependencyGraphInput, DependencyGraphRequest, ImpactInput, ImpactRequest,
    ParserMetricsInput, ParserMetricsRequest, RelatedTestsInput, SymbolInfoInput, SymbolRequest,
    ToolDefaults,
};

/// Substring the engine puts in its error message when a position resolves
/// to no analyzable entity.
pub const NO_SYMBOL_SENTINEL: &str = "No symbol at position";

/// `error.data.kind` for the same condition, when the engine sends one.
pub const NO_SYMBOL_KIND: &str = "symbol_not_found";

/// One analysis capability exposed as an MCP tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DependencyGraph,
    CallGraph,
    AnalyzeImpact,
    AiContext,
    RelatedTests,
    SymbolInfo,
    ParserMetrics,
    ReindexWorkspace,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::DependencyGraph,
        Operation::CallGraph,
        Operation::AnalyzeImpact,
        Operation::AiContext,
        Operation::RelatedTests,
        Operation::SymbolInfo,
        Operation::ParserMetrics,
        Operation::ReindexWorkspace,
    ];

    pub fn tool_name(self) -> &'static str {
        match self {
            Operation::DependencyGraph => "codegraph_get_dependency_graph",
            Operation::CallGraph => "codegraph_get_call_graph",
            Operation::AnalyzeImpact => "codegraph_analyze_impact",
            Operation::AiContext => "codegraph_get_ai_context",
            Operation::RelatedTests => "codegraph_find_related_tests",
            Operation::SymbolInfo => "codegraph_get_symbol_info",
            Operation::ParserMetrics => "codegraph_get_parser_metrics",
            Operation::ReindexWorkspace => "codegraph_reindex_workspace",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Operation::DependencyGraph => "Dependency Graph",
            Operation::CallGraph => "Call Graph",
            Operation::AnalyzeImpact => "Impact Analysis",
            Operation::AiContext => "AI Context",
            Operation::RelatedTests => "Related Tests",
            Operation::SymbolInfo => "Symbol Information",
            Operation::ParserMetrics => "Parser Metrics",
            Operation::ReindexWorkspace => "Reindex Workspace",
        }
    }

    /// What the engine was looking for, for no-symbol guidance.
    fn subject(self) -> &'static str {
        match self {
            Operation::DependencyGraph => "module",
            Operation::CallGraph => "function",
            Operation::AnalyzeImpact => "symbol to analyze",
            Operation::ParserMetrics => "parser data",
            Operation::ReindexWorkspace => "workspace",
            _ => "symbol",
        }
    }

    fn remediation(self) -> [&'static str; 2] {
        match self {
            Operation::DependencyGraph => [
                "Check that the path exists inside the workspace and the file is saved to disk",
                "Run `codegraph_get_parser_metrics` to confirm the file's language is parsed",
            ],
            Operation::CallGraph => [
                "Place the position on a function name or a call expression and retry",
                "Use `codegraph_get_symbol_info` to see what the server finds at this position",
            ],
            Operation::AnalyzeImpact => [
                "Place the position on the declaration of the symbol you plan to change",
                "Use `codegraph_get_symbol_info` to confirm the symbol is indexed",
            ],
            Operation::AiContext => [
                "Move the position onto a function, class or module name",
                "Save the file to disk and run `codegraph_reindex_workspace`, then retry",
            ],
            Operation::RelatedTests => [
                "Pass a `line` that points at the function or class you want tests for",
                "Save the file to disk and run `codegraph_reindex_workspace`, then retry",
            ],
            Operation::SymbolInfo => [
                "Place the position on an identifier; line and character are 0-indexed",
                "Save the file to disk and run `codegraph_reindex_workspace`, then retry",
            ],
            Operation::ParserMetrics => [
                "Check the `language` name, or omit it to get every language",
                "Run `codegraph_reindex_workspace`, query a file, and ask again",
            ],
            Operation::ReindexWorkspace => [
                "Check that the CodeGraph language server is running",
                "Retry the reindex",
            ],
        }
    }

    fn definition(self) -> ToolDefinition {
        let (description, input_schema) = match self {
            Operation::DependencyGraph => (
                "Get the import/dependency graph around a file: which modules it imports \
                 and which modules import it.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "depth": {
                            "type": "integer",
                            "description": "How many levels of dependencies to follow (default: 3)"
                        },
                        "includeExternal": {
                            "type": "boolean",
                            "description": "Include external packages (default: false)"
                        },
                        "direction": {
                            "type": "string",
                            "enum": ["imports", "importedBy", "both"],
                            "description": "Which edges to follow (default: both)"
                        }
                    },
                    "required": ["uri"]
                }),
            ),
            Operation::CallGraph => (
                "Get the call graph of the function at a position: who calls it and what \
                 it calls.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "line": line_property(),
                        "character": character_property(),
                        "depth": {
                            "type": "integer",
                            "description": "How many call levels to follow (default: 3)"
                        },
                        "direction": {
                            "type": "string",
                            "enum": ["callers", "callees", "both"],
                            "description": "Which side of the call graph to return (default: both)"
                        }
                    },
                    "required": ["uri", "line"]
                }),
            ),
            Operation::AnalyzeImpact => (
                "Analyze what would break if the symbol at a position were modified, \
                 deleted or renamed. Reports direct and indirect impact and affected tests.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "line": line_property(),
                        "character": character_property(),
                        "changeType": {
                            "type": "string",
                            "enum": ["modify", "delete", "rename"],
                            "description": "The change to evaluate (default: modify)"
                        }
                    },
                    "required": ["uri", "line"]
                }),
            ),
            Operation::AiContext => (
                "Get the source of the symbol at a position together with related symbols, \
                 dependencies and architecture notes, sized to a token budget.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "line": line_property(),
                        "character": character_property(),
                        "intent": {
                            "type": "string",
                            "enum": ["explain", "modify", "debug", "test"],
                            "description": "What the context will be used for (default: explain)"
                        },
                        "maxTokens": {
                            "type": "integer",
                            "description": "Token budget for the returned context (default: 4000)"
                        }
                    },
                    "required": ["uri", "line"]
                }),
            ),
            Operation::RelatedTests => (
                "Find tests related to the code at a position.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "line": {
                            "type": "integer",
                            "description": "0-indexed line of the code to find tests for (default: 0)"
                        }
                    },
                    "required": ["uri"]
                }),
            ),
            Operation::SymbolInfo => (
                "Get documentation, definition and references for the symbol at a position.",
                json!({
                    "type": "object",
                    "properties": {
                        "uri": uri_property(),
                        "line": line_property(),
                        "character": character_property()
                    },
                    "required": ["uri", "line"]
                }),
            ),
            Operation::ParserMetrics => (
                "Get parsing statistics per language: files parsed, failures, entities \
                 and relationships extracted.",
                json!({
                    "type": "object",
                    "properties": {
                        "language": {
                            "type": "string",
                            "description": "Optional: only report this language (e.g., 'rust')"
                        }
                    }
                }),
            ),
            Operation::ReindexWorkspace => (
                "Clear the language server's code graph. Files are parsed again the next \
                 time a tool asks about them. Use when results look stale.",
                json!({ "type": "object", "properties": {} }),
            ),
        };
        ToolDefinition {
            name: self.tool_name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

fn uri_property() -> Value {
    json!({
        "type": "string",
        "description": "File URI or path (relative paths resolve against the workspace root)"
    })
}

fn line_property() -> Value {
    json!({ "type": "integer", "description": "0-indexed line number" })
}

fn character_property() -> Value {
    json!({ "type": "integer", "description": "0-indexed character offset (default: 0)" })
}

/// How a failed engine call is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The position resolved to nothing the engine can analyze.
    NoSymbol,
    Generic,
}

/// Classify an engine failure. A structured kind wins; the message
/// substring is the fallback for engines that only send text.
pub fn classify_failure(err: &DispatchError) -> FailureKind {
    if err.kind() == Some(NO_SYMBOL_KIND) || err.to_string().contains(NO_SYMBOL_SENTINEL) {
        FailureKind::NoSymbol
    } else {
        FailureKind::Generic
    }
}

/// A tool the façade currently answers for.
#[derive(Debug, Clone)]
pub struct ToolRegistration {
    operation: Operation,
    definition: ToolDefinition,
}

impl ToolRegistration {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            definition: operation.definition(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }
}

/// A tool call with its arguments validated and defaults applied.
#[derive(Debug, Clone, PartialEq)]
enum Prepared {
    DependencyGraph(DependencyGraphRequest),
    CallGraph(CallGraphRequest),
    AnalyzeImpact(ImpactRequest),
    AiContext(AiContextRequest),
    RelatedTests(AiContextRequest),
    SymbolInfo(SymbolRequest),
    ParserMetrics(ParserMetricsRequest),
    ReindexWorkspace,
}

impl Prepared {
    fn operation(&self) -> Operation {
        match self {
            Prepared::DependencyGraph(_) => Operation::DependencyGraph,
            Prepared::CallGraph(_) => Operation::CallGraph,
            Prepared::AnalyzeImpact(_) => Operation::AnalyzeImpact,
            Prepared::AiContext(_) => Operation::AiContext,
            Prepared::RelatedTests(_) => Operation::RelatedTests,
            Prepared::SymbolInfo(_) => Operation::SymbolInfo,
            Prepared::ParserMetrics(_) => Operation::ParserMetrics,
            Prepared::ReindexWorkspace => Operation::ReindexWorkspace,
        }
    }

    /// Document and position the call is about, if any.
    fn target(&self) -> Option<(&str, Option<Position>)> {
        match self {
            Prepared::DependencyGraph(r) => Some((&r.uri, None)),
            Prepared::CallGraph(r) => Some((&r.uri, Some(r.position))),
            Prepared::AnalyzeImpact(r) => Some((&r.uri, Some(r.position))),
            Prepared::AiContext(r) | Prepared::RelatedTests(r) => Some((&r.uri, Some(r.position))),
            Prepared::SymbolInfo(r) => Some((&r.uri, Some(r.position))),
            Prepared::ParserMetrics(_) | Prepared::ReindexWorkspace => None,
        }
    }

    fn status_line(&self) -> String {
        let at = |uri: &str, pos: Position| format!("`{}:{}`", display_path(uri), pos.line + 1);
        match self {
            Prepared::DependencyGraph(r) => format!(
                "Building dependency graph for `{}` (depth {})...",
                display_path(&r.uri),
                r.depth
            ),
            Prepared::CallGraph(r) => format!("Tracing calls around {}...", at(&r.uri, r.position)),
            Prepared::AnalyzeImpact(r) => format!(
                "Analyzing the impact of a {} at {}...",
                r.analysis_type,
                at(&r.uri, r.position)
            ),
            Prepared::AiContext(r) => format!(
                "Gathering {} context for {} ({} tokens max)...",
                r.context_type,
                at(&r.uri, r.position),
                r.max_tokens
            ),
            Prepared::RelatedTests(r) => {
                format!("Looking for tests related to {}...", at(&r.uri, r.position))
            }
            Prepared::SymbolInfo(r) => format!("Looking up the symbol at {}...", at(&r.uri, r.position)),
            Prepared::ParserMetrics(r) => match &r.language {
                Some(language) => format!("Collecting {language} parser metrics..."),
                None => "Collecting parser metrics...".to_string(),
            },
            Prepared::ReindexWorkspace => "Reindexing the workspace...".to_string(),
        }
    }
}

enum Failure {
    InvalidArguments(String),
    Engine(DispatchError),
}

/// The caller-facing boundary: one tool per analysis capability.
///
/// Owns its tool registrations; [`ToolFacade::dispose`] releases all of them.
/// Calls share no mutable state and may run concurrently.
pub struct ToolFacade {
    engine: Arc<dyn AnalysisEngine>,
    defaults: ToolDefaults,
    root: PathBuf,
    registrations: Vec<ToolRegistration>,
}

impl ToolFacade {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        defaults: ToolDefaults,
        root: impl Into<PathBuf>,
    ) -> Self {
        let registrations: Vec<ToolRegistration> =
            Operation::ALL.into_iter().map(ToolRegistration::new).collect();
        debug!(tools = registrations.len(), "Registered tools");
        Self {
            engine,
            defaults,
            root: root.into(),
            registrations,
        }
    }

    pub fn registrations(&self) -> &[ToolRegistration] {
        &self.registrations
    }

    /// Definitions of every registered tool, for `tools/list`.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.registrations
            .iter()
            .map(|r| r.definition.clone())
            .collect()
    }

    /// Release every registration at once. Later calls get an unknown-tool
    /// diagnostic and `list_tools` is empty.
    pub fn dispose(&mut self) {
        let released = self.registrations.len();
        self.registrations.clear();
        debug!(released, "Tool registrations disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Short progress line for a call, or `None` when the tool is unknown or
    /// the arguments do not validate.
    pub fn preparing_message(&self, name: &str, arguments: &Value) -> Option<String> {
        let operation = self.registered(name)?;
        self.prepare(operation, arguments).ok().map(|p| p.status_line())
    }

    /// Run a tool. Always returns a report; failures set `isError`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
        cancel: &CancelSignal,
    ) -> ToolsCallResult {
        let Some(operation) = self.registered(name) else {
            warn!(tool = name, "Call to unknown tool");
            return ToolsCallResult::error(format!(
                "Unknown tool: {name}\n\nCall `tools/list` to see the available tools."
            ));
        };

        let prepared = match self.prepare(operation, arguments) {
            Ok(prepared) => prepared,
            Err(failure) => return ToolsCallResult::error(self.failure_report(operation, None, failure)),
        };
        info!(tool = name, "{}", prepared.status_line());

        match self.execute(&prepared, cancel).await {
            Ok(report) => ToolsCallResult::text(report),
            Err(err) => {
                warn!(tool = name, error = %err, "Tool call failed");
                ToolsCallResult::error(self.failure_report(
                    operation,
                    Some(&prepared),
                    Failure::Engine(err),
                ))
            }
        }
    }

    fn registered(&self, name: &str) -> Option<Operation> {
        self.registrations
            .iter()
            .find(|r| r.definition.name == name)
            .map(|r| r.operation)
    }

    fn prepare(&self, operation: Operation, arguments: &Value) -> Result<Prepared, Failure> {
        let defaults = &self.defaults;
        Ok(match operation {
            Operation::DependencyGraph => {
                let mut input: DependencyGraphInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::DependencyGraph(input.resolve(defaults))
            }
            Operation::CallGraph => {
                let mut input: CallGraphInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::CallGraph(input.resolve(defaults))
            }
            Operation::AnalyzeImpact => {
                let mut input: ImpactInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::AnalyzeImpact(input.resolve(defaults))
            }
            Operation::AiContext => {
                let mut input: AiContextInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::AiContext(input.resolve(defaults))
            }
            Operation::RelatedTests => {
                let mut input: RelatedTestsInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::RelatedTests(input.resolve(defaults))
            }
            Operation::SymbolInfo => {
                let mut input: SymbolInfoInput = parse_arguments(arguments)?;
                input.uri = self.document_uri(&input.uri)?;
                Prepared::SymbolInfo(input.resolve(defaults))
            }
            Operation::ParserMetrics => {
                let input: ParserMetricsInput = parse_arguments(arguments)?;
                Prepared::ParserMetrics(input.resolve())
            }
            Operation::ReindexWorkspace => Prepared::ReindexWorkspace,
        })
    }

    fn document_uri(&self, raw: &str) -> Result<String, Failure> {
        normalize_uri(raw, &self.root).ok_or_else(|| {
            Failure::InvalidArguments(format!(
                "`uri` must be a file URI or a path, got {raw:?}"
            ))
        })
    }

    async fn execute(&self, prepared: &Prepared, cancel: &CancelSignal) -> Result<String, DispatchError> {
        let engine = self.engine.as_ref();
        Ok(match prepared {
            Prepared::DependencyGraph(req) => {
                format_dependency_graph(&engine.dependency_graph(req, cancel).await?, &req.uri)
            }
            Prepared::CallGraph(req) => format_call_graph(&engine.call_graph(req, cancel).await?),
            Prepared::AnalyzeImpact(req) => {
                format_impact(&engine.analyze_impact(req, cancel).await?, req.analysis_type)
            }
            Prepared::AiContext(req) => format_ai_context(&engine.ai_context(req, cancel).await?),
            Prepared::RelatedTests(req) => {
                format_related_tests(&engine.ai_context(req, cancel).await?)
            }
            Prepared::SymbolInfo(req) => format_symbol_info(&engine.symbol_info(req, cancel).await?),
            Prepared::ParserMetrics(req) => {
                format_parser_metrics(&engine.parser_metrics(req, cancel).await?)
            }
            Prepared::ReindexWorkspace => {
                engine.reindex_workspace(cancel).await?;
                format_reindex()
            }
        })
    }

    fn failure_report(&self, operation: Operation, prepared: Option<&Prepared>, failure: Failure) -> String {
        match failure {
            Failure::InvalidArguments(message) => format!(
                "# {}: invalid arguments\n\n{}\n\nSee the `{}` input schema in `tools/list` \
                 for the expected arguments.\n",
                operation.title(),
                message,
                operation.tool_name()
            ),
            Failure::Engine(err) => match classify_failure(&err) {
                FailureKind::NoSymbol => {
                    no_symbol_guidance(operation, prepared.and_then(Prepared::target))
                }
                FailureKind::Generic => generic_diagnostic(operation, &err),
            },
        }
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: &Value) -> Result<T, Failure> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };
    serde_json::from_value(arguments).map_err(|e| Failure::InvalidArguments(e.to_string()))
}

fn no_symbol_guidance(operation: Operation, target: Option<(&str, Option<Position>)>) -> String {
    let mut out = format!("# {}: no {} found\n\n", operation.title(), operation.subject());

    let mut causes: Vec<String> = Vec::new();
    match target {
        Some((uri, Some(pos))) => {
            let path = display_path(uri);
            out.push_str(&format!(
                "The language server found no {} at line {}, character {} (0-indexed) of `{}`.\n\n",
                operation.subject(),
                pos.line,
                pos.character,
                path
            ));
            causes.push("The position is on whitespace, punctuation or inside a comment".to_string());
            causes.push(format!("`{path}` has not been indexed by the language server yet"));
            causes.push(format!(
                "Line {} or character {} is outside the file",
                pos.line, pos.character
            ));
        }
        Some((uri, None)) => {
            let path = display_path(uri);
            out.push_str(&format!(
                "The language server found no {} for `{}`.\n\n",
                operation.subject(),
                path
            ));
            causes.push(format!("`{path}` has not been indexed by the language server yet"));
            causes.push("The path does not point at a file inside the workspace".to_string());
        }
        None => {
            out.push_str(&format!(
                "The language server has no {} to report.\n\n",
                operation.subject()
            ));
            causes.push("The workspace has not been indexed yet".to_string());
            causes.push("The `language` filter names no registered parser".to_string());
        }
    }
    causes.push("The file's language is not supported by the language server".to_string());

    out.push_str("Likely causes:\n");
    for (i, cause) in causes.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, cause));
    }
    out.push_str("\nTry:\n");
    for step in operation.remediation() {
        out.push_str(&format!("- {step}\n"));
    }
    out
}

fn generic_diagnostic(operation: Operation, err: &DispatchError) -> String {
    format!(
        "# {} failed\n\n\
         The language server returned an error:\n\n\
         > {}\n\n\
         No partial result is available. Check that the CodeGraph language server is \
         running (its log goes to stderr) and retry.\n",
        operation.title(),
        err
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::cancel_pair;
    use crate::schema::{
        AiContextResponse, CallGraphResponse, ContextKind, DependencyGraphResponse,
        FunctionNode, ImpactAnalysisResponse, ParserMetricsResponse, PrimaryContext,
        RelatedSymbol, Relationship, SourceLocation, SymbolInfo,
    };
    use async_trait::async_trait;
    use serde::Serialize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory engine: records every request and answers from canned data,
    /// or fails every call with the configured error.
    #[derive(Default)]
    struct FakeEngine {
        fail: Option<(String, Option<Value>)>,
        seen: Mutex<Vec<Value>>,
    }

    impl FakeEngine {
        fn failing(message: &str, data: Option<Value>) -> Self {
            Self {
                fail: Some((message.to_string(), data)),
                ..Default::default()
            }
        }

        fn record<R: Serialize>(&self, request: &R) -> Result<(), DispatchError> {
            self.seen
                .lock()
                .unwrap()
                .push(serde_json::to_value(request).unwrap());
            match &self.fail {
                Some((message, data)) => Err(DispatchError::Remote {
                    code: -32602,
                    message: message.clone(),
                    data: data.clone(),
                }),
                None => Ok(()),
            }
        }

        fn last(&self) -> Value {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl AnalysisEngine for FakeEngine {
        async fn dependency_graph(
            &self,
            request: &DependencyGraphRequest,
            _cancel: &CancelSignal,
        ) -> Result<DependencyGraphResponse, DispatchError> {
            self.record(request)?;
            Ok(DependencyGraphResponse::default())
        }

        async fn call_graph(
            &self,
            request: &CallGraphRequest,
            _cancel: &CancelSignal,
        ) -> Result<CallGraphResponse, DispatchError> {
            self.record(request)?;
            tokio::time::sleep(Duration::from_millis(20)).await;
            let root = FunctionNode {
                id: "root".to_string(),
                name: format!("fn_at_line_{}", request.position.line),
                signature: String::new(),
                uri: request.uri.clone(),
                range: Default::default(),
                language: "rust".to_string(),
                metrics: None,
            };
            Ok(CallGraphResponse {
                root: Some(root.clone()),
                nodes: vec![root],
                edges: vec![],
            })
        }

        async fn analyze_impact(
            &self,
            request: &ImpactRequest,
            _cancel: &CancelSignal,
        ) -> Result<ImpactAnalysisResponse, DispatchError> {
            self.record(request)?;
            Ok(ImpactAnalysisResponse::default())
        }

        async fn ai_context(
            &self,
            request: &AiContextRequest,
            cancel: &CancelSignal,
        ) -> Result<AiContextResponse, DispatchError> {
            self.record(request)?;
            if request.max_tokens == 0 {
                // Stand-in for a slow query: only cancellation ends it.
                cancel.clone().cancelled().await;
                return Err(DispatchError::Cancelled);
            }
            Ok(AiContextResponse {
                primary_context: PrimaryContext {
                    kind: ContextKind::Function,
                    name: "login".to_string(),
                    code: "fn login() {}".to_string(),
                    language: "rust".to_string(),
                    location: SourceLocation {
                        uri: request.uri.clone(),
                        ..Default::default()
                    },
                },
                related_symbols: vec![RelatedSymbol {
                    name: "test_login".to_string(),
                    relationship: Relationship::Tests,
                    code: String::new(),
                    location: SourceLocation::default(),
                    relevance_score: 0.9,
                }],
                dependencies: vec![],
                usage_examples: None,
                architecture: None,
                metadata: None,
            })
        }

        async fn symbol_info(
            &self,
            request: &SymbolRequest,
            _cancel: &CancelSignal,
        ) -> Result<SymbolInfo, DispatchError> {
            self.record(request)?;
            Ok(SymbolInfo {
                hover: Some(format!("symbol in {}", request.uri)),
                ..Default::default()
            })
        }

        async fn parser_metrics(
            &self,
            request: &ParserMetricsRequest,
            _cancel: &CancelSignal,
        ) -> Result<ParserMetricsResponse, DispatchError> {
            self.record(request)?;
            Ok(ParserMetricsResponse::default())
        }

        async fn reindex_workspace(&self, _cancel: &CancelSignal) -> Result<(), DispatchError> {
            self.record(&json!("reindex"))
        }
    }

    fn facade(engine: Arc<FakeEngine>) -> ToolFacade {
        ToolFacade::new(engine, ToolDefaults::default(), "/work")
    }

    #[test]
    fn test_list_tools() {
        let tools = facade(Arc::new(FakeEngine::default())).list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "codegraph_get_dependency_graph",
                "codegraph_get_call_graph",
                "codegraph_analyze_impact",
                "codegraph_get_ai_context",
                "codegraph_find_related_tests",
                "codegraph_get_symbol_info",
                "codegraph_get_parser_metrics",
                "codegraph_reindex_workspace",
            ]
        );
        let call_graph = &tools[1];
        assert_eq!(call_graph.input_schema["required"], json!(["uri", "line"]));
    }

    #[tokio::test]
    async fn test_defaults_and_relative_path() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());

        let result = tools
            .call_tool(
                "codegraph_get_call_graph",
                &json!({ "uri": "src/lib.rs", "line": 41 }),
                &CancelSignal::never(),
            )
            .await;
        assert!(!result.is_error());
        assert!(result.as_text().contains("# Call Graph: `fn_at_line_41`"));

        let sent = engine.last();
        assert_eq!(sent["uri"], "file:///work/src/lib.rs");
        assert_eq!(sent["position"], json!({ "line": 41, "character": 0 }));
        assert_eq!(sent["depth"], 3);
        assert_eq!(sent["direction"], "both");
        assert_eq!(sent["includeExternal"], false);
    }

    #[tokio::test]
    async fn test_related_tests_use_test_intent() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());

        let result = tools
            .call_tool(
                "codegraph_find_related_tests",
                &json!({ "uri": "file:///work/src/auth.rs" }),
                &CancelSignal::never(),
            )
            .await;
        assert!(result.as_text().contains("`test_login` (tests, 90%)"));

        let sent = engine.last();
        assert_eq!(sent["contextType"], "test");
        assert_eq!(sent["position"]["line"], 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());

        let missing_line = tools
            .call_tool(
                "codegraph_get_symbol_info",
                &json!({ "uri": "src/lib.rs" }),
                &CancelSignal::never(),
            )
            .await;
        assert!(missing_line.is_error());
        assert!(missing_line.as_text().contains("invalid arguments"));
        assert!(missing_line.as_text().contains("line"));

        let empty_uri = tools
            .call_tool(
                "codegraph_get_dependency_graph",
                &json!({ "uri": "  " }),
                &CancelSignal::never(),
            )
            .await;
        assert!(empty_uri.is_error());
        assert!(empty_uri.as_text().contains("`uri` must be"));

        let bad_enum = tools
            .call_tool(
                "codegraph_analyze_impact",
                &json!({ "uri": "a.rs", "line": 1, "changeType": "explode" }),
                &CancelSignal::never(),
            )
            .await;
        assert!(bad_enum.is_error());

        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_symbol_sentinel_gives_guidance() {
        let tools = facade(Arc::new(FakeEngine::failing(
            "No symbol at position 12:4",
            None,
        )));
        let result = tools
            .call_tool(
                "codegraph_get_ai_context",
                &json!({ "uri": "src/auth.rs", "line": 12, "character": 4 }),
                &CancelSignal::never(),
            )
            .await;
        let text = result.as_text();
        assert!(result.is_error());
        assert!(text.starts_with("# AI Context: no symbol found"));
        assert!(text.contains("line 12, character 4"));
        assert!(text.contains("1. The position is on whitespace"));
        assert!(text.contains("has not been indexed"));
        assert!(text.contains("outside the file"));
        assert!(text.contains("not supported"));
        assert!(text.contains("Move the position onto"));
        assert!(!text.contains("returned an error"));
    }

    #[tokio::test]
    async fn test_structured_kind_gives_guidance() {
        let tools = facade(Arc::new(FakeEngine::failing(
            "nothing here",
            Some(json!({ "kind": "symbol_not_found" })),
        )));
        let result = tools
            .call_tool(
                "codegraph_get_call_graph",
                &json!({ "uri": "src/lib.rs", "line": 3 }),
                &CancelSignal::never(),
            )
            .await;
        assert!(result.as_text().starts_with("# Call Graph: no function found"));
        assert!(result.as_text().contains("Place the position on a function name"));
    }

    #[tokio::test]
    async fn test_other_errors_embed_message() {
        let tools = facade(Arc::new(FakeEngine::failing(
            "Graph store is locked by another process",
            None,
        )));
        let result = tools
            .call_tool(
                "codegraph_get_dependency_graph",
                &json!({ "uri": "src/lib.rs" }),
                &CancelSignal::never(),
            )
            .await;
        assert!(result.is_error());
        assert!(result.as_text().starts_with("# Dependency Graph failed"));
        assert!(result
            .as_text()
            .contains("> Graph store is locked by another process"));
        assert!(!result.as_text().contains("Likely causes"));
    }

    #[test]
    fn test_classify_failure() {
        let remote = |message: &str, data: Option<Value>| DispatchError::Remote {
            code: -32602,
            message: message.to_string(),
            data,
        };
        assert_eq!(
            classify_failure(&remote("No symbol at position", None)),
            FailureKind::NoSymbol
        );
        assert_eq!(
            classify_failure(&remote("x", Some(json!({ "kind": "symbol_not_found" })))),
            FailureKind::NoSymbol
        );
        assert_eq!(
            classify_failure(&remote("no symbol at position", None)),
            FailureKind::Generic
        );
        assert_eq!(classify_failure(&DispatchError::Cancelled), FailureKind::Generic);
    }

    #[tokio::test]
    async fn test_cancel_is_reported_not_raised() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine);
        let (handle, signal) = cancel_pair();

        let args = json!({ "uri": "src/a.rs", "line": 1, "maxTokens": 0 });
        let call = tools.call_tool("codegraph_get_ai_context", &args, &signal);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        };
        let (result, _) = tokio::join!(call, cancel);

        assert!(result.is_error());
        assert!(result.as_text().contains("Request cancelled"));
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());
        let never = CancelSignal::never();

        let first = json!({ "uri": "file:///work/one.rs", "line": 5 });
        let second = json!({ "uri": "file:///work/two.rs", "line": 9 });
        let (a, b) = tokio::join!(
            tools.call_tool("codegraph_get_call_graph", &first, &never),
            tools.call_tool("codegraph_get_symbol_info", &second, &never),
        );

        assert!(a.as_text().contains("fn_at_line_5"));
        assert!(a.as_text().contains("/work/one.rs"));
        assert!(!a.as_text().contains("two.rs"));
        assert!(b.as_text().contains("symbol in file:///work/two.rs"));
        assert!(!b.as_text().contains("one.rs"));
        assert_eq!(engine.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_dispose_releases_all_tools() {
        let mut tools = facade(Arc::new(FakeEngine::default()));
        assert_eq!(tools.registrations().len(), 8);

        tools.dispose();
        assert!(tools.is_disposed());
        assert!(tools.list_tools().is_empty());

        let result = tools
            .call_tool("codegraph_get_parser_metrics", &Value::Null, &CancelSignal::never())
            .await;
        assert!(result.is_error());
        assert!(result.as_text().starts_with("Unknown tool: codegraph_get_parser_metrics"));
    }

    #[test]
    fn test_preparing_message() {
        let tools = facade(Arc::new(FakeEngine::default()));
        assert_eq!(
            tools
                .preparing_message(
                    "codegraph_analyze_impact",
                    &json!({ "uri": "src/lib.rs", "line": 9, "changeType": "rename" })
                )
                .as_deref(),
            Some("Analyzing the impact of a rename at `/work/src/lib.rs:10`...")
        );
        assert_eq!(
            tools
                .preparing_message("codegraph_get_parser_metrics", &Value::Null)
                .as_deref(),
            Some("Collecting parser metrics...")
        );
        assert!(tools
            .preparing_message("codegraph_get_call_graph", &json!({}))
            .is_none());
        assert!(tools.preparing_message("nope", &json!({})).is_none());
    }

    #[tokio::test]
    async fn test_parser_metrics_without_arguments() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());
        let result = tools
            .call_tool(
                "codegraph_get_parser_metrics",
                &json!({ "language": "" }),
                &CancelSignal::never(),
            )
            .await;
        assert!(!result.is_error());
        assert!(result.as_text().contains("No parser metrics available."));
        assert_eq!(engine.last(), json!({}));
    }

    #[tokio::test]
    async fn test_reindex_workspace() {
        let engine = Arc::new(FakeEngine::default());
        let tools = facade(engine.clone());
        assert_eq!(
            tools
                .preparing_message("codegraph_reindex_workspace", &Value::Null)
                .as_deref(),
            Some("Reindexing the workspace...")
        );

        let result = tools
            .call_tool("codegraph_reindex_workspace", &json!({}), &CancelSignal::never())
            .await;
        assert!(!result.is_error());
        assert!(result.as_text().contains("Workspace reindexed"));
        assert_eq!(engine.last(), json!("reindex"));

        let failing = facade(Arc::new(FakeEngine::failing("server exited", None)));
        let result = failing
            .call_tool("codegraph_reindex_workspace", &Value::Null, &CancelSignal::never())
            .await;
        assert!(result.is_error());
        assert!(result.as_text().starts_with("# Reindex Workspace failed"));
    }

    #[tokio::test]
    async fn test_parser_metrics_guidance_lists_three_causes() {
        let tools = facade(Arc::new(FakeEngine::failing(
            "nothing",
            Some(json!({ "kind": "symbol_not_found" })),
        )));
        let result = tools
            .call_tool(
                "codegraph_get_parser_metrics",
                &json!({ "language": "cobol" }),
                &CancelSignal::never(),
            )
            .await;
        let text = result.as_text();
        assert!(text.starts_with("# Parser Metrics: no parser data found"));
        assert!(text.contains("1. The workspace has not been indexed yet"));
        assert!(text.contains("2. The `language` filter names no registered parser"));
        assert!(text.contains("3. The file's language is not supported"));
        assert!(text.contains("- Check the `language` name"));
    }
}
