//! The analysis-engine seam.
//!
//! [`AnalysisEngine`] is what the tool façade talks to. [`LspEngine`] is the
//! real implementation: every capability is one request to the CodeGraph
//! language server, either a `workspace/executeCommand` or a standard
//! `textDocument/*` request. The document a request is about is opened on
//! the server first.

use async_trait::async_trait;
use lsp_types::{
    ExecuteCommandParams, GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverParams,
    Location, PartialResultParams, Position, ReferenceContext, ReferenceParams,
    TextDocumentIdentifier, TextDocumentPositionParams, Url, WorkDoneProgressParams,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::cancel::CancelSignal;
use super::client::LspClient;
use crate::error::DispatchError;
use crate::params::{
    AiContextRequest, CallGraphRequest, DependencyGraphRequest, ImpactRequest,
    ParserMetricsRequest, SymbolRequest,
};
use crate::schema::{
    AiContextResponse, CallGraphResponse, DependencyGraphResponse, ImpactAnalysisResponse,
    ParserMetricsResponse, SymbolInfo,
};

/// Remote procedure names understood by the CodeGraph server.
pub mod commands {
    pub const DEPENDENCY_GRAPH: &str = "codegraph.getDependencyGraph";
    pub const CALL_GRAPH: &str = "codegraph.getCallGraph";
    pub const ANALYZE_IMPACT: &str = "codegraph.analyzeImpact";
    pub const AI_CONTEXT: &str = "codegraph.getAIContext";
    pub const PARSER_METRICS: &str = "codegraph.getParserMetrics";
    pub const REINDEX_WORKSPACE: &str = "codegraph.reindexWorkspace";
}

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn dependency_graph(
        &self,
        request: &DependencyGraphRequest,
        cancel: &CancelSignal,
    ) -> Result<DependencyGraphResponse, DispatchError>;

    async fn call_graph(
        &self,
        request: &CallGraphRequest,
        cancel: &CancelSignal,
    ) -> Result<CallGraphResponse, DispatchError>;

    async fn analyze_impact(
        &self,
        request: &ImpactRequest,
        cancel: &CancelSignal,
    ) -> Result<ImpactAnalysisResponse, DispatchError>;

    async fn ai_context(
        &self,
        request: &AiContextRequest,
        cancel: &CancelSignal,
    ) -> Result<AiContextResponse, DispatchError>;

    async fn symbol_info(
        &self,
        request: &SymbolRequest,
        cancel: &CancelSignal,
    ) -> Result<SymbolInfo, DispatchError>;

    async fn parser_metrics(
        &self,
        request: &ParserMetricsRequest,
        cancel: &CancelSignal,
    ) -> Result<ParserMetricsResponse, DispatchError>;

    /// Drop the engine's graph so every document is parsed again.
    async fn reindex_workspace(&self, cancel: &CancelSignal) -> Result<(), DispatchError>;
}

/// [`AnalysisEngine`] backed by a live language server.
pub struct LspEngine {
    client: LspClient,
}

impl LspEngine {
    pub fn new(client: LspClient) -> Self {
        Self { client }
    }

    pub async fn shutdown(&self) {
        self.client.shutdown().await;
    }

    async fn execute<A, T>(&self, command: &str, args: &A, cancel: &CancelSignal) -> Result<T, DispatchError>
    where
        A: Serialize + Sync,
        T: DeserializeOwned,
    {
        let params = ExecuteCommandParams {
            command: command.to_string(),
            arguments: vec![serde_json::to_value(args)?],
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        debug!(command, "executing engine command");
        let value = self
            .client
            .request("workspace/executeCommand", serde_json::to_value(params)?, cancel)
            .await?;
        decode_result(command, value)
    }

    /// Make sure the server has `uri` open. Unparseable URIs are left for
    /// the server to reject.
    async fn open(&self, uri: &str) -> Result<(), DispatchError> {
        match Url::parse(uri) {
            Ok(url) => self.client.open_document(&url).await,
            Err(_) => Ok(()),
        }
    }

    async fn text_document<P, T>(&self, method: &str, params: P, cancel: &CancelSignal) -> Result<Option<T>, DispatchError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let value = self
            .client
            .request(method, serde_json::to_value(params)?, cancel)
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }
}

#[async_trait]
impl AnalysisEngine for LspEngine {
    async fn dependency_graph(
        &self,
        request: &DependencyGraphRequest,
        cancel: &CancelSignal,
    ) -> Result<DependencyGraphResponse, DispatchError> {
        self.open(&request.uri).await?;
        self.execute(commands::DEPENDENCY_GRAPH, request, cancel).await
    }

    async fn call_graph(
        &self,
        request: &CallGraphRequest,
        cancel: &CancelSignal,
    ) -> Result<CallGraphResponse, DispatchError> {
        self.open(&request.uri).await?;
        self.execute(commands::CALL_GRAPH, request, cancel).await
    }

    async fn analyze_impact(
        &self,
        request: &ImpactRequest,
        cancel: &CancelSignal,
    ) -> Result<ImpactAnalysisResponse, DispatchError> {
        self.open(&request.uri).await?;
        self.execute(commands::ANALYZE_IMPACT, request, cancel).await
    }

    async fn ai_context(
        &self,
        request: &AiContextRequest,
        cancel: &CancelSignal,
    ) -> Result<AiContextResponse, DispatchError> {
        self.open(&request.uri).await?;
        self.execute(commands::AI_CONTEXT, request, cancel).await
    }

    async fn symbol_info(
        &self,
        request: &SymbolRequest,
        cancel: &CancelSignal,
    ) -> Result<SymbolInfo, DispatchError> {
        let position = text_position(&request.uri, request.position)?;
        self.client.open_document(&position.text_document.uri).await?;

        let hover_params = HoverParams {
            text_document_position_params: position.clone(),
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        let definition_params = GotoDefinitionParams {
            text_document_position_params: position.clone(),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        let reference_params = ReferenceParams {
            text_document_position: position,
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration: false,
            },
        };

        let (hover, definition, references) = tokio::join!(
            self.text_document::<_, Hover>("textDocument/hover", hover_params, cancel),
            self.text_document::<_, GotoDefinitionResponse>(
                "textDocument/definition",
                definition_params,
                cancel
            ),
            self.text_document::<_, Vec<Location>>("textDocument/references", reference_params, cancel),
        );

        Ok(SymbolInfo::from_lsp(hover?, definition?, references?))
    }

    async fn parser_metrics(
        &self,
        request: &ParserMetricsRequest,
        cancel: &CancelSignal,
    ) -> Result<ParserMetricsResponse, DispatchError> {
        self.execute(commands::PARSER_METRICS, request, cancel).await
    }

    async fn reindex_workspace(&self, cancel: &CancelSignal) -> Result<(), DispatchError> {
        let params = ExecuteCommandParams {
            command: commands::REINDEX_WORKSPACE.to_string(),
            arguments: Vec::new(),
            work_done_progress_params: WorkDoneProgressParams::default(),
        };
        debug!(command = commands::REINDEX_WORKSPACE, "executing engine command");
        self.client
            .request("workspace/executeCommand", serde_json::to_value(params)?, cancel)
            .await?;
        // The engine forgot every document; send them again on next use.
        self.client.close_documents().await
    }
}

fn text_position(uri: &str, position: Position) -> Result<TextDocumentPositionParams, DispatchError> {
    let uri = Url::parse(uri).map_err(|e| DispatchError::Remote {
        code: -32602,
        message: format!("Invalid URI {uri}: {e}"),
        data: None,
    })?;
    Ok(TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri },
        position,
    })
}

fn decode_result<T: DeserializeOwned>(command: &str, value: Value) -> Result<T, DispatchError> {
    if value.is_null() {
        return Err(DispatchError::NoResult(command.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}
