//! MCP JSON-RPC 2.0 server — reads requests from stdin, writes responses to stdout.
//!
//! The MCP protocol uses newline-delimited JSON over STDIO.
//! Tracing output goes to stderr so it doesn't interfere with the protocol.
//!
//! Each `tools/call` runs in its own task, so a slow analysis never holds up
//! other requests. Responses from all tasks funnel through one writer task.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::tools::ToolFacade;
use super::types::*;
use crate::lsp::{cancel_pair, CancelHandle};

/// Cancel handles of in-flight tool calls, keyed by the JSON text of the request id.
type InFlight = Arc<Mutex<HashMap<String, CancelHandle>>>;

/// Run the MCP server on the process's stdin/stdout until stdin closes.
pub async fn run(facade: ToolFacade) -> io::Result<()> {
    serve(facade, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Run the MCP server loop over any byte streams.
///
/// Returns once `reader` hits EOF and every in-flight call has answered.
/// The façade's registrations are released on the way out.
pub async fn serve<R, W>(facade: ToolFacade, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    info!("MCP server starting");

    let (outgoing, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let mut server = Server {
        facade: Arc::new(facade),
        outgoing,
        in_flight: Arc::new(Mutex::new(HashMap::new())),
        tasks: JoinSet::new(),
    };

    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(joined) = server.tasks.join_next(), if !server.tasks.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "tool task failed");
                }
                continue;
            }
        };
        match line {
            Some(line) => server.handle_line(&line),
            None => break,
        }
    }

    info!(pending = server.tasks.len(), "stdin closed, draining in-flight calls");
    while let Some(joined) = server.tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "tool task failed");
        }
    }

    let Server {
        facade, outgoing, ..
    } = server;
    drop(outgoing);
    match Arc::try_unwrap(facade) {
        Ok(mut facade) => facade.dispose(),
        Err(_) => warn!("tool façade still shared at shutdown"),
    }

    match writer_task.await {
        Ok(result) => result?,
        Err(e) => error!(error = %e, "writer task failed"),
    }
    info!("MCP server shutting down");
    Ok(())
}

struct Server {
    facade: Arc<ToolFacade>,
    outgoing: mpsc::UnboundedSender<JsonRpcResponse>,
    in_flight: InFlight,
    tasks: JoinSet<()>,
}

impl Server {
    fn handle_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        debug!(request = %trimmed, "received request");

        let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                self.send(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
                return;
            }
        };

        match request.method.as_str() {
            "tools/call" => self.spawn_call(request),
            "notifications/cancelled" => self.cancel(&request.params),
            _ => {
                if let Some(response) = handle_request(&self.facade, &request) {
                    self.send(response);
                }
            }
        }
    }

    fn send(&self, response: JsonRpcResponse) {
        if self.outgoing.send(response).is_err() {
            warn!("writer closed, dropping response");
        }
    }

    fn spawn_call(&mut self, request: JsonRpcRequest) {
        let Some(id) = request.id else {
            warn!("tools/call sent as a notification, ignoring");
            return;
        };

        let params: ToolsCallParams = match serde_json::from_value(request.params) {
            Ok(p) => p,
            Err(e) => {
                self.send(JsonRpcResponse::error(
                    Some(id),
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ));
                return;
            }
        };

        debug!(tool = %params.name, "calling tool");

        let key = id.to_string();
        let (handle, signal) = cancel_pair();
        lock(&self.in_flight).insert(key.clone(), handle);

        let facade = Arc::clone(&self.facade);
        let in_flight = Arc::clone(&self.in_flight);
        let outgoing = self.outgoing.clone();
        self.tasks.spawn(async move {
            let result = facade
                .call_tool(&params.name, &params.arguments, &signal)
                .await;
            lock(&in_flight).remove(&key);

            if signal.is_cancelled() {
                debug!(id = %key, "call was cancelled, no response sent");
                return;
            }
            if outgoing
                .send(JsonRpcResponse::from_result(Some(id), &result))
                .is_err()
            {
                warn!("writer closed, dropping response");
            }
        });
    }

    fn cancel(&self, params: &Value) {
        let params: CancelledParams = match serde_json::from_value(params.clone()) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "malformed cancellation");
                return;
            }
        };
        let key = params.request_id.to_string();
        match lock(&self.in_flight).get(&key) {
            Some(handle) => {
                info!(id = %key, reason = ?params.reason, "cancelling tool call");
                handle.cancel();
            }
            None => debug!(id = %key, "cancellation for unknown or finished request"),
        }
    }
}

fn lock(in_flight: &InFlight) -> std::sync::MutexGuard<'_, HashMap<String, CancelHandle>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle a request that does not touch the engine. Returns `None` for
/// notifications.
fn handle_request(facade: &ToolFacade, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = request.id.clone();

    match request.method.as_str() {
        "initialize" => {
            info!("client initializing");
            let result = InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: ToolCapability {},
                },
                server_info: ServerInfo {
                    name: "codegraph-bridge".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            };
            Some(JsonRpcResponse::from_result(id, &result))
        }

        "notifications/initialized" => {
            info!("client initialized");
            None
        }

        "tools/list" => {
            debug!("listing tools");
            let result = ToolsListResult {
                tools: facade.list_tools(),
            };
            Some(JsonRpcResponse::from_result(id, &result))
        }

        "ping" => Some(JsonRpcResponse::success(
            id,
            Value::Object(Default::default()),
        )),

        _ if id.is_none() => {
            debug!(method = %request.method, "ignoring notification");
            None
        }

        _ => {
            warn!(method = %request.method, "unknown method");
            Some(JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ))
        }
    }
}

/// Write responses as newline-delimited JSON until every sender is gone.
async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut json = serde_json::to_string(&response)?;
        debug!(response = %json, "sending response");
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
