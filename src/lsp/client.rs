//! JSON-RPC client for a language server running as a child process.
//!
//! One reader task routes replies to waiting callers by request id; one
//! writer task owns the server's stdin. Any number of requests may be in
//! flight at once, each with its own cancellation signal.
//!
//! The server only indexes documents it has been told about, so the client
//! opens each file (`textDocument/didOpen`) before the first request on it.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lsp_types::{
    ClientCapabilities, ClientInfo, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializedParams, TextDocumentIdentifier, TextDocumentItem, Url,
    WorkspaceFolder,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::cancel::CancelSignal;
use super::codec;
use crate::error::{BridgeError, DispatchError};

type Reply = Result<Value, DispatchError>;

#[derive(Default)]
struct PendingMap {
    waiting: HashMap<i64, oneshot::Sender<Reply>>,
    /// Set once the reader stops; later requests fail immediately.
    closed: Option<String>,
}

#[derive(Clone, Default)]
struct Pending(Arc<Mutex<PendingMap>>);

impl Pending {
    fn lock(&self) -> MutexGuard<'_, PendingMap> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self, id: i64) -> Result<oneshot::Receiver<Reply>, DispatchError> {
        let mut map = self.lock();
        if let Some(reason) = &map.closed {
            return Err(DispatchError::ServerClosed(reason.clone()));
        }
        let (tx, rx) = oneshot::channel();
        map.waiting.insert(id, tx);
        Ok(rx)
    }

    fn remove(&self, id: i64) -> Option<oneshot::Sender<Reply>> {
        self.lock().waiting.remove(&id)
    }

    fn close_all(&self, reason: &str) {
        let mut map = self.lock();
        map.closed = Some(reason.to_string());
        for (_, tx) in map.waiting.drain() {
            let _ = tx.send(Err(DispatchError::ServerClosed(reason.to_string())));
        }
    }

    fn len(&self) -> usize {
        self.lock().waiting.len()
    }
}

/// Client side of an LSP connection.
pub struct LspClient {
    outgoing: mpsc::UnboundedSender<Value>,
    pending: Pending,
    next_id: AtomicI64,
    child: tokio::sync::Mutex<Option<Child>>,
    /// Documents already sent with `textDocument/didOpen`.
    opened: tokio::sync::Mutex<HashSet<Url>>,
    tasks: Vec<JoinHandle<()>>,
}

impl LspClient {
    /// Start `command` with `args`, wire its stdio and run the
    /// `initialize`/`initialized` handshake for `root`.
    pub async fn spawn(command: &str, args: &[String], root: &Path) -> crate::Result<Self> {
        info!(command, ?args, root = %root.display(), "starting language server");

        let mut child = Command::new(command)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe(command, "stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe(command, "stdout"))?;
        let stderr = child.stderr.take();

        let mut client = Self::connect(stdout, stdin);
        if let Some(stderr) = stderr {
            client.tasks.push(tokio::spawn(forward_stderr(stderr)));
        }
        *client.child.get_mut() = Some(child);

        client.initialize(root).await?;
        Ok(client)
    }

    /// Build a client over an arbitrary reader/writer pair. No handshake.
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (outgoing, rx) = mpsc::unbounded_channel();
        let pending = Pending::default();

        let writer_task = tokio::spawn(run_write_loop(writer, rx));
        let reader_task = tokio::spawn(run_read_loop(
            BufReader::new(reader),
            pending.clone(),
            outgoing.clone(),
        ));

        Self {
            outgoing,
            pending,
            next_id: AtomicI64::new(1),
            child: tokio::sync::Mutex::new(None),
            opened: tokio::sync::Mutex::new(HashSet::new()),
            tasks: vec![writer_task, reader_task],
        }
    }

    /// LSP handshake: `initialize` request, then `initialized` notification.
    pub async fn initialize(&self, root: &Path) -> Result<(), DispatchError> {
        let root_uri = Url::from_file_path(root).ok();
        let folders = root_uri.clone().map(|uri| {
            vec![WorkspaceFolder {
                uri,
                name: root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "workspace".to_string()),
            }]
        });

        #[allow(deprecated)]
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri,
            workspace_folders: folders,
            capabilities: ClientCapabilities::default(),
            client_info: Some(ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        };

        let result = self
            .request("initialize", serde_json::to_value(params)?, &CancelSignal::never())
            .await?;
        debug!(capabilities = %result, "language server initialized");

        self.notify("initialized", serde_json::to_value(InitializedParams {})?)
    }

    /// Send a request and wait for its reply, or for `cancel` to fire.
    pub async fn request(
        &self,
        method: &str,
        params: Value,
        cancel: &CancelSignal,
    ) -> Result<Value, DispatchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rx = self.pending.register(id)?;

        debug!(id, method, "sending request");
        let message = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        if self.outgoing.send(message).is_err() {
            self.pending.remove(id);
            return Err(DispatchError::ServerClosed("writer stopped".to_string()));
        }

        let mut cancel = cancel.clone();
        tokio::select! {
            reply = rx => match reply {
                Ok(reply) => reply,
                Err(_) => Err(DispatchError::ServerClosed("reply dropped".to_string())),
            },
            _ = cancel.cancelled() => {
                self.pending.remove(id);
                debug!(id, method, "request cancelled");
                let _ = self.notify("$/cancelRequest", json!({ "id": id }));
                Err(DispatchError::Cancelled)
            }
        }
    }

    pub fn notify(&self, method: &str, params: Value) -> Result<(), DispatchError> {
        let message = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        self.outgoing
            .send(message)
            .map_err(|_| DispatchError::ServerClosed("writer stopped".to_string()))
    }

    /// Send `textDocument/didOpen` for `uri` with its text from disk, once.
    ///
    /// Non-file URIs and unreadable files are left alone; the server then
    /// answers from whatever it already has.
    pub async fn open_document(&self, uri: &Url) -> Result<(), DispatchError> {
        if uri.scheme() != "file" {
            return Ok(());
        }
        // Held across the read so a concurrent request on the same document
        // cannot overtake the didOpen.
        let mut opened = self.opened.lock().await;
        if opened.contains(uri) {
            return Ok(());
        }
        let Ok(path) = uri.to_file_path() else {
            return Ok(());
        };
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                debug!(%uri, error = %e, "cannot read document, not opening it");
                return Ok(());
            }
        };

        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(uri.clone(), language_id(&path).to_string(), 1, text),
        };
        self.notify("textDocument/didOpen", serde_json::to_value(params)?)?;
        debug!(%uri, "opened document");
        opened.insert(uri.clone());
        Ok(())
    }

    /// Close every open document, so the next request on each sends its
    /// text again.
    pub async fn close_documents(&self) -> Result<(), DispatchError> {
        let mut opened = self.opened.lock().await;
        debug!(count = opened.len(), "closing documents");
        for uri in opened.drain() {
            let params = DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri },
            };
            self.notify("textDocument/didClose", serde_json::to_value(params)?)?;
        }
        Ok(())
    }

    /// Number of documents sent with `textDocument/didOpen`.
    pub async fn open_documents(&self) -> usize {
        self.opened.lock().await.len()
    }

    /// Number of requests still waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Polite shutdown: `shutdown` request, `exit` notification, reap the child.
    pub async fn shutdown(&self) {
        if let Err(e) = self
            .request("shutdown", Value::Null, &CancelSignal::never())
            .await
        {
            warn!(error = %e, "shutdown request failed");
        }
        let _ = self.notify("exit", Value::Null);

        let mut child = self.child.lock().await;
        if let Some(mut child) = child.take() {
            let waited =
                tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await;
            match waited {
                Ok(Ok(status)) => info!(%status, "language server exited"),
                Ok(Err(e)) => warn!(error = %e, "failed to wait for language server"),
                Err(_) => {
                    warn!("language server did not exit, killing it");
                    let _ = child.kill().await;
                }
            }
        }
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// LSP language identifier for a file, from its extension.
pub fn language_id(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "rs" => "rust",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "py" | "pyi" => "python",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        _ => "plaintext",
    }
}

fn missing_pipe(command: &str, which: &str) -> BridgeError {
    BridgeError::Spawn {
        command: command.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, format!("no {which} pipe")),
    }
}

async fn run_write_loop<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = codec::write_message(&mut writer, &message).await {
            warn!(error = %e, "failed to write to language server");
            break;
        }
    }
}

/// Fails every waiting and later request once the reader stops, however it
/// stops.
struct CloseOnExit {
    pending: Pending,
    reason: String,
}

impl Drop for CloseOnExit {
    fn drop(&mut self) {
        self.pending.close_all(&self.reason);
    }
}

async fn run_read_loop<R: tokio::io::AsyncBufRead + Unpin>(
    mut reader: R,
    pending: Pending,
    outgoing: mpsc::UnboundedSender<Value>,
) {
    let mut exit = CloseOnExit {
        pending,
        reason: "language server reader stopped".to_string(),
    };
    let reason = loop {
        let message = match codec::read_message(&mut reader).await {
            Ok(Some(m)) => m,
            Ok(None) => break "language server closed its output".to_string(),
            Err(e) => {
                warn!(error = %e, "failed to read from language server");
                break format!("read error: {e}");
            }
        };
        route_message(message, &exit.pending, &outgoing);
    };
    info!(%reason, "language server connection closed");
    exit.reason = reason;
}

fn route_message(message: Value, pending: &Pending, outgoing: &mpsc::UnboundedSender<Value>) {
    let method = message.get("method").and_then(Value::as_str);
    let id = message.get("id").cloned();

    match (method, id) {
        // Reply to one of our requests.
        (None, Some(id)) => {
            let Some(id) = id.as_i64() else {
                warn!(%id, "reply with non-numeric id");
                return;
            };
            let Some(tx) = pending.remove(id) else {
                debug!(id, "reply for unknown or cancelled request");
                return;
            };
            let reply = match message.get("error") {
                Some(error) => Err(remote_error(error)),
                None => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
            };
            let _ = tx.send(reply);
        }
        // Server-to-client request. Nothing here needs a real answer.
        (Some(method), Some(id)) => {
            debug!(method, %id, "answering server request with null");
            let _ = outgoing.send(json!({ "jsonrpc": "2.0", "id": id, "result": null }));
        }
        (Some(method), None) => {
            if method == "window/logMessage" || method == "window/showMessage" {
                let text = message
                    .pointer("/params/message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                debug!(method, message = text, "server message");
            } else {
                debug!(method, "server notification");
            }
        }
        (None, None) => warn!(%message, "unroutable message from language server"),
    }
}

fn remote_error(error: &Value) -> DispatchError {
    DispatchError::Remote {
        code: error.get("code").and_then(Value::as_i64).unwrap_or(-32603),
        message: error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
        data: error.get("data").cloned().filter(|d| !d.is_null()),
    }
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "codegraph_lsp", "{}", line);
    }
}
