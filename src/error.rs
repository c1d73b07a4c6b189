//! Error types for the bridge.
//!
//! `DispatchError` covers everything that can go wrong between the tool
//! façade and the external language server. `BridgeError` covers local
//! setup: configuration, process spawning, I/O.

use serde_json::Value;
use thiserror::Error;

/// Failure of a single request to the analysis engine.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The engine answered with a JSON-RPC error. The message is kept verbatim.
    #[error("{message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The caller cancelled the request before a reply arrived.
    #[error("Request cancelled")]
    Cancelled,

    /// The server process went away (stdout closed, process exited).
    #[error("Language server is not running: {0}")]
    ServerClosed(String),

    /// The engine replied with `null` where a result was expected.
    #[error("Language server returned no result for {0}")]
    NoResult(String),

    /// The reply arrived but did not match the expected shape.
    #[error("Invalid response from language server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Structured error kind attached by the engine in `error.data.kind`, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            DispatchError::Remote {
                data: Some(data), ..
            } => data.get("kind").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Errors raised while setting up the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid config {path}: {message}")]
    Config { path: String, message: String },

    #[error("Failed to start language server `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Language server handshake failed: {0}")]
    Handshake(#[from] DispatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_error_displays_message_verbatim() {
        let err = DispatchError::Remote {
            code: -32602,
            message: "No symbol at position".to_string(),
            data: None,
        };
        assert_eq!(err.to_string(), "No symbol at position");
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_structured_kind() {
        let err = DispatchError::Remote {
            code: -32602,
            message: "whatever".to_string(),
            data: Some(json!({ "kind": "symbol_not_found" })),
        };
        assert_eq!(err.kind(), Some("symbol_not_found"));
        assert_eq!(DispatchError::Cancelled.kind(), None);
    }
}
