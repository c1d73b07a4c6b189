//! # CodeGraph Bridge
//!
//! Code intelligence for AI agents, served from an external CodeGraph
//! language server.
//!
//! The bridge owns no analysis of its own. It forwards each question to the
//! engine over LSP, decodes the typed reply and renders it as a markdown
//! report an agent can read.
//!
//! ## Layers
//!
//! - [`mcp`]: MCP tools and the STDIO JSON-RPC server (the tool façade)
//! - [`params`]: caller inputs and default policy
//! - [`lsp`]: request dispatcher talking to the engine
//! - [`schema`]: typed engine responses
//! - [`format`]: markdown reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codegraph_bridge::{LspClient, LspEngine, ToolDefaults, ToolFacade};
//! use codegraph_bridge::lsp::CancelSignal;
//! use serde_json::json;
//!
//! # async fn demo() -> codegraph_bridge::Result<()> {
//! let root = std::path::Path::new(".");
//! let client = LspClient::spawn("codegraph-lsp", &[], root).await?;
//! let tools = ToolFacade::new(Arc::new(LspEngine::new(client)), ToolDefaults::default(), root);
//!
//! let report = tools
//!     .call_tool(
//!         "codegraph_get_call_graph",
//!         &json!({ "uri": "src/main.rs", "line": 10 }),
//!         &CancelSignal::never(),
//!     )
//!     .await;
//! println!("{}", report.as_text());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod lsp;
pub mod mcp;
pub mod params;
pub mod schema;

// Re-exports for convenience
pub use config::BridgeConfig;
pub use error::{BridgeError, DispatchError, Result};
pub use lsp::{AnalysisEngine, LspClient, LspEngine};
pub use mcp::ToolFacade;
pub use params::ToolDefaults;
