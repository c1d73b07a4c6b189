//! CodeGraph MCP server — code intelligence for AI agents.
//!
//! Runs a JSON-RPC 2.0 server over STDIO that exposes the CodeGraph language
//! server's analyses through the Model Context Protocol (MCP).
//!
//! Usage:
//!   codegraph-mcp [workspace_root]
//!
//! If no workspace root is given, uses the current working directory.
//! Config is read from `<root>/.codegraph/bridge.toml`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use codegraph_bridge::config::LogConfig;
use codegraph_bridge::{BridgeConfig, LspClient, LspEngine, ToolFacade};

#[tokio::main]
async fn main() -> Result<()> {
    // Determine workspace root
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = root
        .canonicalize()
        .with_context(|| format!("workspace root {} not found", root.display()))?;

    let config_path = BridgeConfig::default_path(&root);
    let loaded = BridgeConfig::try_load(&config_path);
    let filter = match &loaded {
        Ok(Some(config)) => config.log.filter.clone(),
        _ => LogConfig::default().filter,
    };

    // Initialize tracing to stderr (MCP uses stdout for protocol)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .init();

    let config = BridgeConfig::from_loaded(&config_path, loaded);
    info!(root = %root.display(), server = %config.server.command, "CodeGraph MCP server starting");

    let client = LspClient::spawn(&config.server.command, &config.server.args, &root).await?;
    let engine = Arc::new(LspEngine::new(client));
    let tools = ToolFacade::new(engine.clone(), config.defaults, &root);

    info!("MCP server ready — waiting for JSON-RPC requests on stdin");

    // Run the MCP server loop (returns when stdin closes)
    if let Err(e) = codegraph_bridge::mcp::server::run(tools).await {
        warn!(error = %e, "MCP transport failed");
    }

    engine.shutdown().await;
    info!("language server stopped");
    Ok(())
}
