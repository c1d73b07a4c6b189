//! CodeGraph bridge CLI — run one analysis and print its report.
//!
//! Usage:
//!   codegraph-bridge deps <file>                 # Import graph around a file
//!   codegraph-bridge calls <file> <line>         # Callers and callees
//!   codegraph-bridge impact <file> <line>        # What a change would break
//!   codegraph-bridge context <file> <line>       # Source plus related context
//!   codegraph-bridge tests <file> [--line N]     # Related tests
//!   codegraph-bridge symbol <file> <line>        # Docs, definition, references
//!   codegraph-bridge metrics                     # Parser statistics

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use codegraph_bridge::cli::Cli;
use codegraph_bridge::config::LogConfig;
use codegraph_bridge::lsp::cancel_pair;
use codegraph_bridge::{BridgeConfig, LspClient, LspEngine, ToolFacade};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("workspace root {} not found", cli.root.display()))?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| BridgeConfig::default_path(&root));
    let loaded = BridgeConfig::try_load(&config_path);
    let filter = match &loaded {
        Ok(Some(config)) => config.log.filter.clone(),
        _ => LogConfig::default().filter,
    };

    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .init();

    let config = BridgeConfig::from_loaded(&config_path, loaded);

    let client = LspClient::spawn(&config.server.command, &config.server.args, &root).await?;
    let engine = Arc::new(LspEngine::new(client));
    let mut tools = ToolFacade::new(engine.clone(), config.defaults, &root);

    // Ctrl-C cancels the in-flight request instead of killing the process
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupted, cancelling request");
            handle.cancel();
        }
    });

    let (operation, arguments) = cli.command.tool_call();
    let result = tools
        .call_tool(operation.tool_name(), &arguments, &signal)
        .await;

    tools.dispose();
    engine.shutdown().await;

    println!("{}", result.as_text().trim_end());
    Ok(if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
