//! Command-line interface for the bridge.
//!
//! Each subcommand maps to one MCP tool and prints the same report the tool
//! returns. Options left out fall through to the configured defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::mcp::Operation;

#[derive(Parser, Debug)]
#[command(name = "codegraph-bridge")]
#[command(about = "Code intelligence for AI agents, backed by the CodeGraph language server")]
#[command(version)]
pub struct Cli {
    /// Workspace root (default: current directory)
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: <root>/.codegraph/bridge.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── File-level ─────────────────────────────────────────────────
    /// Show the import graph around a file
    Deps {
        /// File path or URI
        uri: String,

        /// Levels of dependencies to follow
        #[arg(short, long)]
        depth: Option<u32>,

        /// Include external packages
        #[arg(long)]
        include_external: bool,

        /// Which edges to follow
        #[arg(long, value_parser = ["imports", "importedBy", "both"])]
        direction: Option<String>,
    },

    // ─── Position-level ─────────────────────────────────────────────
    /// Show callers and callees of the function at a position
    Calls {
        uri: String,
        /// 0-indexed line
        line: u32,
        /// 0-indexed character
        #[arg(short, long)]
        character: Option<u32>,
        #[arg(short, long)]
        depth: Option<u32>,
        #[arg(long, value_parser = ["callers", "callees", "both"])]
        direction: Option<String>,
    },

    /// Show what a change to the symbol at a position would affect
    Impact {
        uri: String,
        line: u32,
        #[arg(short, long)]
        character: Option<u32>,
        /// The change to evaluate
        #[arg(long, value_parser = ["modify", "delete", "rename"])]
        change_type: Option<String>,
    },

    /// Gather source and related context for the symbol at a position
    Context {
        uri: String,
        line: u32,
        #[arg(short, long)]
        character: Option<u32>,
        #[arg(short, long, value_parser = ["explain", "modify", "debug", "test"])]
        intent: Option<String>,
        /// Token budget for the context
        #[arg(long)]
        max_tokens: Option<u32>,
    },

    /// Find tests related to the code at a position
    Tests {
        uri: String,
        #[arg(short, long)]
        line: Option<u32>,
    },

    /// Show documentation, definition and references of a symbol
    Symbol {
        uri: String,
        line: u32,
        #[arg(short, long)]
        character: Option<u32>,
    },

    // ─── Workspace-level ────────────────────────────────────────────
    /// Show parser statistics per language
    Metrics {
        /// Only report this language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Clear the server's code graph so files are parsed again
    Reindex,
}

impl Commands {
    /// The tool this command runs and its MCP arguments.
    pub fn tool_call(&self) -> (Operation, Value) {
        let mut args = Map::new();
        let operation = match self {
            Commands::Deps {
                uri,
                depth,
                include_external,
                direction,
            } => {
                put(&mut args, "uri", Some(uri.as_str()));
                put(&mut args, "depth", *depth);
                if *include_external {
                    put(&mut args, "includeExternal", Some(true));
                }
                put(&mut args, "direction", direction.as_deref());
                Operation::DependencyGraph
            }
            Commands::Calls {
                uri,
                line,
                character,
                depth,
                direction,
            } => {
                put_position(&mut args, uri, Some(*line), *character);
                put(&mut args, "depth", *depth);
                put(&mut args, "direction", direction.as_deref());
                Operation::CallGraph
            }
            Commands::Impact {
                uri,
                line,
                character,
                change_type,
            } => {
                put_position(&mut args, uri, Some(*line), *character);
                put(&mut args, "changeType", change_type.as_deref());
                Operation::AnalyzeImpact
            }
            Commands::Context {
                uri,
                line,
                character,
                intent,
                max_tokens,
            } => {
                put_position(&mut args, uri, Some(*line), *character);
                put(&mut args, "intent", intent.as_deref());
                put(&mut args, "maxTokens", *max_tokens);
                Operation::AiContext
            }
            Commands::Tests { uri, line } => {
                put_position(&mut args, uri, *line, None);
                Operation::RelatedTests
            }
            Commands::Symbol {
                uri,
                line,
                character,
            } => {
                put_position(&mut args, uri, Some(*line), *character);
                Operation::SymbolInfo
            }
            Commands::Metrics { language } => {
                put(&mut args, "language", language.as_deref());
                Operation::ParserMetrics
            }
            Commands::Reindex => Operation::ReindexWorkspace,
        };
        (operation, Value::Object(args))
    }
}

fn put<T: Into<Value>>(args: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        args.insert(key.to_string(), value.into());
    }
}

fn put_position(args: &mut Map<String, Value>, uri: &str, line: Option<u32>, character: Option<u32>) {
    put(args, "uri", Some(uri));
    put(args, "line", line);
    put(args, "character", character);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("codegraph-bridge").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_only_given_options_are_sent() {
        let cli = parse(&["calls", "src/lib.rs", "41"]);
        let (operation, args) = cli.command.tool_call();
        assert_eq!(operation, Operation::CallGraph);
        assert_eq!(args, json!({ "uri": "src/lib.rs", "line": 41 }));
    }

    #[test]
    fn test_options_map_to_tool_arguments() {
        let cli = parse(&[
            "--root", "/work", "context", "a.rs", "3", "-c", "7", "--intent", "debug",
            "--max-tokens", "900",
        ]);
        assert_eq!(cli.root, PathBuf::from("/work"));
        let (operation, args) = cli.command.tool_call();
        assert_eq!(operation, Operation::AiContext);
        assert_eq!(
            args,
            json!({ "uri": "a.rs", "line": 3, "character": 7, "intent": "debug", "maxTokens": 900 })
        );

        let (_, args) = parse(&["deps", "a.rs", "--include-external", "--direction", "importedBy"])
            .command
            .tool_call();
        assert_eq!(
            args,
            json!({ "uri": "a.rs", "includeExternal": true, "direction": "importedBy" })
        );
    }

    #[test]
    fn test_rejects_unknown_enum_values() {
        let result = Cli::try_parse_from(["codegraph-bridge", "impact", "a.rs", "1", "--change-type", "explode"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_metrics_without_language() {
        let (operation, args) = parse(&["metrics"]).command.tool_call();
        assert_eq!(operation, Operation::ParserMetrics);
        assert_eq!(args, json!({}));
    }

    #[test]
    fn test_reindex_takes_no_arguments() {
        let (operation, args) = parse(&["reindex"]).command.tool_call();
        assert_eq!(operation, Operation::ReindexWorkspace);
        assert_eq!(args, json!({}));
        assert!(Cli::try_parse_from(["codegraph-bridge", "reindex", "extra"]).is_err());
    }
}
