//! Bridge configuration, loaded from `.codegraph/bridge.toml`.
//!
//! Every table and key is optional. A missing file gives the built-in
//! defaults; a malformed one is reported and ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::params::ToolDefaults;

/// Environment variable that overrides `[server] command`.
pub const SERVER_COMMAND_ENV: &str = "CODEGRAPH_LSP";

/// Config file location relative to the workspace root.
pub const CONFIG_FILE: &str = ".codegraph/bridge.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub defaults: ToolDefaults,
    pub log: LogConfig,
}

/// How to launch the CodeGraph language server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "codegraph-lsp".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Default config path for a workspace.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing or invalid. Environment overrides are applied last.
    pub fn load(path: &Path) -> Self {
        Self::from_loaded(path, Self::try_load(path))
    }

    /// Finish a [`BridgeConfig::try_load`] result: fall back to defaults on
    /// a missing or invalid file, then apply environment overrides.
    pub fn from_loaded(path: &Path, loaded: Result<Option<Self>>) -> Self {
        let config = match loaded {
            Ok(Some(config)) => {
                debug!(path = %path.display(), "loaded config");
                config
            }
            Ok(None) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "ignoring config file, using defaults");
                Self::default()
            }
        };
        config.with_env_overrides(std::env::var(SERVER_COMMAND_ENV).ok())
    }

    /// Read and parse `path`. `Ok(None)` when the file does not exist.
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
            .map(Some)
            .map_err(|message| BridgeError::Config {
                path: path.display().to_string(),
                message,
            })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Apply an override for the server command, ignoring blank values.
    pub fn with_env_overrides(mut self, server_command: Option<String>) -> Self {
        if let Some(command) = server_command.filter(|c| !c.trim().is_empty()) {
            debug!(command = %command, "server command overridden by {}", SERVER_COMMAND_ENV);
            self.server.command = command;
        }
        self
    }
}
