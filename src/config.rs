use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{LspError, Result};

/// Server name reported to clients and used as the log message prefix
pub const SERVER_NAME: &str = "sitter-lsp";

/// Directory names skipped by the workspace walk unless the client overrides them
pub const DEFAULT_EXCLUDE_DIRS: [&str; 4] = [".git", "build", "vendor", "contrib"];

/// Directory holding the default log file, resolved from the process
/// environment
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Default log destination when `--log-file` is not given
pub fn log_path() -> PathBuf {
    data_dir().join("sitter-lsp.log")
}

/// `<base>/sitter-lsp`, where base is the first of: a non-empty
/// `xdg_data_home`, `<home_dir>/.local/share`, the working directory.
fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(SERVER_NAME)
}

/// Options a client may pass as `initializationOptions`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Directory names the workspace walk does not descend into
    pub exclude_dirs: Vec<String>,
    /// Push syntax diagnostics after every open and change
    pub publish_diagnostics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|d| d.to_string()).collect(),
            publish_diagnostics: true,
        }
    }
}

impl ServerConfig {
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Result<Self> {
        match options {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                LspError::InvalidParams(format!("malformed initializationOptions: {}", e))
            }),
        }
    }
}
