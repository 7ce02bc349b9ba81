use std::sync::OnceLock;

use tower_lsp::lsp_types::Url;

use crate::config::ServerConfig;
use crate::error::{LspError, Result};
use crate::lsp::client::Client;
use crate::parser::TreeStore;

/// Workspace facts learned from `initialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: Url,
    pub config: ServerConfig,
}

/// State shared by every handler invocation.
///
/// Built once per connection and handed to handlers by reference. The
/// workspace is recorded exactly once, by a successful `initialize`.
pub struct ServerContext {
    client: Client,
    trees: TreeStore,
    workspace: OnceLock<Workspace>,
}

impl ServerContext {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            trees: TreeStore::new(),
            workspace: OnceLock::new(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn trees(&self) -> &TreeStore {
        &self.trees
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.get()
    }

    pub fn publish_diagnostics_enabled(&self) -> bool {
        self.workspace()
            .is_none_or(|workspace| workspace.config.publish_diagnostics)
    }

    pub(crate) fn set_workspace(&self, workspace: Workspace) -> Result<()> {
        self.workspace
            .set(workspace)
            .map_err(|_| LspError::Internal("workspace was already recorded".to_string()))
    }
}
