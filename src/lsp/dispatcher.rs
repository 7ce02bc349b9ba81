//! Single entry point for inbound JSON-RPC messages
//!
//! The dispatcher owns the lifecycle state and routes each message by method
//! name. Requests always get exactly one response; notifications never get
//! one, and their failures are logged.

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification,
};
use tower_lsp::lsp_types::request::{FoldingRangeRequest, HoverRequest, Request as LspRequest};
use tower_lsp::lsp_types::{InitializeParams, InitializeResult, MessageType, Url};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{LspError, Result};
use crate::lsp::capabilities::{server_capabilities, server_info};
use crate::lsp::context::{ServerContext, Workspace};
use crate::lsp::handlers::{document, folding, hover};
use crate::lsp::lifecycle::LifecycleState;
use crate::workspace;

pub struct Dispatcher {
    ctx: ServerContext,
    state: LifecycleState,
    exit_code: Option<i32>,
}

impl Dispatcher {
    pub fn new(ctx: ServerContext) -> Self {
        Self {
            ctx,
            state: LifecycleState::default(),
            exit_code: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    pub fn is_exited(&self) -> bool {
        self.state == LifecycleState::Exited
    }

    /// Process exit code: 0 only when `exit` followed a `shutdown`
    pub fn exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(1)
    }

    /// Handles one inbound request or notification. Returns the response
    /// for requests and `None` for notifications.
    pub fn dispatch(&mut self, request: Request) -> Option<Response> {
        let (method, id, params) = request.into_parts();

        let Some(id) = id else {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| self.handle_notification(&method, params)));
            if outcome.is_err() {
                error!("Handler for notification {} panicked", method);
            }
            return None;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.handle_request(&method, params)))
            .unwrap_or_else(|_| {
                Err(LspError::Internal(format!("handler for {} panicked", method)))
            });

        Some(match result {
            Ok(value) => Response::from_ok(id, value),
            Err(e) => {
                warn!("Request {} ({:?}) failed: {}", method, id, e);
                Response::from_error(id, e.into())
            }
        })
    }

    fn handle_request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        match method {
            "initialize" => self.initialize(params),
            "shutdown" => {
                self.state = self.state.shutdown()?;
                info!("Shutdown requested");
                Ok(Value::Null)
            }
            _ => {
                self.state.check_request(method)?;
                match method {
                    "textDocument/hover" => self.call::<HoverRequest>(params, hover::hover),
                    "textDocument/foldingRange" => {
                        self.call::<FoldingRangeRequest>(params, folding::folding_ranges)
                    }
                    _ => Err(LspError::MethodNotFound(method.to_string())),
                }
            }
        }
    }

    fn handle_notification(&mut self, method: &str, params: Option<Value>) {
        if method == "exit" {
            self.exit_code = Some(match self.state {
                LifecycleState::ShuttingDown => 0,
                _ => 1,
            });
            info!("Exit received in state {:?}", self.state);
            self.state = self.state.exit();
            return;
        }

        if !self.state.accepts_notifications() {
            debug!("Dropping {} notification in state {:?}", method, self.state);
            return;
        }

        let result = match method {
            "initialized" => {
                info!("Client finished initialization");
                Ok(())
            }
            "textDocument/didOpen" => {
                self.notify::<DidOpenTextDocument>(params, document::did_open)
            }
            "textDocument/didChange" => {
                self.notify::<DidChangeTextDocument>(params, document::did_change)
            }
            "textDocument/didClose" => {
                self.notify::<DidCloseTextDocument>(params, document::did_close)
            }
            _ => {
                debug!("Ignoring unhandled notification {}", method);
                Ok(())
            }
        };

        if let Err(e) = result {
            error!("Notification {} failed: {}", method, e);
            self.ctx
                .client()
                .log_message(MessageType::ERROR, format!("{} failed: {}", method, e));
        }
    }

    fn initialize(&mut self, params: Option<Value>) -> Result<Value> {
        let next = self.state.initialize()?;
        let params: InitializeParams = decode("initialize", params)?;
        let root = workspace_root(&params)?;
        let config = ServerConfig::from_initialization_options(params.initialization_options)?;

        self.ctx.set_workspace(Workspace {
            root: root.clone(),
            config: config.clone(),
        })?;
        self.state = next;

        info!("Initialized with workspace root {}", root);
        workspace::spawn_walk(root.clone(), config.exclude_dirs, self.ctx.client().clone());
        self.ctx.client().log_message(
            MessageType::INFO,
            format!("initialized with workspace root {}", root),
        );

        encode(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(server_info()),
        })
    }

    fn call<R: LspRequest>(
        &self,
        params: Option<Value>,
        handler: impl FnOnce(&ServerContext, R::Params) -> Result<R::Result>,
    ) -> Result<Value> {
        let params = decode::<R::Params>(R::METHOD, params)?;
        encode(handler(&self.ctx, params)?)
    }

    fn notify<N: Notification>(
        &self,
        params: Option<Value>,
        handler: impl FnOnce(&ServerContext, N::Params) -> Result<()>,
    ) -> Result<()> {
        let params = decode::<N::Params>(N::METHOD, params)?;
        handler(&self.ctx, params)
    }
}

/// First workspace folder, then `rootUri`, then the deprecated `rootPath`
#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Result<Url> {
    if let Some(folder) = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
    {
        return Ok(folder.uri.clone());
    }
    if let Some(uri) = &params.root_uri {
        return Ok(uri.clone());
    }
    match params.root_path.as_deref() {
        None | Some("") => Err(LspError::MissingRootPath),
        Some(path) => Url::from_directory_path(path).map_err(|_| {
            LspError::InvalidParams(format!("rootPath {:?} is not an absolute path", path))
        }),
    }
}

fn decode<P: DeserializeOwned>(method: &str, params: Option<Value>) -> Result<P> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| LspError::InvalidParams(format!("{}: {}", method, e)))
}

fn encode<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| LspError::Internal(format!("failed to encode result: {}", e)))
}
