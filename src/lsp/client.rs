//! Outbound notification channel
//!
//! Handlers push server-to-client notifications through a `Client`. Sends
//! go into an unbounded queue drained by the writer task, so they never
//! block and never fail from the caller's point of view.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::lsp_types::notification::{LogMessage, Notification, PublishDiagnostics};
use tower_lsp::lsp_types::{
    Diagnostic, LogMessageParams, MessageType, PublishDiagnosticsParams, Url,
};
use tracing::{debug, error};

use crate::config::SERVER_NAME;

/// A JSON-RPC message in either direction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Response(Response),
}

#[derive(Debug, Clone)]
pub struct Client {
    tx: UnboundedSender<Message>,
}

impl Client {
    pub fn new(tx: UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    /// Sends `window/logMessage`, prefixed with the server name
    pub fn log_message(&self, typ: MessageType, message: impl Display) {
        self.notify::<LogMessage>(LogMessageParams {
            typ,
            message: format!("{}: {}", SERVER_NAME, message),
        });
    }

    /// Replaces the client's diagnostics for `uri` with `diagnostics`.
    /// An empty list clears them.
    pub fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.notify::<PublishDiagnostics>(PublishDiagnosticsParams::new(uri, diagnostics, version));
    }

    fn notify<N: Notification>(&self, params: N::Params) {
        let params = match serde_json::to_value(params) {
            Ok(params) => params,
            Err(e) => {
                error!("Failed to encode {} params: {}", N::METHOD, e);
                return;
            }
        };
        self.send(Message::Request(
            Request::build(N::METHOD).params(params).finish(),
        ));
    }

    pub(crate) fn send(&self, message: Message) {
        if self.tx.send(message).is_err() {
            debug!("Outbound channel closed, dropping message");
        }
    }
}
