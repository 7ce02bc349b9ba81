use tower_lsp::lsp_types::{
    FoldingRangeProviderCapability, HoverProviderCapability, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
};

use crate::config::SERVER_NAME;

/// Capabilities advertised in the `initialize` reply.
///
/// Only features with a route in the dispatcher are set; clients read every
/// unset entry as "not supported".
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                ..Default::default()
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        ..Default::default()
    }
}

pub fn server_info() -> ServerInfo {
    ServerInfo {
        name: SERVER_NAME.to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
