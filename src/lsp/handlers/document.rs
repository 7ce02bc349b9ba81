//! Document synchronization: the only writers of the tree store

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    MessageType,
};
use tracing::{debug, info};

use crate::error::Result;
use crate::lsp::context::ServerContext;
use crate::lsp::handlers::diagnostics;
use crate::parser::LanguageKind;

pub fn did_open(ctx: &ServerContext, params: DidOpenTextDocumentParams) -> Result<()> {
    let document = params.text_document;
    let uri = document.uri;

    let Some(language) = LanguageKind::detect(&uri, Some(&document.language_id)) else {
        info!(
            "No grammar for {} (languageId {:?}), not tracking it",
            uri, document.language_id
        );
        ctx.client().log_message(
            MessageType::LOG,
            format!("No grammar for {}, ignoring it", uri),
        );
        return Ok(());
    };

    ctx.trees()
        .open(uri.clone(), language, document.text, document.version)?;
    ctx.client()
        .log_message(MessageType::LOG, format!("Document opened: {}", uri));

    diagnostics::publish(ctx, &uri);
    Ok(())
}

pub fn did_change(ctx: &ServerContext, params: DidChangeTextDocumentParams) -> Result<()> {
    let uri = params.text_document.uri;
    ctx.trees().apply_changes(
        &uri,
        params.content_changes,
        params.text_document.version,
    )?;

    diagnostics::publish(ctx, &uri);
    Ok(())
}

pub fn did_close(ctx: &ServerContext, params: DidCloseTextDocumentParams) -> Result<()> {
    let uri = params.text_document.uri;
    if !ctx.trees().close(&uri) {
        debug!("Close for untracked document {}", uri);
        return Ok(());
    }

    if ctx.publish_diagnostics_enabled() {
        ctx.client().publish_diagnostics(uri.clone(), Vec::new(), None);
    }
    ctx.client()
        .log_message(MessageType::LOG, format!("Document closed: {}", uri));
    Ok(())
}
