//! Syntax diagnostics pushed after every document update

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};
use tracing::{debug, warn};
use tree_sitter::Node;

use crate::config::SERVER_NAME;
use crate::lsp::context::ServerContext;
use crate::parser::Document;

/// Publishes the document's complete diagnostic set, replacing whatever the
/// client showed before.
pub fn publish(ctx: &ServerContext, uri: &Url) {
    if !ctx.publish_diagnostics_enabled() {
        return;
    }

    match ctx.trees().with_document(uri, |document| {
        (syntax_diagnostics(document), document.version())
    }) {
        Ok((diagnostics, version)) => {
            debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
            ctx.client()
                .publish_diagnostics(uri.clone(), diagnostics, Some(version));
        }
        Err(e) => warn!("Skipping diagnostics for {}: {}", uri, e),
    }
}

/// One diagnostic per `ERROR` node and per missing node in the tree
pub fn syntax_diagnostics(document: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let root = document.tree().root_node();
    if root.has_error() {
        collect(document, root, &mut diagnostics);
    }
    diagnostics
}

fn collect(document: &Document, node: Node<'_>, diagnostics: &mut Vec<Diagnostic>) {
    if node.is_error() {
        diagnostics.push(diagnostic(document, node, "Syntax error".to_string()));
        return;
    }
    if node.is_missing() {
        diagnostics.push(diagnostic(
            document,
            node,
            format!("Missing `{}`", node.kind()),
        ));
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            collect(document, child, diagnostics);
        }
    }
}

fn diagnostic(document: &Document, node: Node<'_>, message: String) -> Diagnostic {
    Diagnostic {
        range: document.lsp_range(node),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(SERVER_NAME.to_string()),
        message,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{LanguageKind, TreeStore};

    fn diagnostics_for(language: LanguageKind, text: &str) -> Vec<Diagnostic> {
        let store = TreeStore::new();
        let uri = Url::parse("file:///test/doc").unwrap();
        store.open(uri.clone(), language, text.to_string(), 1).unwrap();
        store.with_document(&uri, syntax_diagnostics).unwrap()
    }

    #[test]
    fn valid_documents_have_no_diagnostics() {
        assert!(diagnostics_for(LanguageKind::Json, r#"{"a": [1, 2]}"#).is_empty());
        assert!(diagnostics_for(LanguageKind::Toml, "[package]\nname = \"x\"\n").is_empty());
    }

    #[test]
    fn syntax_errors_become_error_diagnostics() {
        let diagnostics = diagnostics_for(LanguageKind::Json, "{\n  \"a\": 1,,\n}");

        assert!(!diagnostics.is_empty());
        for diagnostic in &diagnostics {
            assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
            assert_eq!(diagnostic.source.as_deref(), Some("sitter-lsp"));
            assert!(diagnostic.range.start.line <= 2);
        }
    }
}
