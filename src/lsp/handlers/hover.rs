use tower_lsp::lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use crate::error::Result;
use crate::lsp::context::ServerContext;
use crate::parser::SyntaxNode;

/// Describes the smallest syntax node under the cursor. Positions outside
/// the document have no node and yield no hover.
pub fn hover(ctx: &ServerContext, params: HoverParams) -> Result<Option<Hover>> {
    let position = params.text_document_position_params.position;
    let uri = params.text_document_position_params.text_document.uri;
    let trees = ctx.trees();

    let Some(point) = trees.with_document(&uri, |document| document.point_at(position))? else {
        return Ok(None);
    };
    let Some(node) = trees.node_at(&uri, point)? else {
        return Ok(None);
    };
    let range = trees.with_document(&uri, |document| {
        document.lsp_range_between(node.start, node.end)
    })?;

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: describe(&node),
        }),
        range: Some(range),
    }))
}

fn describe(node: &SyntaxNode) -> String {
    let mut value = if node.is_named {
        format!("**{}**", node.kind)
    } else {
        format!("`{}` token", node.kind)
    };
    if !node.ancestors.is_empty() {
        let chain: Vec<String> = node
            .ancestors
            .iter()
            .map(|kind| format!("`{}`", kind))
            .collect();
        value.push_str("\n\nin ");
        value.push_str(&chain.join(" > "));
    }
    value
}
