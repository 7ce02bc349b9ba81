use std::collections::HashSet;

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeParams};
use tree_sitter::Node;

use crate::error::Result;
use crate::lsp::context::ServerContext;

pub fn folding_ranges(
    ctx: &ServerContext,
    params: FoldingRangeParams,
) -> Result<Option<Vec<FoldingRange>>> {
    ctx.trees()
        .with_document(&params.text_document.uri, |document| {
            Some(collect_folding_ranges(document.tree().root_node()))
        })
}

/// One range per named multi-line node below the root. When several nodes
/// start on the same line the outermost one is kept.
pub fn collect_folding_ranges(root: Node<'_>) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();
    let mut start_lines = HashSet::new();
    let mut cursor = root.walk();

    // pre-order, so parents are seen before their children
    'walk: loop {
        let node = cursor.node();
        if node.id() != root.id() && node.is_named() {
            let start_line = node.start_position().row;
            let end = node.end_position();
            // a node ending at column 0 stops at the previous line
            let end_line = if end.column == 0 {
                end.row.saturating_sub(1)
            } else {
                end.row
            };
            if end_line > start_line && start_lines.insert(start_line) {
                ranges.push(FoldingRange {
                    start_line: start_line as u32,
                    end_line: end_line as u32,
                    ..Default::default()
                });
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    ranges
}
