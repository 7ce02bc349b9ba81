//! Translation of LSP content changes into tree-sitter edits

use tower_lsp::lsp_types::Range;
use tree_sitter::InputEdit;

use crate::error::{LspError, Result};
use crate::parser::position::{LineIndex, advance_point};

/// Describes replacing `range` of `text` with `replacement` as a tree-sitter
/// edit (start, old end, new end) in both bytes and points.
pub fn input_edit(text: &str, range: Range, replacement: &str) -> Result<InputEdit> {
    let index = LineIndex::new(text);

    let start_byte = index.offset(text, range.start).ok_or_else(|| {
        LspError::InvalidEdit(format!(
            "start {}:{} is past the last line {}",
            range.start.line,
            range.start.character,
            index.line_count() - 1
        ))
    })?;
    let old_end_byte = index.offset(text, range.end).ok_or_else(|| {
        LspError::InvalidEdit(format!(
            "end {}:{} is past the last line {}",
            range.end.line,
            range.end.character,
            index.line_count() - 1
        ))
    })?;
    if old_end_byte < start_byte {
        return Err(LspError::InvalidEdit(format!(
            "range end {}:{} precedes start {}:{}",
            range.end.line, range.end.character, range.start.line, range.start.character
        )));
    }

    let start_position = index.point(start_byte);
    Ok(InputEdit {
        start_byte,
        old_end_byte,
        new_end_byte: start_byte + replacement.len(),
        start_position,
        old_end_position: index.point(old_end_byte),
        new_end_position: advance_point(start_position, replacement),
    })
}

/// Checks that an edit describes a mutation from `old_text` to `new_text`
/// without running past either text.
pub fn check_bounds(edit: &InputEdit, old_text: &str, new_text: &str) -> Result<()> {
    if edit.start_byte > edit.old_end_byte || edit.old_end_byte > old_text.len() {
        return Err(LspError::InvalidEdit(format!(
            "old range {}..{} does not fit a {}-byte document",
            edit.start_byte,
            edit.old_end_byte,
            old_text.len()
        )));
    }
    if edit.start_byte > edit.new_end_byte || edit.new_end_byte > new_text.len() {
        return Err(LspError::InvalidEdit(format!(
            "new range {}..{} does not fit a {}-byte document",
            edit.start_byte,
            edit.new_end_byte,
            new_text.len()
        )));
    }
    Ok(())
}
