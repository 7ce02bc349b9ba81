//! Conversions between LSP positions, byte offsets and tree-sitter points
//!
//! LSP counts columns in UTF-16 code units, tree-sitter counts them in bytes.
//! The two also disagree on lines: LSP ends a line at `\n`, `\r\n` or a lone
//! `\r`, while tree-sitter only starts a new row after `\n`. A `LineIndex`
//! is built once per document revision and answers both sides.

use tower_lsp::lsp_types::Position;
use tree_sitter::Point;

/// Line and row start offsets of a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// LSP line starts
    line_starts: Vec<usize>,
    /// tree-sitter row starts
    row_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut row_starts = vec![0];
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => {
                    line_starts.push(i + 1);
                    row_starts.push(i + 1);
                }
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }
        Self {
            line_starts,
            row_starts,
            len: text.len(),
        }
    }

    /// Number of lines as an LSP client counts them
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of a line's content, excluding its line terminator
    fn line_bounds(&self, text: &str, line: usize) -> Option<(usize, usize)> {
        let bytes = text.as_bytes();
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(&next) if next >= 2 && bytes[next - 1] == b'\n' && bytes[next - 2] == b'\r' => {
                next - 2
            }
            Some(&next) => next - 1,
            None => self.len,
        };
        Some((start, end))
    }

    /// Converts an LSP position to a byte offset.
    ///
    /// Columns past the end of the line clamp to the line end. Returns
    /// `None` when the line does not exist.
    pub fn offset(&self, text: &str, position: Position) -> Option<usize> {
        let (start, end) = self.line_bounds(text, position.line as usize)?;
        let line = &text[start..end];
        let column = utf16_to_byte_offset(line, position.character).unwrap_or(line.len());
        Some(start + column)
    }

    /// Converts a byte offset to a tree-sitter point (row, byte column)
    pub fn point(&self, offset: usize) -> Point {
        let row = containing(&self.row_starts, offset);
        Point::new(row, offset - self.row_starts[row])
    }

    /// Converts an LSP position to a tree-sitter point
    pub fn point_at(&self, text: &str, position: Position) -> Option<Point> {
        self.offset(text, position).map(|offset| self.point(offset))
    }

    /// Converts a tree-sitter point back to an LSP position
    pub fn position(&self, text: &str, point: Point) -> Position {
        let Some(&row_start) = self.row_starts.get(point.row) else {
            return Position::new(point.row as u32, point.column as u32);
        };
        let offset = (row_start + point.column).min(self.len);
        let line = containing(&self.line_starts, offset);
        let character = text
            .get(self.line_starts[line]..offset)
            .map(|prefix| prefix.chars().map(|c| c.len_utf16() as u32).sum())
            .unwrap_or(point.column as u32);
        Position::new(line as u32, character)
    }
}

/// Index of the last start at or before `offset`
fn containing(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        Ok(index) => index,
        Err(index) => index.saturating_sub(1),
    }
}

/// Converts a UTF-16 column within a single line to a byte offset.
///
/// Returns `None` if the column lies past the end of the line.
pub fn utf16_to_byte_offset(line: &str, utf16_offset: u32) -> Option<usize> {
    let mut utf16_count = 0u32;
    for (byte_idx, ch) in line.char_indices() {
        if utf16_count >= utf16_offset {
            return Some(byte_idx);
        }
        utf16_count += ch.len_utf16() as u32;
    }
    if utf16_count >= utf16_offset {
        return Some(line.len());
    }
    None
}

/// Point reached after writing `text` starting at `start`
pub fn advance_point(start: Point, text: &str) -> Point {
    match text.rfind('\n') {
        Some(last_newline) => Point::new(
            start.row + text.matches('\n').count(),
            text.len() - last_newline - 1,
        ),
        None => Point::new(start.row, start.column + text.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("hello", 2, Some(2))]
    #[case("hello", 5, Some(5))]
    #[case("hello", 6, None)]
    #[case("日本語", 1, Some(3))]
    #[case("😀test", 2, Some(4))]
    fn utf16_to_byte_offset_counts_code_units(
        #[case] line: &str,
        #[case] column: u32,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(utf16_to_byte_offset(line, column), expected);
    }

    #[test]
    fn offset_and_point_follow_lines() {
        let text = "{\n  \"a\": 1,\n  \"b\": 2\n}";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 4);
        assert_eq!(index.offset(text, Position::new(1, 2)), Some(4));
        assert_eq!(index.point(4), Point::new(1, 2));
        assert_eq!(index.point(text.len()), Point::new(3, 1));
    }

    #[test]
    fn offset_clamps_columns_past_line_end() {
        let text = "ab\ncd";
        let index = LineIndex::new(text);

        assert_eq!(index.offset(text, Position::new(0, 40)), Some(2));
        assert_eq!(index.offset(text, Position::new(1, 40)), Some(5));
        assert_eq!(index.offset(text, Position::new(2, 0)), None);
    }

    #[test]
    fn offset_ignores_carriage_returns() {
        let text = "ab\r\ncd";
        let index = LineIndex::new(text);

        assert_eq!(index.offset(text, Position::new(0, 10)), Some(2));
        assert_eq!(index.offset(text, Position::new(1, 1)), Some(5));
    }

    #[test]
    fn lone_carriage_returns_end_lsp_lines_but_not_rows() {
        let text = "a\rb\nc";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.offset(text, Position::new(0, 10)), Some(1));
        assert_eq!(index.offset(text, Position::new(1, 0)), Some(2));
        assert_eq!(index.offset(text, Position::new(2, 1)), Some(5));
        // tree-sitter keeps `a\rb` on row 0
        assert_eq!(index.point(2), Point::new(0, 2));
        assert_eq!(index.position(text, Point::new(0, 2)), Position::new(1, 0));
        assert_eq!(index.position(text, Point::new(1, 0)), Position::new(2, 0));
    }

    #[test]
    fn position_converts_byte_columns_to_utf16() {
        let text = "name = \"日本\"\nx = 1";
        let index = LineIndex::new(text);

        // "name = \"日本" is 8 ASCII bytes plus two 3-byte characters
        assert_eq!(
            index.position(text, Point::new(0, 14)),
            Position::new(0, 10)
        );
        assert_eq!(index.position(text, Point::new(1, 4)), Position::new(1, 4));
    }

    #[test]
    fn text_ending_with_newline_has_an_empty_last_line() {
        let text = "a\n";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 2);
        assert_eq!(index.offset(text, Position::new(1, 0)), Some(2));
        assert_eq!(index.point(2), Point::new(1, 0));
    }

    #[rstest]
    #[case(Point::new(3, 4), "xyz", Point::new(3, 7))]
    #[case(Point::new(3, 4), "", Point::new(3, 4))]
    #[case(Point::new(3, 4), "a\nbc", Point::new(4, 2))]
    #[case(Point::new(0, 0), "a\n\n", Point::new(2, 0))]
    fn advance_point_tracks_rows_and_columns(
        #[case] start: Point,
        #[case] text: &str,
        #[case] expected: Point,
    ) {
        assert_eq!(advance_point(start, text), expected);
    }
}
