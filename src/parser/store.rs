//! Per-document syntax tree ownership
//!
//! The store holds exactly one tree per open URI. Every mutation builds the
//! new text and tree off to the side under the document's exclusive entry
//! lock and swaps them in only once the reparse succeeded, so readers never
//! observe a half-applied edit.

use std::ops::Range;

use dashmap::DashMap;
use tower_lsp::lsp_types::{self as lsp, TextDocumentContentChangeEvent, Url};
use tracing::{debug, warn};
use tree_sitter::{InputEdit, Node, Point, Tree};

use crate::error::{LspError, Result};
use crate::parser::edit::{check_bounds, input_edit};
use crate::parser::language::LanguageKind;
use crate::parser::position::LineIndex;

/// An open document: its text, its tree and the version they belong to
pub struct Document {
    language: LanguageKind,
    text: String,
    tree: Tree,
    version: i32,
    line_index: LineIndex,
}

impl Document {
    fn new(language: LanguageKind, text: String, tree: Tree, version: i32) -> Self {
        let line_index = LineIndex::new(&text);
        Self {
            language,
            text,
            tree,
            version,
            line_index,
        }
    }

    pub fn language(&self) -> LanguageKind {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Tree-sitter point for an LSP position, `None` if the line does not exist
    pub fn point_at(&self, position: lsp::Position) -> Option<Point> {
        self.line_index.point_at(&self.text, position)
    }

    /// LSP range covering a tree-sitter node
    pub fn lsp_range(&self, node: Node<'_>) -> lsp::Range {
        self.lsp_range_between(node.start_position(), node.end_position())
    }

    pub fn lsp_range_between(&self, start: Point, end: Point) -> lsp::Range {
        lsp::Range::new(
            self.line_index.position(&self.text, start),
            self.line_index.position(&self.text, end),
        )
    }

    fn check_version(&self, uri: &Url, received: i32) -> Result<()> {
        if received <= self.version {
            return Err(LspError::OutOfOrderEdit {
                uri: uri.clone(),
                current: self.version,
                received,
            });
        }
        Ok(())
    }

    fn commit(&mut self, text: String, tree: Tree, version: i32) {
        self.line_index = LineIndex::new(&text);
        self.text = text;
        self.tree = tree;
        self.version = version;
    }
}

/// Owned snapshot of a syntax node, detached from the tree it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub is_named: bool,
    pub start: Point,
    pub end: Point,
    pub byte_range: Range<usize>,
    /// Kinds of the enclosing nodes, innermost first
    pub ancestors: Vec<&'static str>,
}

impl From<Node<'_>> for SyntaxNode {
    fn from(node: Node<'_>) -> Self {
        let ancestors = std::iter::successors(node.parent(), |parent| parent.parent())
            .map(|parent| parent.kind())
            .collect();
        Self {
            kind: node.kind(),
            is_named: node.is_named(),
            start: node.start_position(),
            end: node.end_position(),
            byte_range: node.byte_range(),
            ancestors,
        }
    }
}

/// Inclusive containment: `point` lies in `[start, end]`, comparing columns
/// only on the boundary rows.
pub fn point_in_range(point: Point, start: Point, end: Point) -> bool {
    let after_start =
        point.row > start.row || (point.row == start.row && point.column >= start.column);
    let before_end = point.row < end.row || (point.row == end.row && point.column <= end.column);
    after_start && before_end
}

/// Smallest node under `root` whose range contains `point`.
///
/// When a point sits on the boundary shared by two siblings the earlier
/// sibling wins.
pub fn smallest_node_at(root: Node<'_>, point: Point) -> Option<Node<'_>> {
    if !point_in_range(point, root.start_position(), root.end_position()) {
        return None;
    }

    let mut node = root;
    let mut cursor = root.walk();
    loop {
        let next = node
            .children(&mut cursor)
            .find(|child| point_in_range(point, child.start_position(), child.end_position()));
        match next {
            Some(child) => node = child,
            None => return Some(node),
        }
    }
}

fn parse(uri: &Url, language: LanguageKind, text: &str, hint: Option<&Tree>) -> Result<Tree> {
    let mut parser = language.parser().map_err(|e| LspError::ParseFailure {
        uri: uri.clone(),
        reason: e.to_string(),
    })?;

    parser.parse(text, hint).ok_or_else(|| {
        warn!("tree-sitter produced no tree for {}", uri);
        LspError::ParseFailure {
            uri: uri.clone(),
            reason: "parser returned no tree".to_string(),
        }
    })
}

/// Owner of every open document's syntax tree
#[derive(Default)]
pub struct TreeStore {
    documents: DashMap<Url, Document>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` from scratch and stores it under `uri`, replacing any
    /// previous entry.
    pub fn open(&self, uri: Url, language: LanguageKind, text: String, version: i32) -> Result<()> {
        let tree = parse(&uri, language, &text, None)?;
        debug!(
            "Opened {} as {} (version {}, {} bytes)",
            uri,
            language.name(),
            version,
            text.len()
        );
        self.documents
            .insert(uri, Document::new(language, text, tree, version));
        Ok(())
    }

    /// Applies one explicit edit: the stored tree is told which region went
    /// stale, then `new_text` is reparsed with the edited tree as a hint.
    pub fn apply_edit(
        &self,
        uri: &Url,
        edit: &InputEdit,
        new_text: String,
        version: i32,
    ) -> Result<()> {
        let mut document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| LspError::UnknownDocument(uri.clone()))?;
        document.check_version(uri, version)?;
        check_bounds(edit, &document.text, &new_text)?;

        let mut hint = document.tree.clone();
        hint.edit(edit);
        let tree = parse(uri, document.language, &new_text, Some(&hint))?;
        debug!("Reparsed {} at version {} from one edit", uri, version);

        document.commit(new_text, tree, version);
        Ok(())
    }

    /// Applies the content changes of one `didChange` notification in order.
    ///
    /// A lone change goes through `replace` or `apply_edit`. Several changes
    /// are folded into one working copy: ranged changes are recorded on the
    /// tree as edits, a change without a range replaces the whole text and
    /// drops the reuse hint, and the document is reparsed once at the end.
    pub fn apply_changes(
        &self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<()> {
        if let [change] = changes.as_slice() {
            let Some(range) = change.range else {
                return self.replace(uri, change.text.clone(), version);
            };
            let (edit, new_text) = self.with_document(uri, |document| -> Result<_> {
                let edit = input_edit(&document.text, range, &change.text)?;
                let mut text = document.text.clone();
                text.replace_range(edit.start_byte..edit.old_end_byte, &change.text);
                Ok((edit, text))
            })??;
            return self.apply_edit(uri, &edit, new_text, version);
        }

        let mut document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| LspError::UnknownDocument(uri.clone()))?;
        document.check_version(uri, version)?;

        let mut text = document.text.clone();
        let mut hint = Some(document.tree.clone());
        let mut edits = 0usize;

        for change in changes {
            match change.range {
                Some(range) => {
                    let edit = input_edit(&text, range, &change.text)?;
                    text.replace_range(edit.start_byte..edit.old_end_byte, &change.text);
                    if let Some(tree) = hint.as_mut() {
                        tree.edit(&edit);
                    }
                    edits += 1;
                }
                None => {
                    text = change.text;
                    hint = None;
                }
            }
        }

        let tree = parse(uri, document.language, &text, hint.as_ref())?;
        debug!(
            "Reparsed {} at version {} ({} incremental edits, reused tree: {})",
            uri,
            version,
            edits,
            hint.is_some()
        );

        document.commit(text, tree, version);
        Ok(())
    }

    /// Replaces the whole text of an open document with a full reparse
    pub fn replace(&self, uri: &Url, text: String, version: i32) -> Result<()> {
        let mut document = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| LspError::UnknownDocument(uri.clone()))?;
        document.check_version(uri, version)?;

        let tree = parse(uri, document.language, &text, None)?;
        debug!("Replaced {} at version {}", uri, version);
        document.commit(text, tree, version);
        Ok(())
    }

    /// Discards the document's tree; returns whether one was stored
    pub fn close(&self, uri: &Url) -> bool {
        self.documents.remove(uri).is_some()
    }

    /// Smallest node containing `point`, or `None` when the point is outside
    /// the tree's root range.
    pub fn node_at(&self, uri: &Url, point: Point) -> Result<Option<SyntaxNode>> {
        self.with_document(uri, |document| {
            smallest_node_at(document.tree.root_node(), point).map(SyntaxNode::from)
        })
    }

    /// Runs `f` against an open document while holding its read lock
    pub fn with_document<R>(&self, uri: &Url, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let document = self
            .documents
            .get(uri)
            .ok_or_else(|| LspError::UnknownDocument(uri.clone()))?;
        Ok(f(&document))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
