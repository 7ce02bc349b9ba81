//! Parser layer
//! - language.rs: grammar selection (JSON, TOML, YAML)
//! - position.rs: LSP position / byte offset / tree-sitter point conversions
//! - edit.rs: content changes as tree-sitter edits
//! - store.rs: per-document tree ownership and point lookups

pub mod edit;
pub mod language;
pub mod position;
pub mod store;

pub use language::LanguageKind;
pub use position::LineIndex;
pub use store::{Document, SyntaxNode, TreeStore, point_in_range};
