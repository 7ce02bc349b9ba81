//! Request and notification handlers
//! - document.rs: didOpen / didChange / didClose
//! - diagnostics.rs: syntax diagnostics pushed after document updates
//! - hover.rs: textDocument/hover
//! - folding.rs: textDocument/foldingRange

pub mod diagnostics;
pub mod document;
pub mod folding;
pub mod hover;
