pub mod config;
pub mod error;
pub mod log;
pub mod lsp;
pub mod parser;
pub mod workspace;

pub use error::{LspError, Result};
