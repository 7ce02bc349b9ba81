//! Grammar selection for open documents

use tower_lsp::lsp_types::Url;
use tracing::warn;

/// Languages the server has a tree-sitter grammar for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageKind {
    Json,
    Toml,
    Yaml,
}

impl LanguageKind {
    /// Every supported language, in detection order
    pub const ALL: [LanguageKind; 3] = [LanguageKind::Json, LanguageKind::Toml, LanguageKind::Yaml];

    /// Resolves a language from an LSP `languageId`
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id.to_ascii_lowercase().as_str() {
            "json" | "jsonc" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Resolves a language from a file extension, without the leading dot
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Picks the grammar for a document: the client's `languageId` wins,
    /// the URI extension is the fallback.
    pub fn detect(uri: &Url, language_id: Option<&str>) -> Option<Self> {
        language_id
            .and_then(Self::from_language_id)
            .or_else(|| {
                let file_name = uri.path_segments()?.last()?;
                let (_, extension) = file_name.rsplit_once('.')?;
                Self::from_extension(extension)
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        match self {
            Self::Json => tree_sitter_json::LANGUAGE.into(),
            Self::Toml => tree_sitter_toml_ng::LANGUAGE.into(),
            Self::Yaml => tree_sitter_yaml::LANGUAGE.into(),
        }
    }

    /// Creates a parser configured for this language
    pub fn parser(self) -> Result<tree_sitter::Parser, tree_sitter::LanguageError> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&self.grammar()).inspect_err(|e| {
            warn!("Failed to set {} language for tree-sitter: {}", self.name(), e);
        })?;
        Ok(parser)
    }
}
