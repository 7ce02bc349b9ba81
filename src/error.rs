use serde_json::json;
use thiserror::Error;
use tower_lsp::jsonrpc::{self, ErrorCode};
use tower_lsp::lsp_types::Url;

/// JSON-RPC code reserved by LSP for requests sent before `initialize`.
const SERVER_NOT_INITIALIZED: i64 = -32002;
/// JSON-RPC code reserved by LSP for requests that were valid but failed.
const REQUEST_FAILED: i64 = -32803;

/// Every failure a handler can report back to the client.
///
/// Each variant is a distinct kind on the wire: the error reply carries the
/// variant name in its `data.kind` field so clients can branch on it.
#[derive(Debug, Error)]
pub enum LspError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("server not initialized")]
    ServerNotInitialized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no root path")]
    MissingRootPath,

    #[error("unknown document: {0}")]
    UnknownDocument(Url),

    #[error("failed to parse {uri}: {reason}")]
    ParseFailure { uri: Url, reason: String },

    #[error("out-of-order edit for {uri}: version {received} is not newer than {current}")]
    OutOfOrderEdit {
        uri: Url,
        current: i32,
        received: i32,
    },

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("method not found: {0:?}")]
    MethodNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LspError {
    /// Stable name of the error kind, sent as `data.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParams(_) => "InvalidParams",
            Self::ServerNotInitialized => "ServerNotInitialized",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::MissingRootPath => "MissingRootPath",
            Self::UnknownDocument(_) => "UnknownDocument",
            Self::ParseFailure { .. } => "ParseFailure",
            Self::OutOfOrderEdit { .. } => "OutOfOrderEdit",
            Self::InvalidEdit(_) => "InvalidEdit",
            Self::MethodNotFound(_) => "MethodNotFound",
            Self::Internal(_) => "Internal",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidParams(_)
            | Self::MissingRootPath
            | Self::UnknownDocument(_)
            | Self::OutOfOrderEdit { .. }
            | Self::InvalidEdit(_) => ErrorCode::InvalidParams,
            Self::ServerNotInitialized => ErrorCode::ServerError(SERVER_NOT_INITIALIZED),
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::ParseFailure { .. } => ErrorCode::ServerError(REQUEST_FAILED),
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<LspError> for jsonrpc::Error {
    fn from(err: LspError) -> Self {
        jsonrpc::Error {
            code: err.code(),
            message: err.to_string().into(),
            data: Some(json!({ "kind": err.kind() })),
        }
    }
}

/// Convenience alias used by the tree store and the handlers.
pub type Result<T> = std::result::Result<T, LspError>;

/// Failures of the Content-Length framing layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed header line: {0:?}")]
    InvalidHeader(String),

    #[error("message is missing a Content-Length header")]
    MissingContentLength,

    #[error("message of {length} bytes exceeds the {max}-byte limit")]
    MessageTooLarge { length: usize, max: usize },
}
