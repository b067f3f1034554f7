use ropey::Rope;

use thiserror::Error;

use tower_lsp::lsp_types::Url;

/// Errors raised while applying edits to an open document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("version {received} is not newer than {current}")]
    StaleVersion { received: i32, current: i32 },
}

/// State for an open text document managed by the LSP server.
#[derive(Debug)]
pub struct LspDocumentState {
    pub uri: Url,
    pub text: Rope,
    pub version: i32,
}

/// LSP document with state for open files.
#[derive(Debug)]
pub struct LspDocument {
    pub id: u32,
    pub state: tokio::sync::RwLock<LspDocumentState>,
}
