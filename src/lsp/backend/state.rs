//! Backend state management
//!
//! This module defines the IsaacBackend struct, which holds the namespace
//! registry, the open documents, the client session and the diagnostic
//! provider.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;

use dashmap::DashMap;
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::lsp::diagnostic_provider::DiagnosticProvider;
use crate::lsp::models::LspDocument;
use crate::lsp::session::Session;
use crate::registry::NamespaceRegistry;

/// The language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct IsaacBackend {
    pub(super) client: Client,
    /// Enum namespaces offered by completion, immutable after start-up
    pub(super) registry: Arc<NamespaceRegistry>,
    /// Negotiated capabilities and settings for this connection
    pub(super) session: Arc<Session>,
    pub(super) documents_by_uri: Arc<DashMap<Url, Arc<LspDocument>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    pub(super) diagnostic_provider: Arc<dyn DiagnosticProvider>,
}

// Manual Debug implementation since DiagnosticProvider doesn't implement Debug
impl std::fmt::Debug for IsaacBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsaacBackend")
            .field("diagnostics", &self.diagnostic_provider.backend_name())
            .field("namespaces", &self.registry.len())
            .field("documents_count", &self.documents_by_uri.len())
            .finish()
    }
}
