use std::sync::Arc;
use std::sync::atomic::Ordering;

use tower_lsp::Client;
use tower_lsp::lsp_types::{CompletionItem, ConfigurationItem, Diagnostic, Position, Url};

use tracing::{debug, trace, warn};

use crate::lsp::diagnostic_provider::{DiagnosticProvider, UppercaseWordProvider, ValidationRequest};
use crate::lsp::features::completion::complete;
use crate::lsp::models::LspDocument;
use crate::lsp::session::{SETTINGS_SECTION, ServerSettings, Session};
use crate::registry::NamespaceRegistry;

mod handlers;
mod state;

pub use state::IsaacBackend;

impl IsaacBackend {
    /// Creates a backend serving completions from `registry`, validating
    /// documents with the default uppercase-word provider.
    pub fn new(client: Client, registry: Arc<NamespaceRegistry>) -> Self {
        Self::with_diagnostic_provider(client, registry, Arc::new(UppercaseWordProvider))
    }

    pub fn with_diagnostic_provider(
        client: Client,
        registry: Arc<NamespaceRegistry>,
        diagnostic_provider: Arc<dyn DiagnosticProvider>,
    ) -> Self {
        debug!(
            "Creating backend with {} namespaces, {} diagnostics",
            registry.len(),
            diagnostic_provider.backend_name()
        );
        Self {
            client,
            registry,
            session: Arc::new(Session::new()),
            documents_by_uri: Arc::new(dashmap::DashMap::new()),
            serial_document_id: Arc::new(std::sync::atomic::AtomicU32::new(0)),
            diagnostic_provider,
        }
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the open document for `uri`, if any.
    pub fn document(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents_by_uri.get(uri).map(|entry| entry.value().clone())
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Completion items for the cursor at `position` in `uri`.
    ///
    /// A document the server does not know about completes like an empty
    /// line, i.e. with the global namespace list.
    pub async fn completions_at(&self, uri: &Url, position: Position) -> Vec<CompletionItem> {
        let line_prefix = match self.document(uri) {
            Some(document) => document.line_prefix(position).await,
            None => {
                debug!("Document not found: {}, using an empty line prefix", uri);
                String::new()
            }
        };
        trace!("Line prefix at {}:{:?}: {:?}", uri, position, line_prefix);
        complete(&line_prefix, &self.registry)
    }

    /// Settings that apply to `uri`.
    ///
    /// Clients without `workspace/configuration` support share the global
    /// settings. Otherwise the client is asked once per document and the
    /// answer is cached in the session.
    pub(super) async fn document_settings(&self, uri: &Url) -> ServerSettings {
        if !self.session.capabilities().configuration {
            return self.session.global_settings();
        }
        if let Some(settings) = self.session.cached_settings(uri) {
            return settings;
        }

        let items = vec![ConfigurationItem {
            scope_uri: Some(uri.clone()),
            section: Some(SETTINGS_SECTION.to_string()),
        }];
        match self.client.configuration(items).await {
            Ok(values) => {
                let settings = ServerSettings::from_value(values.into_iter().next());
                self.session.cache_settings(uri.clone(), settings.clone());
                settings
            }
            Err(e) => {
                warn!("Failed to fetch settings for {}: {}", uri, e);
                ServerSettings::default()
            }
        }
    }

    /// Runs the diagnostic provider over the current text of `document`.
    pub async fn validate(&self, document: &LspDocument) -> (i32, Vec<Diagnostic>) {
        let (uri, version, text) = {
            let state = document.state.read().await;
            (state.uri.clone(), state.version, state.text.clone())
        };
        let settings = self.document_settings(&uri).await;
        let diagnostics = self.diagnostic_provider.validate(&ValidationRequest {
            uri: &uri,
            text: &text,
            settings: &settings,
            related_information: self.session.capabilities().diagnostic_related_information,
        });
        (version, diagnostics)
    }

    /// Validates `document` in the background and publishes the result if
    /// the document is still open at the same version.
    pub(super) fn spawn_validation(&self, document: Arc<LspDocument>) {
        let backend = self.clone();
        tokio::spawn(async move {
            let (version, diagnostics) = backend.validate(&document).await;
            let uri = document.uri().await;

            let still_current = match backend.document(&uri) {
                Some(open) => Arc::ptr_eq(&open, &document) && open.version().await == version,
                None => false,
            };
            if still_current {
                debug!(
                    "Publishing {} diagnostics for {} (version {})",
                    diagnostics.len(),
                    uri,
                    version
                );
                backend.client.publish_diagnostics(uri, diagnostics, Some(version)).await;
            } else {
                trace!(
                    "Dropping diagnostics for {} version {}: document changed or closed",
                    uri,
                    version
                );
            }
        });
    }

    /// Revalidates every open document, e.g. after a configuration change.
    pub(super) fn revalidate_all(&self) {
        let documents: Vec<_> = self
            .documents_by_uri
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        debug!("Revalidating {} open documents", documents.len());
        for document in documents {
            self.spawn_validation(document);
        }
    }
}
