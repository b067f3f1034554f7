//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` implementation for
//! the backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Workspace notifications (configuration, watched files, folders)
//! - Completion and completion resolve

use std::sync::Arc;

use tower_lsp::{LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidChangeWatchedFilesParams,
    DidChangeWorkspaceFoldersParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, OneOf, Registration,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
    WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};
use tower_lsp::jsonrpc::Result as LspResult;

use tracing::{debug, info, warn};

use super::state::IsaacBackend;
use crate::lsp::features::completion::{MEMBER_ACCESS, resolve_completion_item};
use crate::lsp::models::LspDocument;
use crate::lsp::session::{NegotiatedCapabilities, SETTINGS_SECTION, ServerSettings};

const DID_CHANGE_CONFIGURATION: &str = "workspace/didChangeConfiguration";

#[tower_lsp::async_trait]
impl LanguageServer for IsaacBackend {
    /// Handles the LSP initialize request, recording client capabilities.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        debug!("Received initialize: {:?}", params);

        let capabilities = NegotiatedCapabilities::from(&params.capabilities);
        self.session.set_capabilities(capabilities);

        let workspace = capabilities.workspace_folders.then(|| WorkspaceServerCapabilities {
            workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                supported: Some(true),
                change_notifications: Some(OneOf::Left(true)),
            }),
            file_operations: None,
        });

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    trigger_characters: Some(vec![MEMBER_ACCESS.to_string()]),
                    ..Default::default()
                }),
                workspace,
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    /// Handles the LSP initialized notification.
    async fn initialized(&self, _params: InitializedParams) {
        info!("Server initialized with {} namespaces", self.registry.len());

        if self.session.capabilities().configuration {
            let registration = Registration {
                id: DID_CHANGE_CONFIGURATION.to_string(),
                method: DID_CHANGE_CONFIGURATION.to_string(),
                register_options: None,
            };
            if let Err(e) = self.client.register_capability(vec![registration]).await {
                warn!("Failed to register for configuration changes: {}", e);
            }
        }

        self.client
            .show_message(MessageType::INFO, "Isaac Repentance API Running ...")
            .await;
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    /// Handles opening a text document and validating it.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let document_id = self.next_document_id();
        info!("Opening document: URI={}, id={}, version={}", uri, document_id, version);

        let text = &params.text_document.text;
        let document = Arc::new(LspDocument::new(document_id, uri.clone(), text, version));
        if let Some(previous) = self.documents_by_uri.insert(uri.clone(), document.clone()) {
            warn!("Document {} was already open (id {}), replacing it", uri, previous.id);
        }

        self.spawn_validation(document);
    }

    /// Handles changes to a text document, applying incremental updates and re-validating.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!(
            "textDocument/didChange: URI={}, version={}, {} changes",
            uri,
            version,
            params.content_changes.len()
        );

        let Some(document) = self.document(&uri) else {
            warn!("Failed to find document with URI={}", uri);
            return;
        };

        match document.apply(params.content_changes, version).await {
            Ok(()) => self.spawn_validation(document),
            Err(e) => warn!("Failed to apply changes to {}: {}", uri, e),
        }
    }

    /// Handles closing a text document, removing it from state and clearing diagnostics.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents_by_uri.remove(&uri) {
            Some((_key, document)) => info!("Closed document: {}, id: {}", uri, document.id),
            None => warn!("Failed to find document with URI={}", uri),
        }
        self.session.forget_document(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        debug!("workspace/didChangeConfiguration: {:?}", params.settings);

        if self.session.capabilities().configuration {
            self.session.clear_document_settings();
        } else {
            let section = params.settings.get(SETTINGS_SECTION).cloned();
            self.session.set_global_settings(ServerSettings::from_value(section));
        }

        self.revalidate_all();
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        info!("Received {} watched file change events", params.changes.len());
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        info!(
            "Workspace folder change event received: {} added, {} removed",
            params.event.added.len(),
            params.event.removed.len()
        );
    }

    /// Provides namespace or member completions for the text before the cursor.
    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("Completion request at {}:{:?}", uri, position);

        let items = self.completions_at(&uri, position).await;
        debug!("Returning {} completion items", items.len());
        Ok(Some(CompletionResponse::Array(items)))
    }

    /// Attaches the detail string to a completion item chosen by the user.
    async fn completion_resolve(&self, item: CompletionItem) -> LspResult<CompletionItem> {
        let resolved = resolve_completion_item(item);
        if resolved.detail.as_deref() == Some("") {
            debug!("Completion item '{}' carried no usable data", resolved.label);
        }
        Ok(resolved)
    }
}
