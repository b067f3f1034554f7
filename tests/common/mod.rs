//! In-process LSP harness shared by the integration tests.
//!
//! The backend is driven through `LspService::inner()`, so the tower-lsp
//! client stays uninitialized and every notification the server would send
//! (diagnostics, log messages) is dropped instead of written to a transport.

#![allow(dead_code)]

use std::sync::Arc;

use tower_lsp::lsp_types::{
    ClientCapabilities, CompletionItem, CompletionParams, CompletionResponse,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, PartialResultParams, Position, Range,
    TextDocumentContentChangeEvent, TextDocumentIdentifier, TextDocumentItem,
    TextDocumentPositionParams, Url, VersionedTextDocumentIdentifier, WorkDoneProgressParams,
};
use tower_lsp::{ClientSocket, LanguageServer, LspService};

use isaac_api_language_server::lsp::backend::IsaacBackend;
use isaac_api_language_server::registry::NamespaceRegistry;

pub struct TestServer {
    service: LspService<IsaacBackend>,
    _socket: ClientSocket,
}

impl TestServer {
    /// Server backed by the built-in API enums.
    pub fn new() -> Self {
        let registry = NamespaceRegistry::builtin().expect("built-in namespaces should load");
        Self::with_registry(registry)
    }

    pub fn with_registry(registry: NamespaceRegistry) -> Self {
        let registry = Arc::new(registry);
        let (service, socket) = LspService::new(|client| IsaacBackend::new(client, registry));
        Self { service, _socket: socket }
    }

    pub fn backend(&self) -> &IsaacBackend {
        self.service.inner()
    }

    pub async fn initialize(&self, capabilities: ClientCapabilities) -> InitializeResult {
        let params = InitializeParams {
            capabilities,
            ..Default::default()
        };
        let result = self.backend().initialize(params).await.expect("initialize should succeed");
        self.backend().initialized(InitializedParams {}).await;
        result
    }

    pub async fn open(&self, path: &str, text: &str) -> Url {
        let uri = Url::parse(&format!("file://{}", path)).expect("valid test URI");
        self.backend()
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "lua".to_string(),
                    version: 0,
                    text: text.to_string(),
                },
            })
            .await;
        uri
    }

    pub async fn change(
        &self,
        uri: &Url,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) {
        self.backend()
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: uri.clone(),
                    version,
                },
                content_changes: changes,
            })
            .await;
    }

    /// Inserts `text` at `(line, character)` as an incremental change.
    pub async fn type_text(&self, uri: &Url, version: i32, line: u32, character: u32, text: &str) {
        let at = Position::new(line, character);
        let change = TextDocumentContentChangeEvent {
            range: Some(Range { start: at, end: at }),
            range_length: None,
            text: text.to_string(),
        };
        self.change(uri, version, vec![change]).await;
    }

    pub async fn close(&self, uri: &Url) {
        self.backend()
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
            })
            .await;
    }

    pub async fn complete(&self, uri: &Url, line: u32, character: u32) -> Vec<CompletionItem> {
        let params = CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position: Position::new(line, character),
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        };
        match self.backend().completion(params).await {
            Ok(Some(CompletionResponse::Array(items))) => items,
            other => panic!("Expected a completion array, got {:?}", other),
        }
    }

    pub async fn resolve(&self, item: CompletionItem) -> CompletionItem {
        self.backend()
            .completion_resolve(item)
            .await
            .expect("completion resolve should succeed")
    }
}

pub fn labels(items: &[CompletionItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}
