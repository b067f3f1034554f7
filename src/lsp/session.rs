//! Per-connection session state
//!
//! Holds what the client told us at `initialize` and the settings used when
//! validating documents. The backend owns one `Session` and passes it to the
//! code that needs it; there is no process-global settings cache.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Deserialize;
use tower_lsp::lsp_types::{ClientCapabilities, Url};
use tracing::debug;

/// Configuration section requested from the client.
pub const SETTINGS_SECTION: &str = "isaacApi";

const DEFAULT_MAX_NUMBER_OF_PROBLEMS: u32 = 1000;

/// User settings for the server (`isaacApi.*` in the editor configuration).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub max_number_of_problems: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl ServerSettings {
    /// Reads settings from a JSON value, falling back to defaults when the
    /// value is missing or malformed.
    pub fn from_value(value: Option<serde_json::Value>) -> Self {
        value
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// Client features that change how the server behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NegotiatedCapabilities {
    /// Client answers `workspace/configuration` requests.
    pub configuration: bool,
    pub workspace_folders: bool,
    /// Client renders `relatedInformation` on diagnostics.
    pub diagnostic_related_information: bool,
}

impl From<&ClientCapabilities> for NegotiatedCapabilities {
    fn from(capabilities: &ClientCapabilities) -> Self {
        let workspace = capabilities.workspace.as_ref();
        Self {
            configuration: workspace.and_then(|w| w.configuration).unwrap_or(false),
            workspace_folders: workspace.and_then(|w| w.workspace_folders).unwrap_or(false),
            diagnostic_related_information: capabilities
                .text_document
                .as_ref()
                .and_then(|td| td.publish_diagnostics.as_ref())
                .and_then(|pd| pd.related_information)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    capabilities: RwLock<NegotiatedCapabilities>,
    global_settings: RwLock<ServerSettings>,
    document_settings: DashMap<Url, ServerSettings>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capabilities(&self) -> NegotiatedCapabilities {
        *self.capabilities.read()
    }

    pub fn set_capabilities(&self, capabilities: NegotiatedCapabilities) {
        debug!("Negotiated client capabilities: {:?}", capabilities);
        *self.capabilities.write() = capabilities;
    }

    pub fn global_settings(&self) -> ServerSettings {
        self.global_settings.read().clone()
    }

    pub fn set_global_settings(&self, settings: ServerSettings) {
        *self.global_settings.write() = settings;
    }

    pub fn cached_settings(&self, uri: &Url) -> Option<ServerSettings> {
        self.document_settings.get(uri).map(|entry| entry.value().clone())
    }

    pub fn cache_settings(&self, uri: Url, settings: ServerSettings) {
        self.document_settings.insert(uri, settings);
    }

    /// Drops the cached settings of a closed document.
    pub fn forget_document(&self, uri: &Url) {
        self.document_settings.remove(uri);
    }

    pub fn clear_document_settings(&self) {
        self.document_settings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tower_lsp::lsp_types::{
        PublishDiagnosticsClientCapabilities, TextDocumentClientCapabilities,
        WorkspaceClientCapabilities,
    };

    #[test]
    fn test_settings_defaults() {
        assert_eq!(ServerSettings::default().max_number_of_problems, 1000);
        assert_eq!(ServerSettings::from_value(None), ServerSettings::default());
        assert_eq!(ServerSettings::from_value(Some(json!({}))), ServerSettings::default());
        assert_eq!(ServerSettings::from_value(Some(json!("bogus"))), ServerSettings::default());
    }

    #[test]
    fn test_settings_camel_case() {
        let settings = ServerSettings::from_value(Some(json!({"maxNumberOfProblems": 3})));
        assert_eq!(settings.max_number_of_problems, 3);
    }

    #[test]
    fn test_capabilities_from_client() {
        assert_eq!(
            NegotiatedCapabilities::from(&ClientCapabilities::default()),
            NegotiatedCapabilities::default()
        );

        let capabilities = ClientCapabilities {
            workspace: Some(WorkspaceClientCapabilities {
                configuration: Some(true),
                workspace_folders: Some(true),
                ..Default::default()
            }),
            text_document: Some(TextDocumentClientCapabilities {
                publish_diagnostics: Some(PublishDiagnosticsClientCapabilities {
                    related_information: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let negotiated = NegotiatedCapabilities::from(&capabilities);
        assert!(negotiated.configuration);
        assert!(negotiated.workspace_folders);
        assert!(negotiated.diagnostic_related_information);
    }

    #[test]
    fn test_document_settings_cache() {
        let session = Session::new();
        let uri = Url::parse("file:///mod/main.lua").unwrap();
        assert_eq!(session.cached_settings(&uri), None);

        session.cache_settings(uri.clone(), ServerSettings { max_number_of_problems: 5 });
        assert_eq!(session.cached_settings(&uri).map(|s| s.max_number_of_problems), Some(5));

        session.forget_document(&uri);
        assert_eq!(session.cached_settings(&uri), None);

        session.cache_settings(uri.clone(), ServerSettings::default());
        session.clear_document_settings();
        assert_eq!(session.cached_settings(&uri), None);
    }
}
