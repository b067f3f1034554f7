//! Diagnostic provider abstraction
//!
//! The backend validates every open document through a `DiagnosticProvider`.
//! The only provider shipped today flags words written entirely in capitals.

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, Location, Range, Url,
};

use crate::lsp::document::char_index_to_position;
use crate::lsp::session::ServerSettings;

/// Source tag attached to every diagnostic produced by this server.
pub const DIAGNOSTIC_SOURCE: &str = "isaac-api";

/// Everything a provider needs to validate one document version.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRequest<'a> {
    pub uri: &'a Url,
    pub text: &'a Rope,
    pub settings: &'a ServerSettings,
    /// Attach `relatedInformation` to diagnostics.
    pub related_information: bool,
}

/// Common interface for all diagnostic backends
pub trait DiagnosticProvider: Send + Sync {
    /// Validate a document and return its diagnostics (empty when clean).
    fn validate(&self, request: &ValidationRequest<'_>) -> Vec<Diagnostic>;

    /// Get a human-readable name for this backend (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}

/// Word boundaries are ASCII-only, so `éAB` still yields `AB`.
static UPPERCASE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)[A-Z]{2,}(?-u:\b)").expect("uppercase word pattern is valid")
});

/// Warns about every all-uppercase word of two or more letters.
#[derive(Debug, Default, Clone, Copy)]
pub struct UppercaseWordProvider;

impl DiagnosticProvider for UppercaseWordProvider {
    fn validate(&self, request: &ValidationRequest<'_>) -> Vec<Diagnostic> {
        let text = request.text.to_string();
        let limit = request.settings.max_number_of_problems as usize;

        UPPERCASE_WORD
            .find_iter(&text)
            .take(limit)
            .map(|m| {
                let position_at = |byte: usize| {
                    char_index_to_position(request.text.byte_to_char(byte), request.text)
                };
                let range = Range {
                    start: position_at(m.start()),
                    end: position_at(m.end()),
                };
                let related_information = request.related_information.then(|| {
                    ["Spelling matters", "Particularly for names"]
                        .into_iter()
                        .map(|message| DiagnosticRelatedInformation {
                            location: Location { uri: request.uri.clone(), range },
                            message: message.to_string(),
                        })
                        .collect()
                });

                Diagnostic {
                    range,
                    severity: Some(DiagnosticSeverity::WARNING),
                    source: Some(DIAGNOSTIC_SOURCE.to_string()),
                    message: format!("{} is all uppercase.", m.as_str()),
                    related_information,
                    ..Default::default()
                }
            })
            .collect()
    }

    fn backend_name(&self) -> &'static str {
        "uppercase-words"
    }
}
