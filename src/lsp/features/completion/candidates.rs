//! Completion candidate production
//!
//! Turns a [`CompletionContext`] into the ordered list of candidates the
//! client displays. Each candidate carries a small payload that the resolve
//! step uses to compute its detail without re-running context detection.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use super::context::CompletionContext;
use crate::registry::NamespaceRegistry;

/// What a candidate completes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Namespace,
    Member,
}

impl From<CandidateKind> for CompletionItemKind {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Namespace => CompletionItemKind::ENUM,
            CandidateKind::Member => CompletionItemKind::ENUM_MEMBER,
        }
    }
}

/// Opaque data attached to a candidate and echoed back by the client on resolve.
///
/// Serialized untagged: a member's value travels as a JSON number and a
/// namespace as its name string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidatePayload {
    Value(i64),
    Namespace(String),
}

/// One proposed completion, before or after detail resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: String,
    pub kind: CandidateKind,
    pub payload: Option<CandidatePayload>,
    pub detail: Option<String>,
}

impl Candidate {
    pub fn namespace(name: &str) -> Self {
        Self {
            label: name.to_string(),
            kind: CandidateKind::Namespace,
            payload: Some(CandidatePayload::Namespace(name.to_string())),
            detail: None,
        }
    }

    pub fn member(name: &str, value: i64) -> Self {
        Self {
            label: name.to_string(),
            kind: CandidateKind::Member,
            payload: Some(CandidatePayload::Value(value)),
            detail: None,
        }
    }

    /// Rebuilds a candidate from a completion item sent back by the client.
    ///
    /// Unknown kinds are treated as members and unreadable `data` leaves the
    /// payload empty.
    pub fn from_completion_item(item: &CompletionItem) -> Self {
        let kind = match item.kind {
            Some(CompletionItemKind::ENUM) => CandidateKind::Namespace,
            _ => CandidateKind::Member,
        };
        let payload = item
            .data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok());

        Self {
            label: item.label.clone(),
            kind,
            payload,
            detail: item.detail.clone(),
        }
    }
}

impl From<Candidate> for CompletionItem {
    fn from(candidate: Candidate) -> Self {
        CompletionItem {
            label: candidate.label,
            kind: Some(candidate.kind.into()),
            detail: candidate.detail,
            data: candidate.payload.and_then(|payload| serde_json::to_value(payload).ok()),
            ..Default::default()
        }
    }
}

/// Produce the ordered candidate list for a context.
///
/// - `Global`: every namespace, in registry order.
/// - `WithinNamespace`: every member in declaration order, skipping
///   zero-valued members when the namespace hides them.
pub fn produce_candidates(
    context: &CompletionContext<'_>,
    registry: &NamespaceRegistry,
) -> Vec<Candidate> {
    match context {
        CompletionContext::Global => registry.namespace_names().map(Candidate::namespace).collect(),
        CompletionContext::WithinNamespace(namespace) => {
            let hide_zero = namespace.hide_zero_member();
            namespace
                .members()
                .iter()
                .filter(|member| !(hide_zero && member.value == 0))
                .map(|member| Candidate::member(&member.name, member.value))
                .collect()
        }
    }
}
