//! Second-phase completion: attach a detail string to one chosen candidate.

use tower_lsp::lsp_types::CompletionItem;

use super::candidates::{Candidate, CandidatePayload};

/// Detail for a payload: the member value, or the namespace name.
///
/// A missing payload resolves to an empty string.
pub fn detail_for(payload: Option<&CandidatePayload>) -> String {
    match payload {
        Some(CandidatePayload::Value(value)) => value.to_string(),
        Some(CandidatePayload::Namespace(name)) => name.clone(),
        None => String::new(),
    }
}

/// Attach detail to a candidate. Resolving an already resolved candidate
/// yields the same detail.
pub fn resolve_candidate(mut candidate: Candidate) -> Candidate {
    candidate.detail = Some(detail_for(candidate.payload.as_ref()));
    candidate
}

/// Resolve a completion item as received from the client.
///
/// Only `detail` is touched; every other field the client sent is returned
/// unchanged.
pub fn resolve_completion_item(mut item: CompletionItem) -> CompletionItem {
    let candidate = Candidate::from_completion_item(&item);
    item.detail = resolve_candidate(candidate).detail;
    item
}
