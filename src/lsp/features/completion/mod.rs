//! Code completion for namespace-qualified enum members
//!
//! This module provides:
//! - Context detection from the text preceding the cursor
//! - Candidate production for the global namespace list or one namespace
//! - Detail resolution for a single chosen candidate

pub mod candidates;
pub mod context;
pub mod resolve;

pub use candidates::{Candidate, CandidateKind, CandidatePayload, produce_candidates};
pub use context::{CompletionContext, MEMBER_ACCESS, determine_context};
pub use resolve::{detail_for, resolve_candidate, resolve_completion_item};

use tower_lsp::lsp_types::CompletionItem;

use crate::registry::NamespaceRegistry;

/// Full completion pipeline for one line prefix.
pub fn complete(line_prefix: &str, registry: &NamespaceRegistry) -> Vec<CompletionItem> {
    let context = determine_context(line_prefix, registry);
    produce_candidates(&context, registry)
        .into_iter()
        .map(CompletionItem::from)
        .collect()
}
