//! Context detection for code completion
//!
//! Decides, from the text between the start of the line and the cursor,
//! whether the user is completing a namespace name or a member of one
//! particular namespace. The test is a plain suffix check: the line prefix
//! must end with `<Namespace>.` where `<Namespace>` is a registered name.
//! There is no tokenization and no awareness of strings or comments.

use tracing::trace;

use crate::registry::{Namespace, NamespaceRegistry};

/// Member-access delimiter that introduces a namespace-scoped completion.
pub const MEMBER_ACCESS: char = '.';

/// Completion context at a cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext<'r> {
    /// No namespace qualifier before the cursor: offer every namespace.
    Global,

    /// Cursor directly follows `<Namespace>.`: offer that namespace's members.
    ///
    /// The namespace is borrowed from the registry, so it always exists.
    WithinNamespace(&'r Namespace),
}

impl<'r> CompletionContext<'r> {
    pub fn namespace(&self) -> Option<&'r Namespace> {
        match *self {
            CompletionContext::Global => None,
            CompletionContext::WithinNamespace(ns) => Some(ns),
        }
    }
}

/// Determine the completion context for the given line prefix.
///
/// Exactly one trailing `.` is stripped, then the namespaces are tried in
/// registry order and the first whose name ends the remaining text wins.
pub fn determine_context<'r>(
    line_prefix: &str,
    registry: &'r NamespaceRegistry,
) -> CompletionContext<'r> {
    let Some(before_dot) = line_prefix.strip_suffix(MEMBER_ACCESS) else {
        return CompletionContext::Global;
    };

    match registry
        .namespaces()
        .iter()
        .find(|namespace| before_dot.ends_with(namespace.name()))
    {
        Some(namespace) => {
            trace!("Completion context: within namespace {}", namespace.name());
            CompletionContext::WithinNamespace(namespace)
        }
        None => {
            trace!("No registered namespace before '.', using global context");
            CompletionContext::Global
        }
    }
}
