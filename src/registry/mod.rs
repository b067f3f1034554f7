//! Namespace registry
//!
//! Read-only store of the enumerated namespaces (Lua API enums) that the
//! completion engine offers. The registry is built once at start-up, either
//! from the JSON definition embedded in the binary or from a file given on
//! the command line, and is then shared through an `Arc` for the lifetime of
//! the process.
//!
//! Lookups never fail: a missing namespace is reported as `None` or as an
//! empty member slice, and callers fall back to the global completion list.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Built-in namespace definitions for the Repentance Lua API.
const BUILTIN_NAMESPACES: &str = include_str!("../../data/namespaces.json");

/// Errors raised while loading namespace definitions.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to parse namespace definitions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("namespace '{0}' is defined more than once")]
    DuplicateNamespace(String),

    #[error("member '{member}' is defined more than once in namespace '{namespace}'")]
    DuplicateMember { namespace: String, member: String },

    #[error("'{0}' is not a valid namespace name")]
    InvalidName(String),
}

/// One named constant of a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub value: i64,
}

/// An enumerated namespace: an ordered list of members plus display flags.
///
/// Member order is the declaration order of the source definition. Values
/// may repeat (aliases, trailing counters such as `NUM_CHALLENGE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    members: Vec<Member>,
    hide_zero_member: bool,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Whether members with value `0` are placeholders that completion should skip.
    pub fn hide_zero_member(&self) -> bool {
        self.hide_zero_member
    }
}

/// Serialized form of a namespace, as found in `data/namespaces.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDefinition {
    pub name: String,
    #[serde(default)]
    pub hide_zero_member: bool,
    pub members: Vec<(String, i64)>,
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    namespaces: Vec<NamespaceDefinition>,
}

/// Immutable mapping from namespace name to namespace, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
    index: FxHashMap<String, usize>,
}

impl NamespaceRegistry {
    /// Loads the namespaces compiled into the binary.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_json(BUILTIN_NAMESPACES)
    }

    /// Parses a registry document of the form
    /// `{ "namespaces": [{ "name": ..., "hideZeroMember": ..., "members": [[name, value]] }] }`.
    pub fn from_json(source: &str) -> Result<Self, RegistryError> {
        let document: RegistryDocument = serde_json::from_str(source)?;
        Self::from_definitions(document.namespaces)
    }

    /// Builds a registry from already materialized definitions, validating
    /// name uniqueness.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = NamespaceDefinition>,
    ) -> Result<Self, RegistryError> {
        let mut namespaces = Vec::new();
        let mut index = FxHashMap::default();

        for definition in definitions {
            if !is_identifier(&definition.name) {
                return Err(RegistryError::InvalidName(definition.name));
            }
            if index.contains_key(&definition.name) {
                return Err(RegistryError::DuplicateNamespace(definition.name));
            }

            let mut seen = rustc_hash::FxHashSet::default();
            let mut members = Vec::with_capacity(definition.members.len());
            for (name, value) in definition.members {
                if !seen.insert(name.clone()) {
                    return Err(RegistryError::DuplicateMember {
                        namespace: definition.name,
                        member: name,
                    });
                }
                members.push(Member { name, value });
            }

            index.insert(definition.name.clone(), namespaces.len());
            namespaces.push(Namespace {
                name: definition.name,
                members,
                hide_zero_member: definition.hide_zero_member,
            });
        }

        debug!("Loaded {} namespaces", namespaces.len());
        Ok(Self { namespaces, index })
    }

    /// Namespace names in insertion order.
    pub fn namespace_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.namespaces.iter().map(|ns| ns.name.as_str())
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.index.get(name).map(|&i| &self.namespaces[i])
    }

    /// Members of `name` in declaration order, or an empty slice when the
    /// namespace is unknown.
    pub fn members(&self, name: &str) -> &[Member] {
        self.get(name).map(Namespace::members).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

/// Characters allowed in a namespace identifier.
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(is_identifier_char)
        }
        _ => false,
    }
}
