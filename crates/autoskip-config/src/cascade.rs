//! Cascade resolution of override entries along a scope chain
//!
//! A [`ScopeChain`] lists the keys an item can be addressed by, most specific
//! first: the item itself, its season, its series, then [`GLOBAL_SCOPE`].
//!
//! In first-match mode the most specific scope with an entry wins outright.
//! In cascading mode every scope's entry is merged from least to most
//! specific with the [`Merge`] rules, so lists accumulate and scalars end up
//! as the most specific value.

use crate::document::{AccessList, MarkerRegion, Offsets, OverrideDocument};
use crate::merge::Merge;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Sentinel scope that closes every chain built from a hierarchy.
pub const GLOBAL_SCOPE: &str = "global";

/// Ordered lookup keys for one item, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeChain(Vec<String>);

impl ScopeChain {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Build `item -> parent -> grandparent -> global`, skipping absent levels.
    pub fn from_hierarchy(item: &str, parent: Option<&str>, grandparent: Option<&str>) -> Self {
        let keys = std::iter::once(item)
            .chain(parent)
            .chain(grandparent)
            .chain(std::iter::once(GLOBAL_SCOPE));
        Self::new(keys)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn most_specific(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeChain {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A top-level section of an override document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Markers,
    Offsets,
    Allowed,
    Blocked,
    Clients,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Self::Markers,
        Self::Offsets,
        Self::Allowed,
        Self::Blocked,
        Self::Clients,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markers => "markers",
            Self::Offsets => "offsets",
            Self::Allowed => "allowed",
            Self::Blocked => "blocked",
            Self::Clients => "clients",
        }
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| Error::UnknownSection { name: s.to_string() })
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking an item's scopes against the allow and block lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAccess {
    Allowed,
    Blocked,
    Unspecified,
}

/// Resolves effective override values for items over a merged document.
///
/// Immutable once built; a settings reload constructs a new resolver.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    document: OverrideDocument,
    cascade: bool,
    default_offsets: Offsets,
}

impl CascadeResolver {
    /// Create a resolver. `cascade` selects cascading-merge over first-match.
    pub fn new(document: OverrideDocument, cascade: bool) -> Self {
        Self {
            document,
            cascade,
            default_offsets: Offsets::new(0, 0),
        }
    }

    /// Offsets returned when no scope in a chain has an entry.
    pub fn with_default_offsets(mut self, offsets: Offsets) -> Self {
        self.default_offsets = offsets;
        self
    }

    pub fn document(&self) -> &OverrideDocument {
        &self.document
    }

    pub fn is_cascading(&self) -> bool {
        self.cascade
    }

    pub fn default_offsets(&self) -> Offsets {
        self.default_offsets
    }

    fn lookup<V>(&self, entries: &BTreeMap<String, V>, chain: &ScopeChain) -> Option<V>
    where
        V: Merge + Clone,
    {
        if !self.cascade {
            return chain.iter().find_map(|scope| entries.get(scope)).cloned();
        }

        chain
            .iter()
            .rev()
            .filter_map(|scope| entries.get(scope))
            .fold(None, |acc: Option<V>, entry| match acc {
                Some(mut merged) => {
                    Merge::merge(&mut merged, entry.clone());
                    Some(merged)
                }
                None => Some(entry.clone()),
            })
    }

    /// Custom markers for the item; empty when no scope defines any.
    pub fn markers(&self, chain: &ScopeChain) -> Vec<MarkerRegion> {
        self.lookup(&self.document.markers, chain).unwrap_or_default()
    }

    /// Offsets for the item, or the configured default offsets.
    pub fn offsets(&self, chain: &ScopeChain) -> Offsets {
        self.lookup(&self.document.offsets, chain)
            .unwrap_or(self.default_offsets)
    }

    /// True when some scope in the chain has its own offsets entry.
    pub fn has_custom_offsets(&self, chain: &ScopeChain) -> bool {
        chain.iter().any(|scope| self.document.offsets.contains_key(scope))
    }

    /// The allow list as it applies to the item: users and clients pass
    /// through, `keys` holds the matched scopes.
    pub fn allowed(&self, chain: &ScopeChain) -> AccessList {
        self.scoped_access(&self.document.allowed, chain)
    }

    /// The block list as it applies to the item. See [`Self::allowed`].
    pub fn blocked(&self, chain: &ScopeChain) -> AccessList {
        self.scoped_access(&self.document.blocked, chain)
    }

    fn scoped_access(&self, list: &AccessList, chain: &ScopeChain) -> AccessList {
        let keys = if self.cascade {
            chain
                .iter()
                .rev()
                .filter(|scope| list.has_key(scope))
                .map(str::to_string)
                .collect()
        } else {
            chain
                .iter()
                .find(|scope| list.has_key(scope))
                .map(|scope| vec![scope.to_string()])
                .unwrap_or_default()
        };

        AccessList {
            users: list.users.clone(),
            clients: list.clients.clone(),
            keys,
        }
    }

    /// Decide whether the item's scopes are allowed or blocked.
    ///
    /// First-match mode uses the most specific scope named in either list,
    /// with block winning a tie at the same scope. Cascading mode blocks when
    /// any scope is blocked, else allows when any scope is allowed.
    pub fn key_access(&self, chain: &ScopeChain) -> KeyAccess {
        let allowed = &self.document.allowed;
        let blocked = &self.document.blocked;

        if self.cascade {
            if chain.iter().any(|scope| blocked.has_key(scope)) {
                KeyAccess::Blocked
            } else if chain.iter().any(|scope| allowed.has_key(scope)) {
                KeyAccess::Allowed
            } else {
                KeyAccess::Unspecified
            }
        } else {
            chain
                .iter()
                .find_map(|scope| {
                    if blocked.has_key(scope) {
                        Some(KeyAccess::Blocked)
                    } else if allowed.has_key(scope) {
                        Some(KeyAccess::Allowed)
                    } else {
                        None
                    }
                })
                .unwrap_or(KeyAccess::Unspecified)
        }
    }

    pub fn is_allowed_user(&self, user: &str) -> bool {
        self.document.allowed.has_user(user)
    }

    pub fn is_blocked_user(&self, user: &str) -> bool {
        self.document.blocked.has_user(user)
    }

    pub fn is_allowed_client(&self, client: &str) -> bool {
        self.document.allowed.has_client(client)
    }

    pub fn is_blocked_client(&self, client: &str) -> bool {
        self.document.blocked.has_client(client)
    }

    /// Per-client settings by client name.
    pub fn client(&self, name: &str) -> Option<&Value> {
        self.document.clients.get(name)
    }

    /// Effective value of `section` for the chain, as JSON.
    ///
    /// For [`Section::Clients`] the chain holds client names.
    pub fn resolve(&self, section: Section, chain: &ScopeChain) -> Result<Value> {
        let value = match section {
            Section::Markers => serde_json::to_value(self.markers(chain))?,
            Section::Offsets => serde_json::to_value(self.offsets(chain))?,
            Section::Allowed => serde_json::to_value(self.allowed(chain))?,
            Section::Blocked => serde_json::to_value(self.blocked(chain))?,
            Section::Clients => self
                .lookup(&self.document.clients, chain)
                .unwrap_or_else(|| Value::Object(Default::default())),
        };
        Ok(value)
    }

    /// [`Self::resolve`] with the section given by name.
    pub fn resolve_named(&self, section: &str, chain: &ScopeChain) -> Result<Value> {
        self.resolve(section.parse()?, chain)
    }
}
