//! Translation between rating-key and GUID item namespaces
//!
//! Rating keys are server-local numbers that change when a library is
//! re-indexed. GUIDs are provider-assigned and stable. Moving an override
//! document to GUIDs keeps it valid across a server migration; moving it back
//! to rating keys makes it readable against the current server.
//!
//! Translation never drops data: a key with no mapping is kept as-is and
//! reported in [`Translation::unresolved`].

use crate::cascade::GLOBAL_SCOPE;
use crate::document::{AccessList, OverrideDocument};
use crate::merge::Merge;
use regex::Regex;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

static RATING_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

static GUID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$").unwrap());

/// The identifier namespace an item key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    RatingKey,
    Guid,
}

impl Namespace {
    /// Classify a key by shape: all digits is a rating key, `scheme://...` is
    /// a GUID. Anything else (scope names, the global sentinel) is neither.
    pub fn classify(key: &str) -> Option<Self> {
        if RATING_KEY_PATTERN.is_match(key) {
            Some(Self::RatingKey)
        } else if GUID_PATTERN.is_match(key) {
            Some(Self::Guid)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RatingKey => "rating-key",
            Self::Guid => "guid",
        }
    }
}

/// One-way key mapping for a single server snapshot.
///
/// A table from [`crate::MediaServer::mapping_table`] maps rating keys to
/// GUIDs; its [`inverse`](Self::inverse) maps GUIDs back to rating keys. When
/// several keys map to the same target (the same title in two libraries),
/// the inverse keeps the first one inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    forward: HashMap<String, String>,
    reverse: HashMap<String, String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, mapped: impl Into<String>) {
        let key = key.into();
        let mapped = mapped.into();
        self.reverse
            .entry(mapped.clone())
            .or_insert_with(|| key.clone());
        self.forward.insert(key, mapped);
    }

    /// The key `key` maps to.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.forward.get(key).map(String::as_str)
    }

    /// The same association read in the other direction.
    pub fn inverse(&self) -> Self {
        Self {
            forward: self.reverse.clone(),
            reverse: self.forward.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<K: Into<String>, G: Into<String>> FromIterator<(K, G)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (K, G)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (rating_key, guid) in iter {
            table.insert(rating_key, guid);
        }
        table
    }
}

/// Result of translating one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub document: OverrideDocument,
    /// Source keys with no mapping, left untouched in `document`
    pub unresolved: BTreeSet<String>,
    /// Number of key occurrences rewritten
    pub translated: usize,
}

/// Rewrite every rating key in `document` to its GUID.
///
/// `rating_key_lookup` maps rating keys to GUIDs.
pub fn to_guids(document: &OverrideDocument, rating_key_lookup: &MappingTable) -> Translation {
    translate(document, Namespace::Guid, |key| rating_key_lookup.get(key))
}

/// Rewrite every GUID in `document` to its rating key.
///
/// `guid_lookup` maps GUIDs to rating keys, usually the
/// [`inverse`](MappingTable::inverse) of a server's table.
pub fn to_rating_keys(document: &OverrideDocument, guid_lookup: &MappingTable) -> Translation {
    translate(document, Namespace::RatingKey, |key| guid_lookup.get(key))
}

/// Rewrite item keys into `target` using `lookup`.
///
/// Keys already shaped like `target`, and the global scope, are passed
/// through without a lookup.
pub fn translate<'t, F>(document: &OverrideDocument, target: Namespace, lookup: F) -> Translation
where
    F: Fn(&str) -> Option<&'t str>,
{
    let mut unresolved = BTreeSet::new();
    let mut translated = 0;

    let mut rename = |key: &str| -> String {
        if key == GLOBAL_SCOPE || Namespace::classify(key) == Some(target) {
            return key.to_string();
        }
        match lookup(key) {
            Some(mapped) => {
                translated += 1;
                mapped.to_string()
            }
            None => {
                unresolved.insert(key.to_string());
                key.to_string()
            }
        }
    };

    let markers = rekey(&document.markers, &mut rename);
    let offsets = rekey(&document.offsets, &mut rename);
    let allowed = rekey_access(&document.allowed, &mut rename);
    let blocked = rekey_access(&document.blocked, &mut rename);

    Translation {
        document: OverrideDocument {
            markers,
            offsets,
            allowed,
            blocked,
            clients: document.clients.clone(),
        },
        unresolved,
        translated,
    }
}

fn rekey<V, F>(entries: &BTreeMap<String, V>, rename: &mut F) -> BTreeMap<String, V>
where
    V: Merge + Clone,
    F: FnMut(&str) -> String,
{
    let mut out: BTreeMap<String, V> = BTreeMap::new();
    for (key, value) in entries {
        match out.entry(rename(key)) {
            Entry::Occupied(mut slot) => {
                tracing::warn!(key = %slot.key(), from = %key, "Translated keys collide, merging entries");
                Merge::merge(slot.get_mut(), value.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
        }
    }
    out
}

fn rekey_access<F>(list: &AccessList, rename: &mut F) -> AccessList
where
    F: FnMut(&str) -> String,
{
    AccessList {
        users: list.users.clone(),
        clients: list.clients.clone(),
        keys: list.keys.iter().map(|key| rename(key)).collect(),
    }
}
