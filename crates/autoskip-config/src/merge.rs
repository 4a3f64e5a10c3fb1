//! Document merging
//!
//! Maps are unioned key by key, recursing where both sides hold a value for
//! the same key. Lists are concatenated base-then-incoming with duplicates
//! kept. Anything else is replaced by the incoming value. No key is dropped
//! except by overwrite.

use crate::document::{AccessList, Offsets, OverrideDocument};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Fold an incoming value into `self` using map-union / list-concat rules.
pub trait Merge {
    fn merge(&mut self, incoming: Self);
}

impl<T> Merge for Vec<T> {
    fn merge(&mut self, incoming: Self) {
        self.extend(incoming);
    }
}

impl<V: Merge> Merge for BTreeMap<String, V> {
    fn merge(&mut self, incoming: Self) {
        for (key, value) in incoming {
            match self.entry(key) {
                Entry::Occupied(mut slot) => slot.get_mut().merge(value),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
    }
}

/// Offsets are a scalar pair: the incoming value wins.
impl Merge for Offsets {
    fn merge(&mut self, incoming: Self) {
        *self = incoming;
    }
}

impl Merge for AccessList {
    fn merge(&mut self, incoming: Self) {
        self.users.merge(incoming.users);
        self.clients.merge(incoming.clients);
        self.keys.merge(incoming.keys);
    }
}

impl Merge for Value {
    fn merge(&mut self, incoming: Self) {
        merge_value(self, incoming);
    }
}

impl Merge for OverrideDocument {
    fn merge(&mut self, incoming: Self) {
        Merge::merge(&mut self.markers, incoming.markers);
        Merge::merge(&mut self.offsets, incoming.offsets);
        Merge::merge(&mut self.allowed, incoming.allowed);
        Merge::merge(&mut self.blocked, incoming.blocked);
        Merge::merge(&mut self.clients, incoming.clients);
    }
}

/// Deep merge two JSON values.
///
/// Objects merge recursively, arrays concatenate, and any other pairing is
/// replaced by `incoming`.
pub fn merge_value(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, incoming_val) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => merge_value(base_val, incoming_val),
                    None => {
                        base_map.insert(key, incoming_val);
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(incoming_items)) => {
            base_items.extend(incoming_items);
        }
        (base, incoming) => {
            *base = incoming;
        }
    }
}

/// Merge documents in iteration order into one. Later documents win scalar
/// conflicts.
pub fn merge_all<I>(documents: I) -> OverrideDocument
where
    I: IntoIterator<Item = OverrideDocument>,
{
    documents
        .into_iter()
        .fold(OverrideDocument::empty(), |mut acc, doc| {
            acc.merge(doc);
            acc
        })
}
