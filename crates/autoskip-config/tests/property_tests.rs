//! Algebraic properties of merging, cascading and translation

use autoskip_config::{
    AccessList, CascadeResolver, MappingTable, MarkerRegion, Merge, Offsets, OverrideDocument,
    ScopeChain, to_guids, to_rating_keys,
};
use proptest::collection::{btree_map, btree_set, vec};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeMap;

fn marker() -> impl Strategy<Value = MarkerRegion> {
    (0i64..10_000, 0i64..10_000).prop_map(|(start, len)| MarkerRegion::new(start, start + len))
}

fn offsets() -> impl Strategy<Value = Offsets> {
    (-5_000i64..5_000, -5_000i64..5_000).prop_map(|(start, end)| Offsets::new(start, end))
}

fn access_list(keys: BoxedStrategy<String>) -> impl Strategy<Value = AccessList> {
    (
        vec("[a-e]", 0..3),
        vec("[A-C]", 0..3),
        vec(keys, 0..4),
    )
        .prop_map(|(users, clients, keys)| AccessList { users, clients, keys })
}

/// Client settings with a fixed shape, so every key keeps one JSON kind.
fn client_settings() -> impl Strategy<Value = Value> {
    (vec("[a-d]", 0..3), proptest::option::of(0i64..100))
        .prop_map(|(tags, volume)| match volume {
            Some(volume) => json!({ "tags": tags, "volume": volume }),
            None => json!({ "tags": tags }),
        })
}

fn document_with_keys(keys: BoxedStrategy<String>) -> impl Strategy<Value = OverrideDocument> {
    (
        btree_map(keys.clone(), vec(marker(), 0..3), 0..4),
        btree_map(keys.clone(), offsets(), 0..4),
        access_list(keys.clone()),
        access_list(keys),
        btree_map("[A-C]", client_settings(), 0..3),
    )
        .prop_map(|(markers, offsets, allowed, blocked, clients)| OverrideDocument {
            markers,
            offsets,
            allowed,
            blocked,
            clients,
        })
}

fn document() -> impl Strategy<Value = OverrideDocument> {
    document_with_keys("[1-6]".boxed())
}

/// A document whose item keys all come from one set of rating keys.
fn rating_keyed_document() -> impl Strategy<Value = (Vec<String>, OverrideDocument)> {
    btree_set("[0-9]{1,4}", 1..8).prop_flat_map(|set| {
        let keys: Vec<String> = set.into_iter().collect();
        let doc = document_with_keys(proptest::sample::select(keys.clone()).boxed());
        (Just(keys), doc)
    })
}

fn merged(mut base: OverrideDocument, incoming: OverrideDocument) -> OverrideDocument {
    base.merge(incoming);
    base
}

fn guid_for(rating_key: &str) -> String {
    format!("plex://item/{rating_key}")
}

proptest! {
    #[test]
    fn merge_is_associative(a in document(), b in document(), c in document()) {
        let left = merged(merged(a.clone(), b.clone()), c.clone());
        let right = merged(a, merged(b, c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn list_sections_concatenate_in_order(a in document(), b in document(), c in document()) {
        let result = merged(merged(a.clone(), b.clone()), c.clone());

        let users: Vec<_> = [&a, &b, &c].iter().flat_map(|d| d.allowed.users.clone()).collect();
        let keys: Vec<_> = [&a, &b, &c].iter().flat_map(|d| d.blocked.keys.clone()).collect();
        prop_assert_eq!(result.allowed.users, users);
        prop_assert_eq!(result.blocked.keys, keys);
    }

    #[test]
    fn merge_never_drops_keys(a in document(), b in document()) {
        let result = merged(a.clone(), b.clone());
        for key in a.markers.keys().chain(b.markers.keys()) {
            prop_assert!(result.markers.contains_key(key));
        }
        for key in a.offsets.keys().chain(b.offsets.keys()) {
            prop_assert!(result.offsets.contains_key(key));
        }
    }

    #[test]
    fn first_match_prefers_most_specific_entry(
        doc in document(),
        chain in vec("[1-8]", 0..5),
    ) {
        let resolver = CascadeResolver::new(doc.clone(), false);
        let scope = ScopeChain::new(chain.clone());

        let expected = chain
            .iter()
            .find_map(|key| doc.offsets.get(key))
            .copied()
            .unwrap_or(resolver.default_offsets());
        prop_assert_eq!(resolver.offsets(&scope), expected);
    }

    #[test]
    fn cascading_markers_contain_every_scope(
        doc in document(),
        chain in vec("[1-8]", 0..5),
    ) {
        let resolver = CascadeResolver::new(doc.clone(), true);
        let resolved = resolver.markers(&ScopeChain::new(chain.clone()));

        for key in &chain {
            if let Some(own) = doc.markers.get(key) {
                for region in own {
                    prop_assert!(resolved.contains(region));
                }
            }
        }
    }

    #[test]
    fn translation_round_trips((keys, doc) in rating_keyed_document()) {
        let table: MappingTable = keys.iter().map(|k| (k.clone(), guid_for(k))).collect();

        let forward = to_guids(&doc, &table);
        prop_assert!(forward.unresolved.is_empty());
        let back = to_rating_keys(&forward.document, &table.inverse());
        prop_assert!(back.unresolved.is_empty());
        prop_assert_eq!(back.document, doc);
    }

    #[test]
    fn unresolved_entries_are_preserved(doc in document()) {
        // Only rating keys 1-3 are known to the server
        let table: MappingTable = ["1", "2", "3"].iter().map(|k| (*k, guid_for(k))).collect();
        let result = to_guids(&doc, &table);

        let unknown: BTreeMap<_, _> = doc
            .offsets
            .iter()
            .filter(|(key, _)| table.get(key).is_none())
            .collect();
        for (key, value) in unknown {
            prop_assert!(result.unresolved.contains(key));
            prop_assert_eq!(result.document.offsets.get(key), Some(value));
        }
        for (key, regions) in doc.markers.iter().filter(|(key, _)| table.get(key).is_none()) {
            prop_assert_eq!(result.document.markers.get(key), Some(regions));
        }
    }
}
