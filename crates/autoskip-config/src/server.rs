//! Media-server boundary
//!
//! The live server client belongs to the surrounding application. This
//! module fixes what the settings layer needs from it and provides a
//! snapshot-backed implementation for offline use and tests.

use crate::cascade::ScopeChain;
use crate::translate::{MappingTable, Namespace};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the settings layer asks of a media server.
pub trait MediaServer {
    /// Rating key <-> GUID table for every item the server currently knows.
    fn mapping_table(&self) -> Result<MappingTable>;

    /// Scope chain for an item, in the same namespace as `item`.
    fn scope_chain(&self, item: &str) -> Result<ScopeChain>;
}

/// One library item in a snapshot. Parents are referenced by rating key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotItem {
    pub rating_key: String,
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grandparent: Option<String>,
}

/// A saved listing of a server's library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub items: Vec<SnapshotItem>,
}

impl LibrarySnapshot {
    pub fn from_items(items: Vec<SnapshotItem>) -> Self {
        Self { items }
    }

    /// Read a JSON snapshot. Any failure is reported as a server error.
    pub fn load(path: &Path) -> Result<Self> {
        autoskip_fs::ConfigStore::new()
            .load(path)
            .map_err(|e| Error::server(format!("cannot read library snapshot: {e}")))
    }

    fn by_rating_key(&self, rating_key: &str) -> Option<&SnapshotItem> {
        self.items.iter().find(|item| item.rating_key == rating_key)
    }

    fn find(&self, key: &str) -> Option<&SnapshotItem> {
        self.items
            .iter()
            .find(|item| item.rating_key == key || item.guid == key)
    }
}

impl MediaServer for LibrarySnapshot {
    fn mapping_table(&self) -> Result<MappingTable> {
        Ok(self
            .items
            .iter()
            .map(|item| (item.rating_key.as_str(), item.guid.as_str()))
            .collect())
    }

    fn scope_chain(&self, item: &str) -> Result<ScopeChain> {
        let entry = self
            .find(item)
            .ok_or_else(|| Error::server(format!("item {item} not found in library")))?;

        let as_guids = Namespace::classify(item) == Some(Namespace::Guid);
        let express = |rating_key: &str| -> Option<String> {
            if as_guids {
                self.by_rating_key(rating_key).map(|parent| parent.guid.clone())
            } else {
                Some(rating_key.to_string())
            }
        };

        let parent = entry.parent.as_deref().and_then(express);
        let grandparent = entry.grandparent.as_deref().and_then(express);

        Ok(ScopeChain::from_hierarchy(
            item,
            parent.as_deref(),
            grandparent.as_deref(),
        ))
    }
}
