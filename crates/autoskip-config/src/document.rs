//! Override document model
//!
//! An override document holds per-item exceptions layered on top of the flat
//! settings. All five sections are always present in memory; a section that
//! is absent on disk deserializes as empty.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Top-level section names, in canonical order.
pub const SECTION_NAMES: [&str; 5] = ["markers", "offsets", "allowed", "blocked", "clients"];

/// Field names of an [`AccessList`].
pub const ACCESS_FIELDS: [&str; 3] = ["users", "clients", "keys"];

/// A custom marker region on an item's timeline, in milliseconds.
///
/// Times keep the number exactly as written, so a fractional value such as
/// `1000.5` survives a rewrite. Numeric strings are accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRegion {
    #[serde(deserialize_with = "millis")]
    pub start: Number,
    #[serde(deserialize_with = "millis")]
    pub end: Number,

    /// Behaviour while inside the region, e.g. "skip" or "volume"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Fields this model does not interpret, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarkerRegion {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            mode: None,
            name: None,
            extra: Map::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(Number),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Number(number) => Ok(number),
        Millis::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid marker time {text:?}"))),
    }
}

/// Start and end adjustments for an item, in milliseconds.
///
/// Serialized as `[start, end]`. The object form `{"start": .., "end": ..}`
/// is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OffsetsRepr", into = "[i64; 2]")]
pub struct Offsets {
    pub start: i64,
    pub end: i64,
}

impl Offsets {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OffsetsRepr {
    Pair([i64; 2]),
    Named { start: i64, end: i64 },
}

impl From<OffsetsRepr> for Offsets {
    fn from(repr: OffsetsRepr) -> Self {
        match repr {
            OffsetsRepr::Pair([start, end]) => Self { start, end },
            OffsetsRepr::Named { start, end } => Self { start, end },
        }
    }
}

impl From<Offsets> for [i64; 2] {
    fn from(offsets: Offsets) -> Self {
        [offsets.start, offsets.end]
    }
}

/// Users, clients and item keys named by the `allowed` or `blocked` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    #[serde(default)]
    pub users: Vec<String>,

    #[serde(default)]
    pub clients: Vec<String>,

    #[serde(default)]
    pub keys: Vec<String>,
}

impl AccessList {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.clients.is_empty() && self.keys.is_empty()
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.users.iter().any(|u| u.eq_ignore_ascii_case(user))
    }

    pub fn has_client(&self, client: &str) -> bool {
        self.clients.iter().any(|c| c.eq_ignore_ascii_case(client))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// Per-item exceptions loaded from one or more `custom*.json` files.
///
/// Item keys are either all rating keys or all GUIDs; see
/// [`crate::translate`] for moving a document between the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideDocument {
    /// Item key -> custom marker regions
    #[serde(default)]
    pub markers: BTreeMap<String, Vec<MarkerRegion>>,

    /// Item key -> start/end offsets
    #[serde(default)]
    pub offsets: BTreeMap<String, Offsets>,

    #[serde(default)]
    pub allowed: AccessList,

    #[serde(default)]
    pub blocked: AccessList,

    /// Client name -> free-form per-client settings
    #[serde(default)]
    pub clients: BTreeMap<String, Value>,
}

impl OverrideDocument {
    /// The default-shaped document: every section present and empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
            && self.offsets.is_empty()
            && self.allowed.is_empty()
            && self.blocked.is_empty()
            && self.clients.is_empty()
    }

    /// Every item key referenced anywhere in the document, deduplicated.
    pub fn item_keys(&self) -> std::collections::BTreeSet<&str> {
        self.markers
            .keys()
            .chain(self.offsets.keys())
            .chain(self.allowed.keys.iter())
            .chain(self.blocked.keys.iter())
            .map(String::as_str)
            .collect()
    }
}
