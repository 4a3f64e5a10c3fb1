//! Flat settings file
//!
//! `config.toml` holds one table per section. Every key in [`SCHEMA`] is
//! guaranteed present after [`load_flat_config`]: missing sections and keys
//! are back-filled with their defaults and the file is rewritten once,
//! preserving operator comments and ordering.
//!
//! Values written as strings by older tooling (`ssl = "yes"`,
//! `port = "32400"`, `tags = "intro, credits"`) are coerced to the schema
//! type.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table, Value};

pub const SECTION_ACCOUNT: &str = "Plex.tv";
pub const SECTION_SERVER: &str = "Server";
pub const SECTION_SECURITY: &str = "Security";
pub const SECTION_SKIP: &str = "Skip";
pub const SECTION_OFFSETS: &str = "Offsets";

const DEFAULT_PORT: i64 = 32400;
const DEFAULT_TAGS: &str = "intro, commercial, advertisement";
const DEFAULT_START_OFFSET: i64 = 3000;
const DEFAULT_END_OFFSET: i64 = 1000;

/// A schema default, typed as it is written into a fresh file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl DefaultValue {
    fn to_item(self) -> Item {
        match self {
            Self::Str(s) => toml_edit::value(s),
            Self::Bool(b) => toml_edit::value(b),
            Self::Int(i) => toml_edit::value(i),
            Self::Float(f) => toml_edit::value(f),
        }
    }
}

/// One key of the flat settings schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaKey {
    pub section: &'static str,
    pub key: &'static str,
    pub default: DefaultValue,
}

const fn key(section: &'static str, key: &'static str, default: DefaultValue) -> SchemaKey {
    SchemaKey {
        section,
        key,
        default,
    }
}

/// Every section and key the flat settings file must contain.
pub const SCHEMA: &[SchemaKey] = &[
    key(SECTION_ACCOUNT, "username", DefaultValue::Str("")),
    key(SECTION_ACCOUNT, "password", DefaultValue::Str("")),
    key(SECTION_ACCOUNT, "token", DefaultValue::Str("")),
    key(SECTION_ACCOUNT, "servername", DefaultValue::Str("")),
    key(SECTION_SERVER, "address", DefaultValue::Str("")),
    key(SECTION_SERVER, "ssl", DefaultValue::Bool(true)),
    key(SECTION_SERVER, "port", DefaultValue::Int(DEFAULT_PORT)),
    key(SECTION_SECURITY, "ignore-certs", DefaultValue::Bool(false)),
    key(SECTION_SKIP, "tags", DefaultValue::Str(DEFAULT_TAGS)),
    key(SECTION_SKIP, "last-chapter", DefaultValue::Float(0.0)),
    key(SECTION_SKIP, "unwatched", DefaultValue::Bool(true)),
    key(SECTION_SKIP, "first-episode-series", DefaultValue::Str("Watched")),
    key(SECTION_SKIP, "first-episode-season", DefaultValue::Str("Always")),
    key(SECTION_SKIP, "custom-cascade", DefaultValue::Bool(true)),
    key(SECTION_OFFSETS, "start", DefaultValue::Int(DEFAULT_START_OFFSET)),
    key(SECTION_OFFSETS, "end", DefaultValue::Int(DEFAULT_END_OFFSET)),
];

fn schema_default(section: &str, key: &str) -> Option<DefaultValue> {
    SCHEMA
        .iter()
        .find(|k| k.section == section && k.key == key)
        .map(|k| k.default)
}

/// When to skip the first episode of a series or season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipMode {
    Never,
    Watched,
    Always,
}

impl SkipMode {
    /// Decode a setting value.
    ///
    /// Boolean forms come first (`true` is `Always`, `false` is `Never`),
    /// then the names `never`, `watched`/`played` and `always`/`all`.
    /// Anything else falls back to `Always` with a warning.
    pub fn decode(raw: &str) -> Self {
        if let Some(flag) = parse_bool(raw) {
            return if flag { Self::Always } else { Self::Never };
        }
        match raw.trim().to_lowercase().as_str() {
            "never" => Self::Never,
            "watched" | "played" => Self::Watched,
            "always" | "all" => Self::Always,
            other => {
                tracing::warn!(value = other, "Unrecognised skip mode, using \"always\"");
                Self::Always
            }
        }
    }
}

/// Parse the boolean spellings accepted in the flat file.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated list: spaces removed, lower-cased, trimmed.
pub fn parse_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(normalize_list_item).collect()
}

fn normalize_list_item(item: &str) -> String {
    item.replace(' ', "").to_lowercase().trim().to_string()
}

/// Strip scheme prefixes and trailing slashes from a server address.
pub fn normalize_address(raw: &str) -> String {
    let mut address = raw.trim();
    for prefix in ["http://", "https://"] {
        if let Some(rest) = address.strip_prefix(prefix) {
            address = rest;
        }
    }
    address.trim_end_matches('/').to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountSettings {
    pub username: String,
    pub password: String,
    pub token: String,
    pub servername: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerSettings {
    /// Host (and optional path) without scheme or trailing slash
    pub address: String,
    pub ssl: bool,
    pub port: i64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: String::new(),
            ssl: true,
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecuritySettings {
    pub ignore_certs: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipSettings {
    /// Marker tags that trigger a skip, lower-cased
    pub tags: Vec<String>,
    /// Fraction of the final chapter treated as credits; 0 disables
    pub last_chapter: f64,
    pub unwatched: bool,
    pub first_episode_series: SkipMode,
    pub first_episode_season: SkipMode,
    /// Merge override entries across the whole scope chain instead of
    /// stopping at the most specific match
    pub cascade: bool,
}

impl Default for SkipSettings {
    fn default() -> Self {
        Self {
            tags: parse_list(DEFAULT_TAGS),
            last_chapter: 0.0,
            unwatched: true,
            first_episode_series: SkipMode::Watched,
            first_episode_season: SkipMode::Always,
            cascade: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OffsetSettings {
    pub start: i64,
    pub end: i64,
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_OFFSET,
            end: DEFAULT_END_OFFSET,
        }
    }
}

/// Typed view of the flat settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatConfig {
    pub account: AccountSettings,
    pub server: ServerSettings,
    pub security: SecuritySettings,
    pub skip: SkipSettings,
    pub offsets: OffsetSettings,
}

impl FlatConfig {
    /// Read every schema key from a parsed settings document.
    ///
    /// Keys absent from `doc` read as their schema default.
    pub fn from_document(doc: &DocumentMut) -> Result<Self> {
        let r = FlatReader { doc };
        Ok(Self {
            account: AccountSettings {
                username: r.string(SECTION_ACCOUNT, "username")?,
                password: r.string(SECTION_ACCOUNT, "password")?,
                token: r.string(SECTION_ACCOUNT, "token")?,
                servername: r.string(SECTION_ACCOUNT, "servername")?,
            },
            server: ServerSettings {
                address: normalize_address(&r.string(SECTION_SERVER, "address")?),
                ssl: r.boolean(SECTION_SERVER, "ssl")?,
                port: r.integer(SECTION_SERVER, "port")?,
            },
            security: SecuritySettings {
                ignore_certs: r.boolean(SECTION_SECURITY, "ignore-certs")?,
            },
            skip: SkipSettings {
                tags: r.list(SECTION_SKIP, "tags")?,
                last_chapter: r.float(SECTION_SKIP, "last-chapter")?,
                unwatched: r.boolean(SECTION_SKIP, "unwatched")?,
                first_episode_series: SkipMode::decode(&r.string(SECTION_SKIP, "first-episode-series")?),
                first_episode_season: SkipMode::decode(&r.string(SECTION_SKIP, "first-episode-season")?),
                cascade: r.boolean(SECTION_SKIP, "custom-cascade")?,
            },
            offsets: OffsetSettings {
                start: r.integer(SECTION_OFFSETS, "start")?,
                end: r.integer(SECTION_OFFSETS, "end")?,
            },
        })
    }
}

/// Typed lookups over a settings document with schema fallback.
struct FlatReader<'a> {
    doc: &'a DocumentMut,
}

enum Raw<'a> {
    Value(&'a Value),
    Default(DefaultValue),
    Missing,
}

impl FlatReader<'_> {
    fn raw(&self, section: &str, key: &str) -> Raw<'_> {
        match self.doc.get(section).and_then(|s| s.get(key)).and_then(Item::as_value) {
            Some(value) => Raw::Value(value),
            None => match schema_default(section, key) {
                Some(default) => Raw::Default(default),
                None => Raw::Missing,
            },
        }
    }

    fn invalid(section: &str, key: &str, value: impl ToString, expected: &'static str) -> Error {
        Error::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    fn string(&self, section: &str, key: &str) -> Result<String> {
        match self.raw(section, key) {
            Raw::Value(value) => scalar_text(value)
                .ok_or_else(|| Self::invalid(section, key, value, "a string")),
            Raw::Default(DefaultValue::Str(s)) => Ok(s.to_string()),
            Raw::Default(other) => Ok(default_text(other)),
            Raw::Missing => Ok(String::new()),
        }
    }

    fn boolean(&self, section: &str, key: &str) -> Result<bool> {
        if let Raw::Value(Value::Boolean(b)) = self.raw(section, key) {
            return Ok(*b.value());
        }
        let text = self.string(section, key)?;
        parse_bool(&text).ok_or_else(|| Self::invalid(section, key, text, "a boolean"))
    }

    fn integer(&self, section: &str, key: &str) -> Result<i64> {
        if let Raw::Value(Value::Integer(i)) = self.raw(section, key) {
            return Ok(*i.value());
        }
        let text = self.string(section, key)?;
        text.trim()
            .parse()
            .map_err(|_| Self::invalid(section, key, text, "an integer"))
    }

    fn float(&self, section: &str, key: &str) -> Result<f64> {
        match self.raw(section, key) {
            Raw::Value(Value::Float(f)) => return Ok(*f.value()),
            Raw::Value(Value::Integer(i)) => return Ok(*i.value() as f64),
            _ => {}
        }
        let text = self.string(section, key)?;
        text.trim()
            .parse()
            .map_err(|_| Self::invalid(section, key, text, "a number"))
    }

    fn list(&self, section: &str, key: &str) -> Result<Vec<String>> {
        if let Raw::Value(Value::Array(items)) = self.raw(section, key) {
            return items
                .iter()
                .map(|item| {
                    scalar_text(item)
                        .map(|t| normalize_list_item(&t))
                        .ok_or_else(|| Self::invalid(section, key, item, "a list of strings"))
                })
                .collect();
        }
        Ok(parse_list(&self.string(section, key)?))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.value().clone()),
        Value::Integer(i) => Some(i.value().to_string()),
        Value::Float(f) => Some(f.value().to_string()),
        Value::Boolean(b) => Some(b.value().to_string()),
        Value::Datetime(d) => Some(d.value().to_string()),
        Value::Array(_) | Value::InlineTable(_) => None,
    }
}

fn default_text(default: DefaultValue) -> String {
    match default {
        DefaultValue::Str(s) => s.to_string(),
        DefaultValue::Bool(b) => b.to_string(),
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::Float(f) => f.to_string(),
    }
}

/// Add every missing schema section and key to `doc`.
///
/// Returns true when anything was added. A section that exists but is not a
/// table is an error.
pub fn backfill(doc: &mut DocumentMut) -> Result<bool> {
    let mut changed = false;
    for entry in SCHEMA {
        if !doc.contains_key(entry.section) {
            doc.insert(entry.section, Item::Table(Table::new()));
            changed = true;
        }
        let Some(table) = doc
            .get_mut(entry.section)
            .and_then(Item::as_table_like_mut)
        else {
            return Err(Error::InvalidValue {
                section: entry.section.to_string(),
                key: String::new(),
                value: "non-table".to_string(),
                expected: "a table",
            });
        };
        if !table.contains_key(entry.key) {
            table.insert(entry.key, entry.default.to_item());
            changed = true;
        }
    }
    Ok(changed)
}

/// Load the flat settings file at `path`, back-filling and rewriting it when
/// keys are missing.
///
/// A missing file is treated as empty and created. A failed write-back is
/// logged; the loaded values are still returned.
pub fn load_flat_config(path: &Path) -> Result<FlatConfig> {
    let content = if path.is_file() {
        autoskip_fs::io::read_text(path)?
    } else {
        tracing::debug!(path = %path.display(), "Settings file not found, starting from defaults");
        String::new()
    };

    let mut doc: DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
        Error::FlatConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    if backfill(&mut doc)? {
        tracing::debug!(path = %path.display(), "Back-filled missing settings keys");
        if let Err(e) = autoskip_fs::io::write_text(path, &doc.to_string()) {
            tracing::error!(path = %path.display(), error = %e, "Failed to write settings file");
        }
    }

    FlatConfig::from_document(&doc)
}
