//! Shared test fixtures for the autoskip workspace.
//!
//! Dev-dependency only. [`ConfigDir`] builds a throwaway settings directory
//! holding `config.toml`, any number of `custom*.json` override files and an
//! optional library snapshot.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary settings directory.
///
/// # Example
///
/// ```rust,no_run
/// use autoskip_test_utils::ConfigDir;
/// use serde_json::json;
///
/// let dir = ConfigDir::new();
/// dir.write_config("[Skip]\ncustom-cascade = false\n");
/// dir.write_override("custom.json", &json!({ "offsets": { "1": [0, 0] } }));
/// dir.assert_file_exists("custom.json");
/// ```
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("ConfigDir::new: failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the flat settings file, whether or not it exists yet.
    pub fn config_file(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write `config.toml` with the given content.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_file();
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_config: failed to write {}: {e}", path.display()));
        path
    }

    /// Write an override file as pretty JSON.
    pub fn write_override(&self, name: &str, document: &Value) -> PathBuf {
        let content = serde_json::to_string_pretty(document)
            .unwrap_or_else(|e| panic!("write_override: failed to serialize {name}: {e}"));
        self.write_raw(name, &content)
    }

    /// Write arbitrary text to a file in the directory.
    pub fn write_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_raw: failed to write {}: {e}", path.display()));
        path
    }

    /// Write a library snapshot from `(rating_key, guid, parent)` rows.
    pub fn write_snapshot(&self, name: &str, items: &[(&str, &str, Option<&str>)]) -> PathBuf {
        let items: Vec<Value> = items
            .iter()
            .map(|(rating_key, guid, parent)| {
                let mut item = serde_json::json!({ "rating_key": rating_key, "guid": guid });
                if let Some(parent) = parent {
                    item["parent"] = Value::String(parent.to_string());
                }
                item
            })
            .collect();
        self.write_override(name, &serde_json::json!({ "items": items }))
    }

    pub fn read(&self, name: &str) -> String {
        let path = self.path(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("read: failed to read {}: {e}", path.display()))
    }

    /// Parse a file in the directory as JSON.
    pub fn read_json(&self, name: &str) -> Value {
        serde_json::from_str(&self.read(name))
            .unwrap_or_else(|e| panic!("read_json: {name} is not valid JSON: {e}"))
    }

    pub fn assert_file_exists(&self, name: &str) {
        assert!(
            self.path(name).is_file(),
            "expected {name} to exist in {}",
            self.root().display()
        );
    }
}
