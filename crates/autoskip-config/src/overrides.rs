//! Override file discovery, loading and persistence
//!
//! Override files live next to the flat settings file and are named
//! `custom*.json`. They are merged in lexicographic file-name order, so a
//! later file wins scalar conflicts. Each file is still loaded and saved on
//! its own; the merged document is a read-side view only.

use crate::document::{ACCESS_FIELDS, OverrideDocument, SECTION_NAMES};
use crate::merge::merge_all;
use crate::Result;
use autoskip_fs::{ConfigStore, io};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const OVERRIDE_PREFIX: &str = "custom";
pub const OVERRIDE_SUFFIX: &str = ".json";
pub const DEFAULT_OVERRIDE_FILE: &str = "custom.json";

/// The override files found in a directory, merged in discovery order.
#[derive(Debug, Clone)]
pub struct LoadedOverrides {
    pub files: Vec<PathBuf>,
    pub document: OverrideDocument,
}

/// Outcome of loading one override file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedFile {
    /// The file parsed, or was created or back-filled.
    Parsed(OverrideDocument),
    /// The file could not be read or parsed and was left untouched.
    Fallback,
}

impl LoadedFile {
    /// The parsed document, or the empty document for a fallback.
    pub fn into_document(self) -> OverrideDocument {
        match self {
            Self::Parsed(document) => document,
            Self::Fallback => OverrideDocument::empty(),
        }
    }
}

/// Reads and writes the override files in one directory.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    dir: PathBuf,
    store: ConfigStore,
}

impl OverrideStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            store: ConfigStore::new(),
        }
    }

    /// Store for the directory holding `config_file`.
    pub fn beside(config_file: &Path) -> Self {
        let dir = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_path(&self) -> PathBuf {
        self.dir.join(DEFAULT_OVERRIDE_FILE)
    }

    /// Override files in merge order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let files = io::find_files(&self.dir, OVERRIDE_PREFIX, OVERRIDE_SUFFIX)?;
        tracing::debug!(dir = %self.dir.display(), count = files.len(), "Discovered override files");
        Ok(files)
    }

    /// Load one override file.
    ///
    /// Never fails: a missing file is created with the default document, and
    /// an unreadable or malformed file yields [`LoadedFile::Fallback`] without
    /// touching the file. A file missing sections is back-filled and saved.
    pub fn load(&self, path: &Path) -> LoadedFile {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Creating default override file");
            let document = OverrideDocument::empty();
            self.persist_logged(path, &document);
            return LoadedFile::Parsed(document);
        }

        let raw: Value = match io::read_text(path)
            .and_then(|content| self.store.parse(path, &content))
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load override file, using defaults");
                return LoadedFile::Fallback;
            }
        };

        let incomplete = missing_sections(&raw);
        let document: OverrideDocument = match serde_json::from_value(raw) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Override file has an invalid shape, using defaults");
                return LoadedFile::Fallback;
            }
        };

        if incomplete {
            tracing::debug!(path = %path.display(), "Back-filling override sections");
            self.persist_logged(path, &document);
        }

        tracing::info!(path = %path.display(), "Loaded override file");
        LoadedFile::Parsed(document)
    }

    /// Write a document in canonical form.
    pub fn persist(&self, path: &Path, document: &OverrideDocument) -> Result<()> {
        self.store.save(path, document)?;
        Ok(())
    }

    /// [`Self::persist`], logging instead of returning a failure.
    pub fn persist_logged(&self, path: &Path, document: &OverrideDocument) -> bool {
        match self.persist(path, document) {
            Ok(()) => true,
            Err(crate::Error::Fs(e)) if e.is_permission_denied() => {
                tracing::error!(path = %path.display(), "Permission denied writing override file");
                false
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to write override file");
                false
            }
        }
    }

    /// Discover, load and merge every override file.
    ///
    /// With no files present, `custom.json` is synthesized and saved.
    pub fn load_all(&self) -> Result<LoadedOverrides> {
        let mut files = self.discover()?;
        if files.is_empty() {
            files.push(self.default_path());
        }

        let document = merge_all(files.iter().map(|path| self.load(path).into_document()));
        Ok(LoadedOverrides { files, document })
    }
}

/// True when a raw document lacks a top-level section or an access-list field.
fn missing_sections(raw: &Value) -> bool {
    let Some(object) = raw.as_object() else {
        return false;
    };

    SECTION_NAMES.iter().any(|name| !object.contains_key(*name))
        || ["allowed", "blocked"].iter().any(|name| {
            object
                .get(*name)
                .and_then(Value::as_object)
                .is_some_and(|list| ACCESS_FIELDS.iter().any(|field| !list.contains_key(*field)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn complete_document_needs_no_backfill() {
        let raw = serde_json::to_value(OverrideDocument::empty()).unwrap();
        assert!(!missing_sections(&raw));
    }

    #[test]
    fn missing_top_level_section_needs_backfill() {
        let mut raw = serde_json::to_value(OverrideDocument::empty()).unwrap();
        raw.as_object_mut().unwrap().remove("clients");
        assert!(missing_sections(&raw));
    }

    #[test]
    fn missing_access_field_needs_backfill() {
        let mut raw = serde_json::to_value(OverrideDocument::empty()).unwrap();
        raw["blocked"] = json!({ "users": [], "clients": [] });
        assert!(missing_sections(&raw));
    }

    #[test]
    fn unparsable_file_loads_as_fallback() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.json");
        std::fs::write(&path, "{ oops").unwrap();

        let loaded = OverrideStore::new(temp.path()).load(&path);

        assert_eq!(loaded, LoadedFile::Fallback);
        assert_eq!(loaded.into_document(), OverrideDocument::empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ oops");
    }

    #[test]
    fn missing_file_is_created_and_parsed() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.json");

        let loaded = OverrideStore::new(temp.path()).load(&path);

        assert_eq!(loaded, LoadedFile::Parsed(OverrideDocument::empty()));
        assert!(path.is_file());
    }

    #[test]
    fn beside_bare_file_name_uses_current_dir() {
        let store = OverrideStore::beside(Path::new("config.toml"));
        assert_eq!(store.dir(), Path::new("."));
    }
}
