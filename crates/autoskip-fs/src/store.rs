//! JSON document loading and saving

use crate::{Error, Result, io};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

/// Indentation used for persisted JSON documents.
const JSON_INDENT: &[u8] = b"    ";

/// Reject paths that do not carry a `.json` extension.
fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension == "json" {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat { extension })
    }
}

/// Store for JSON documents.
///
/// Handles serialization transparently and writes with a four-space indent.
/// All saves go through [`io::write_atomic`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document from a `.json` file.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        check_extension(path)?;
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Parse already-read content as if it came from `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &Path, content: &str) -> Result<T> {
        serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Render a value as indented JSON.
    pub fn render<T: Serialize>(&self, path: &Path, value: &T) -> Result<String> {
        let serialize_error = |message: String| Error::ConfigSerialize {
            path: path.to_path_buf(),
            message,
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        value
            .serialize(&mut serializer)
            .map_err(|e| serialize_error(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| serialize_error(e.to_string()))
    }

    /// Save a document to a `.json` file atomically.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        check_extension(path)?;
        let content = self.render(path, value)?;
        io::write_text(path, &content)
    }
}
