//! Error types for autoskip-config

use std::path::PathBuf;

/// Result type for autoskip-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or resolving settings
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cascade section name outside the override schema
    #[error("Unknown override section: {name}")]
    UnknownSection { name: String },

    /// A flat config value that cannot be read as the schema type
    #[error("Invalid value {value:?} for [{section}] {key}: expected {expected}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: &'static str,
    },

    /// The flat config file is not valid TOML
    #[error("Failed to parse settings file {path}: {message}")]
    FlatConfigParse { path: PathBuf, message: String },

    /// The media-server collaborator could not supply what was asked
    #[error("Media server error: {message}")]
    Server { message: String },

    /// Filesystem error from autoskip-fs
    #[error(transparent)]
    Fs(#[from] autoskip_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }
}
