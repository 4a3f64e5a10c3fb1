//! Settings facade
//!
//! [`Settings`] is built once at startup and passed by reference to whatever
//! needs it. Loading runs in a fixed order:
//!
//! 1. locate the flat settings file ([`ConfigLocator`])
//! 2. load it, back-filling missing keys ([`load_flat_config`])
//! 3. discover and merge the override files beside it ([`OverrideStore`])
//! 4. build the [`CascadeResolver`] over the merged document
//!
//! A reload builds a new value; nothing is mutated in place.

use crate::cascade::CascadeResolver;
use crate::document::{Offsets, OverrideDocument};
use crate::flat::{FlatConfig, load_flat_config};
use crate::overrides::{LoadedFile, OverrideStore};
use crate::server::MediaServer;
use crate::translate::{Namespace, to_guids, to_rating_keys};
use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file or its directory.
pub const ENV_CONFIG_VAR: &str = "AUTOSKIP_CONFIG";

pub const CONFIG_FILE_NAME: &str = "config.toml";

const APP_DIR_NAME: &str = "autoskip";

/// Decides which settings file to load.
///
/// Precedence: the environment override (when it names an existing path),
/// then an explicit path, then `<config_dir>/autoskip/config.toml`. A
/// directory is joined with `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigLocator {
    explicit: Option<PathBuf>,
    env_override: Option<PathBuf>,
    default_dir: Option<PathBuf>,
}

impl ConfigLocator {
    /// Locator reading the environment override from the process.
    pub fn new(explicit: Option<&Path>) -> Self {
        Self {
            explicit: explicit.map(Path::to_path_buf),
            env_override: std::env::var_os(ENV_CONFIG_VAR).map(PathBuf::from),
            default_dir: None,
        }
    }

    /// Replace the environment override (used for testing).
    pub fn with_env_override(mut self, path: Option<PathBuf>) -> Self {
        self.env_override = path;
        self
    }

    /// Replace the platform default directory (used for testing).
    pub fn with_default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = Some(dir.into());
        self
    }

    fn default_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.default_dir {
            return dir.clone();
        }
        dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("config"))
    }

    /// Resolve the settings file path.
    pub fn locate(&self) -> PathBuf {
        let candidate = match self.env_override {
            Some(ref env_path) if env_path.exists() => {
                tracing::debug!("{ENV_CONFIG_VAR} environment override found");
                env_path.clone()
            }
            _ => match self.explicit {
                Some(ref path) => path.clone(),
                None => {
                    tracing::debug!("Using default settings location");
                    self.default_dir().join(CONFIG_FILE_NAME)
                }
            },
        };

        if candidate.is_dir() {
            tracing::debug!(dir = %candidate.display(), "Settings path is a directory, joining with {CONFIG_FILE_NAME}");
            candidate.join(CONFIG_FILE_NAME)
        } else {
            candidate
        }
    }
}

/// Outcome of translating one override file.
#[derive(Debug, Clone, Serialize)]
pub struct FileTranslation {
    pub path: PathBuf,
    pub translated: usize,
    pub unresolved: BTreeSet<String>,
    /// False when the rewritten file could not be saved
    pub persisted: bool,
    /// True when the file could not be parsed and was left as it was
    pub skipped: bool,
}

/// Outcome of translating every override file.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    pub target: Namespace,
    pub files: Vec<FileTranslation>,
}

impl TranslationReport {
    /// Every unresolved key across all files.
    pub fn unresolved(&self) -> BTreeSet<&str> {
        self.files
            .iter()
            .flat_map(|f| f.unresolved.iter().map(String::as_str))
            .collect()
    }

    /// True when every file that was translated was also saved.
    pub fn all_persisted(&self) -> bool {
        self.files.iter().all(|f| f.skipped || f.persisted)
    }
}

/// Loaded settings: flat values plus the merged override view.
#[derive(Debug, Clone)]
pub struct Settings {
    locator: ConfigLocator,
    config_file: PathBuf,
    flat: FlatConfig,
    override_files: Vec<PathBuf>,
    resolver: CascadeResolver,
}

impl Settings {
    /// Load settings from `explicit`, the environment override, or the
    /// default location.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(ConfigLocator::new(explicit))
    }

    pub fn load_with(locator: ConfigLocator) -> Result<Self> {
        let config_file = locator.locate();
        tracing::info!(path = %config_file.display(), "Loading settings file");

        let flat = load_flat_config(&config_file)?;
        let loaded = OverrideStore::beside(&config_file).load_all()?;

        let resolver = CascadeResolver::new(loaded.document, flat.skip.cascade)
            .with_default_offsets(Offsets::new(flat.offsets.start, flat.offsets.end));

        Ok(Self {
            locator,
            config_file,
            flat,
            override_files: loaded.files,
            resolver,
        })
    }

    /// Load everything again from disk into a new value.
    pub fn reload(&self) -> Result<Self> {
        Self::load_with(self.locator.clone())
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn flat(&self) -> &FlatConfig {
        &self.flat
    }

    /// The merged override document.
    pub fn overrides(&self) -> &OverrideDocument {
        self.resolver.document()
    }

    /// Override files in merge order.
    pub fn override_files(&self) -> &[PathBuf] {
        &self.override_files
    }

    pub fn resolver(&self) -> &CascadeResolver {
        &self.resolver
    }

    pub fn override_store(&self) -> OverrideStore {
        OverrideStore::beside(&self.config_file)
    }

    /// Rewrite every override file from rating keys to GUIDs.
    pub fn replace_with_guids(&self, server: &dyn MediaServer) -> Result<TranslationReport> {
        self.translate_files(server, Namespace::Guid)
    }

    /// Rewrite every override file from GUIDs to rating keys.
    pub fn replace_with_rating_keys(&self, server: &dyn MediaServer) -> Result<TranslationReport> {
        self.translate_files(server, Namespace::RatingKey)
    }

    /// Translate each override file on its own and save it back.
    ///
    /// The mapping table is fetched first, so a server failure leaves every
    /// file untouched. Files are re-read from disk rather than taken from the
    /// merged view. This instance is not updated; call [`Self::reload`].
    fn translate_files(&self, server: &dyn MediaServer, target: Namespace) -> Result<TranslationReport> {
        let table = server.mapping_table()?;
        tracing::debug!(entries = table.len(), target = target.as_str(), "Fetched mapping table");

        let lookup = match target {
            Namespace::Guid => table,
            Namespace::RatingKey => table.inverse(),
        };
        let store = self.override_store();
        let mut files = Vec::new();

        for path in store.discover()? {
            let document = match store.load(&path) {
                LoadedFile::Parsed(document) => document,
                LoadedFile::Fallback => {
                    tracing::warn!(path = %path.display(), "Skipping unreadable override file");
                    files.push(FileTranslation {
                        path,
                        translated: 0,
                        unresolved: BTreeSet::new(),
                        persisted: false,
                        skipped: true,
                    });
                    continue;
                }
            };
            let translation = match target {
                Namespace::Guid => to_guids(&document, &lookup),
                Namespace::RatingKey => to_rating_keys(&document, &lookup),
            };

            if !translation.unresolved.is_empty() {
                tracing::warn!(
                    path = %path.display(),
                    unresolved = ?translation.unresolved,
                    "Some item keys could not be translated"
                );
            }

            let persisted = store.persist_logged(&path, &translation.document);
            if persisted {
                tracing::info!(path = %path.display(), translated = translation.translated, "Translated override file");
            }

            files.push(FileTranslation {
                path,
                translated: translation.translated,
                unresolved: translation.unresolved,
                persisted,
                skipped: false,
            });
        }

        Ok(TranslationReport { target, files })
    }
}
