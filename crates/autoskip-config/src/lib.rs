//! Settings resolution and override cascade engine for autoskip
//!
//! autoskip reads two layers of configuration:
//!
//! - a flat `config.toml` of global settings ([`flat`])
//! - one or more `custom*.json` override documents with per-item markers,
//!   offsets and allow/block lists ([`document`])
//!
//! The override documents are merged into one view ([`merge`]), resolved per
//! item along a scope chain ([`cascade`]), and can be rewritten between the
//! server-local rating-key namespace and stable GUIDs ([`translate`]).
//! [`Settings`] ties the pieces together.
//!
//! # Example
//!
//! ```ignore
//! use autoskip_config::{ScopeChain, Section, Settings};
//!
//! let settings = Settings::load(None)?;
//! let chain = ScopeChain::from_hierarchy("101", Some("200"), Some("300"));
//! let offsets = settings.resolver().offsets(&chain);
//! let markers = settings.resolver().resolve(Section::Markers, &chain)?;
//! ```

pub mod cascade;
pub mod document;
pub mod error;
pub mod flat;
pub mod merge;
pub mod overrides;
pub mod server;
pub mod settings;
pub mod translate;

pub use cascade::{CascadeResolver, GLOBAL_SCOPE, KeyAccess, ScopeChain, Section};
pub use document::{AccessList, MarkerRegion, Offsets, OverrideDocument};
pub use error::{Error, Result};
pub use flat::{FlatConfig, SkipMode};
pub use merge::{Merge, merge_all};
pub use overrides::{LoadedFile, LoadedOverrides, OverrideStore};
pub use server::{LibrarySnapshot, MediaServer, SnapshotItem};
pub use settings::{ConfigLocator, FileTranslation, Settings, TranslationReport};
pub use translate::{MappingTable, Namespace, Translation, to_guids, to_rating_keys};
