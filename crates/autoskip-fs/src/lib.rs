//! Filesystem layer for autoskip
//!
//! Provides locked atomic writes, override-file enumeration and a
//! JSON store for the override documents.

pub mod error;
pub mod io;
pub mod store;

pub use error::{Error, Result};
pub use store::ConfigStore;
