//! Command implementations for autoskip-cli

pub mod convert;
pub mod resolve;
pub mod show;

pub use convert::run_convert;
pub use resolve::run_resolve;
pub use show::run_show;
