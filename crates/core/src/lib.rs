//! solprep core library.
//!
//! This crate provides the pieces of a Solidity build setup: typed build
//! configuration, named network definitions, the import remapping table and
//! per-line remapper, and the preprocessing pass that applies it to a source
//! tree before compilation.

pub mod config;
pub mod errors;
pub mod network;
pub mod preprocess;
pub mod remap;
pub mod source_filter;

// Re-exports for convenience.
pub use config::BuildConfig;
pub use network::NetworkConfig;
pub use preprocess::{PreprocessReport, Preprocessor};
pub use remap::{ImportRemapper, RemappingRule, RemappingTable};
