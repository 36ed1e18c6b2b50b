//! Import path remapping.
//!
//! - [`table`]: remappings file parsing and first-match substitution.
//! - [`remapper`]: the per-line transform applied to Solidity sources.

pub mod remapper;
pub mod table;

pub use remapper::{is_import_line, ImportRemapper};
pub use table::{MalformedLine, RemappingRule, RemappingTable};
