//! Line-level import remapping.
//!
//! [`ImportRemapper`] rewrites Solidity `import` lines using a
//! [`RemappingTable`]. Every other line passes through untouched and never
//! consults the table.
//!
//! # Table sources
//!
//! | Source | Behaviour |
//! |--------|-----------|
//! | `Live` | remappings file re-read for every import line |
//! | `Cached` | table loaded once (per pass) or supplied in memory |
//!
//! Live mode lets an edit to the remappings file take effect on the very next
//! import line of a running pass.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::{debug, trace};

use super::table::RemappingTable;
use crate::config::{PreprocessConfig, ReloadMode};
use crate::errors::RemapError;

/// `true` if `line` is an import statement: optional leading whitespace, the
/// keyword `import` in any case, then a space.
///
/// Leading whitespace also covers a byte-order mark and non-breaking spaces.
pub fn is_import_line(line: &str) -> bool {
    static IMPORT_RE: OnceLock<Regex> = OnceLock::new();
    IMPORT_RE
        .get_or_init(|| {
            Regex::new(r"(?i)^[\s\x{A0}\x{FEFF}]*import ").expect("import pattern is valid")
        })
        .is_match(line)
}

/// Where the remapper gets its table from.
#[derive(Debug, Clone)]
enum TableSource {
    Live(PathBuf),
    Cached(RemappingTable),
}

/// Rewrites import lines according to a remapping table.
#[derive(Debug, Clone)]
pub struct ImportRemapper {
    source: TableSource,
}

impl ImportRemapper {
    /// Re-read the remappings file at `path` for every import line.
    ///
    /// Construction does not touch the file; a missing file surfaces on the
    /// first import line.
    pub fn live<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source: TableSource::Live(path.as_ref().to_path_buf()),
        }
    }

    /// Load the remappings file once and reuse it for every line.
    pub fn per_pass<P: AsRef<Path>>(path: P) -> Result<Self, RemapError> {
        let table = RemappingTable::load(path)?;
        Ok(Self::from_table(table))
    }

    /// Use an in-memory table.
    pub fn from_table(table: RemappingTable) -> Self {
        Self {
            source: TableSource::Cached(table),
        }
    }

    /// Build a remapper from the `[preprocess]` section, resolving the
    /// remappings file relative to `base_dir`.
    pub fn from_config(config: &PreprocessConfig, base_dir: &Path) -> Result<Self, RemapError> {
        let path = base_dir.join(&config.remappings_file);
        match config.reload {
            ReloadMode::PerLine => Ok(Self::live(path)),
            ReloadMode::PerPass => Self::per_pass(path),
        }
    }

    /// `true` if the table is re-read on every import line.
    pub fn is_live(&self) -> bool {
        matches!(self.source, TableSource::Live(_))
    }

    /// Transform a single source line.
    ///
    /// Non-import lines are returned unchanged without reading the table. For
    /// import lines, the first rule whose prefix occurs in the line replaces
    /// one occurrence of that prefix; if no rule matches the line is returned
    /// unchanged.
    pub fn transform_line(&self, line: &str) -> Result<String, RemapError> {
        if !is_import_line(line) {
            return Ok(line.to_string());
        }

        let rewritten = match &self.source {
            TableSource::Live(path) => RemappingTable::load(path)?.apply(line),
            TableSource::Cached(table) => table.apply(line),
        };

        match rewritten {
            Some(new_line) => {
                debug!(before = line, after = new_line.as_str(), "remapped import");
                Ok(new_line)
            }
            None => {
                trace!(line, "no remapping matched import");
                Ok(line.to_string())
            }
        }
    }
}
