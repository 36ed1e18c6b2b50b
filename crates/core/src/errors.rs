//! Error types for the solprep core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Remap(#[from] RemapError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// The requested network is not defined under `[networks]`.
    #[error("unknown network '{name}' (available: {available})")]
    UnknownNetwork {
        name: String,
        available: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Remapping errors
// ---------------------------------------------------------------------------

/// Errors from loading or applying the remapping table.
#[derive(Debug, Error)]
pub enum RemapError {
    /// The remappings artifact is absent or unreadable. Always fatal.
    #[error("remappings file unavailable at '{}': {source}", .path.display())]
    TableUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Preprocessing errors
// ---------------------------------------------------------------------------

/// Errors from a preprocessing pass over the source tree.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The configured sources directory does not exist.
    #[error("sources directory not found: {}", .0.display())]
    SourcesNotFound(PathBuf),

    /// The remapping table could not be consulted while transforming a line.
    #[error("remapping failed at {}:{line}: {source}", .file.display())]
    Remap {
        file: PathBuf,
        line: usize,
        #[source]
        source: RemapError,
    },

    /// The remapper could not be constructed before the pass started.
    #[error("failed to prepare remapper: {0}")]
    Setup(#[from] RemapError),

    /// Reading a source file or writing an output file failed.
    #[error("preprocess I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
