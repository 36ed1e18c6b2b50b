//! Source-artifact selection for the preprocessing pass.
//!
//! Provides [`SourceFilter`] which encapsulates the `include` and `exclude`
//! patterns from [`PreprocessConfig`] and decides whether a file under the
//! sources directory is a source artifact.
//!
//! # Decision model
//!
//! | Condition | Decision |
//! |-----------|----------|
//! | Path matches an exclude pattern | `Excluded` |
//! | Path matches an include pattern | `Source` |
//! | None of the above | `NotSource` |
//!
//! Exclude is checked first, so it wins over include.

use tracing::debug;

use crate::config::PreprocessConfig;

/// The outcome of evaluating a path against the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDecision {
    /// A source artifact: run it through the remapper.
    Source,
    /// Matched an exclude pattern.
    Excluded { pattern: String },
    /// Matched no include pattern.
    NotSource,
}

impl SourceDecision {
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source)
    }

    /// Short human-readable label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Excluded { .. } => "excluded",
            Self::NotSource => "not-source",
        }
    }
}

/// Evaluates relative paths against include/exclude glob patterns.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl SourceFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Evaluate `rel_path`, a path relative to the sources directory.
    pub fn evaluate(&self, rel_path: &str) -> SourceDecision {
        let path = rel_path.replace('\\', "/");

        if let Some(pattern) = self.exclude.iter().find(|p| matches_pattern(&path, p)) {
            debug!(path = path.as_str(), pattern = pattern.as_str(), "excluded by pattern");
            return SourceDecision::Excluded {
                pattern: pattern.clone(),
            };
        }

        if self.include.iter().any(|p| matches_pattern(&path, p)) {
            SourceDecision::Source
        } else {
            SourceDecision::NotSource
        }
    }
}

impl From<&PreprocessConfig> for SourceFilter {
    fn from(config: &PreprocessConfig) -> Self {
        Self::new(config.include.clone(), config.exclude.clone())
    }
}

/// Glob match with a leading `**/` also matching files at the root.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    let pat = pattern.replace('\\', "/");
    if glob_match::glob_match(&pat, path) {
        return true;
    }
    match pat.strip_prefix("**/") {
        Some(rest) => glob_match::glob_match(rest, path),
        None => false,
    }
}
