//! Remapping table reader.
//!
//! The remappings file format is one rule per line:
//!
//! ```text
//! @openzeppelin/=lib/openzeppelin-contracts/
//! ds-test/=lib/forge-std/lib/ds-test/src/
//! ```
//!
//! Each line is trimmed and split on the first `=`. Blank lines are ignored.
//! There is no comment syntax, escaping or quoting.

use std::path::Path;

use tracing::{debug, warn};

use crate::errors::RemapError;

/// A single `(prefix, replacement)` substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappingRule {
    /// Text searched for anywhere in an import line.
    pub prefix: String,
    /// Text substituted for the first occurrence of `prefix`.
    pub replacement: String,
}

impl RemappingRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }
}

/// A remappings line that could not be turned into a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the remappings file.
    pub line: usize,
    /// The trimmed line content.
    pub content: String,
    /// Why the line was rejected.
    pub reason: &'static str,
}

/// Ordered list of remapping rules. Order matters: the first rule whose
/// prefix occurs in a line wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemappingTable {
    rules: Vec<RemappingRule>,
}

impl RemappingTable {
    pub fn new(rules: Vec<RemappingRule>) -> Self {
        Self { rules }
    }

    /// Parse remappings text, skipping malformed lines with a warning.
    pub fn parse(text: &str) -> Self {
        let (table, malformed) = Self::parse_with_diagnostics(text);
        for bad in &malformed {
            warn!(
                line = bad.line,
                content = bad.content.as_str(),
                reason = bad.reason,
                "skipping malformed remapping"
            );
        }
        table
    }

    /// Parse remappings text and also return the lines that were rejected.
    ///
    /// A line is rejected only when it has no `=` separator. Blank and
    /// whitespace-only lines are not reported. A line with an empty prefix
    /// (`=pre/`) is kept as a rule; it matches every import line.
    pub fn parse_with_diagnostics(text: &str) -> (Self, Vec<MalformedLine>) {
        let mut rules = Vec::new();
        let mut malformed = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match line.split_once('=') {
                Some((prefix, replacement)) => {
                    rules.push(RemappingRule::new(prefix, replacement));
                }
                None => malformed.push(MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                    reason: "missing '=' separator",
                }),
            }
        }

        (Self { rules }, malformed)
    }

    /// Read and parse the remappings file at `path`.
    ///
    /// A missing or unreadable file is reported as
    /// [`RemapError::TableUnavailable`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RemapError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| RemapError::TableUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let table = Self::parse(&contents);
        debug!(path = %path.display(), count = table.len(), "loaded remappings");
        Ok(table)
    }

    /// Apply the first rule whose prefix occurs anywhere in `line`.
    ///
    /// Only the first occurrence of that prefix is replaced and no further
    /// rules are tried. Returns `None` when no rule matches.
    pub fn apply(&self, line: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|rule| line.contains(rule.prefix.as_str()))
            .map(|rule| line.replacen(rule.prefix.as_str(), &rule.replacement, 1))
    }

    /// Rules whose empty prefix makes them match every import line.
    pub fn catch_all_rules(&self) -> impl Iterator<Item = &RemappingRule> {
        self.rules.iter().filter(|rule| rule.prefix.is_empty())
    }

    pub fn rules(&self) -> &[RemappingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_whitespace_lines() {
        let text = "\n@openzeppelin/=lib/openzeppelin-contracts/\n   \n\t\nds-test/=lib/ds-test/src/\n\n";
        let table = RemappingTable::parse(text);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0].prefix, "@openzeppelin/");
        assert_eq!(table.rules()[1].replacement, "lib/ds-test/src/");
    }

    #[test]
    fn test_parse_trims_lines_and_handles_crlf() {
        let table = RemappingTable::parse("  a/=b/  \r\nc/=d/\r\n");
        assert_eq!(
            table.rules(),
            &[RemappingRule::new("a/", "b/"), RemappingRule::new("c/", "d/")]
        );
    }

    #[test]
    fn test_parse_splits_on_first_equals_only() {
        let table = RemappingTable::parse("key=value=more");
        assert_eq!(table.rules(), &[RemappingRule::new("key", "value=more")]);
    }

    #[test]
    fn test_parse_allows_empty_replacement() {
        let table = RemappingTable::parse("strip/=");
        assert_eq!(table.rules(), &[RemappingRule::new("strip/", "")]);
    }

    #[test]
    fn test_malformed_lines_are_reported_and_skipped() {
        let text = "good/=lib/good/\nno-separator\n=orphan\n";
        let (table, malformed) = RemappingTable::parse_with_diagnostics(text);
        assert_eq!(table.len(), 2);
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].line, 2);
        assert_eq!(malformed[0].reason, "missing '=' separator");
        assert_eq!(table.rules()[1], RemappingRule::new("", "orphan"));
    }

    #[test]
    fn test_empty_prefix_rule_prepends_and_stops_scanning() {
        let table = RemappingTable::parse("=pre/\n@a/=lib/a/\n");
        assert_eq!(table.catch_all_rules().count(), 1);
        assert_eq!(
            table.apply("import \"@a/X.sol\";").as_deref(),
            Some("pre/import \"@a/X.sol\";")
        );
    }

    #[test]
    fn test_apply_first_match_wins() {
        let table = RemappingTable::new(vec![
            RemappingRule::new("A", "X"),
            RemappingRule::new("B", "Y"),
        ]);
        assert_eq!(table.apply("import B then A").as_deref(), Some("import B then X"));
    }

    #[test]
    fn test_apply_replaces_only_first_occurrence() {
        let table = RemappingTable::new(vec![RemappingRule::new("lib/", "deps/")]);
        assert_eq!(
            table.apply("import \"lib/lib/x.sol\";").as_deref(),
            Some("import \"deps/lib/x.sol\";")
        );
    }

    #[test]
    fn test_apply_matches_anywhere_in_line() {
        // Substring semantics: the prefix is not anchored to the path start.
        let table = RemappingTable::new(vec![RemappingRule::new("a=", "b=")]);
        assert_eq!(
            table.apply("import { data=1 } from \"x\";").as_deref(),
            Some("import { datb=1 } from \"x\";")
        );
    }

    #[test]
    fn test_apply_no_match() {
        let table = RemappingTable::new(vec![RemappingRule::new("@oz/", "lib/oz/")]);
        assert_eq!(table.apply("import \"./Local.sol\";"), None);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remappings.txt");
        std::fs::write(&path, "@openzeppelin/=lib/openzeppelin-contracts/\n").unwrap();

        let table = RemappingTable::load(&path).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = RemappingTable::load("/nonexistent/remappings.txt");
        assert!(matches!(result, Err(RemapError::TableUnavailable { .. })));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remappings.txt");
        std::fs::write(&path, "").unwrap();

        let table = RemappingTable::load(&path).unwrap();
        assert!(table.is_empty());
    }
}
