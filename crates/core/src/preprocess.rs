//! Preprocessing pass over the source tree.
//!
//! Walks the sources directory in sorted order, runs every line of every
//! source artifact through the [`ImportRemapper`], and mirrors the results
//! into the output directory. Files that the [`SourceFilter`] rejects are
//! never handed to the remapper.
//!
//! All files are transformed in memory before anything is written, so a
//! fatal remapping error leaves the output directory untouched.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::BuildConfig;
use crate::errors::PreprocessError;
use crate::remap::ImportRemapper;
use crate::source_filter::SourceFilter;

/// A single rewritten import line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Path relative to the sources directory.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Summary of a preprocessing pass.
#[derive(Debug, Clone, Default)]
pub struct PreprocessReport {
    /// Every regular file found under the sources directory.
    pub files_scanned: usize,
    /// Files handed to the remapper.
    pub sources_processed: usize,
    /// Files rejected by the source filter.
    pub files_skipped: usize,
    /// Files written to the output directory (0 for a dry run).
    pub files_written: usize,
    pub rewrites: Vec<Rewrite>,
    pub output_dir: PathBuf,
}

/// One transformed source file waiting to be written.
struct ProcessedFile {
    rel_path: PathBuf,
    contents: String,
}

/// Runs the import remapper over a source tree.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    sources: PathBuf,
    output: PathBuf,
    filter: SourceFilter,
    remapper: ImportRemapper,
}

impl Preprocessor {
    pub fn new(
        sources: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        filter: SourceFilter,
        remapper: ImportRemapper,
    ) -> Self {
        Self {
            sources: sources.into(),
            output: output.into(),
            filter,
            remapper,
        }
    }

    /// Build a preprocessor from the loaded configuration.
    ///
    /// In per-pass reload mode the remappings file is read here, so a missing
    /// file fails before any source is touched.
    pub fn from_config(config: &BuildConfig) -> Result<Self, PreprocessError> {
        let remapper = ImportRemapper::from_config(&config.preprocess, &config.root)?;
        Ok(Self::new(
            config.sources_dir(),
            config.preprocessed_dir(),
            SourceFilter::from(&config.preprocess),
            remapper,
        ))
    }

    /// Override the output directory.
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    /// Transform every source artifact and write the results.
    pub fn run(&self) -> Result<PreprocessReport, PreprocessError> {
        let (files, mut report) = self.transform_all()?;

        for file in &files {
            let dest = self.output.join(&file.rel_path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|source| PreprocessError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&dest, &file.contents).map_err(|source| PreprocessError::Io {
                path: dest.clone(),
                source,
            })?;
        }
        report.files_written = files.len();

        info!(
            sources = report.sources_processed,
            rewrites = report.rewrites.len(),
            output = %self.output.display(),
            "preprocessing complete"
        );
        Ok(report)
    }

    /// Transform every source artifact without writing anything.
    pub fn dry_run(&self) -> Result<PreprocessReport, PreprocessError> {
        let (_, report) = self.transform_all()?;
        Ok(report)
    }

    /// Run every line of `text` through the remapper, keeping line
    /// terminators exactly as they were. Rewritten lines are appended to
    /// `rewrites`.
    pub fn transform_source(
        &self,
        text: &str,
        rel_path: &Path,
        rewrites: &mut Vec<Rewrite>,
    ) -> Result<String, PreprocessError> {
        let mut out = String::with_capacity(text.len());

        for (idx, raw) in text.split_inclusive('\n').enumerate() {
            let (body, terminator) = split_terminator(raw);
            let transformed =
                self.remapper
                    .transform_line(body)
                    .map_err(|source| PreprocessError::Remap {
                        file: rel_path.to_path_buf(),
                        line: idx + 1,
                        source,
                    })?;

            if transformed != body {
                rewrites.push(Rewrite {
                    file: rel_path.to_path_buf(),
                    line: idx + 1,
                    before: body.to_string(),
                    after: transformed.clone(),
                });
            }

            out.push_str(&transformed);
            out.push_str(terminator);
        }

        Ok(out)
    }

    fn transform_all(&self) -> Result<(Vec<ProcessedFile>, PreprocessReport), PreprocessError> {
        if !self.sources.is_dir() {
            return Err(PreprocessError::SourcesNotFound(self.sources.clone()));
        }

        info!(
            sources = %self.sources.display(),
            live_reload = self.remapper.is_live(),
            "starting preprocessing pass"
        );

        // The output directory may be spelled differently from the walked
        // paths (`..`, symlinks), so compare canonical forms when it exists.
        let output = std::fs::canonicalize(&self.output).ok();
        let mut paths = Vec::new();
        self.collect_files(&self.sources, output.as_deref(), &mut paths)?;

        let mut report = PreprocessReport {
            output_dir: self.output.clone(),
            ..PreprocessReport::default()
        };
        let mut files = Vec::new();

        for rel_path in paths {
            report.files_scanned += 1;

            let decision = self.filter.evaluate(&rel_path.to_string_lossy());
            if !decision.is_source() {
                debug!(path = %rel_path.display(), decision = decision.label(), "skipping file");
                report.files_skipped += 1;
                continue;
            }

            let full = self.sources.join(&rel_path);
            let text = std::fs::read_to_string(&full).map_err(|source| PreprocessError::Io {
                path: full.clone(),
                source,
            })?;

            let contents = self.transform_source(&text, &rel_path, &mut report.rewrites)?;
            report.sources_processed += 1;
            files.push(ProcessedFile { rel_path, contents });
        }

        Ok((files, report))
    }

    /// Recursively collect regular files under `dir` as paths relative to the
    /// sources directory, in sorted order. The output directory is skipped
    /// when it lives inside the sources tree.
    fn collect_files(
        &self,
        dir: &Path,
        output: Option<&Path>,
        out: &mut Vec<PathBuf>,
    ) -> Result<(), PreprocessError> {
        let io_err = |source: std::io::Error| PreprocessError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut entries = std::fs::read_dir(dir)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                if self.is_output_dir(&path, output) {
                    debug!(path = %path.display(), "skipping output directory");
                    continue;
                }
                self.collect_files(&path, output, out)?;
            } else if path.is_file() {
                if let Ok(rel) = path.strip_prefix(&self.sources) {
                    out.push(rel.to_path_buf());
                }
            }
        }

        Ok(())
    }

    fn is_output_dir(&self, path: &Path, canonical_output: Option<&Path>) -> bool {
        if path == self.output {
            return true;
        }
        match (canonical_output, std::fs::canonicalize(path)) {
            (Some(output), Ok(path)) => path == output,
            _ => false,
        }
    }
}

/// Split a line into its body and its `\n` / `\r\n` terminator.
pub fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}
