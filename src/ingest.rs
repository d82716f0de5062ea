//! Feeding files from disk into a session.
//!
//! Each path given on the command line is either a file, which is always
//! read, or a directory, which is walked recursively with the
//! `[ingest]` include/exclude globs applied to paths relative to it.
//! Files are added in path order so repeated runs build the same index.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ragdesk_core::Session;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, IngestConfig};
use crate::embedding::create_strategy;

/// Outcome of an ingest run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Files added as documents.
    pub accepted: Vec<PathBuf>,
    /// Files read but holding no text.
    pub empty: Vec<PathBuf>,
    /// Files that could not be read.
    pub failed: Vec<PathBuf>,
}

impl IngestReport {
    pub fn seen(&self) -> usize {
        self.accepted.len() + self.empty.len() + self.failed.len()
    }
}

/// Expand `paths` into the list of files to ingest.
pub fn collect_files(paths: &[PathBuf], config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("Path does not exist: {}", root.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) {
                continue;
            }
            if !include_set.is_match(&rel_str) {
                continue;
            }

            found.push(path.to_path_buf());
        }

        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Read every file selected by `paths` and add it to `session`.
///
/// Unreadable files are logged and skipped.
pub fn ingest_paths(
    session: &mut Session,
    paths: &[PathBuf],
    config: &IngestConfig,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    for path in collect_files(paths, config)? {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                report.failed.push(path);
                continue;
            }
        };

        if session.add_document(&bytes, &display_name(&path)) {
            report.accepted.push(path);
        } else {
            report.empty.push(path);
        }
    }

    Ok(report)
}

/// Create a session from `config` and ingest `paths` into it.
pub fn load_session(config: &Config, paths: &[PathBuf]) -> Result<(Session, IngestReport)> {
    let mut session = Session::new(config.session_params(), create_strategy(config)?);
    let report = ingest_paths(&mut session, paths, &config.ingest)?;

    info!(
        files = report.seen(),
        documents = session.document_count(),
        chunks = session.chunk_count(),
        "ingest complete"
    );
    Ok((session, report))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
