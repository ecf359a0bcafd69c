//! Recursive directory traversal.
//!
//! Walks a library root depth-first, yielding leaf files with their fast
//! classification. Hidden (dot-prefixed) entries are skipped. An unreadable
//! subdirectory aborts only its own subtree: the failure is surfaced to the
//! caller as a [`WalkFailure`] and siblings keep scanning.

use shelfmark_common::FileKind;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use super::classifier::FileClassifier;

/// A leaf file discovered by the walker.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Fast-path classification; `None` means the extension was
    /// inconclusive and the slow probe should decide.
    pub kind: Option<FileKind>,
}

/// A subtree the walker could not enter.
#[derive(Debug)]
pub struct WalkFailure {
    pub path: Option<PathBuf>,
    pub error: walkdir::Error,
}

impl std::fmt::Display for WalkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "failed to walk {:?}: {}", path, self.error),
            None => write!(f, "failed to walk: {}", self.error),
        }
    }
}

/// Result of walking one root: every readable leaf file plus the subtrees
/// that could not be read.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<ScannedFile>,
    pub failures: Vec<WalkFailure>,
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk a directory tree, collecting classified leaf files.
///
/// Directory-ness comes from filesystem metadata, not extensions. This does
/// blocking I/O; async callers run it via `spawn_blocking`.
pub fn walk(root: &Path) -> WalkOutcome {
    let classifier = FileClassifier::new();
    let mut outcome = WalkOutcome::default();

    // The root was chosen explicitly; only entries below it are subject to
    // the hidden-name rule.
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map(Path::to_path_buf);
                warn!("Skipping unreadable subtree {:?}: {}", path, error);
                outcome.failures.push(WalkFailure { path, error });
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.into_path();
        let kind = classifier.classify_fast(&path);
        outcome.files.push(ScannedFile { path, kind });
    }

    outcome
}
