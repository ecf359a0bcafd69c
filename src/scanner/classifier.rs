//! File classification for the scanner.
//!
//! Decides whether a filesystem entry is a playable video/audio asset, an
//! image, or something else. Classification has two tiers:
//!
//! - **Fast path**: extension allow-lists, pure string work, safe anywhere.
//! - **Slow path**: header probing for files whose extension is
//!   inconclusive; reads from disk and must not run on a latency-sensitive
//!   path.

use shelfmark_common::paths::{is_audio_file, is_image_file, is_video_file};
use shelfmark_common::FileKind;
use std::path::Path;

use super::probe;

/// File classifier with fast extension matching and a slow probe fallback.
#[derive(Debug, Default)]
pub struct FileClassifier;

impl FileClassifier {
    /// Create a new file classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify by extension alone. Returns `None` when the extension is
    /// inconclusive and the slow path should be consulted.
    pub fn classify_fast(&self, path: &Path) -> Option<FileKind> {
        if is_video_file(path) {
            Some(FileKind::Video)
        } else if is_audio_file(path) {
            Some(FileKind::Audio)
        } else if is_image_file(path) {
            Some(FileKind::Image)
        } else {
            None
        }
    }

    /// Full classification: the fast path when the extension is conclusive,
    /// otherwise a header probe.
    pub async fn classify(&self, path: &Path) -> FileKind {
        if let Some(kind) = self.classify_fast(path) {
            return kind;
        }
        probe::probe_file(path).await
    }
}
