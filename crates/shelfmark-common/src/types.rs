//! Core type definitions for media kinds and file classifications.
//!
//! This module defines the enums used throughout shelfmark for categorizing
//! library roots, scanned files, and resolved entries. All enums are
//! serialized in lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a library root or feed contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Movies library containing film content.
    Movies,
    /// TV shows library containing series and episodes.
    TvShows,
    /// Music library containing audio content.
    Music,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movies => write!(f, "movies"),
            Self::TvShows => write!(f, "tvshows"),
            Self::Music => write!(f, "music"),
        }
    }
}

/// Classification of a single filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A playable video asset.
    Video,
    /// A playable audio asset.
    Audio,
    /// An image (cover art, poster, fanart).
    Image,
    /// Anything else; invisible to metadata resolution.
    Other,
}

impl FileKind {
    /// Video files carry an audio track for library purposes; the converse
    /// does not hold.
    #[must_use]
    pub fn is_audio_capable(&self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }

    /// Whether this file participates in metadata resolution at all.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Kind of resolved library entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A single movie.
    Movie,
    /// A TV series (show).
    Series,
    /// A season within a series.
    Season,
    /// A single episode within a season.
    Episode,
    /// An audio track.
    Track,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
            Self::Season => write!(f, "season"),
            Self::Episode => write!(f, "episode"),
            Self::Track => write!(f, "track"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_display() {
        assert_eq!(MediaKind::Movies.to_string(), "movies");
        assert_eq!(MediaKind::TvShows.to_string(), "tvshows");
        assert_eq!(MediaKind::Music.to_string(), "music");
    }

    #[test]
    fn test_media_kind_serde() {
        let json = serde_json::to_string(&MediaKind::TvShows).unwrap();
        assert_eq!(json, "\"tvshows\"");
        let back: MediaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MediaKind::TvShows);
    }

    #[test]
    fn test_video_implies_audio() {
        assert!(FileKind::Video.is_audio_capable());
        assert!(FileKind::Audio.is_audio_capable());
        assert!(!FileKind::Image.is_audio_capable());
        assert!(!FileKind::Other.is_audio_capable());
    }

    #[test]
    fn test_playable() {
        assert!(FileKind::Video.is_playable());
        assert!(FileKind::Audio.is_playable());
        assert!(!FileKind::Image.is_playable());
        assert!(!FileKind::Other.is_playable());
    }
}
