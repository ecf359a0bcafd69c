//! Filename identity extraction.
//!
//! This module parses bare filenames into structured identity: movie
//! title/year, TV season/episode markers, or disc/track numbers for music.
//! A filename that matches none of the grammars yields `None` rather than an
//! error; such files stay visible to the walker but are skipped for metadata
//! purposes.

use regex::Regex;
use shelfmark_common::MediaKind;
use std::path::Path;
use std::sync::LazyLock;

/// Structured identity extracted from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedIdentity {
    /// `<title>[ (<year>)]` - year optional, parens/brackets optional.
    Movie { title: String, year: Option<u16> },
    /// `<title>S<season>E<episode>` - both digit groups mandatory.
    Episode {
        title: String,
        season: u32,
        episode: u32,
    },
    /// `[[<disc>-]<track>]? [-]? <title>` - disc defaults to 1 when a track
    /// number is present without a disc marker.
    Track {
        title: String,
        disc: Option<u32>,
        track: Option<u32>,
    },
}

impl ExtractedIdentity {
    /// The search title carried by any variant.
    pub fn title(&self) -> &str {
        match self {
            Self::Movie { title, .. } => title,
            Self::Episode { title, .. } => title,
            Self::Track { title, .. } => title,
        }
    }

    /// The year disambiguator, where the grammar produces one.
    pub fn year(&self) -> Option<u16> {
        match self {
            Self::Movie { year, .. } => *year,
            _ => None,
        }
    }
}

// Anchoring the year group at the end of the string makes the regex engine
// pick the LAST plausible year-like group, not an embedded digit run.
static MOVIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.*?)[\s]*[\(\[]?(?P<year>(?:19|20)\d{2})[\)\]]?$").unwrap()
});

static EPISODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.*?)[\s\-]*[Ss](?P<season>\d+)\s*[Ee](?P<episode>\d+)").unwrap()
});

static TRACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?:(?P<disc>\d+)\s*-\s*)?(?P<track>\d+))?\s*-?\s*(?P<title>.*?)\s*$")
        .unwrap()
});

/// Extract structured identity from a bare filename (no extension).
///
/// The grammar is selected by `kind`; a non-matching filename returns `None`.
pub fn extract(name: &str, kind: MediaKind) -> Option<ExtractedIdentity> {
    match kind {
        MediaKind::Movies => extract_movie(name),
        MediaKind::TvShows => extract_episode(name),
        MediaKind::Music => extract_track(name),
    }
}

/// Convenience wrapper that stems a path before extraction.
pub fn extract_from_path(path: &Path, kind: MediaKind) -> Option<ExtractedIdentity> {
    let stem = path.file_stem().and_then(|s| s.to_str())?;
    extract(stem, kind)
}

/// Normalize scene-style separators so `The.Matrix.1999` parses the same as
/// `The Matrix 1999`. Dashes are left alone; the track grammar needs them.
fn normalize_separators(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c == '.' || c == '_' { ' ' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_movie(name: &str) -> Option<ExtractedIdentity> {
    let normalized = normalize_separators(name);
    if normalized.is_empty() {
        return None;
    }

    if let Some(caps) = MOVIE_RE.captures(&normalized) {
        let title = caps["title"].trim().to_string();
        let year = caps["year"].parse::<u16>().ok();
        // A filename that is nothing but a year is a title, not a year.
        if !title.is_empty() {
            return Some(ExtractedIdentity::Movie { title, year });
        }
    }

    Some(ExtractedIdentity::Movie {
        title: normalized,
        year: None,
    })
}

fn extract_episode(name: &str) -> Option<ExtractedIdentity> {
    let normalized = normalize_separators(name);
    let caps = EPISODE_RE.captures(&normalized)?;

    let season = caps["season"].parse::<u32>().ok()?;
    let episode = caps["episode"].parse::<u32>().ok()?;
    let title = caps["title"].trim_matches(['-', ' ']).trim().to_string();

    Some(ExtractedIdentity::Episode {
        title,
        season,
        episode,
    })
}

fn extract_track(name: &str) -> Option<ExtractedIdentity> {
    let caps = TRACK_RE.captures(name)?;

    let disc = caps.name("disc").and_then(|m| m.as_str().parse().ok());
    let track = caps.name("track").and_then(|m| m.as_str().parse().ok());
    let title = caps
        .name("title")
        .map(|m| m.as_str())
        .unwrap_or("")
        .trim_matches(['-', ' '])
        .trim()
        .to_string();

    // Disc defaults to 1 when a track number is present without a disc marker.
    let disc = match (disc, track) {
        (None, Some(_)) => Some(1),
        (d, _) => d,
    };

    Some(ExtractedIdentity::Track { title, disc, track })
}
