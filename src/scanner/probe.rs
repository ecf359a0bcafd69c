//! Container sniffing for files whose extension is inconclusive.
//!
//! Reads the first bytes of a file and matches container magic numbers to
//! decide whether the payload carries a video or audio stream. This is the
//! classifier's slow path: it touches the disk, may block on cold storage,
//! and is therefore async so callers can treat it as a cancellable I/O
//! operation.

use shelfmark_common::FileKind;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Container formats recognized by the header sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Matroska / WebM (EBML header).
    Matroska,
    /// MPEG-4 family (.mp4, .m4v, .mov).
    Mp4,
    /// MPEG audio (ID3 tag or MPEG sync word).
    Mp3,
    /// RIFF/WAVE audio.
    Wav,
    /// Free Lossless Audio Codec.
    Flac,
    /// Ogg container (Vorbis/Opus).
    Ogg,
}

impl Container {
    /// The library classification for a detected container.
    pub fn file_kind(&self) -> FileKind {
        match self {
            Self::Matroska | Self::Mp4 => FileKind::Video,
            Self::Mp3 | Self::Wav | Self::Flac | Self::Ogg => FileKind::Audio,
        }
    }
}

/// Probe a file header and classify its container.
///
/// Returns `FileKind::Other` when the header is unreadable or matches no
/// known container; probe failures never abort a scan.
pub async fn probe_file(path: &Path) -> FileKind {
    match read_magic(path).await {
        Ok(magic) => detect_container(&magic)
            .map(|c| c.file_kind())
            .unwrap_or(FileKind::Other),
        Err(e) => {
            tracing::debug!("Failed to read header of {:?}: {}", path, e);
            FileKind::Other
        }
    }
}

async fn read_magic(path: &Path) -> std::io::Result<[u8; 12]> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut magic = [0u8; 12];
    file.read_exact(&mut magic).await?;
    Ok(magic)
}

/// Detect container format from file magic bytes.
pub fn detect_container(magic: &[u8; 12]) -> Option<Container> {
    // Matroska/WebM: EBML header 0x1A 0x45 0xDF 0xA3
    if magic[0..4] == [0x1A, 0x45, 0xDF, 0xA3] {
        return Some(Container::Matroska);
    }

    // MP4/MOV: 'ftyp' box at offset 4; some files lead with 'moov'/'mdat'/'free'
    if &magic[4..8] == b"ftyp"
        || &magic[4..8] == b"moov"
        || &magic[4..8] == b"mdat"
        || &magic[4..8] == b"free"
    {
        return Some(Container::Mp4);
    }

    // MP3: ID3v2 tag, or a raw MPEG audio sync word (11 set bits)
    if &magic[0..3] == b"ID3" || (magic[0] == 0xFF && magic[1] & 0xE0 == 0xE0) {
        return Some(Container::Mp3);
    }

    // WAV: RIFF....WAVE
    if &magic[0..4] == b"RIFF" && &magic[8..12] == b"WAVE" {
        return Some(Container::Wav);
    }

    if &magic[0..4] == b"fLaC" {
        return Some(Container::Flac);
    }

    if &magic[0..4] == b"OggS" {
        return Some(Container::Ogg);
    }

    None
}
