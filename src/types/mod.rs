//! Core data model: native tags, format facts and the common view

use std::fmt;

mod common;
mod format;
mod value;


pub use common::CommonMetadata;
pub use format::FormatInfo;
pub use value::{Gain, NativeTag, PartOf, Picture, Rating, ReplayGainUndo, TagValue};

/// A metadata encoding recognized by the probe
///
/// The set is closed: parsers only ever emit tags under one of these
/// systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagSystem {
    /// ID3 version 1 / 1.1 trailer
    Id3v1,
    /// ID3 version 2.2 (3-byte frame IDs)
    Id3v22,
    /// ID3 version 2.3
    Id3v23,
    /// ID3 version 2.4
    Id3v24,
    /// APE tag version 2
    Apev2,
    /// Vorbis comments (FLAC, Ogg)
    Vorbis,
    /// iTunes MP4 `ilst` atoms
    Itunes,
    /// ASF/WMA descriptors
    Asf,
    /// RIFF INFO list
    Riff,
    /// AIFF annotation chunks
    Aiff,
    /// Matroska/WebM tags
    Matroska,
}

impl TagSystem {
    /// Canonical name of the tag system
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id3v1 => "ID3v1",
            Self::Id3v22 => "ID3v2.2",
            Self::Id3v23 => "ID3v2.3",
            Self::Id3v24 => "ID3v2.4",
            Self::Apev2 => "APEv2",
            Self::Vorbis => "vorbis",
            Self::Itunes => "iTunes",
            Self::Asf => "asf",
            Self::Riff => "RIFF",
            Self::Aiff => "AIFF",
            Self::Matroska => "matroska",
        }
    }
}

impl fmt::Display for TagSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported outer container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// MPEG audio (layers 1-3)
    Mpeg,
    /// Standalone APEv2 tag
    Apev2,
    /// MP4 / QuickTime atom tree
    Mp4,
    /// ASF / WMA objects
    Asf,
    /// FLAC metadata blocks
    Flac,
    /// Ogg pages
    Ogg,
    /// AIFF / AIFF-C chunks
    Aiff,
    /// WavPack blocks
    Wavpack,
    /// RIFF / WAVE chunks
    Riff,
    /// Musepack SV7 / SV8
    Musepack,
    /// DSD stream file
    Dsf,
    /// DSDIFF interchange format
    Dsdiff,
    /// Raw AAC with ADTS headers
    Adts,
}

impl ContainerKind {
    /// Canonical container name reported in [`FormatInfo`]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mpeg => "MPEG",
            Self::Apev2 => "APEv2",
            Self::Mp4 => "MP4",
            Self::Asf => "ASF",
            Self::Flac => "FLAC",
            Self::Ogg => "Ogg",
            Self::Aiff => "AIFF",
            Self::Wavpack => "WavPack",
            Self::Riff => "WAVE",
            Self::Musepack => "Musepack",
            Self::Dsf => "DSF",
            Self::Dsdiff => "DSDIFF",
            Self::Adts => "ADTS",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
