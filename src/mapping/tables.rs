//! Static `(tag system, tag id) → common field` tables
//!
//! Kept as data so adding a format is a decoder plus a table, not new
//! mapper code. Lookups are case-sensitive for frame-ID systems (ID3v2,
//! iTunes, ASF) and case-insensitive for key-value systems (Vorbis, APE,
//! RIFF INFO).

use super::{Coerce, Rule, Target};
use crate::types::TagSystem;

type Table = &'static [(&'static str, &'static [Rule])];

/// Rules for one native tag, empty when the id is unmapped
pub(crate) fn rules_for(system: TagSystem, id: &str) -> &'static [Rule] {
    match system {
        TagSystem::Id3v23 | TagSystem::Id3v24 => {
            if let Some(desc) = id.strip_prefix("TXXX:") {
                return find(GENERIC, &desc.to_ascii_uppercase());
            }
            if let Some(owner) = id.strip_prefix("UFID:") {
                return if owner == "http://musicbrainz.org" {
                    &[(Target::MbRecordingId, Coerce::Text)]
                } else {
                    &[]
                };
            }
            find(ID3V23, id)
        }
        TagSystem::Id3v22 => {
            if let Some(desc) = id.strip_prefix("TXX:") {
                return find(GENERIC, &desc.to_ascii_uppercase());
            }
            find(ID3V22, id)
        }
        TagSystem::Itunes => {
            if let Some(rest) = id.strip_prefix("----:") {
                let name = rest.rsplit(':').next().unwrap_or(rest);
                return find(GENERIC, &name.to_ascii_uppercase());
            }
            find(ITUNES, id)
        }
        TagSystem::Vorbis | TagSystem::Apev2 => find(GENERIC, &id.to_ascii_uppercase()),
        TagSystem::Asf => find(ASF, id),
        TagSystem::Riff => find(RIFF, id),
        TagSystem::Aiff => find(AIFF, id),
        TagSystem::Id3v1 => find(ID3V1, id),
        TagSystem::Matroska => &[],
    }
}

fn find(table: Table, id: &str) -> &'static [Rule] {
    table
        .iter()
        .find(|(key, _)| *key == id)
        .map_or(&[], |(_, rules)| rules)
}

/// ID3v2.3 and ID3v2.4 frames (four-byte IDs)
static ID3V23: Table = &[
    ("TIT2", &[(Target::Title, Coerce::Text)]),
    ("TIT1", &[(Target::Grouping, Coerce::Text)]),
    ("GRP1", &[(Target::Grouping, Coerce::Text)]),
    ("TALB", &[(Target::Album, Coerce::Text)]),
    ("TPE1", &[(Target::Artist, Coerce::Text)]),
    ("TPE2", &[(Target::AlbumArtist, Coerce::Text)]),
    ("TPE3", &[(Target::Conductor, Coerce::Text)]),
    ("TPE4", &[(Target::Remixer, Coerce::Text)]),
    ("TCOM", &[(Target::Composer, Coerce::Split('/'))]),
    ("TEXT", &[(Target::Lyricist, Coerce::Split('/'))]),
    ("TRCK", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("TPOS", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("TCON", &[(Target::Genre, Coerce::Genre)]),
    ("TYER", &[(Target::Year, Coerce::Int)]),
    ("TDRC", &[(Target::Date, Coerce::Date)]),
    ("TDOR", &[(Target::OriginalDate, Coerce::Date)]),
    ("TORY", &[(Target::OriginalYear, Coerce::Int)]),
    ("TPUB", &[(Target::Label, Coerce::Text)]),
    ("TSRC", &[(Target::Isrc, Coerce::Text)]),
    ("TBPM", &[(Target::Bpm, Coerce::Float)]),
    ("TKEY", &[(Target::Key, Coerce::Text)]),
    ("TMED", &[(Target::Media, Coerce::Text)]),
    ("TMOO", &[(Target::Mood, Coerce::Text)]),
    ("TCOP", &[(Target::Copyright, Coerce::Text)]),
    ("WCOP", &[(Target::License, Coerce::Text)]),
    ("TENC", &[(Target::EncodedBy, Coerce::Text)]),
    ("TSSE", &[(Target::EncoderSettings, Coerce::Text)]),
    ("TLAN", &[(Target::Language, Coerce::Text)]),
    ("TSOT", &[(Target::TitleSort, Coerce::Text)]),
    ("TSOP", &[(Target::ArtistSort, Coerce::Text)]),
    ("TSOA", &[(Target::AlbumSort, Coerce::Text)]),
    ("TSO2", &[(Target::AlbumArtistSort, Coerce::Text)]),
    ("TSOC", &[(Target::ComposerSort, Coerce::Text)]),
    ("TCMP", &[(Target::Compilation, Coerce::Bool)]),
    ("COMM", &[(Target::Comment, Coerce::Text)]),
    ("USLT", &[(Target::Lyrics, Coerce::Text)]),
    ("APIC", &[(Target::Picture, Coerce::Picture)]),
    ("POPM", &[(Target::Rating, Coerce::RatingUnit)]),
    ("PCST", &[(Target::Podcast, Coerce::Bool)]),
    ("WFED", &[(Target::PodcastUrl, Coerce::Text)]),
];

/// ID3v2.2 frames (three-byte IDs)
static ID3V22: Table = &[
    ("TT2", &[(Target::Title, Coerce::Text)]),
    ("TT1", &[(Target::Grouping, Coerce::Text)]),
    ("TAL", &[(Target::Album, Coerce::Text)]),
    ("TP1", &[(Target::Artist, Coerce::Text)]),
    ("TP2", &[(Target::AlbumArtist, Coerce::Text)]),
    ("TP3", &[(Target::Conductor, Coerce::Text)]),
    ("TP4", &[(Target::Remixer, Coerce::Text)]),
    ("TCM", &[(Target::Composer, Coerce::Split('/'))]),
    ("TXT", &[(Target::Lyricist, Coerce::Split('/'))]),
    ("TRK", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("TPA", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("TCO", &[(Target::Genre, Coerce::Genre)]),
    ("TYE", &[(Target::Year, Coerce::Int)]),
    ("TOR", &[(Target::OriginalYear, Coerce::Int)]),
    ("TPB", &[(Target::Label, Coerce::Text)]),
    ("TRC", &[(Target::Isrc, Coerce::Text)]),
    ("TBP", &[(Target::Bpm, Coerce::Float)]),
    ("TKE", &[(Target::Key, Coerce::Text)]),
    ("TMT", &[(Target::Media, Coerce::Text)]),
    ("TCR", &[(Target::Copyright, Coerce::Text)]),
    ("TEN", &[(Target::EncodedBy, Coerce::Text)]),
    ("TSS", &[(Target::EncoderSettings, Coerce::Text)]),
    ("TLA", &[(Target::Language, Coerce::Text)]),
    ("TST", &[(Target::TitleSort, Coerce::Text)]),
    ("TSP", &[(Target::ArtistSort, Coerce::Text)]),
    ("TSA", &[(Target::AlbumSort, Coerce::Text)]),
    ("TS2", &[(Target::AlbumArtistSort, Coerce::Text)]),
    ("TSC", &[(Target::ComposerSort, Coerce::Text)]),
    ("TCP", &[(Target::Compilation, Coerce::Bool)]),
    ("COM", &[(Target::Comment, Coerce::Text)]),
    ("ULT", &[(Target::Lyrics, Coerce::Text)]),
    ("PIC", &[(Target::Picture, Coerce::Picture)]),
    ("POP", &[(Target::Rating, Coerce::RatingUnit)]),
];

/// Vorbis comments, APEv2 items, `TXXX` descriptions and iTunes freeform
/// names, all matched case-insensitively
static GENERIC: Table = &[
    ("TITLE", &[(Target::Title, Coerce::Text)]),
    ("ARTIST", &[(Target::Artist, Coerce::Text)]),
    ("ARTISTS", &[(Target::Artists, Coerce::Text)]),
    ("ALBUMARTIST", &[(Target::AlbumArtist, Coerce::Text)]),
    ("ALBUM ARTIST", &[(Target::AlbumArtist, Coerce::Text)]),
    ("ALBUM", &[(Target::Album, Coerce::Text)]),
    ("DATE", &[(Target::Date, Coerce::Date)]),
    ("YEAR", &[(Target::Year, Coerce::Int)]),
    ("ORIGINALDATE", &[(Target::OriginalDate, Coerce::Date)]),
    ("ORIGINALYEAR", &[(Target::OriginalYear, Coerce::Int)]),
    ("TRACKNUMBER", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("TRACK", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("TRACKTOTAL", &[(Target::TrackTotal, Coerce::Int)]),
    ("TOTALTRACKS", &[(Target::TrackTotal, Coerce::Int)]),
    ("DISCNUMBER", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("DISC", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("DISCTOTAL", &[(Target::DiskTotal, Coerce::Int)]),
    ("TOTALDISCS", &[(Target::DiskTotal, Coerce::Int)]),
    ("GENRE", &[(Target::Genre, Coerce::Genre)]),
    ("COMPOSER", &[(Target::Composer, Coerce::Text)]),
    ("CONDUCTOR", &[(Target::Conductor, Coerce::Text)]),
    ("LYRICIST", &[(Target::Lyricist, Coerce::Text)]),
    ("WRITER", &[(Target::Writer, Coerce::Text)]),
    ("REMIXER", &[(Target::Remixer, Coerce::Text)]),
    ("ARRANGER", &[(Target::Arranger, Coerce::Text)]),
    ("ENGINEER", &[(Target::Engineer, Coerce::Text)]),
    ("PRODUCER", &[(Target::Producer, Coerce::Text)]),
    ("MIXER", &[(Target::Mixer, Coerce::Text)]),
    ("DJMIXER", &[(Target::DjMixer, Coerce::Text)]),
    ("LABEL", &[(Target::Label, Coerce::Text)]),
    ("ORGANIZATION", &[(Target::Label, Coerce::Text)]),
    ("CATALOGNUMBER", &[(Target::CatalogNumber, Coerce::Text)]),
    ("BARCODE", &[(Target::Barcode, Coerce::Text)]),
    ("ISRC", &[(Target::Isrc, Coerce::Text)]),
    ("BPM", &[(Target::Bpm, Coerce::Float)]),
    ("MOOD", &[(Target::Mood, Coerce::Text)]),
    ("MEDIA", &[(Target::Media, Coerce::Text)]),
    ("KEY", &[(Target::Key, Coerce::Text)]),
    ("INITIALKEY", &[(Target::Key, Coerce::Text)]),
    ("COMMENT", &[(Target::Comment, Coerce::Text)]),
    ("DESCRIPTION", &[(Target::Comment, Coerce::Text)]),
    ("LYRICS", &[(Target::Lyrics, Coerce::Text)]),
    ("UNSYNCEDLYRICS", &[(Target::Lyrics, Coerce::Text)]),
    ("WORK", &[(Target::Work, Coerce::Text)]),
    ("GROUPING", &[(Target::Grouping, Coerce::Text)]),
    ("CONTENTGROUP", &[(Target::Grouping, Coerce::Text)]),
    ("TITLESORT", &[(Target::TitleSort, Coerce::Text)]),
    ("ARTISTSORT", &[(Target::ArtistSort, Coerce::Text)]),
    ("ALBUMARTISTSORT", &[(Target::AlbumArtistSort, Coerce::Text)]),
    ("ALBUMSORT", &[(Target::AlbumSort, Coerce::Text)]),
    ("COMPOSERSORT", &[(Target::ComposerSort, Coerce::Text)]),
    ("COPYRIGHT", &[(Target::Copyright, Coerce::Text)]),
    ("LICENSE", &[(Target::License, Coerce::Text)]),
    ("ENCODEDBY", &[(Target::EncodedBy, Coerce::Text)]),
    ("ENCODED-BY", &[(Target::EncodedBy, Coerce::Text)]),
    ("ENCODERSETTINGS", &[(Target::EncoderSettings, Coerce::Text)]),
    ("ENCODER", &[(Target::EncoderSettings, Coerce::Text)]),
    ("RELEASESTATUS", &[(Target::ReleaseStatus, Coerce::Text)]),
    ("MUSICBRAINZ_ALBUMSTATUS", &[(Target::ReleaseStatus, Coerce::Text)]),
    ("RELEASETYPE", &[(Target::ReleaseType, Coerce::Text)]),
    ("MUSICBRAINZ_ALBUMTYPE", &[(Target::ReleaseType, Coerce::Text)]),
    ("RELEASECOUNTRY", &[(Target::ReleaseCountry, Coerce::Text)]),
    ("SCRIPT", &[(Target::Script, Coerce::Text)]),
    ("LANGUAGE", &[(Target::Language, Coerce::Text)]),
    ("COMPILATION", &[(Target::Compilation, Coerce::Bool)]),
    ("RATING", &[(Target::Rating, Coerce::RatingPercent)]),
    ("METADATA_BLOCK_PICTURE", &[(Target::Picture, Coerce::Picture)]),
    ("COVER ART (FRONT)", &[(Target::Picture, Coerce::Picture)]),
    ("COVER ART (BACK)", &[(Target::Picture, Coerce::Picture)]),
    ("MUSICBRAINZ_ARTISTID", &[(Target::MbArtistId, Coerce::Text)]),
    ("MUSICBRAINZ ARTIST ID", &[(Target::MbArtistId, Coerce::Text)]),
    ("MUSICBRAINZ_ALBUMID", &[(Target::MbAlbumId, Coerce::Text)]),
    ("MUSICBRAINZ ALBUM ID", &[(Target::MbAlbumId, Coerce::Text)]),
    ("MUSICBRAINZ_ALBUMARTISTID", &[(Target::MbAlbumArtistId, Coerce::Text)]),
    ("MUSICBRAINZ ALBUM ARTIST ID", &[(Target::MbAlbumArtistId, Coerce::Text)]),
    ("MUSICBRAINZ_TRACKID", &[(Target::MbRecordingId, Coerce::Text)]),
    ("MUSICBRAINZ TRACK ID", &[(Target::MbRecordingId, Coerce::Text)]),
    ("MUSICBRAINZ_RELEASETRACKID", &[(Target::MbTrackId, Coerce::Text)]),
    ("MUSICBRAINZ RELEASE TRACK ID", &[(Target::MbTrackId, Coerce::Text)]),
    ("MUSICBRAINZ_RELEASEGROUPID", &[(Target::MbReleaseGroupId, Coerce::Text)]),
    ("MUSICBRAINZ RELEASE GROUP ID", &[(Target::MbReleaseGroupId, Coerce::Text)]),
    ("MUSICBRAINZ_WORKID", &[(Target::MbWorkId, Coerce::Text)]),
    ("MUSICBRAINZ WORK ID", &[(Target::MbWorkId, Coerce::Text)]),
    ("ACOUSTID_ID", &[(Target::AcoustidId, Coerce::Text)]),
    ("ACOUSTID ID", &[(Target::AcoustidId, Coerce::Text)]),
    ("ACOUSTID_FINGERPRINT", &[(Target::AcoustidFingerprint, Coerce::Text)]),
    ("ACOUSTID FINGERPRINT", &[(Target::AcoustidFingerprint, Coerce::Text)]),
    ("MUSICIP_PUID", &[(Target::MusicIpPuid, Coerce::Text)]),
    ("MUSICIP PUID", &[(Target::MusicIpPuid, Coerce::Text)]),
    ("REPLAYGAIN_TRACK_GAIN", &[(Target::RgTrackGain, Coerce::GainDb)]),
    ("REPLAYGAIN_TRACK_PEAK", &[(Target::RgTrackPeak, Coerce::PeakRatio)]),
    ("REPLAYGAIN_ALBUM_GAIN", &[(Target::RgAlbumGain, Coerce::GainDb)]),
    ("REPLAYGAIN_ALBUM_PEAK", &[(Target::RgAlbumPeak, Coerce::PeakRatio)]),
    ("MP3GAIN_UNDO", &[(Target::RgUndo, Coerce::Undo)]),
];

/// iTunes `ilst` atoms
static ITUNES: Table = &[
    ("\u{a9}nam", &[(Target::Title, Coerce::Text)]),
    ("\u{a9}ART", &[(Target::Artist, Coerce::Text)]),
    ("aART", &[(Target::AlbumArtist, Coerce::Text)]),
    ("\u{a9}alb", &[(Target::Album, Coerce::Text)]),
    ("\u{a9}day", &[(Target::Date, Coerce::Date)]),
    ("\u{a9}gen", &[(Target::Genre, Coerce::Text)]),
    ("gnre", &[(Target::Genre, Coerce::Text)]),
    ("trkn", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("disk", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("\u{a9}wrt", &[(Target::Composer, Coerce::Text)]),
    ("\u{a9}cmt", &[(Target::Comment, Coerce::Text)]),
    ("covr", &[(Target::Picture, Coerce::Picture)]),
    ("cpil", &[(Target::Compilation, Coerce::Bool)]),
    ("tmpo", &[(Target::Bpm, Coerce::Float)]),
    ("\u{a9}lyr", &[(Target::Lyrics, Coerce::Text)]),
    ("\u{a9}grp", &[(Target::Grouping, Coerce::Text)]),
    ("\u{a9}wrk", &[(Target::Work, Coerce::Text)]),
    ("\u{a9}too", &[(Target::EncodedBy, Coerce::Text)]),
    ("cprt", &[(Target::Copyright, Coerce::Text)]),
    ("soal", &[(Target::AlbumSort, Coerce::Text)]),
    ("soar", &[(Target::ArtistSort, Coerce::Text)]),
    ("soaa", &[(Target::AlbumArtistSort, Coerce::Text)]),
    ("sonm", &[(Target::TitleSort, Coerce::Text)]),
    ("soco", &[(Target::ComposerSort, Coerce::Text)]),
    ("sosn", &[(Target::TvShowSort, Coerce::Text)]),
    ("tvsh", &[(Target::TvShow, Coerce::Text)]),
    ("tvsn", &[(Target::TvSeason, Coerce::Int)]),
    ("tves", &[(Target::TvEpisode, Coerce::Int)]),
    ("tven", &[(Target::TvEpisodeId, Coerce::Text)]),
    ("tvnn", &[(Target::TvNetwork, Coerce::Text)]),
    ("pcst", &[(Target::Podcast, Coerce::Bool)]),
    ("purl", &[(Target::PodcastUrl, Coerce::Text)]),
    ("pgap", &[(Target::Gapless, Coerce::Bool)]),
];

/// ASF content descriptors
static ASF: Table = &[
    ("Title", &[(Target::Title, Coerce::Text)]),
    ("Author", &[(Target::Artist, Coerce::Text)]),
    ("Copyright", &[(Target::Copyright, Coerce::Text)]),
    ("Description", &[(Target::Comment, Coerce::Text)]),
    ("WM/AlbumTitle", &[(Target::Album, Coerce::Text)]),
    ("WM/AlbumArtist", &[(Target::AlbumArtist, Coerce::Text)]),
    ("WM/TrackNumber", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("WM/PartOfSet", &[(Target::Disk, Coerce::TrackOfTotal)]),
    ("WM/Genre", &[(Target::Genre, Coerce::Text)]),
    ("WM/Year", &[(Target::Year, Coerce::Int)]),
    ("WM/Composer", &[(Target::Composer, Coerce::Text)]),
    ("WM/Conductor", &[(Target::Conductor, Coerce::Text)]),
    ("WM/Writer", &[(Target::Lyricist, Coerce::Text)]),
    ("WM/Publisher", &[(Target::Label, Coerce::Text)]),
    ("WM/Producer", &[(Target::Producer, Coerce::Text)]),
    ("WM/ModifiedBy", &[(Target::Remixer, Coerce::Text)]),
    ("WM/BeatsPerMinute", &[(Target::Bpm, Coerce::Float)]),
    ("WM/InitialKey", &[(Target::Key, Coerce::Text)]),
    ("WM/Mood", &[(Target::Mood, Coerce::Text)]),
    ("WM/ISRC", &[(Target::Isrc, Coerce::Text)]),
    ("WM/Barcode", &[(Target::Barcode, Coerce::Text)]),
    ("WM/CatalogNo", &[(Target::CatalogNumber, Coerce::Text)]),
    ("WM/SharedUserRating", &[(Target::Rating, Coerce::RatingPercent)]),
    ("WM/Picture", &[(Target::Picture, Coerce::Picture)]),
    ("WM/EncodedBy", &[(Target::EncodedBy, Coerce::Text)]),
    ("WM/ToolName", &[(Target::EncoderSettings, Coerce::Text)]),
    ("WM/Language", &[(Target::Language, Coerce::Text)]),
    ("WM/Media", &[(Target::Media, Coerce::Text)]),
    ("WM/Lyrics", &[(Target::Lyrics, Coerce::Text)]),
    ("MusicBrainz/Artist Id", &[(Target::MbArtistId, Coerce::Text)]),
    ("MusicBrainz/Album Id", &[(Target::MbAlbumId, Coerce::Text)]),
    ("MusicBrainz/Album Artist Id", &[(Target::MbAlbumArtistId, Coerce::Text)]),
    ("MusicBrainz/Track Id", &[(Target::MbRecordingId, Coerce::Text)]),
    ("MusicBrainz/Release Track Id", &[(Target::MbTrackId, Coerce::Text)]),
    ("MusicBrainz/Release Group Id", &[(Target::MbReleaseGroupId, Coerce::Text)]),
    ("MusicBrainz/Album Status", &[(Target::ReleaseStatus, Coerce::Text)]),
    ("MusicBrainz/Album Type", &[(Target::ReleaseType, Coerce::Text)]),
    ("MusicBrainz/Album Release Country", &[(Target::ReleaseCountry, Coerce::Text)]),
    ("Acoustid/Id", &[(Target::AcoustidId, Coerce::Text)]),
];

/// RIFF INFO list entries
static RIFF: Table = &[
    ("INAM", &[(Target::Title, Coerce::Text)]),
    ("IART", &[(Target::Artist, Coerce::Text)]),
    ("IPRD", &[(Target::Album, Coerce::Text)]),
    ("ICMT", &[(Target::Comment, Coerce::Text)]),
    ("ICRD", &[(Target::Date, Coerce::Date)]),
    ("IGNR", &[(Target::Genre, Coerce::Text)]),
    ("ICOP", &[(Target::Copyright, Coerce::Text)]),
    ("IENG", &[(Target::Engineer, Coerce::Text)]),
    ("ISFT", &[(Target::EncodedBy, Coerce::Text)]),
    ("ITRK", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("IPRT", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("ILNG", &[(Target::Language, Coerce::Text)]),
    ("IMUS", &[(Target::Composer, Coerce::Text)]),
    ("IWRI", &[(Target::Writer, Coerce::Text)]),
];

/// AIFF text chunks
static AIFF: Table = &[
    ("NAME", &[(Target::Title, Coerce::Text)]),
    ("AUTH", &[(Target::Artist, Coerce::Text)]),
    ("ANNO", &[(Target::Comment, Coerce::Text)]),
    ("(c) ", &[(Target::Copyright, Coerce::Text)]),
];

/// ID3v1 fixed fields
static ID3V1: Table = &[
    ("title", &[(Target::Title, Coerce::Text)]),
    ("artist", &[(Target::Artist, Coerce::Text)]),
    ("album", &[(Target::Album, Coerce::Text)]),
    ("year", &[(Target::Year, Coerce::Int)]),
    ("comment", &[(Target::Comment, Coerce::Text)]),
    ("track", &[(Target::Track, Coerce::TrackOfTotal)]),
    ("genre", &[(Target::Genre, Coerce::Text)]),
];
