//! The common-view mapper
//!
//! Maps every recognized native tag to zero, one, or more fields of the
//! common view. The `(system, id) → field` relation lives in [`tables`] as
//! data; the coercers here are the closed set of value conversions applied
//! on the way in.

mod genres;
mod tables;


pub(crate) use genres::lookup as genre_name;

use crate::collector::Collector;
use crate::types::{
    CommonMetadata, Gain, NativeTag, PartOf, Rating, ReplayGainUndo, TagSystem, TagValue,
};

/// A common-view field a native tag can land in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Title,
    TitleSort,
    Artist,
    ArtistSort,
    Artists,
    AlbumArtist,
    AlbumArtistSort,
    Album,
    AlbumSort,
    Year,
    Date,
    OriginalDate,
    OriginalYear,
    Track,
    TrackTotal,
    Disk,
    DiskTotal,
    Genre,
    Picture,
    Comment,
    Composer,
    ComposerSort,
    Lyrics,
    Work,
    Grouping,
    Lyricist,
    Writer,
    Conductor,
    Remixer,
    Arranger,
    Engineer,
    Producer,
    Mixer,
    DjMixer,
    Label,
    CatalogNumber,
    Rating,
    Bpm,
    Mood,
    Media,
    Barcode,
    Isrc,
    MbArtistId,
    MbAlbumId,
    MbAlbumArtistId,
    MbTrackId,
    MbRecordingId,
    MbReleaseGroupId,
    MbWorkId,
    AcoustidId,
    AcoustidFingerprint,
    MusicIpPuid,
    RgTrackGain,
    RgTrackPeak,
    RgAlbumGain,
    RgAlbumPeak,
    RgUndo,
    Key,
    EncodedBy,
    EncoderSettings,
    Copyright,
    License,
    ReleaseStatus,
    ReleaseType,
    ReleaseCountry,
    Script,
    Language,
    Gapless,
    Compilation,
    TvShow,
    TvShowSort,
    TvNetwork,
    TvSeason,
    TvEpisode,
    TvEpisodeId,
    Podcast,
    PodcastUrl,
}

/// A value conversion applied before assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Coerce {
    /// Trimmed text, numbers stringified
    Text,
    /// Integer
    Int,
    /// Floating point
    Float,
    /// Boolean from flags or `"1"`/`"true"` text
    Bool,
    /// `yyyy`, `yyyy-mm` or `yyyy-mm-dd`
    Date,
    /// `"3/12"` composite or pre-split parts
    TrackOfTotal,
    /// Multi-valued text split on a separator
    Split(char),
    /// `"-6.00 dB"` style decibel text
    GainDb,
    /// Linear peak ratio
    PeakRatio,
    /// Rating already normalized to [0, 1]
    RatingUnit,
    /// Rating on a 0-100 scale
    RatingPercent,
    /// Genre text with legacy `(n)` table references
    Genre,
    /// Embedded picture pass-through
    Picture,
    /// MP3Gain undo triple
    Undo,
}

/// A single mapping rule: where the value lands and how it is coerced
pub(crate) type Rule = (Target, Coerce);

/// Fold one native tag into the common view
pub(crate) fn map_tag(c: &mut Collector, system: TagSystem, tag: &NativeTag) {
    for (target, coerce) in tables::rules_for(system, &tag.id) {
        apply(c, *target, *coerce, &tag.value);
    }
}

/// POPM byte (0-255) to a unit rating
///
/// Zero means "unrated" in the wild but is kept as 0.0 here; the common
/// view records what the tag said.
pub(crate) fn popm_to_unit(byte: u8) -> f32 {
    f32::from(byte) / 255.0
}

fn text_of(value: &TagValue) -> Option<String> {
    let s = match value {
        TagValue::Text(s) => s.trim().to_owned(),
        TagValue::Int(n) => n.to_string(),
        TagValue::Float(f) => f.to_string(),
        TagValue::Binary(b) => String::from_utf8(b.clone()).ok()?.trim().to_owned(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn int_of(value: &TagValue) -> Option<i64> {
    match value {
        TagValue::Float(f) if f.fract() == 0.0 => {
            #[allow(clippy::cast_possible_truncation)]
            let n = *f as i64;
            Some(n)
        }
        other => other.as_int(),
    }
}

fn float_of(value: &TagValue) -> Option<f64> {
    match value {
        TagValue::Float(f) => Some(*f),
        #[allow(clippy::cast_precision_loss)]
        TagValue::Int(n) => Some(*n as f64),
        TagValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_of(value: &TagValue) -> Option<bool> {
    match value {
        TagValue::Bool(b) => Some(*b),
        TagValue::Int(n) => Some(*n != 0),
        TagValue::Text(s) => match s.trim() {
            "1" | "true" | "True" | "yes" => Some(true),
            "0" | "false" | "False" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn part_of(value: &TagValue) -> Option<PartOf> {
    let part = match value {
        TagValue::Parts(p) => *p,
        TagValue::Text(s) => PartOf::parse(s),
        TagValue::Int(n) => PartOf {
            no: u32::try_from(*n).ok(),
            of: None,
        },
        _ => return None,
    };
    (!part.is_empty()).then_some(part)
}

/// Parse `yyyy`, `yyyy-mm` or `yyyy-mm-dd`, returning the normalized date
/// and its year
fn parse_date(s: &str) -> Option<(String, i32)> {
    let s = s.trim();
    let b = s.as_bytes();
    if b.len() < 4 || !b[..4].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let year: i32 = s[..4].parse().ok()?;
    let mut out = s[..4].to_owned();

    if b.len() >= 7 && b[4] == b'-' && b[5..7].iter().all(u8::is_ascii_digit) {
        let month: u8 = s[5..7].parse().ok()?;
        if (1..=12).contains(&month) {
            out.push_str(&s[4..7]);
            if b.len() >= 10 && b[7] == b'-' && b[8..10].iter().all(u8::is_ascii_digit) {
                let day: u8 = s[8..10].parse().ok()?;
                if (1..=31).contains(&day) {
                    out.push_str(&s[7..10]);
                }
            }
        }
    }
    Some((out, year))
}

/// Parse a `"-6.00 dB"` style gain value
fn parse_db(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s
        .strip_suffix("dB")
        .or_else(|| s.strip_suffix("db"))
        .or_else(|| s.strip_suffix("DB"))
        .unwrap_or(s);
    s.trim().parse().ok()
}

/// Parse an MP3Gain undo triple: `"+1,+1,N"`
fn parse_undo(s: &str) -> Option<ReplayGainUndo> {
    let mut parts = s.split(',');
    let left = parts.next()?.trim().parse().ok()?;
    let right = parts.next()?.trim().parse().ok()?;
    Some(ReplayGainUndo {
        left_channel_adjustment: left,
        right_channel_adjustment: right,
    })
}

/// Expand genre text, resolving legacy `(n)` references
fn expand_genre(s: &str) -> Vec<String> {
    // Wholly numeric values are table indices
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return match s.parse::<u8>().ok().and_then(genres::lookup) {
            Some(name) => vec![name.to_owned()],
            None => vec![s.to_owned()],
        };
    }

    let mut out = Vec::new();
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        let before = rest[..open].trim();
        if !before.is_empty() {
            out.push(before.to_owned());
        }
        // "((" escapes a literal parenthesis
        if rest[open + 1..].starts_with('(') {
            out.push(rest[open + 1..].trim().to_owned());
            rest = "";
            break;
        }
        let Some(close) = rest[open..].find(')') else {
            out.push(rest[open..].trim().to_owned());
            rest = "";
            break;
        };
        let inner = &rest[open + 1..open + close];
        let resolved = match inner {
            "RX" => Some("Remix".to_owned()),
            "CR" => Some("Cover".to_owned()),
            _ => inner
                .parse::<u8>()
                .ok()
                .and_then(genres::lookup)
                .map(str::to_owned),
        };
        match resolved {
            Some(name) => out.push(name),
            None => out.push(format!("({inner})")),
        }
        rest = &rest[open + close + 1..];
    }
    let tail = rest.trim();
    if !tail.is_empty() {
        out.push(tail.to_owned());
    }
    out
}

type ScalarSlot = fn(&mut CommonMetadata) -> &mut Option<String>;
type SeqSlot = fn(&mut CommonMetadata) -> &mut Vec<String>;

fn scalar_text(c: &mut Collector, field: &'static str, slot: ScalarSlot, value: &TagValue) {
    if let Some(s) = text_of(value) {
        c.set_common_scalar(field, slot, s);
    }
}

fn seq_text(
    c: &mut Collector,
    field: &'static str,
    slot: SeqSlot,
    value: &TagValue,
    split: Option<char>,
) {
    let Some(s) = text_of(value) else { return };
    match split {
        Some(sep) => {
            for piece in s.split(sep) {
                let piece = piece.trim();
                if !piece.is_empty() {
                    c.push_common_seq(field, slot, piece.to_owned());
                }
            }
        }
        None => c.push_common_seq(field, slot, s),
    }
}

fn split_of(coerce: Coerce) -> Option<char> {
    match coerce {
        Coerce::Split(sep) => Some(sep),
        _ => None,
    }
}

#[allow(clippy::too_many_lines)]
fn apply(c: &mut Collector, target: Target, coerce: Coerce, value: &TagValue) {
    match target {
        Target::Title => scalar_text(c, "title", |m| &mut m.title, value),
        Target::TitleSort => scalar_text(c, "title_sort", |m| &mut m.title_sort, value),
        Target::Artist => {
            scalar_text(c, "artist", |m| &mut m.artist, value);
            seq_text(c, "artists", |m| &mut m.artists, value, split_of(coerce));
        }
        Target::Artists => {
            seq_text(c, "artists", |m| &mut m.artists, value, split_of(coerce));
            if let Some(s) = text_of(value) {
                c.fill_common_scalar("artist", |m| &mut m.artist, s);
            }
        }
        Target::ArtistSort => scalar_text(c, "artist_sort", |m| &mut m.artist_sort, value),
        Target::AlbumArtist => scalar_text(c, "album_artist", |m| &mut m.album_artist, value),
        Target::AlbumArtistSort => {
            scalar_text(c, "album_artist_sort", |m| &mut m.album_artist_sort, value);
        }
        Target::Album => scalar_text(c, "album", |m| &mut m.album, value),
        Target::AlbumSort => scalar_text(c, "album_sort", |m| &mut m.album_sort, value),
        Target::Year => {
            if let Some(year) = int_of(value).and_then(|n| i32::try_from(n).ok()) {
                c.set_common_scalar("year", |m| &mut m.year, year);
            }
        }
        Target::OriginalYear => {
            if let Some(year) = int_of(value).and_then(|n| i32::try_from(n).ok()) {
                c.set_common_scalar("original_year", |m| &mut m.original_year, year);
            }
        }
        Target::Date => {
            if let Some((date, year)) = text_of(value).as_deref().and_then(parse_date) {
                c.set_common_scalar("date", |m| &mut m.date, date);
                c.fill_common_scalar("year", |m| &mut m.year, year);
            }
        }
        Target::OriginalDate => {
            if let Some((date, year)) = text_of(value).as_deref().and_then(parse_date) {
                c.set_common_scalar("original_date", |m| &mut m.original_date, date);
                c.fill_common_scalar("original_year", |m| &mut m.original_year, year);
            }
        }
        Target::Track => {
            if let Some(part) = part_of(value) {
                c.merge_common_part("track", |m| &mut m.track, part);
            }
        }
        Target::TrackTotal => {
            if let Some(of) = int_of(value).and_then(|n| u32::try_from(n).ok()) {
                c.merge_common_part("track", |m| &mut m.track, PartOf { no: None, of: Some(of) });
            }
        }
        Target::Disk => {
            if let Some(part) = part_of(value) {
                c.merge_common_part("disk", |m| &mut m.disk, part);
            }
        }
        Target::DiskTotal => {
            if let Some(of) = int_of(value).and_then(|n| u32::try_from(n).ok()) {
                c.merge_common_part("disk", |m| &mut m.disk, PartOf { no: None, of: Some(of) });
            }
        }
        Target::Genre => {
            let Some(s) = text_of(value) else { return };
            let expanded = match coerce {
                Coerce::Genre => expand_genre(&s),
                _ => vec![s],
            };
            for genre in expanded {
                c.push_common_seq("genre", |m| &mut m.genre, genre);
            }
        }
        Target::Picture => {
            if c.opts.skip_covers {
                return;
            }
            if let TagValue::Picture(picture) = value {
                c.push_common_seq("picture", |m| &mut m.picture, picture.clone());
            }
        }
        Target::Comment => seq_text(c, "comment", |m| &mut m.comment, value, split_of(coerce)),
        Target::Composer => seq_text(c, "composer", |m| &mut m.composer, value, split_of(coerce)),
        Target::ComposerSort => scalar_text(c, "composer_sort", |m| &mut m.composer_sort, value),
        Target::Lyrics => seq_text(c, "lyrics", |m| &mut m.lyrics, value, None),
        Target::Work => scalar_text(c, "work", |m| &mut m.work, value),
        Target::Grouping => scalar_text(c, "grouping", |m| &mut m.grouping, value),
        Target::Lyricist => seq_text(c, "lyricist", |m| &mut m.lyricist, value, split_of(coerce)),
        Target::Writer => seq_text(c, "writer", |m| &mut m.writer, value, split_of(coerce)),
        Target::Conductor => seq_text(c, "conductor", |m| &mut m.conductor, value, split_of(coerce)),
        Target::Remixer => seq_text(c, "remixer", |m| &mut m.remixer, value, split_of(coerce)),
        Target::Arranger => seq_text(c, "arranger", |m| &mut m.arranger, value, split_of(coerce)),
        Target::Engineer => seq_text(c, "engineer", |m| &mut m.engineer, value, split_of(coerce)),
        Target::Producer => seq_text(c, "producer", |m| &mut m.producer, value, split_of(coerce)),
        Target::Mixer => seq_text(c, "mixer", |m| &mut m.mixer, value, split_of(coerce)),
        Target::DjMixer => seq_text(c, "dj_mixer", |m| &mut m.dj_mixer, value, split_of(coerce)),
        Target::Label => seq_text(c, "label", |m| &mut m.label, value, split_of(coerce)),
        Target::CatalogNumber => {
            seq_text(c, "catalog_number", |m| &mut m.catalog_number, value, split_of(coerce));
        }
        Target::Rating => {
            let rating = match (coerce, value) {
                (_, TagValue::Rating(r)) => Some(r.clone()),
                (Coerce::RatingPercent, v) => float_of(v).map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let unit = ((f / 100.0).clamp(0.0, 1.0)) as f32;
                    Rating {
                        source: None,
                        rating: unit,
                    }
                }),
                (Coerce::RatingUnit, v) => float_of(v).map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let unit = f.clamp(0.0, 1.0) as f32;
                    Rating {
                        source: None,
                        rating: unit,
                    }
                }),
                _ => None,
            };
            if let Some(rating) = rating {
                c.push_common_seq("rating", |m| &mut m.rating, rating);
            }
        }
        Target::Bpm => {
            if let Some(bpm) = float_of(value) {
                c.set_common_scalar("bpm", |m| &mut m.bpm, bpm);
            }
        }
        Target::Mood => scalar_text(c, "mood", |m| &mut m.mood, value),
        Target::Media => scalar_text(c, "media", |m| &mut m.media, value),
        Target::Barcode => scalar_text(c, "barcode", |m| &mut m.barcode, value),
        Target::Isrc => seq_text(c, "isrc", |m| &mut m.isrc, value, None),
        Target::MbArtistId => {
            seq_text(c, "musicbrainz_artist_id", |m| &mut m.musicbrainz_artist_id, value, None);
        }
        Target::MbAlbumId => {
            scalar_text(c, "musicbrainz_album_id", |m| &mut m.musicbrainz_album_id, value);
        }
        Target::MbAlbumArtistId => {
            seq_text(
                c,
                "musicbrainz_album_artist_id",
                |m| &mut m.musicbrainz_album_artist_id,
                value,
                None,
            );
        }
        Target::MbTrackId => {
            scalar_text(c, "musicbrainz_track_id", |m| &mut m.musicbrainz_track_id, value);
        }
        Target::MbRecordingId => {
            scalar_text(
                c,
                "musicbrainz_recording_id",
                |m| &mut m.musicbrainz_recording_id,
                value,
            );
        }
        Target::MbReleaseGroupId => {
            scalar_text(
                c,
                "musicbrainz_release_group_id",
                |m| &mut m.musicbrainz_release_group_id,
                value,
            );
        }
        Target::MbWorkId => {
            scalar_text(c, "musicbrainz_work_id", |m| &mut m.musicbrainz_work_id, value);
        }
        Target::AcoustidId => scalar_text(c, "acoustid_id", |m| &mut m.acoustid_id, value),
        Target::AcoustidFingerprint => {
            scalar_text(c, "acoustid_fingerprint", |m| &mut m.acoustid_fingerprint, value);
        }
        Target::MusicIpPuid => scalar_text(c, "musicip_puid", |m| &mut m.musicip_puid, value),
        Target::RgTrackGain | Target::RgAlbumGain => {
            let gain = match value {
                TagValue::Float(f) => Some(Gain::from_db(*f)),
                other => text_of(other).as_deref().and_then(parse_db).map(Gain::from_db),
            };
            if let Some(gain) = gain {
                if target == Target::RgTrackGain {
                    c.set_common_scalar(
                        "replaygain_track_gain",
                        |m| &mut m.replaygain_track_gain,
                        gain,
                    );
                } else {
                    c.set_common_scalar(
                        "replaygain_album_gain",
                        |m| &mut m.replaygain_album_gain,
                        gain,
                    );
                }
            }
        }
        Target::RgTrackPeak | Target::RgAlbumPeak => {
            if let Some(ratio) = float_of(value) {
                let gain = Gain::from_ratio(ratio);
                if target == Target::RgTrackPeak {
                    c.set_common_scalar(
                        "replaygain_track_peak",
                        |m| &mut m.replaygain_track_peak,
                        gain,
                    );
                } else {
                    c.set_common_scalar(
                        "replaygain_album_peak",
                        |m| &mut m.replaygain_album_peak,
                        gain,
                    );
                }
            }
        }
        Target::RgUndo => {
            if let Some(undo) = text_of(value).as_deref().and_then(parse_undo) {
                c.set_common_scalar("replaygain_undo", |m| &mut m.replaygain_undo, undo);
            }
        }
        Target::Key => scalar_text(c, "key", |m| &mut m.key, value),
        Target::EncodedBy => scalar_text(c, "encoded_by", |m| &mut m.encoded_by, value),
        Target::EncoderSettings => {
            scalar_text(c, "encoder_settings", |m| &mut m.encoder_settings, value);
        }
        Target::Copyright => scalar_text(c, "copyright", |m| &mut m.copyright, value),
        Target::License => scalar_text(c, "license", |m| &mut m.license, value),
        Target::ReleaseStatus => scalar_text(c, "release_status", |m| &mut m.release_status, value),
        Target::ReleaseType => {
            seq_text(c, "release_type", |m| &mut m.release_type, value, split_of(coerce));
        }
        Target::ReleaseCountry => {
            scalar_text(c, "release_country", |m| &mut m.release_country, value);
        }
        Target::Script => scalar_text(c, "script", |m| &mut m.script, value),
        Target::Language => scalar_text(c, "language", |m| &mut m.language, value),
        Target::Gapless => {
            if let Some(b) = bool_of(value) {
                c.set_common_scalar("gapless", |m| &mut m.gapless, b);
            }
        }
        Target::Compilation => {
            if let Some(b) = bool_of(value) {
                c.set_common_scalar("compilation", |m| &mut m.compilation, b);
            }
        }
        Target::TvShow => scalar_text(c, "tv_show", |m| &mut m.tv_show, value),
        Target::TvShowSort => scalar_text(c, "tv_show_sort", |m| &mut m.tv_show_sort, value),
        Target::TvNetwork => scalar_text(c, "tv_network", |m| &mut m.tv_network, value),
        Target::TvSeason => {
            if let Some(n) = int_of(value).and_then(|n| u32::try_from(n).ok()) {
                c.set_common_scalar("tv_season", |m| &mut m.tv_season, n);
            }
        }
        Target::TvEpisode => {
            if let Some(n) = int_of(value).and_then(|n| u32::try_from(n).ok()) {
                c.set_common_scalar("tv_episode", |m| &mut m.tv_episode, n);
            }
        }
        Target::TvEpisodeId => scalar_text(c, "tv_episode_id", |m| &mut m.tv_episode_id, value),
        Target::Podcast => {
            if let Some(b) = bool_of(value) {
                c.set_common_scalar("podcast", |m| &mut m.podcast, b);
            }
        }
        Target::PodcastUrl => scalar_text(c, "podcast_url", |m| &mut m.podcast_url, value),
    }
}
