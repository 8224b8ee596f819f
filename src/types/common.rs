//! The format-independent, normalized metadata record

use super::value::{Gain, PartOf, Picture, Rating, ReplayGainUndo};

/// Cross-format metadata, normalized from every recognized tag system
///
/// Every field is sparse. Fields whose semantics permit multiple
/// occurrences are `Vec`s and merge in insertion order, de-duplicating
/// exact repeats; scalar fields keep the first non-empty value.
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::struct_field_names)]
pub struct CommonMetadata {
    /// Track title
    pub title: Option<String>,
    /// Title sort key
    pub title_sort: Option<String>,
    /// Primary artist credit, as a single display string
    pub artist: Option<String>,
    /// Artist sort key
    pub artist_sort: Option<String>,
    /// Individual artists
    pub artists: Vec<String>,
    /// Album artist
    pub album_artist: Option<String>,
    /// Album artist sort key
    pub album_artist_sort: Option<String>,
    /// Album title
    pub album: Option<String>,
    /// Album sort key
    pub album_sort: Option<String>,
    /// Release year
    pub year: Option<i32>,
    /// Release date, `yyyy`, `yyyy-mm` or `yyyy-mm-dd`
    pub date: Option<String>,
    /// Original (first) release date
    pub original_date: Option<String>,
    /// Original release year
    pub original_year: Option<i32>,
    /// Track position on the disk
    pub track: PartOf,
    /// Disk position in the set
    pub disk: PartOf,
    /// Genres
    pub genre: Vec<String>,
    /// Embedded pictures
    pub picture: Vec<Picture>,
    /// Comments
    pub comment: Vec<String>,
    /// Composers
    pub composer: Vec<String>,
    /// Composer sort key
    pub composer_sort: Option<String>,
    /// Lyrics
    pub lyrics: Vec<String>,
    /// Classical work title
    pub work: Option<String>,
    /// Content group / grouping
    pub grouping: Option<String>,
    /// Lyricists
    pub lyricist: Vec<String>,
    /// Writers
    pub writer: Vec<String>,
    /// Conductors
    pub conductor: Vec<String>,
    /// Remixers
    pub remixer: Vec<String>,
    /// Arrangers
    pub arranger: Vec<String>,
    /// Audio engineers
    pub engineer: Vec<String>,
    /// Producers
    pub producer: Vec<String>,
    /// Mix engineers
    pub mixer: Vec<String>,
    /// DJ mixers
    pub dj_mixer: Vec<String>,
    /// Record labels
    pub label: Vec<String>,
    /// Catalog numbers
    pub catalog_number: Vec<String>,
    /// Ratings, each with its source
    pub rating: Vec<Rating>,
    /// Beats per minute
    pub bpm: Option<f64>,
    /// Mood
    pub mood: Option<String>,
    /// Media type, e.g. `CD` or `Digital Media`
    pub media: Option<String>,
    /// Release barcode (EAN/UPC)
    pub barcode: Option<String>,
    /// International Standard Recording Codes
    pub isrc: Vec<String>,
    /// MusicBrainz artist IDs
    pub musicbrainz_artist_id: Vec<String>,
    /// MusicBrainz release (album) ID
    pub musicbrainz_album_id: Option<String>,
    /// MusicBrainz release-artist IDs
    pub musicbrainz_album_artist_id: Vec<String>,
    /// MusicBrainz track ID
    pub musicbrainz_track_id: Option<String>,
    /// MusicBrainz recording ID
    pub musicbrainz_recording_id: Option<String>,
    /// MusicBrainz release-group ID
    pub musicbrainz_release_group_id: Option<String>,
    /// MusicBrainz work ID
    pub musicbrainz_work_id: Option<String>,
    /// AcoustID identifier
    pub acoustid_id: Option<String>,
    /// AcoustID fingerprint
    pub acoustid_fingerprint: Option<String>,
    /// MusicIP PUID
    pub musicip_puid: Option<String>,
    /// ReplayGain track gain
    pub replaygain_track_gain: Option<Gain>,
    /// ReplayGain track peak
    pub replaygain_track_peak: Option<Gain>,
    /// ReplayGain album gain
    pub replaygain_album_gain: Option<Gain>,
    /// ReplayGain album peak
    pub replaygain_album_peak: Option<Gain>,
    /// MP3Gain undo information
    pub replaygain_undo: Option<ReplayGainUndo>,
    /// Musical key, e.g. `Am`
    pub key: Option<String>,
    /// Encoded-by credit
    pub encoded_by: Option<String>,
    /// Encoder settings string
    pub encoder_settings: Option<String>,
    /// Copyright notice
    pub copyright: Option<String>,
    /// License, as text or URL
    pub license: Option<String>,
    /// MusicBrainz release status, e.g. `official`
    pub release_status: Option<String>,
    /// MusicBrainz release types, e.g. `album`
    pub release_type: Vec<String>,
    /// Release country
    pub release_country: Option<String>,
    /// Writing script of the release, ISO 15924
    pub script: Option<String>,
    /// Language of the lyrics
    pub language: Option<String>,
    /// Gapless playback flag
    pub gapless: Option<bool>,
    /// Part-of-compilation flag
    pub compilation: Option<bool>,
    /// TV show name
    pub tv_show: Option<String>,
    /// TV show sort key
    pub tv_show_sort: Option<String>,
    /// TV network
    pub tv_network: Option<String>,
    /// TV season number
    pub tv_season: Option<u32>,
    /// TV episode number
    pub tv_episode: Option<u32>,
    /// TV episode identifier
    pub tv_episode_id: Option<String>,
    /// Podcast flag
    pub podcast: Option<bool>,
    /// Podcast feed URL
    pub podcast_url: Option<String>,
}
