//! # audioprobe
//!
//! A streaming parser for audio-file metadata. Given a byte source, the
//! probe identifies the container format, decodes embedded tag blocks, and
//! produces a **native** view (each tag system's own identifiers and raw
//! values), a **common** view (normalized cross-format fields), and the
//! audio-format facts (codec, sample rate, duration, channel count).
//!
//! Supported containers: MPEG audio, ADTS/AAC, MP4, ASF/WMA, FLAC, Ogg,
//! AIFF, RIFF/WAVE, WavPack, Musepack, DSF, DSDIFF, and standalone APEv2.
//!
//! ## Example
//!
//! ```rust,no_run
//! use audioprobe::{parse_from_buffer, ProbeOptions};
//!
//! # fn example() -> audioprobe::Result<()> {
//! let bytes = std::fs::read("track.flac").expect("read file");
//! let result = parse_from_buffer(&bytes, Some("audio/flac"), ProbeOptions::new())?;
//!
//! println!("container: {:?}", result.format.container);
//! println!("title: {:?}", result.common.title);
//! println!("artists: {:?}", result.common.artists);
//! # Ok(())
//! # }
//! ```
//!
//! The probe never decodes audio samples, never writes tags, and never
//! touches the file system: callers hand it bytes, a [`std::io::Read`]
//! stream, or their own [`Tokenizer`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::io::Read;

// Public modules
/// Error types
pub mod error;
/// Parse options and observer events
pub mod options;
/// Core data model
pub mod types;

// Internal modules
mod collector;
mod containers;
/// Byte source abstraction
pub mod io;
mod mapping;
mod sniff;
mod tags;
mod trailer;

// Re-exports
pub use error::{ProbeError, Result};
pub use options::{Observer, ProbeEvent, ProbeOptions};
pub use types::{
    CommonMetadata, ContainerKind, FormatInfo, Gain, NativeTag, PartOf, Picture, Rating,
    ReplayGainUndo, TagSystem, TagValue,
};

use collector::Collector;
use io::{BufferTokenizer, StreamTokenizer, Tokenizer};

/// The outcome of a successful parse
#[derive(Debug)]
pub struct ProbeResult {
    /// Audio-format facts
    pub format: FormatInfo,
    /// The normalized, format-independent view
    pub common: CommonMetadata,
    /// The native tag view, present when [`ProbeOptions::native`] was set
    pub native: Option<Vec<(TagSystem, Vec<NativeTag>)>>,
    /// Non-fatal defects encountered while parsing
    pub warnings: Vec<String>,
}

impl ProbeResult {
    /// Native tags of one tag system, in arrival order
    #[must_use]
    pub fn native_tags(&self, system: TagSystem) -> Option<&[NativeTag]> {
        self.native
            .as_ref()?
            .iter()
            .find(|(s, _)| *s == system)
            .map(|(_, tags)| tags.as_slice())
    }
}

/// Parse an in-memory buffer
///
/// The buffer is random-access, so the trailer scan for ID3v1, Lyrics3
/// and APEv2 runs before the forward parse (unless
/// [`ProbeOptions::skip_post_headers`] is set).
///
/// # Errors
///
/// Returns [`ProbeError::UnsupportedContainer`] when no parser matches,
/// or the underlying parse error for a malformed container.
pub fn parse_from_buffer(
    data: &[u8],
    mime: Option<&str>,
    options: ProbeOptions,
) -> Result<ProbeResult> {
    let mut c = Collector::new(options);
    c.stream_end = Some(data.len() as u64);

    let mut id3v1_present = false;
    if !c.opts.skip_post_headers {
        match trailer::scan(data) {
            Ok(info) => {
                id3v1_present = info.id3v1;
                // a caller-supplied offset wins over the scanned one
                if c.opts.ape_offset.is_none() {
                    c.opts.ape_offset = info.ape_offset;
                }
                c.stream_end = Some(data.len() as u64 - info.total_len());
            }
            Err(e) => c.warn(format!("trailer scan failed: {e}")),
        }
    }

    let mut t = BufferTokenizer::new(data);
    containers::dispatch(&mut t, mime, &mut c)?;

    parse_ape_trailer(data, &mut c);
    if id3v1_present {
        tags::id3v1::decode(&data[data.len() - tags::id3v1::TAG_LEN..], &mut c);
    }

    Ok(assemble(c))
}

/// Parse a forward-only stream
///
/// Streams cannot seek, so the trailer scan is disabled; trailing ID3v1
/// and APEv2 tags are not discovered. [`ProbeOptions::file_size`] enables
/// size-based duration estimates.
///
/// # Errors
///
/// Returns [`ProbeError::UnsupportedContainer`] when no parser matches,
/// or the underlying parse error for a malformed container.
pub fn parse_from_stream(
    reader: impl Read,
    mime: Option<&str>,
    options: ProbeOptions,
) -> Result<ProbeResult> {
    let file_size = options.file_size;
    let mut c = Collector::new(options);
    c.stream_end = file_size;

    let mut t = StreamTokenizer::with_size(reader, file_size);
    containers::dispatch(&mut t, mime, &mut c)?;
    Ok(assemble(c))
}

/// Parse from a caller-supplied tokenizer
///
/// The advanced entry point: the caller controls buffering and
/// positioning. The trailer scan is disabled, like
/// [`parse_from_stream`].
///
/// # Errors
///
/// Returns [`ProbeError::UnsupportedContainer`] when no parser matches,
/// or the underlying parse error for a malformed container.
pub fn parse_from_tokenizer(
    tokenizer: &mut dyn Tokenizer,
    mime: Option<&str>,
    options: ProbeOptions,
) -> Result<ProbeResult> {
    let mut c = Collector::new(options);
    c.stream_end = c.opts.file_size.or_else(|| tokenizer.size_hint());

    containers::dispatch(tokenizer, mime, &mut c)?;
    Ok(assemble(c))
}

/// Group a flat native-tag sequence by identifier
///
/// Duplicate identifiers keep their arrival order within each group.
#[must_use]
pub fn order_tags<'a>(tags: &'a [NativeTag]) -> HashMap<&'a str, Vec<&'a TagValue>> {
    let mut out: HashMap<&str, Vec<&TagValue>> = HashMap::new();
    for tag in tags {
        out.entry(tag.id.as_str()).or_default().push(&tag.value);
    }
    out
}

/// Convert a unit rating to a 1-5 star display value
///
/// `None` maps to `0` (unrated).
#[must_use]
pub fn rating_to_stars(rating: Option<f32>) -> u8 {
    match rating {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(r) => 1 + (r.clamp(0.0, 1.0) * 4.0).round() as u8,
        None => 0,
    }
}

/// Parse the APEv2 trailer located by the scanner or the caller
fn parse_ape_trailer(data: &[u8], c: &mut Collector) {
    let Some(offset) = c.opts.ape_offset else {
        return;
    };
    let Ok(offset) = usize::try_from(offset) else {
        return;
    };
    if offset >= data.len() {
        c.warn("APEv2 offset points past the end of the source");
        return;
    }
    // the standalone APEv2 container already consumed the tag
    if c.native.iter().any(|(s, _)| *s == TagSystem::Apev2) {
        return;
    }
    let mut t = BufferTokenizer::new(&data[offset..]);
    if let Err(e) = tags::apev2::parse(&mut t, c) {
        c.warn(format!("APEv2 trailer: {e}"));
    }
}

fn assemble(c: Collector) -> ProbeResult {
    ProbeResult {
        native: c.opts.native.then_some(c.native),
        format: c.format,
        common: c.common,
        warnings: c.warnings,
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_rating_to_stars() {
        assert_eq!(rating_to_stars(None), 0);
        assert_eq!(rating_to_stars(Some(0.0)), 1);
        assert_eq!(rating_to_stars(Some(0.25)), 2);
        assert_eq!(rating_to_stars(Some(0.5)), 3);
        assert_eq!(rating_to_stars(Some(0.75)), 4);
        assert_eq!(rating_to_stars(Some(1.0)), 5);
    }

    #[test]
    fn test_order_tags_groups_by_id() {
        let tags = vec![
            NativeTag::text("ARTIST", "A"),
            NativeTag::text("TITLE", "X"),
            NativeTag::text("ARTIST", "B"),
        ];
        let ordered = order_tags(&tags);
        assert_eq!(ordered["ARTIST"].len(), 2);
        assert_eq!(ordered["TITLE"].len(), 1);
        assert_eq!(ordered["ARTIST"][0].as_text(), Some("A"));
        assert_eq!(ordered["ARTIST"][1].as_text(), Some("B"));
    }
}
