//! Container parsers and the dispatch driver
//!
//! Each parser implements one contract: read from the tokenizer, emit
//! native tags and format facts into the collector, accumulate warnings,
//! and tolerate truncation past the metadata region.

pub(crate) mod adts;
pub(crate) mod aiff;
pub(crate) mod apetag;
pub(crate) mod asf;
pub(crate) mod dsdiff;
pub(crate) mod dsf;
pub(crate) mod flac;
pub(crate) mod mp4;
pub(crate) mod mpeg;
pub(crate) mod musepack;
pub(crate) mod ogg;
pub(crate) mod riff;
pub(crate) mod wavpack;

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::sniff::{sniff, Sniffed, SNIFF_WINDOW};
use crate::tags::id3v2;
use crate::types::ContainerKind;

/// Sniff the leading bytes and run the matching parser
///
/// ID3v2 tags are envelopes: each one is decoded and the remaining stream
/// re-sniffed until an audio container appears.
pub(crate) fn dispatch(
    t: &mut dyn Tokenizer,
    mime: Option<&str>,
    c: &mut Collector,
) -> Result<()> {
    let mut envelope_seen = false;
    loop {
        let header = t.peek_vec(SNIFF_WINDOW)?;
        let sniffed = if header.is_empty() {
            None
        } else {
            sniff(&header, mime)
        };

        match sniffed {
            Some(Sniffed::Id3v2) => {
                id3v2::parse(t, c)?;
                envelope_seen = true;
            }
            Some(Sniffed::Container(kind)) => {
                tracing::debug!(container = %kind, "dispatching container parser");
                return match run(kind, t, c) {
                    Err(e) if e.is_truncation() && c.format.container.is_some() => {
                        c.warn(format!("{kind}: stream truncated ({e})"));
                        Ok(())
                    }
                    other => other,
                };
            }
            None if envelope_seen => {
                // a tag with no recognizable audio after it: ID3v2 is
                // almost always an MPEG prefix, report it as such
                c.warn("no recognizable audio stream after ID3v2 tag");
                c.set_container("MPEG");
                return Ok(());
            }
            None => return Err(ProbeError::UnsupportedContainer),
        }
    }
}

fn run(kind: ContainerKind, t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    match kind {
        ContainerKind::Mpeg => mpeg::parse(t, c),
        ContainerKind::Adts => adts::parse(t, c),
        ContainerKind::Flac => flac::parse(t, c),
        ContainerKind::Ogg => ogg::parse(t, c),
        ContainerKind::Mp4 => mp4::parse(t, c),
        ContainerKind::Asf => asf::parse(t, c),
        ContainerKind::Aiff => aiff::parse(t, c),
        ContainerKind::Riff => riff::parse(t, c),
        ContainerKind::Wavpack => wavpack::parse(t, c),
        ContainerKind::Musepack => musepack::parse(t, c),
        ContainerKind::Dsf => dsf::parse(t, c),
        ContainerKind::Dsdiff => dsdiff::parse(t, c),
        ContainerKind::Apev2 => apetag::parse(t, c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferTokenizer;
    use crate::options::ProbeOptions;

    #[test]
    fn test_unknown_bytes_are_unsupported() {
        let mut c = Collector::new(ProbeOptions::new());
        let mut t = BufferTokenizer::new(b"this is not an audio file at all");
        assert!(matches!(
            dispatch(&mut t, None, &mut c),
            Err(ProbeError::UnsupportedContainer)
        ));
    }

    #[test]
    fn test_id3v2_envelope_chains_into_flac() {
        // an ID3v2 tag prepended to a FLAC stream
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"ID3\x04\x00\x00\x00\x00\x00\x00"); // empty tag
        bytes.extend_from_slice(&crate::containers::flac::build::file(&[(
            0,
            crate::containers::flac::build::streaminfo(44_100, 2, 16, 1000, [0; 16]),
        )]));

        let mut c = Collector::new(ProbeOptions::new());
        dispatch(&mut BufferTokenizer::new(&bytes), None, &mut c).unwrap();
        assert_eq!(c.format.container.as_deref(), Some("FLAC"));
    }

    #[test]
    fn test_id3v2_with_no_audio_defaults_to_mpeg() {
        let bytes = b"ID3\x03\x00\x00\x00\x00\x00\x00".to_vec();
        let mut c = Collector::new(ProbeOptions::new());
        dispatch(&mut BufferTokenizer::new(&bytes), None, &mut c).unwrap();
        assert_eq!(c.format.container.as_deref(), Some("MPEG"));
        assert!(!c.warnings.is_empty());
    }
}
