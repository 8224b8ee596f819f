//! MP4 / QuickTime atom parser
//!
//! Box headers are a 4-byte big-endian size and a 4-byte type, with a
//! 64-bit extended size when size == 1. Format facts come from
//! `moov/mvhd` and the sound track's `mdia` subtree; iTunes metadata from
//! `moov/udta/meta/ilst` typed `data` atoms.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::mapping::genre_name;
use crate::types::{NativeTag, PartOf, Picture, TagSystem, TagValue};

/// `data` atom classes
const CLASS_IMPLICIT: u32 = 0;
const CLASS_UTF8: u32 = 1;
const CLASS_JPEG: u32 = 13;
const CLASS_PNG: u32 = 14;
const CLASS_SIGNED_INT: u32 = 21;
const CLASS_UNSIGNED_INT: u32 = 22;

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("MP4");

    loop {
        let header = match read_box_header(t) {
            Ok(Some(header)) => header,
            Ok(None) => break,
            Err(e) if e.is_truncation() => break,
            Err(e) => return Err(e),
        };
        match (&header.name, header.size) {
            (b"moov", _) => {
                let body = t.read_vec(header.body_len()?)?;
                walk_moov(&body, c);
            }
            (_, Some(size)) => match t.skip(size) {
                Ok(()) => {}
                Err(e) if e.is_truncation() => {
                    c.warn(format!(
                        "MP4: box {} truncated",
                        String::from_utf8_lossy(&header.name)
                    ));
                    break;
                }
                Err(e) => return Err(e),
            },
            // a zero size means "to end of file"; nothing can follow
            (_, None) => break,
        }
    }

    c.derive_duration();
    if let (Some(size), Some(duration)) = (c.opts.file_size.or_else(|| t.size_hint()), c.format.duration)
    {
        if duration > 0.0 && c.format.bitrate.is_none() {
            #[allow(clippy::cast_precision_loss)]
            let bitrate = size as f64 * 8.0 / duration;
            c.set_bitrate(bitrate);
        }
    }
    Ok(())
}

struct BoxHeader {
    name: [u8; 4],
    /// Body size in bytes; `None` means "to end of enclosing scope"
    size: Option<u64>,
}

impl BoxHeader {
    fn body_len(&self) -> Result<usize> {
        let size = self.size.ok_or_else(|| {
            ProbeError::decode("MP4 box", "open-ended box cannot be buffered")
        })?;
        usize::try_from(size).map_err(|_| ProbeError::decode("MP4 box", "box too large"))
    }
}

/// Read a box header from the stream, `None` at a clean end
fn read_box_header(t: &mut dyn Tokenizer) -> Result<Option<BoxHeader>> {
    let mut probe = [0u8; 8];
    let n = t.peek_into(&mut probe)?;
    if n == 0 {
        return Ok(None);
    }
    if n < 8 {
        return Err(ProbeError::EndOfStream {
            position: t.position(),
        });
    }
    let size32 = t.read_u32_be()?;
    let name = t.read_fourcc()?;
    let size = match size32 {
        0 => None,
        1 => Some(t.read_u64_be()?.saturating_sub(16)),
        s => Some(u64::from(s).saturating_sub(8)),
    };
    Ok(Some(BoxHeader { name, size }))
}

/// Iterate child boxes within a buffered parent body
fn children(body: &[u8]) -> impl Iterator<Item = ([u8; 4], &[u8])> {
    let mut rest = body;
    std::iter::from_fn(move || {
        if rest.len() < 8 {
            return None;
        }
        let size = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
        let name: [u8; 4] = rest[4..8].try_into().unwrap();
        if size < 8 || size > rest.len() {
            return None;
        }
        let child = &rest[8..size];
        rest = &rest[size..];
        Some((name, child))
    })
}

fn walk_moov(body: &[u8], c: &mut Collector) {
    for (name, child) in children(body) {
        match &name {
            b"mvhd" => decode_mvhd(child, c),
            b"trak" => walk_trak(child, c),
            b"udta" => walk_udta(child, c),
            _ => {}
        }
    }
}

fn decode_mvhd(body: &[u8], c: &mut Collector) {
    let Some((timescale, duration)) = read_versioned_times(body) else {
        c.warn("MP4: malformed mvhd");
        return;
    };
    if timescale > 0 && duration > 0 {
        #[allow(clippy::cast_precision_loss)]
        let seconds = duration as f64 / f64::from(timescale);
        c.set_duration(seconds);
    }
}

/// Extract `(timescale, duration)` from an mvhd/mdhd body, either version
fn read_versioned_times(body: &[u8]) -> Option<(u32, u64)> {
    let version = *body.first()?;
    if version == 1 {
        // creation and modification times are 64-bit
        let timescale = u32::from_be_bytes(body.get(20..24)?.try_into().ok()?);
        let duration = u64::from_be_bytes(body.get(24..32)?.try_into().ok()?);
        Some((timescale, duration))
    } else {
        let timescale = u32::from_be_bytes(body.get(12..16)?.try_into().ok()?);
        let duration = u64::from(u32::from_be_bytes(body.get(16..20)?.try_into().ok()?));
        Some((timescale, duration))
    }
}

fn walk_trak(body: &[u8], c: &mut Collector) {
    let Some(mdia) = children(body).find(|(name, _)| name == b"mdia").map(|(_, b)| b) else {
        return;
    };

    // only the sound track contributes audio facts
    let is_audio = children(mdia)
        .find(|(name, _)| name == b"hdlr")
        .and_then(|(_, hdlr)| hdlr.get(8..12))
        .is_some_and(|subtype| subtype == b"soun");
    if !is_audio {
        return;
    }

    for (name, child) in children(mdia) {
        match &name {
            b"mdhd" => {
                if let Some((timescale, duration)) = read_versioned_times(child) {
                    if timescale > 0 && duration > 0 {
                        c.set_samples(duration);
                        if c.format.sample_rate.is_none() {
                            c.set_sample_rate(timescale);
                        }
                    }
                }
            }
            b"minf" => {
                let stbl = children(child).find(|(name, _)| name == b"stbl").map(|(_, b)| b);
                if let Some(stbl) = stbl {
                    if let Some((_, stsd)) = children(stbl).find(|(name, _)| name == b"stsd") {
                        decode_stsd(stsd, c);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Sample description: codec fourcc and the audio sample entry fields
fn decode_stsd(body: &[u8], c: &mut Collector) {
    // version/flags, entry count
    let Some(entries) = body.get(8..) else { return };
    let Some((name, entry)) = children(entries).next() else {
        return;
    };

    let codec = String::from_utf8_lossy(&name).into_owned();
    let (codec_name, lossless) = match &name {
        b"mp4a" => ("MPEG-4/AAC", false),
        b"alac" => ("ALAC", true),
        b"fLaC" => ("FLAC", true),
        b"Opus" => ("Opus", false),
        b"ac-3" => ("AC-3", false),
        _ => (codec.as_str(), false),
    };
    c.set_codec(codec_name);
    c.set_lossless(lossless);

    // 6 reserved + data reference index, then the audio sample entry
    if let Some(audio) = entry.get(8..) {
        if audio.len() >= 20 {
            let channels = u16::from_be_bytes(audio[8..10].try_into().unwrap());
            let sample_size = u16::from_be_bytes(audio[10..12].try_into().unwrap());
            let rate = u32::from_be_bytes(audio[16..20].try_into().unwrap()) >> 16;
            if channels > 0 {
                c.set_channels(u8::try_from(channels).unwrap_or(u8::MAX));
            }
            if sample_size > 0 {
                c.set_bits_per_sample(u8::try_from(sample_size).unwrap_or(u8::MAX));
            }
            if rate > 0 {
                c.set_sample_rate(rate);
            }
        }
    }
}

fn walk_udta(body: &[u8], c: &mut Collector) {
    let Some(meta) = children(body).find(|(name, _)| name == b"meta").map(|(_, b)| b) else {
        return;
    };
    // meta is a full box: 4 bytes of version/flags before its children
    let Some(meta_children) = meta.get(4..) else { return };
    let Some(ilst) = children(meta_children)
        .find(|(name, _)| name == b"ilst")
        .map(|(_, b)| b)
    else {
        return;
    };

    for (name, child) in children(ilst) {
        if &name == b"----" {
            decode_freeform(child, c);
        } else {
            let id = String::from_utf8_lossy(&name).into_owned();
            decode_ilst_entry(&id, child, c);
        }
    }
}

/// A freeform item: `mean` (namespace), `name` (key), `data`
fn decode_freeform(body: &[u8], c: &mut Collector) {
    let mut mean = None;
    let mut name = None;
    let mut data = None;
    for (child_name, child) in children(body) {
        match &child_name {
            b"mean" => mean = child.get(4..).map(|b| String::from_utf8_lossy(b).into_owned()),
            b"name" => name = child.get(4..).map(|b| String::from_utf8_lossy(b).into_owned()),
            b"data" => data = Some(child),
            _ => {}
        }
    }
    let (Some(mean), Some(name), Some(data)) = (mean, name, data) else {
        return;
    };
    let id = format!("----:{mean}:{name}");
    emit_data_atom(&id, data, c);
}

fn decode_ilst_entry(id: &str, body: &[u8], c: &mut Collector) {
    for (name, data) in children(body) {
        if &name == b"data" {
            emit_data_atom(id, data, c);
        }
    }
}

/// Decode one typed `data` atom: class/locale header, then the payload
fn emit_data_atom(id: &str, data: &[u8], c: &mut Collector) {
    if data.len() < 8 {
        return;
    }
    let class = u32::from_be_bytes(data[..4].try_into().unwrap()) & 0x00FF_FFFF;
    let payload = &data[8..];

    let value = match class {
        CLASS_UTF8 => match std::str::from_utf8(payload) {
            Ok(text) => TagValue::Text(text.to_owned()),
            Err(_) => {
                c.warn(format!("MP4: {id} data is not valid UTF-8"));
                return;
            }
        },
        CLASS_JPEG | CLASS_PNG => picture_value(
            if class == CLASS_JPEG {
                "image/jpeg"
            } else {
                "image/png"
            },
            payload,
            c,
        ),
        CLASS_SIGNED_INT => match int_payload(payload) {
            Some(n) => TagValue::Int(n),
            None => return,
        },
        CLASS_UNSIGNED_INT => match int_payload(payload) {
            Some(n) => TagValue::Int(n),
            None => return,
        },
        CLASS_IMPLICIT => match implicit_value(id, payload, c) {
            Some(value) => value,
            None => return,
        },
        _ => TagValue::Binary(payload.to_vec()),
    };
    c.add_tag(TagSystem::Itunes, NativeTag::new(id, value));
}

fn picture_value(mime: &str, payload: &[u8], c: &Collector) -> TagValue {
    TagValue::Picture(Picture::new(
        mime,
        if c.opts.skip_covers {
            Vec::new()
        } else {
            payload.to_vec()
        },
    ))
}

fn int_payload(payload: &[u8]) -> Option<i64> {
    Some(match payload.len() {
        1 => i64::from(payload[0] as i8),
        2 => i64::from(i16::from_be_bytes(payload.try_into().unwrap())),
        4 => i64::from(i32::from_be_bytes(payload.try_into().unwrap())),
        8 => i64::from_be_bytes(payload.try_into().unwrap()),
        _ => return None,
    })
}

/// Class 0 payloads with well-known shapes: trkn/disk pairs, gnre index,
/// cover art with a missing class
fn implicit_value(id: &str, payload: &[u8], c: &Collector) -> Option<TagValue> {
    match id {
        "trkn" | "disk" => {
            if payload.len() < 6 {
                return None;
            }
            let no = u16::from_be_bytes(payload[2..4].try_into().unwrap());
            let of = u16::from_be_bytes(payload[4..6].try_into().unwrap());
            Some(TagValue::Parts(PartOf {
                no: (no > 0).then(|| u32::from(no)),
                of: (of > 0).then(|| u32::from(of)),
            }))
        }
        "gnre" => {
            if payload.len() < 2 {
                return None;
            }
            let index = u16::from_be_bytes(payload[..2].try_into().unwrap());
            // gnre stores the ID3v1 genre index plus one
            let name = u8::try_from(index.checked_sub(1)?).ok().and_then(genre_name)?;
            Some(TagValue::Text(name.to_owned()))
        }
        "covr" => Some(picture_value(Picture::sniff_mime(payload), payload, c)),
        _ => Some(TagValue::Binary(payload.to_vec())),
    }
}

#[cfg(test)]
pub(crate) mod build {
    //! MP4 fixture builders

    /// A plain box
    pub(crate) fn atom(name: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&u32::try_from(body.len() + 8).unwrap().to_be_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(body);
        out
    }

    /// A `data` atom with the given class and payload
    pub(crate) fn data_atom(class: u32, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&class.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // locale
        body.extend_from_slice(payload);
        atom(b"data", &body)
    }

    /// An `ilst` text entry
    pub(crate) fn text_entry(name: &[u8; 4], value: &str) -> Vec<u8> {
        atom(name, &data_atom(1, value.as_bytes()))
    }

    /// The `trkn`/`disk` pair layout
    pub(crate) fn pair_entry(name: &[u8; 4], no: u16, of: u16) -> Vec<u8> {
        let mut payload = vec![0u8; 2];
        payload.extend_from_slice(&no.to_be_bytes());
        payload.extend_from_slice(&of.to_be_bytes());
        payload.extend_from_slice(&[0, 0]);
        atom(name, &data_atom(0, &payload))
    }

    /// An mvhd box body (version 0)
    pub(crate) fn mvhd(timescale: u32, duration: u32) -> Vec<u8> {
        let mut body = vec![0u8; 12];
        body.extend_from_slice(&timescale.to_be_bytes());
        body.extend_from_slice(&duration.to_be_bytes());
        body.extend_from_slice(&[0u8; 80]);
        atom(b"mvhd", &body)
    }

    /// A minimal sound trak with mdhd and an mp4a sample entry
    pub(crate) fn sound_trak(timescale: u32, duration: u32, channels: u16, rate: u32) -> Vec<u8> {
        let mut mdhd = vec![0u8; 12];
        mdhd.extend_from_slice(&timescale.to_be_bytes());
        mdhd.extend_from_slice(&duration.to_be_bytes());
        mdhd.extend_from_slice(&[0u8; 4]);

        let mut hdlr = vec![0u8; 8];
        hdlr.extend_from_slice(b"soun");
        hdlr.extend_from_slice(&[0u8; 12]);

        let mut sample_entry = vec![0u8; 8]; // reserved + data ref index
        sample_entry.extend_from_slice(&[0u8; 8]); // version, revision, vendor
        sample_entry.extend_from_slice(&channels.to_be_bytes());
        sample_entry.extend_from_slice(&16u16.to_be_bytes()); // sample size
        sample_entry.extend_from_slice(&[0u8; 4]); // compression, packet size
        sample_entry.extend_from_slice(&(rate << 16).to_be_bytes());

        let stsd_body = {
            let mut b = vec![0u8; 4];
            b.extend_from_slice(&1u32.to_be_bytes());
            b.extend_from_slice(&atom(b"mp4a", &sample_entry));
            b
        };
        let stbl = atom(b"stbl", &atom(b"stsd", &stsd_body));
        let minf = atom(b"minf", &stbl);
        let mdia = {
            let mut b = atom(b"mdhd", &mdhd);
            b.extend_from_slice(&atom(b"hdlr", &hdlr));
            b.extend_from_slice(&minf);
            b
        };
        atom(b"trak", &atom(b"mdia", &mdia))
    }

    /// Wrap ilst entries in `moov/udta/meta/ilst`
    pub(crate) fn moov_with_ilst(extra: &[u8], entries: &[Vec<u8>]) -> Vec<u8> {
        let ilst = atom(b"ilst", &entries.concat());
        let mut meta_body = vec![0u8; 4];
        meta_body.extend_from_slice(&ilst);
        let udta = atom(b"udta", &atom(b"meta", &meta_body));
        let mut moov_body = extra.to_vec();
        moov_body.extend_from_slice(&udta);
        atom(b"moov", &moov_body)
    }

    /// A complete minimal file: ftyp + moov
    pub(crate) fn file(moov: &[u8]) -> Vec<u8> {
        let mut out = atom(b"ftyp", b"M4A \0\0\0\0isomiso2");
        out.extend_from_slice(moov);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferTokenizer;
    use crate::options::ProbeOptions;

    fn probe(bytes: &[u8]) -> Collector {
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(bytes), &mut c).unwrap();
        c
    }

    #[test]
    fn test_ilst_scenario() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
        let entries = vec![
            build::text_entry(b"\xA9nam", "T"),
            build::text_entry(b"\xA9ART", "A"),
            build::pair_entry(b"trkn", 2, 10),
            build::atom(b"covr", &build::data_atom(13, &jpeg)),
        ];
        let moov = build::moov_with_ilst(&[], &entries);
        let c = probe(&build::file(&moov));

        assert_eq!(c.format.container.as_deref(), Some("MP4"));
        assert_eq!(c.common.title.as_deref(), Some("T"));
        assert_eq!(c.common.artist.as_deref(), Some("A"));
        assert_eq!(c.common.track.no, Some(2));
        assert_eq!(c.common.track.of, Some(10));
        assert_eq!(c.common.picture.len(), 1);
        assert_eq!(c.common.picture[0].mime, "image/jpeg");
    }

    #[test]
    fn test_format_facts_from_trak() {
        let mut extra = build::mvhd(1000, 10_000);
        extra.extend_from_slice(&build::sound_trak(44_100, 441_000, 2, 44_100));
        let moov = build::moov_with_ilst(&extra, &[]);
        let c = probe(&build::file(&moov));

        assert!((c.format.duration.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(c.format.sample_rate, Some(44_100));
        assert_eq!(c.format.number_of_channels, Some(2));
        assert_eq!(c.format.number_of_samples, Some(441_000));
        assert_eq!(c.format.codec.as_deref(), Some("MPEG-4/AAC"));
        assert_eq!(c.format.lossless, Some(false));
    }

    #[test]
    fn test_gnre_resolves_id3_table() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&18u16.to_be_bytes()); // Rock + 1
        let entries = vec![build::atom(b"gnre", &build::data_atom(0, &payload))];
        let moov = build::moov_with_ilst(&[], &entries);
        let c = probe(&build::file(&moov));
        assert_eq!(c.common.genre, vec!["Rock"]);
    }

    #[test]
    fn test_freeform_atom() {
        let mut body = Vec::new();
        body.extend_from_slice(&build::atom(b"mean", &{
            let mut b = vec![0u8; 4];
            b.extend_from_slice(b"com.apple.iTunes");
            b
        }));
        body.extend_from_slice(&build::atom(b"name", &{
            let mut b = vec![0u8; 4];
            b.extend_from_slice(b"MusicBrainz Track Id");
            b
        }));
        body.extend_from_slice(&build::data_atom(1, b"abc-123"));
        let entries = vec![build::atom(b"----", &body)];
        let moov = build::moov_with_ilst(&[], &entries);
        let c = probe(&build::file(&moov));

        assert_eq!(c.common.musicbrainz_recording_id.as_deref(), Some("abc-123"));
        let (_, tags) = &c.native[0];
        assert_eq!(tags[0].id, "----:com.apple.iTunes:MusicBrainz Track Id");
    }

    #[test]
    fn test_unknown_boxes_are_skipped() {
        let mut bytes = build::file(&build::moov_with_ilst(
            &[],
            &[build::text_entry(b"\xA9nam", "T")],
        ));
        bytes.extend_from_slice(&build::atom(b"free", &[0u8; 32]));
        let c = probe(&bytes);
        assert_eq!(c.common.title.as_deref(), Some("T"));
    }
}
