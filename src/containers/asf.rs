//! ASF / WMA object parser
//!
//! Top-level objects are 16-byte GUIDs with 64-bit little-endian sizes.
//! File Properties gives duration (minus preroll), Stream Properties the
//! codec facts, and the three description objects carry the tags.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::types::{NativeTag, Picture, TagSystem, TagValue};

const HEADER_OBJECT: [u8; 16] = guid(0x75B2_2630, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
const FILE_PROPERTIES: [u8; 16] = guid(0x8CAB_DCA1, 0x47A9, 0x11CF, [0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
const STREAM_PROPERTIES: [u8; 16] = guid(0xB7DC_0791, 0xA9B7, 0x11CF, [0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
const CONTENT_DESCRIPTION: [u8; 16] = guid(0x75B2_2633, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
const EXT_CONTENT_DESCRIPTION: [u8; 16] = guid(0xD2D0_A440, 0xE307, 0x11D2, [0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50]);
const HEADER_EXTENSION: [u8; 16] = guid(0x5FBF_03B5, 0xA92E, 0x11CF, [0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
const METADATA_OBJECT: [u8; 16] = guid(0xC5F8_CBEA, 0x5BAF, 0x4877, [0x84, 0x67, 0xAA, 0x8C, 0x44, 0xFA, 0x4C, 0xCA]);
const METADATA_LIBRARY: [u8; 16] = guid(0x4423_1C94, 0x9498, 0x49D1, [0xA1, 0x41, 0x1D, 0x13, 0x4E, 0x45, 0x70, 0x54]);
const AUDIO_MEDIA: [u8; 16] = guid(0xF869_9E40, 0x5B4D, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);

/// Build the on-disk GUID byte order: the first three fields are
/// little-endian, the last eight bytes verbatim
const fn guid(a: u32, b: u16, c: u16, d: [u8; 8]) -> [u8; 16] {
    let a = a.to_le_bytes();
    let b = b.to_le_bytes();
    let c = c.to_le_bytes();
    [
        a[0], a[1], a[2], a[3], b[0], b[1], c[0], c[1], d[0], d[1], d[2], d[3], d[4], d[5], d[6],
        d[7],
    ]
}

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("ASF");

    let mut header_guid = [0u8; 16];
    t.read_into(&mut header_guid)?;
    if header_guid != HEADER_OBJECT {
        return Err(ProbeError::decode("ASF header", "missing header object GUID"));
    }
    let header_size = t.read_u64_le()?;
    // object count, two reserved bytes
    t.skip(6)?;

    let body_len = header_size.saturating_sub(30);
    let body = t.read_vec(usize::try_from(body_len).map_err(|_| {
        ProbeError::decode("ASF header", "header object too large")
    })?)?;

    walk_objects(&body, c);
    c.derive_duration();
    Ok(())
}

fn walk_objects(body: &[u8], c: &mut Collector) {
    let mut rest = body;
    while rest.len() >= 24 {
        let object_guid: [u8; 16] = rest[..16].try_into().unwrap();
        let size = u64::from_le_bytes(rest[16..24].try_into().unwrap()) as usize;
        if size < 24 || size > rest.len() {
            c.warn("ASF: object size runs past its parent");
            return;
        }
        let object = &rest[24..size];
        rest = &rest[size..];

        match object_guid {
            FILE_PROPERTIES => decode_file_properties(object, c),
            STREAM_PROPERTIES => decode_stream_properties(object, c),
            CONTENT_DESCRIPTION => decode_content_description(object, c),
            EXT_CONTENT_DESCRIPTION => decode_extended_description(object, c),
            HEADER_EXTENSION => {
                // reserved GUID + u16 + data size, then nested objects
                if let Some(nested) = object.get(22..) {
                    walk_objects(nested, c);
                }
            }
            METADATA_OBJECT | METADATA_LIBRARY => decode_metadata_records(object, c),
            _ => {}
        }
    }
}

fn decode_file_properties(object: &[u8], c: &mut Collector) {
    if object.len() < 80 {
        c.warn("ASF: file properties object too short");
        return;
    }
    let play_duration = u64::from_le_bytes(object[40..48].try_into().unwrap());
    let preroll_ms = u64::from_le_bytes(object[56..64].try_into().unwrap());

    // play duration is in 100 ns units and includes the preroll
    #[allow(clippy::cast_precision_loss)]
    let seconds = play_duration as f64 / 1e7 - preroll_ms as f64 / 1e3;
    if seconds > 0.0 {
        c.set_duration(seconds);
    }
}

fn decode_stream_properties(object: &[u8], c: &mut Collector) {
    if object.len() < 54 {
        return;
    }
    let stream_type: [u8; 16] = object[..16].try_into().unwrap();
    if stream_type != AUDIO_MEDIA {
        return;
    }
    // WAVEFORMATEX at offset 54
    let Some(format) = object.get(54..) else { return };
    if format.len() < 16 {
        return;
    }
    let codec_id = u16::from_le_bytes(format[..2].try_into().unwrap());
    let channels = u16::from_le_bytes(format[2..4].try_into().unwrap());
    let sample_rate = u32::from_le_bytes(format[4..8].try_into().unwrap());
    let byte_rate = u32::from_le_bytes(format[8..12].try_into().unwrap());
    let bits = u16::from_le_bytes(format[14..16].try_into().unwrap());

    let (codec, lossless) = match codec_id {
        0x0001 => ("PCM", true),
        0x0055 => ("MPEG 1 Layer 3", false),
        0x0160 => ("WMA v1", false),
        0x0161 => ("WMA v2", false),
        0x0162 => ("WMA Pro", false),
        0x0163 => ("WMA Lossless", true),
        _ => ("ASF", false),
    };
    c.set_codec(codec);
    c.set_lossless(lossless);
    c.set_channels(u8::try_from(channels).unwrap_or(u8::MAX));
    c.set_sample_rate(sample_rate);
    c.set_bitrate(f64::from(byte_rate) * 8.0);
    if bits > 0 {
        c.set_bits_per_sample(u8::try_from(bits).unwrap_or(u8::MAX));
    }
}

/// Content Description: five length-prefixed UTF-16LE strings
fn decode_content_description(object: &[u8], c: &mut Collector) {
    let result = (|| -> Result<()> {
        let mut t = BufferTokenizer::new(object);
        let lengths = [
            t.read_u16_le()?,
            t.read_u16_le()?,
            t.read_u16_le()?,
            t.read_u16_le()?,
            t.read_u16_le()?,
        ];
        let ids = ["Title", "Author", "Copyright", "Description", "Rating"];
        for (id, len) in ids.into_iter().zip(lengths) {
            let raw = t.read_vec(usize::from(len))?;
            if let Some(text) = utf16le_string(&raw) {
                if !text.is_empty() && id != "Rating" {
                    c.add_tag(TagSystem::Asf, NativeTag::text(id, text));
                }
            }
        }
        Ok(())
    })();
    if result.is_err() {
        c.warn("ASF: malformed content description");
    }
}

/// Extended Content Description: count, then name/type/value descriptors
fn decode_extended_description(object: &[u8], c: &mut Collector) {
    let result = (|| -> Result<()> {
        let mut t = BufferTokenizer::new(object);
        let count = t.read_u16_le()?;
        for _ in 0..count {
            let name_len = t.read_u16_le()?;
            let name_raw = t.read_vec(usize::from(name_len))?;
            let value_type = t.read_u16_le()?;
            let value_len = t.read_u16_le()?;
            let value_raw = t.read_vec(usize::from(value_len))?;
            emit_descriptor(&name_raw, value_type, &value_raw, c);
        }
        Ok(())
    })();
    if result.is_err() {
        c.warn("ASF: malformed extended content description");
    }
}

/// Metadata / Metadata Library records share one layout
fn decode_metadata_records(object: &[u8], c: &mut Collector) {
    let result = (|| -> Result<()> {
        let mut t = BufferTokenizer::new(object);
        let count = t.read_u16_le()?;
        for _ in 0..count {
            // reserved (language index in the library object), stream number
            t.skip(4)?;
            let name_len = t.read_u16_le()?;
            let value_type = t.read_u16_le()?;
            let value_len = t.read_u32_le()?;
            let name_raw = t.read_vec(usize::from(name_len))?;
            let value_raw = t.read_vec(value_len as usize)?;
            emit_descriptor(&name_raw, value_type, &value_raw, c);
        }
        Ok(())
    })();
    if result.is_err() {
        c.warn("ASF: malformed metadata object");
    }
}

fn emit_descriptor(name_raw: &[u8], value_type: u16, value_raw: &[u8], c: &mut Collector) {
    let Some(name) = utf16le_string(name_raw) else {
        return;
    };
    if name.is_empty() {
        return;
    }

    if name == "WM/Picture" {
        if let Some(picture) = decode_wm_picture(value_raw, c.opts.skip_covers) {
            c.add_tag(TagSystem::Asf, NativeTag::new(name, TagValue::Picture(picture)));
        } else {
            c.warn("ASF: malformed WM/Picture descriptor");
        }
        return;
    }

    let value = match value_type {
        0 => match utf16le_string(value_raw) {
            Some(text) if !text.is_empty() => TagValue::Text(text),
            _ => return,
        },
        1 => TagValue::Binary(value_raw.to_vec()),
        2 => {
            let truthy = value_raw.iter().any(|&b| b != 0);
            TagValue::Bool(truthy)
        }
        3 if value_raw.len() >= 4 => {
            TagValue::Int(i64::from(u32::from_le_bytes(value_raw[..4].try_into().unwrap())))
        }
        4 if value_raw.len() >= 8 => {
            match i64::try_from(u64::from_le_bytes(value_raw[..8].try_into().unwrap())) {
                Ok(n) => TagValue::Int(n),
                Err(_) => return,
            }
        }
        5 if value_raw.len() >= 2 => {
            TagValue::Int(i64::from(u16::from_le_bytes(value_raw[..2].try_into().unwrap())))
        }
        _ => return,
    };
    c.add_tag(TagSystem::Asf, NativeTag::new(name, value));
}

/// WM/Picture: type byte, 32-bit size, NUL-terminated UTF-16LE MIME and
/// description, then the image bytes
fn decode_wm_picture(raw: &[u8], skip_covers: bool) -> Option<Picture> {
    if raw.len() < 5 {
        return None;
    }
    let mut pos = 5;
    let mime = read_utf16le_until_nul(raw, &mut pos)?;
    let description = read_utf16le_until_nul(raw, &mut pos)?;
    let image = raw.get(pos..)?;

    Some(Picture {
        mime: if mime.is_empty() {
            Picture::sniff_mime(image).to_owned()
        } else {
            mime
        },
        data: if skip_covers {
            Vec::new()
        } else {
            image.to_vec()
        },
        description: (!description.is_empty()).then_some(description),
        picture_type: crate::tags::vorbis::picture_type_label(u32::from(raw[0]))
            .map(str::to_owned),
    })
}

fn read_utf16le_until_nul(raw: &[u8], pos: &mut usize) -> Option<String> {
    let mut units = Vec::new();
    loop {
        let pair = raw.get(*pos..*pos + 2)?;
        *pos += 2;
        let unit = u16::from_le_bytes(pair.try_into().unwrap());
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    String::from_utf16(&units).ok()
}

/// Decode UTF-16LE text, dropping a trailing NUL
fn utf16le_string(raw: &[u8]) -> Option<String> {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes(pair.try_into().unwrap()))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units).ok()
}

#[cfg(test)]
pub(crate) mod build {
    use super::{
        CONTENT_DESCRIPTION, EXT_CONTENT_DESCRIPTION, FILE_PROPERTIES, HEADER_OBJECT,
    };

    fn utf16le(s: &str) -> Vec<u8> {
        let mut out: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        out.extend_from_slice(&[0, 0]);
        out
    }

    fn object(guid: [u8; 16], body: &[u8]) -> Vec<u8> {
        let mut out = guid.to_vec();
        out.extend_from_slice(&u64::try_from(body.len() + 24).unwrap().to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    /// File properties with the given play duration and preroll
    pub(crate) fn file_properties(seconds: f64, preroll_ms: u64) -> Vec<u8> {
        let mut body = vec![0u8; 16]; // file id
        body.extend_from_slice(&0u64.to_le_bytes()); // file size
        body.extend_from_slice(&0u64.to_le_bytes()); // creation
        body.extend_from_slice(&0u64.to_le_bytes()); // packet count
        let play = ((seconds + preroll_ms as f64 / 1e3) * 1e7) as u64;
        body.extend_from_slice(&play.to_le_bytes());
        body.extend_from_slice(&play.to_le_bytes()); // send duration
        body.extend_from_slice(&preroll_ms.to_le_bytes());
        body.extend_from_slice(&[0u8; 16]); // flags, packet sizes, bitrate
        object(FILE_PROPERTIES, &body)
    }

    /// Content description with title/author
    pub(crate) fn content_description(title: &str, author: &str) -> Vec<u8> {
        let title = utf16le(title);
        let author = utf16le(author);
        let mut body = Vec::new();
        for len in [title.len(), author.len(), 0, 0, 0] {
            body.extend_from_slice(&u16::try_from(len).unwrap().to_le_bytes());
        }
        body.extend_from_slice(&title);
        body.extend_from_slice(&author);
        object(CONTENT_DESCRIPTION, &body)
    }

    /// Extended content description from string descriptors
    pub(crate) fn extended_description(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&u16::try_from(entries.len()).unwrap().to_le_bytes());
        for (name, value) in entries {
            let name = utf16le(name);
            let value = utf16le(value);
            body.extend_from_slice(&u16::try_from(name.len()).unwrap().to_le_bytes());
            body.extend_from_slice(&name);
            body.extend_from_slice(&0u16.to_le_bytes()); // unicode
            body.extend_from_slice(&u16::try_from(value.len()).unwrap().to_le_bytes());
            body.extend_from_slice(&value);
        }
        object(EXT_CONTENT_DESCRIPTION, &body)
    }

    /// A complete ASF header object wrapping the given child objects
    pub(crate) fn file(objects: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = objects.concat();
        let mut out = HEADER_OBJECT.to_vec();
        out.extend_from_slice(&u64::try_from(body.len() + 30).unwrap().to_le_bytes());
        out.extend_from_slice(&u32::try_from(objects.len()).unwrap().to_le_bytes());
        out.extend_from_slice(&[0x01, 0x02]); // reserved
        out.extend_from_slice(&body);
        out
    }
}
