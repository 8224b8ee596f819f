//! ID3v2.2 / v2.3 / v2.4 tag decoder
//!
//! The tag is an envelope at the head of the stream (or embedded in an
//! AIFF/RIFF/DSF chunk). Frame IDs are three bytes in v2.2 and four in
//! v2.3/v2.4; v2.4 sizes are syncsafe and text frames may carry multiple
//! NUL-separated values.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::mapping::popm_to_unit;
use crate::tags::vorbis::picture_type_label;
use crate::types::{NativeTag, Picture, Rating, TagSystem, TagValue};

/// Magic at the start of the tag header
pub(crate) const MAGIC: &[u8; 3] = b"ID3";

const HEADER_LEN: u64 = 10;

const FLAG_UNSYNC: u8 = 0x80;
const FLAG_EXTENDED: u8 = 0x40;
const FLAG_FOOTER: u8 = 0x10;

/// Decode a 28-bit syncsafe integer
pub(crate) fn syncsafe_u32(bytes: [u8; 4]) -> u32 {
    (u32::from(bytes[0] & 0x7F) << 21)
        | (u32::from(bytes[1] & 0x7F) << 14)
        | (u32::from(bytes[2] & 0x7F) << 7)
        | u32::from(bytes[3] & 0x7F)
}

/// Parse an ID3v2 tag at the current position
///
/// Consumes exactly the tag (header, body, optional footer) so the caller
/// can re-sniff the remaining stream. Returns the number of bytes
/// consumed.
pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<u64> {
    let mut header = [0u8; 10];
    t.read_into(&mut header)?;
    if &header[..3] != MAGIC {
        return Err(ProbeError::decode("ID3v2 header", "missing ID3 magic"));
    }

    let major = header[3];
    let flags = header[5];
    let size = u64::from(syncsafe_u32([header[6], header[7], header[8], header[9]]));

    let system = match major {
        2 => TagSystem::Id3v22,
        3 => TagSystem::Id3v23,
        4 => TagSystem::Id3v24,
        other => {
            c.warn(format!("ID3v2.{other}: unknown major version, tag skipped"));
            t.skip(size)?;
            return Ok(HEADER_LEN + size);
        }
    };

    let mut body = t.read_vec(size as usize)?;

    // v2.2 uses the extended-header bit for compression; such tags are
    // unreadable without the scheme and must be skipped whole
    if major == 2 && flags & FLAG_EXTENDED != 0 {
        c.warn("ID3v2.2: compressed tag skipped");
        return Ok(HEADER_LEN + size);
    }

    // Tag-level unsynchronisation is reversed before frame parsing;
    // v2.4 moved the flag to individual frames
    if flags & FLAG_UNSYNC != 0 && major < 4 {
        body = reverse_unsync(&body);
    }

    let mut frames = &body[..];
    if flags & FLAG_EXTENDED != 0 {
        frames = skip_extended_header(frames, major)?;
    }

    parse_frames(frames, major, system, c);

    let footer = if flags & FLAG_FOOTER != 0 && major == 4 {
        t.skip(HEADER_LEN)?;
        HEADER_LEN
    } else {
        0
    };
    Ok(HEADER_LEN + size + footer)
}

fn skip_extended_header(body: &[u8], major: u8) -> Result<&[u8]> {
    if body.len() < 4 {
        return Err(ProbeError::decode("ID3v2 extended header", "truncated"));
    }
    let size_bytes = [body[0], body[1], body[2], body[3]];
    let skip = if major == 4 {
        // v2.4: syncsafe, includes its own four size bytes
        syncsafe_u32(size_bytes) as usize
    } else {
        // v2.3: plain big-endian, excludes the size field
        u32::from_be_bytes(size_bytes) as usize + 4
    };
    body.get(skip..)
        .ok_or_else(|| ProbeError::decode("ID3v2 extended header", "size exceeds tag"))
}

/// Replace every unsynchronised `FF 00` pair with `FF`
fn reverse_unsync(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        out.push(data[i]);
        if data[i] == 0xFF && data.get(i + 1) == Some(&0x00) {
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

struct FrameHeader {
    id: String,
    size: usize,
    compressed: bool,
    encrypted: bool,
    unsync: bool,
    data_length_indicator: bool,
}

fn parse_frames(mut data: &[u8], major: u8, system: TagSystem, c: &mut Collector) {
    let header_len = if major == 2 { 6 } else { 10 };

    while data.len() >= header_len {
        // zero byte marks the start of padding
        if data[0] == 0 {
            break;
        }
        let Some(header) = read_frame_header(data, major) else {
            c.warn(format!("{system}: malformed frame header, rest of tag skipped"));
            break;
        };
        let Some(body) = data.get(header_len..header_len + header.size) else {
            c.warn(format!(
                "{system}: frame {} runs past the tag, rest skipped",
                header.id
            ));
            break;
        };
        data = &data[header_len + header.size..];

        if header.compressed || header.encrypted {
            c.warn(format!(
                "{system}: frame {} is {}, skipped",
                header.id,
                if header.compressed { "compressed" } else { "encrypted" }
            ));
            continue;
        }

        let mut body = std::borrow::Cow::Borrowed(body);
        if header.data_length_indicator {
            if body.len() < 4 {
                continue;
            }
            body = std::borrow::Cow::Owned(body[4..].to_vec());
        }
        if header.unsync {
            body = std::borrow::Cow::Owned(reverse_unsync(&body));
        }

        if let Err(e) = decode_frame(&header.id, &body, major, system, c) {
            c.warn(format!("{system}: frame {}: {e}", header.id));
        }
    }
}

fn read_frame_header(data: &[u8], major: u8) -> Option<FrameHeader> {
    if major == 2 {
        let id = frame_id(&data[..3])?;
        let size = (usize::from(data[3]) << 16) | (usize::from(data[4]) << 8) | usize::from(data[5]);
        return Some(FrameHeader {
            id,
            size,
            compressed: false,
            encrypted: false,
            unsync: false,
            data_length_indicator: false,
        });
    }

    let id = frame_id(&data[..4])?;
    let size_bytes = [data[4], data[5], data[6], data[7]];
    let size = if major == 4 {
        syncsafe_u32(size_bytes) as usize
    } else {
        u32::from_be_bytes(size_bytes) as usize
    };
    let format_flags = data[9];
    let (compressed, encrypted, unsync, data_length_indicator) = if major == 4 {
        (
            format_flags & 0x08 != 0,
            format_flags & 0x04 != 0,
            format_flags & 0x02 != 0,
            format_flags & 0x01 != 0,
        )
    } else {
        // v2.3 compression implies a four-byte decompressed-size prefix
        (
            format_flags & 0x80 != 0,
            format_flags & 0x40 != 0,
            false,
            false,
        )
    };
    Some(FrameHeader {
        id,
        size,
        compressed,
        encrypted,
        unsync,
        data_length_indicator,
    })
}

fn frame_id(raw: &[u8]) -> Option<String> {
    raw.iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        .then(|| String::from_utf8_lossy(raw).into_owned())
}

fn decode_frame(
    id: &str,
    body: &[u8],
    major: u8,
    system: TagSystem,
    c: &mut Collector,
) -> Result<()> {
    match id {
        "TXXX" | "TXX" => decode_user_text(id, body, system, c),
        "WXXX" | "WXX" => decode_user_url(id, body, system, c),
        "COMM" | "COM" | "USLT" | "ULT" => decode_lang_text(id, body, system, c),
        "APIC" => decode_apic(body, system, c),
        "PIC" => decode_pic_v22(body, system, c),
        "POPM" | "POP" => decode_popm(id, body, system, c),
        "UFID" | "PRIV" => decode_owned_binary(id, body, system, c),
        "MCDI" | "MCI" => {
            c.add_tag(system, NativeTag::new(id, TagValue::Binary(body.to_vec())));
            Ok(())
        }
        _ if id.starts_with('T') => decode_text_frame(id, body, major, system, c),
        _ if id.starts_with('W') => {
            let url = latin1(trim_nul(body));
            c.add_tag(system, NativeTag::text(id, url));
            Ok(())
        }
        _ => {
            c.add_tag(system, NativeTag::new(id, TagValue::Binary(body.to_vec())));
            Ok(())
        }
    }
}

fn decode_text_frame(
    id: &str,
    body: &[u8],
    major: u8,
    system: TagSystem,
    c: &mut Collector,
) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    let text = decode_text(encoding, data)?;

    if major == 4 {
        // v2.4 text frames hold NUL-separated value lists
        for value in text.split('\0').filter(|v| !v.is_empty()) {
            c.add_tag(system, NativeTag::text(id, value));
        }
    } else {
        let value = text.trim_end_matches('\0');
        if !value.is_empty() {
            c.add_tag(system, NativeTag::text(id, value));
        }
    }
    Ok(())
}

fn decode_user_text(id: &str, body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    let (desc_raw, value_raw) = split_nul(encoding, data);
    let description = decode_text(encoding, desc_raw)?;
    let value = decode_text(encoding, value_raw)?;
    let value = value.trim_end_matches('\0');
    c.add_tag(
        system,
        NativeTag::text(format!("{id}:{description}"), value),
    );
    Ok(())
}

fn decode_user_url(id: &str, body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    let (desc_raw, url_raw) = split_nul(encoding, data);
    let description = decode_text(encoding, desc_raw)?;
    let url = latin1(trim_nul(url_raw));
    c.add_tag(system, NativeTag::text(format!("{id}:{description}"), url));
    Ok(())
}

fn decode_lang_text(id: &str, body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    if data.len() < 3 {
        return Err(ProbeError::decode("language frame", "too short"));
    }
    // three-byte language code, then a NUL-terminated content descriptor
    let (_, text_raw) = split_nul(encoding, &data[3..]);
    let text = decode_text(encoding, text_raw)?;
    let text = text.trim_end_matches('\0');
    if !text.is_empty() {
        c.add_tag(system, NativeTag::text(id, text));
    }
    Ok(())
}

fn decode_apic(body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    let (mime_raw, rest) = split_nul(0, data);
    let mime = latin1(mime_raw);
    let Some((&type_byte, rest)) = rest.split_first() else {
        return Err(ProbeError::decode("APIC frame", "missing picture type"));
    };
    let (desc_raw, image) = split_nul(encoding, rest);
    let description = decode_text(encoding, desc_raw)?;

    emit_picture(system, "APIC", mime, type_byte, description, image, c);
    Ok(())
}

fn decode_pic_v22(body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (encoding, data) = split_encoding(body)?;
    if data.len() < 4 {
        return Err(ProbeError::decode("PIC frame", "too short"));
    }
    let format = latin1(&data[..3]);
    let mime = match format.as_str() {
        "JPG" => "image/jpeg".to_owned(),
        "PNG" => "image/png".to_owned(),
        other => format!("image/{}", other.to_ascii_lowercase()),
    };
    let type_byte = data[3];
    let (desc_raw, image) = split_nul(encoding, &data[4..]);
    let description = decode_text(encoding, desc_raw)?;

    emit_picture(system, "PIC", mime, type_byte, description, image, c);
    Ok(())
}

fn emit_picture(
    system: TagSystem,
    id: &str,
    mime: String,
    type_byte: u8,
    description: String,
    image: &[u8],
    c: &mut Collector,
) {
    let mime = if mime.is_empty() {
        Picture::sniff_mime(image).to_owned()
    } else {
        mime
    };
    let data = if c.opts.skip_covers {
        Vec::new()
    } else {
        image.to_vec()
    };
    let picture = Picture {
        mime,
        data,
        description: (!description.is_empty()).then_some(description),
        picture_type: picture_type_label(u32::from(type_byte)).map(str::to_owned),
    };
    c.add_tag(system, NativeTag::new(id, TagValue::Picture(picture)));
}

fn decode_popm(id: &str, body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (email_raw, rest) = split_nul(0, body);
    let email = latin1(email_raw);
    let Some(&byte) = rest.first() else {
        return Err(ProbeError::decode("POPM frame", "missing rating byte"));
    };
    c.add_tag(
        system,
        NativeTag::new(
            id,
            TagValue::Rating(Rating {
                source: (!email.is_empty()).then_some(email),
                rating: popm_to_unit(byte),
            }),
        ),
    );
    Ok(())
}

fn decode_owned_binary(id: &str, body: &[u8], system: TagSystem, c: &mut Collector) -> Result<()> {
    let (owner_raw, data) = split_nul(0, body);
    let owner = latin1(owner_raw);
    c.add_tag(
        system,
        NativeTag::new(format!("{id}:{owner}"), TagValue::Binary(data.to_vec())),
    );
    Ok(())
}

fn split_encoding(body: &[u8]) -> Result<(u8, &[u8])> {
    body.split_first()
        .map(|(&e, rest)| (e, rest))
        .ok_or_else(|| ProbeError::decode("text frame", "empty body"))
}

/// Split at the encoding-appropriate NUL terminator
///
/// UTF-16 encodings terminate on an aligned 00 00 pair; single-byte
/// encodings on one zero byte. Without a terminator the whole input is the
/// head and the tail is empty.
fn split_nul(encoding: u8, data: &[u8]) -> (&[u8], &[u8]) {
    if encoding == 1 || encoding == 2 {
        let mut i = 0;
        while i + 1 < data.len() {
            if data[i] == 0 && data[i + 1] == 0 {
                return (&data[..i], &data[i + 2..]);
            }
            i += 2;
        }
        (data, &[])
    } else {
        match data.iter().position(|&b| b == 0) {
            Some(i) => (&data[..i], &data[i + 1..]),
            None => (data, &[]),
        }
    }
}

fn trim_nul(data: &[u8]) -> &[u8] {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &data[..end]
}

fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Decode frame text in the declared encoding
///
/// | byte | encoding |
/// |-----:|----------|
/// | 0 | latin1 |
/// | 1 | UTF-16 with BOM |
/// | 2 | UTF-16BE |
/// | 3 | UTF-8 |
fn decode_text(encoding: u8, data: &[u8]) -> Result<String> {
    match encoding {
        0 => Ok(latin1(data)),
        1 => {
            let (be, data) = match data {
                [0xFE, 0xFF, rest @ ..] => (true, rest),
                [0xFF, 0xFE, rest @ ..] => (false, rest),
                _ => (false, data),
            };
            decode_utf16(data, be)
        }
        2 => decode_utf16(data, true),
        3 => String::from_utf8(data.to_vec())
            .map_err(|_| ProbeError::decode("text frame", "invalid UTF-8")),
        other => Err(ProbeError::decode(
            "text frame",
            format!("unknown encoding byte {other}"),
        )),
    }
}

fn decode_utf16(data: &[u8], big_endian: bool) -> Result<String> {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            let bytes = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(bytes)
            } else {
                u16::from_le_bytes(bytes)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|_| ProbeError::decode("text frame", "invalid UTF-16"))
}
