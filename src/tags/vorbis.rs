//! Vorbis comment decoder
//!
//! Shared between FLAC (VORBIS_COMMENT block) and Ogg (comment packets).
//! Entries are 32-bit little-endian length-prefixed UTF-8 `KEY=value`
//! pairs; `METADATA_BLOCK_PICTURE` wraps a base64-encoded FLAC picture
//! structure.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::types::{NativeTag, Picture, TagSystem, TagValue};

/// Labels for the FLAC/ID3v2 picture type codes
static PICTURE_TYPES: [&str; 21] = [
    "Other",
    "32x32 pixels 'file icon' (PNG only)",
    "Other file icon",
    "Cover (front)",
    "Cover (back)",
    "Leaflet page",
    "Media (e.g. label side of CD)",
    "Lead artist/lead performer/soloist",
    "Artist/performer",
    "Conductor",
    "Band/Orchestra",
    "Composer",
    "Lyricist/text writer",
    "Recording Location",
    "During recording",
    "During performance",
    "Movie/video screen capture",
    "A bright coloured fish",
    "Illustration",
    "Band/artist logotype",
    "Publisher/Studio logotype",
];

/// Label for a picture type code, `None` for reserved values
pub(crate) fn picture_type_label(code: u32) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|i| PICTURE_TYPES.get(i))
        .copied()
}

/// Decode a Vorbis comment block, emitting tags into the collector
///
/// `data` starts at the vendor-length field, i.e. after any codec-specific
/// packet framing.
pub(crate) fn decode(data: &[u8], c: &mut Collector) -> Result<()> {
    let mut t = BufferTokenizer::new(data);

    let vendor_len = t.read_u32_le()? as usize;
    t.skip(vendor_len as u64)?;

    let count = t.read_u32_le()?;
    for _ in 0..count {
        let len = t.read_u32_le()? as usize;
        let raw = t.read_vec(len)?;
        let Ok(entry) = String::from_utf8(raw) else {
            c.warn("vorbis comment: entry is not valid UTF-8");
            continue;
        };
        let Some((key, value)) = entry.split_once('=') else {
            c.warn(format!("vorbis comment: no '=' in entry {entry:?}"));
            continue;
        };

        if key.eq_ignore_ascii_case("METADATA_BLOCK_PICTURE") {
            decode_picture_entry(value, c);
        } else {
            c.add_tag(TagSystem::Vorbis, NativeTag::text(key, value));
        }
    }
    Ok(())
}

fn decode_picture_entry(value: &str, c: &mut Collector) {
    let Ok(raw) = BASE64.decode(value.trim()) else {
        c.warn("METADATA_BLOCK_PICTURE: invalid base64");
        return;
    };
    match decode_flac_picture(&raw, c.opts.skip_covers) {
        Ok(picture) => c.add_tag(
            TagSystem::Vorbis,
            NativeTag::new("METADATA_BLOCK_PICTURE", TagValue::Picture(picture)),
        ),
        Err(e) => c.warn(format!("METADATA_BLOCK_PICTURE: {e}")),
    }
}

/// Decode the FLAC picture structure
///
/// Used for FLAC PICTURE blocks and for `METADATA_BLOCK_PICTURE` payloads.
/// With `skip_data` the payload bytes are skipped over and the returned
/// picture carries an empty body.
pub(crate) fn decode_flac_picture(data: &[u8], skip_data: bool) -> Result<Picture> {
    let mut t = BufferTokenizer::new(data);

    let picture_type = t.read_u32_be()?;
    let mime_len = t.read_u32_be()? as usize;
    let mime = t.read_utf8(mime_len)?;
    let desc_len = t.read_u32_be()? as usize;
    let description = t.read_utf8(desc_len)?;
    // width, height, depth, indexed colors
    t.skip(16)?;
    let data_len = t.read_u32_be()? as usize;
    let body = if skip_data {
        t.skip(data_len as u64)?;
        Vec::new()
    } else {
        t.read_vec(data_len)?
    };

    Ok(Picture {
        mime,
        data: body,
        description: (!description.is_empty()).then_some(description),
        picture_type: picture_type_label(picture_type).map(str::to_owned),
    })
}

/// Encode a picture into the FLAC picture structure layout
///
/// Test support for building fixtures; kept here so the byte layout lives
/// in one file.
#[cfg(test)]
pub(crate) fn encode_flac_picture(picture: &Picture, picture_type: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&picture_type.to_be_bytes());
    out.extend_from_slice(&u32::try_from(picture.mime.len()).unwrap().to_be_bytes());
    out.extend_from_slice(picture.mime.as_bytes());
    let desc = picture.description.as_deref().unwrap_or("");
    out.extend_from_slice(&u32::try_from(desc.len()).unwrap().to_be_bytes());
    out.extend_from_slice(desc.as_bytes());
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&u32::try_from(picture.data.len()).unwrap().to_be_bytes());
    out.extend_from_slice(&picture.data);
    out
}
