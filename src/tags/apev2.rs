//! APEv2 tag decoder
//!
//! An APE tag is a sequence of items bracketed by an optional 32-byte
//! header and a mandatory 32-byte footer, both starting with `APETAGEX`.
//! Item values declare their own type: UTF-8 text, binary, or an external
//! link. Binary `Cover Art (...)` items carry a filename, a NUL, then the
//! image bytes.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::types::{NativeTag, Picture, TagSystem, TagValue};

/// Sentinel at the start of both header and footer
pub(crate) const PREAMBLE: &[u8; 8] = b"APETAGEX";

/// Size of the header and footer records
pub(crate) const FOOTER_LEN: u64 = 32;

const FLAG_HAS_HEADER: u32 = 0x8000_0000;
const FLAG_IS_HEADER: u32 = 0x2000_0000;

/// The fixed header/footer record
#[derive(Debug, Clone, Copy)]
pub(crate) struct ApeFooter {
    /// Tag version, 1000 or 2000
    pub version: u32,
    /// Size of items plus footer, header excluded
    pub size: u32,
    /// Number of items
    pub item_count: u32,
    /// Tag flags
    pub flags: u32,
}

impl ApeFooter {
    /// Decode a 32-byte header/footer record
    pub(crate) fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() < 32 || &raw[..8] != PREAMBLE {
            return None;
        }
        Some(Self {
            version: u32::from_le_bytes(raw[8..12].try_into().unwrap()),
            size: u32::from_le_bytes(raw[12..16].try_into().unwrap()),
            item_count: u32::from_le_bytes(raw[16..20].try_into().unwrap()),
            flags: u32::from_le_bytes(raw[20..24].try_into().unwrap()),
        })
    }

    /// Whether the whole tag carries a leading header record
    pub(crate) fn has_header(&self) -> bool {
        self.flags & FLAG_HAS_HEADER != 0
    }

    /// Whether this record is the header rather than the footer
    pub(crate) fn is_header(&self) -> bool {
        self.flags & FLAG_IS_HEADER != 0
    }
}

/// Parse an APE tag at the current position
///
/// The cursor may point at the tag header or, for footer-only tags,
/// directly at the first item; the footer terminates the walk either way.
pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    let mut remaining: Option<u32> = None;

    let mut probe = [0u8; 32];
    if t.peek_into(&mut probe)? == 32 {
        if let Some(record) = ApeFooter::decode(&probe) {
            t.skip(FOOTER_LEN)?;
            if !record.is_header() {
                // an empty, footer-only tag
                return Ok(());
            }
            remaining = Some(record.item_count);
        }
    }

    loop {
        if remaining == Some(0) {
            // skip the trailing footer when the header said one follows
            let mut tail = [0u8; 8];
            if t.peek_into(&mut tail)? == 8 && &tail == PREAMBLE {
                t.skip(FOOTER_LEN)?;
            }
            break;
        }
        let mut tail = [0u8; 8];
        let n = t.peek_into(&mut tail)?;
        if n < 8 {
            break;
        }
        if &tail == PREAMBLE {
            t.skip(FOOTER_LEN)?;
            break;
        }

        decode_item(t, c)?;
        if let Some(count) = remaining.as_mut() {
            *count -= 1;
        }
    }
    Ok(())
}

fn decode_item(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    let size = t.read_u32_le()? as usize;
    let flags = t.read_u32_le()?;

    let mut key = Vec::new();
    loop {
        let b = t.read_u8()?;
        if b == 0 {
            break;
        }
        key.push(b);
        if key.len() > 255 {
            return Err(ProbeError::decode("APE item", "key exceeds 255 bytes"));
        }
    }
    let key = String::from_utf8(key)
        .map_err(|_| ProbeError::decode("APE item", "key is not valid UTF-8"))?;

    match (flags >> 1) & 0x03 {
        // UTF-8 text, possibly multi-valued
        0 | 2 => {
            let raw = t.read_vec(size)?;
            let Ok(text) = String::from_utf8(raw) else {
                c.warn(format!("APE item {key}: value is not valid UTF-8"));
                return Ok(());
            };
            for value in text.split('\0').filter(|v| !v.is_empty()) {
                c.add_tag(TagSystem::Apev2, NativeTag::text(key.clone(), value));
            }
        }
        // binary
        1 => {
            if key.to_ascii_uppercase().starts_with("COVER ART") {
                decode_cover(t, &key, size, c)?;
            } else {
                let data = if c.opts.skip_covers {
                    t.skip(size as u64)?;
                    Vec::new()
                } else {
                    t.read_vec(size)?
                };
                c.add_tag(TagSystem::Apev2, NativeTag::new(key, TagValue::Binary(data)));
            }
        }
        _ => {
            c.warn(format!("APE item {key}: reserved value type, skipped"));
            t.skip(size as u64)?;
        }
    }
    Ok(())
}

/// A binary cover item: embedded filename, NUL, image bytes
fn decode_cover(t: &mut dyn Tokenizer, key: &str, size: usize, c: &mut Collector) -> Result<()> {
    let raw = t.read_vec(size)?;
    let (description, image) = match raw.iter().position(|&b| b == 0) {
        Some(i) => (
            String::from_utf8_lossy(&raw[..i]).into_owned(),
            &raw[i + 1..],
        ),
        None => (String::new(), &raw[..]),
    };
    let picture = Picture {
        mime: Picture::sniff_mime(image).to_owned(),
        data: if c.opts.skip_covers {
            Vec::new()
        } else {
            image.to_vec()
        },
        description: (!description.is_empty()).then_some(description),
        picture_type: Some(
            if key.to_ascii_uppercase().contains("BACK") {
                "Cover (back)"
            } else {
                "Cover (front)"
            }
            .to_owned(),
        ),
    };
    c.add_tag(
        TagSystem::Apev2,
        NativeTag::new(key, TagValue::Picture(picture)),
    );
    Ok(())
}
