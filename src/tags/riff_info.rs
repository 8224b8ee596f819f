//! RIFF `LIST/INFO` decoder
//!
//! A sequence of four-character chunk IDs with 32-bit little-endian sizes,
//! padded to even boundaries. Values are NUL-terminated text.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::types::{NativeTag, TagSystem};

/// Decode the contents of a `LIST` chunk of type `INFO`
///
/// `data` starts immediately after the `INFO` list type.
pub(crate) fn decode(data: &[u8], c: &mut Collector) -> Result<()> {
    let mut t = BufferTokenizer::new(data);

    while t.remaining() >= 8 {
        let id = t.read_fourcc()?;
        let size = t.read_u32_le()? as usize;
        if size > t.remaining() {
            c.warn("INFO list: truncated entry");
            break;
        }
        let raw = t.read_vec(size)?;
        if size % 2 == 1 && t.remaining() > 0 {
            t.skip(1)?;
        }

        let Ok(id) = std::str::from_utf8(&id) else {
            continue;
        };
        if let Some(text) = entry_text(&raw) {
            c.add_tag(TagSystem::Riff, NativeTag::text(id, text));
        }
    }
    Ok(())
}

fn entry_text(raw: &[u8]) -> Option<String> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let raw = &raw[..end];
    if raw.is_empty() {
        return None;
    }
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.to_owned(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    };
    Some(text.trim().to_owned())
}
