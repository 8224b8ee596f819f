//! ID3v1 / ID3v1.1 trailer decoder
//!
//! A fixed 128-byte record at the end of the file. Text fields are
//! space-padded latin1 unless they happen to be valid UTF-8.

use crate::collector::Collector;
use crate::mapping::genre_name;
use crate::types::{NativeTag, TagSystem, TagValue};

/// Length of the trailer
pub(crate) const TAG_LEN: usize = 128;

/// Sentinel at the start of the trailer
pub(crate) const MAGIC: &[u8; 3] = b"TAG";

/// Whether `block` starts with an ID3v1 sentinel
pub(crate) fn is_present(block: &[u8]) -> bool {
    block.len() >= TAG_LEN && &block[..3] == MAGIC
}

/// Decode the 128-byte trailer, emitting tags into the collector
pub(crate) fn decode(block: &[u8], c: &mut Collector) {
    if !is_present(block) {
        return;
    }

    emit_text(c, "title", &block[3..33]);
    emit_text(c, "artist", &block[33..63]);
    emit_text(c, "album", &block[63..93]);

    if let Some(year) = field_text(&block[93..97]).and_then(|s| s.parse::<i64>().ok()) {
        c.add_tag(TagSystem::Id3v1, NativeTag::new("year", TagValue::Int(year)));
    }

    // v1.1 steals the last two comment bytes for a track number
    let comment = &block[97..127];
    if comment[28] == 0 && comment[29] != 0 {
        emit_text(c, "comment", &comment[..28]);
        c.add_tag(
            TagSystem::Id3v1,
            NativeTag::new("track", TagValue::Int(i64::from(comment[29]))),
        );
    } else {
        emit_text(c, "comment", comment);
    }

    let genre = block[127];
    if let Some(name) = genre_name(genre) {
        c.add_tag(TagSystem::Id3v1, NativeTag::text("genre", name));
    }
}

fn emit_text(c: &mut Collector, id: &'static str, raw: &[u8]) {
    if let Some(text) = field_text(raw) {
        c.add_tag(TagSystem::Id3v1, NativeTag::text(id, text));
    }
}

/// Decode a fixed-width field: strip padding, try UTF-8, fall back to latin1
fn field_text(raw: &[u8]) -> Option<String> {
    let end = raw
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |i| i + 1);
    let raw = &raw[..end];
    if raw.is_empty() {
        return None;
    }
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.to_owned(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    };
    Some(text)
}
