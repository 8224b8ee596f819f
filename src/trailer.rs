//! Appending-header scanner
//!
//! Probes the end of a sized source for ID3v1, Lyrics3 and APEv2 trailers
//! before the primary forward parse begins, so the forward parsers know
//! where the audio stream really ends. Skipped for stream-only sources.

use crate::error::Result;
use crate::io::RandomRead;
use crate::tags::apev2::ApeFooter;
use crate::tags::id3v1;

/// Byte layout of the trailing tag region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TrailerInfo {
    /// An ID3v1 tag occupies the last 128 bytes
    pub id3v1: bool,
    /// Bytes occupied by a Lyrics3 v1/v2 block, footer included
    pub lyrics3_len: u64,
    /// Absolute offset where the APEv2 tag begins (header if present,
    /// first item otherwise)
    pub ape_offset: Option<u64>,
    /// Total APEv2 tag length, header included
    pub ape_len: u64,
}

impl TrailerInfo {
    /// Total trailing bytes that are not audio
    pub(crate) fn total_len(&self) -> u64 {
        u64::from(self.id3v1) * id3v1::TAG_LEN as u64 + self.lyrics3_len + self.ape_len
    }
}

const LYRICS3V2_FOOTER: &[u8; 9] = b"LYRICS200";
const LYRICS3V1_FOOTER: &[u8; 9] = b"LYRICSEND";
const LYRICS3_BEGIN: &[u8; 11] = b"LYRICSBEGIN";
const LYRICS3V1_MAX: u64 = 5100;

/// Scan the tail of a sized source
pub(crate) fn scan<R: RandomRead + ?Sized>(reader: &R) -> Result<TrailerInfo> {
    let mut info = TrailerInfo::default();
    let size = reader.len();
    let mut tail = size;

    if tail >= id3v1::TAG_LEN as u64 {
        let mut block = [0u8; id3v1::TAG_LEN];
        let n = reader.read_at(tail - id3v1::TAG_LEN as u64, &mut block)?;
        if n == id3v1::TAG_LEN && id3v1::is_present(&block) {
            info.id3v1 = true;
            tail -= id3v1::TAG_LEN as u64;
        }
    }

    // Lyrics3 sits immediately before ID3v1
    if info.id3v1 {
        info.lyrics3_len = lyrics3_len(reader, tail)?;
        tail -= info.lyrics3_len;
    }

    if tail >= 32 {
        let mut record = [0u8; 32];
        let n = reader.read_at(tail - 32, &mut record)?;
        if n == 32 {
            if let Some(footer) = ApeFooter::decode(&record) {
                if !footer.is_header() && u64::from(footer.size) <= tail {
                    let items_start = tail - u64::from(footer.size);
                    let header_len = if footer.has_header() { 32 } else { 0 };
                    if items_start >= header_len {
                        info.ape_offset = Some(items_start - header_len);
                        info.ape_len = u64::from(footer.size) + header_len;
                    }
                }
            }
        }
    }

    Ok(info)
}

/// Length of a Lyrics3 block ending at `end`, or 0
fn lyrics3_len<R: RandomRead + ?Sized>(reader: &R, end: u64) -> Result<u64> {
    if end < 15 {
        return Ok(0);
    }
    let mut footer = [0u8; 15];
    if reader.read_at(end - 15, &mut footer)? < 15 {
        return Ok(0);
    }

    if &footer[6..] == LYRICS3V2_FOOTER {
        // six ASCII digits give the block size, footer excluded
        let Ok(digits) = std::str::from_utf8(&footer[..6]) else {
            return Ok(0);
        };
        let Ok(declared) = digits.parse::<u64>() else {
            return Ok(0);
        };
        let total = declared + 15;
        if total > end {
            return Ok(0);
        }
        // a malformed size degrades to "no Lyrics3"
        let mut begin = [0u8; 11];
        if reader.read_at(end - total, &mut begin)? == 11 && &begin == LYRICS3_BEGIN {
            return Ok(total);
        }
        return Ok(0);
    }

    if &footer[6..] == LYRICS3V1_FOOTER {
        // v1 has no size field; scan back for the begin marker
        let window = LYRICS3V1_MAX.min(end);
        let start = end - window;
        let mut buf = vec![0u8; usize::try_from(window).unwrap_or(usize::MAX)];
        let n = reader.read_at(start, &mut buf)?;
        buf.truncate(n);
        if let Some(pos) = buf
            .windows(LYRICS3_BEGIN.len())
            .rposition(|w| w == LYRICS3_BEGIN)
        {
            return Ok(window - pos as u64);
        }
    }

    Ok(0)
}
