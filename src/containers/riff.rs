//! RIFF / WAVE chunk parser
//!
//! Four-byte chunk IDs with 32-bit little-endian sizes, padded to even
//! boundaries. `fmt ` supplies the format facts, `LIST/INFO` the RIFF
//! tags, and an `id3 ` chunk an embedded ID3v2 tag.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::tags::{id3v2, riff_info};

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("WAVE");

    // "RIFF", outer size, "WAVE"
    t.skip(12)?;

    let mut block_align = 0u16;
    loop {
        let mut probe = [0u8; 8];
        let n = t.peek_into(&mut probe)?;
        if n < 8 {
            break;
        }
        let id = t.read_fourcc()?;
        let size = t.read_u32_le()? as usize;

        match &id {
            b"fmt " => {
                let body = t.read_vec(size)?;
                block_align = decode_fmt(&body, c);
            }
            b"data" => {
                if block_align > 0 {
                    let frames = size as u64 / u64::from(block_align);
                    c.set_samples(frames);
                }
                match t.skip(size as u64) {
                    Ok(()) => {}
                    Err(e) if e.is_truncation() => {
                        c.warn("WAVE: data chunk truncated");
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            b"LIST" => {
                let body = t.read_vec(size)?;
                if body.get(..4) == Some(b"INFO") {
                    riff_info::decode(&body[4..], c)?;
                }
            }
            b"id3 " | b"ID3 " => {
                let body = t.read_vec(size)?;
                let mut tag = BufferTokenizer::new(&body);
                if let Err(e) = id3v2::parse(&mut tag, c) {
                    c.warn(format!("WAVE: embedded ID3v2: {e}"));
                }
            }
            _ => t.skip(size as u64)?,
        }

        // chunks are word-aligned
        if size % 2 == 1 {
            let mut pad = [0u8; 1];
            if t.peek_into(&mut pad)? == 1 {
                t.skip(1)?;
            }
        }
    }

    c.derive_duration();
    Ok(())
}

/// WAVEFORMATEX fields; returns the block alignment for frame counting
fn decode_fmt(body: &[u8], c: &mut Collector) -> u16 {
    if body.len() < 16 {
        c.warn("WAVE: fmt chunk too short");
        return 0;
    }
    let format_tag = u16::from_le_bytes(body[..2].try_into().unwrap());
    let channels = u16::from_le_bytes(body[2..4].try_into().unwrap());
    let sample_rate = u32::from_le_bytes(body[4..8].try_into().unwrap());
    let byte_rate = u32::from_le_bytes(body[8..12].try_into().unwrap());
    let block_align = u16::from_le_bytes(body[12..14].try_into().unwrap());
    let bits = u16::from_le_bytes(body[14..16].try_into().unwrap());

    let (codec, lossless) = match format_tag {
        0x0001 => ("PCM", true),
        0x0003 => ("IEEE float PCM", true),
        0x0006 => ("A-law", false),
        0x0007 => ("µ-law", false),
        0x0055 => ("MPEG 1 Layer 3", false),
        0xFFFE => ("Extensible PCM", true),
        _ => ("WAVE", false),
    };
    c.set_codec(codec);
    c.set_lossless(lossless);
    c.set_channels(u8::try_from(channels).unwrap_or(u8::MAX));
    c.set_sample_rate(sample_rate);
    c.set_bitrate(f64::from(byte_rate) * 8.0);
    if bits > 0 {
        c.set_bits_per_sample(u8::try_from(bits).unwrap_or(u8::MAX));
    }
    block_align
}
