//! DSDIFF (`FRM8`) parser
//!
//! An IFF-style form with 64-bit big-endian chunk sizes. `PROP/SND `
//! subchunks give sample rate, channel layout and compression; the sound
//! data chunk size gives the sample count for uncompressed DSD.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::tags::id3v2;

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("DSDIFF");
    c.set_lossless(true);
    c.set_bits_per_sample(1);

    let header = t.read_vec(16)?;
    if &header[..4] != b"FRM8" || &header[12..16] != b"DSD " {
        return Err(ProbeError::decode("DSDIFF header", "missing FRM8/DSD form"));
    }

    loop {
        let mut probe = [0u8; 12];
        if t.peek_into(&mut probe)? < 12 {
            break;
        }
        let id = t.read_fourcc()?;
        let size = t.read_u64_be()?;

        match &id {
            b"PROP" => {
                let body = t.read_vec(usize::try_from(size).map_err(|_| {
                    ProbeError::decode("DSDIFF PROP", "unreasonable size")
                })?)?;
                decode_prop(&body, c);
            }
            b"DSD " => {
                // uncompressed 1-bit data: size bytes = samples x channels / 8
                if let Some(channels) = c.format.number_of_channels {
                    if channels > 0 {
                        c.set_samples(size * 8 / u64::from(channels));
                    }
                }
                match t.skip(size) {
                    Ok(()) => {}
                    Err(e) if e.is_truncation() => {
                        c.warn("DSDIFF: sound data truncated");
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            b"DST " => {
                // compressed: the frame info child gives the duration
                let header = t.read_vec(18.min(usize::try_from(size).unwrap_or(18)))?;
                decode_dst_info(&header, c);
                t.skip(size - header.len() as u64)?;
            }
            b"ID3 " => {
                let body = t.read_vec(usize::try_from(size).map_err(|_| {
                    ProbeError::decode("DSDIFF ID3 chunk", "unreasonable size")
                })?)?;
                let mut tag = BufferTokenizer::new(&body);
                if let Err(e) = id3v2::parse(&mut tag, c) {
                    c.warn(format!("DSDIFF: embedded ID3v2: {e}"));
                }
            }
            _ => t.skip(size)?,
        }

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

fn decode_prop(body: &[u8], c: &mut Collector) {
    if body.get(..4) != Some(b"SND ") {
        return;
    }
    let mut rest = &body[4..];
    while rest.len() >= 12 {
        let id: [u8; 4] = rest[..4].try_into().unwrap();
        let size = u64::from_be_bytes(rest[4..12].try_into().unwrap()) as usize;
        let Some(chunk) = rest.get(12..12 + size) else {
            c.warn("DSDIFF: PROP subchunk runs past its parent");
            return;
        };
        let padded = size + size % 2;
        rest = rest.get(12 + padded..).unwrap_or(&[]);

        match &id {
            b"FS  " => {
                if chunk.len() >= 4 {
                    c.set_sample_rate(u32::from_be_bytes(chunk[..4].try_into().unwrap()));
                }
            }
            b"CHNL" => {
                if chunk.len() >= 2 {
                    let channels = u16::from_be_bytes(chunk[..2].try_into().unwrap());
                    c.set_channels(u8::try_from(channels).unwrap_or(u8::MAX));
                }
            }
            b"CMPR" => {
                if chunk.len() >= 4 {
                    let compression: [u8; 4] = chunk[..4].try_into().unwrap();
                    match &compression {
                        b"DSD " => c.set_codec("DSD"),
                        b"DST " => {
                            c.set_codec("DST");
                        }
                        other => {
                            c.set_codec(&String::from_utf8_lossy(other));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// `DST ` chunk: an `FRTE` child with frame count and frame rate
fn decode_dst_info(header: &[u8], c: &mut Collector) {
    if header.get(..4) != Some(b"FRTE") || header.len() < 18 {
        return;
    }
    let frames = u32::from_be_bytes(header[12..16].try_into().unwrap());
    let rate = u16::from_be_bytes(header[16..18].try_into().unwrap());
    if rate > 0 {
        let seconds = f64::from(frames) / f64::from(rate);
        c.set_duration(seconds);
    }
}
