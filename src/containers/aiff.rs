//! AIFF / AIFF-C chunk parser
//!
//! Like RIFF but big-endian. `COMM` carries channel count, frame count,
//! sample size and an 80-bit extended-float sample rate; AIFF-C appends a
//! compression type. Text chunks and an embedded `ID3 ` chunk carry tags.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{BufferTokenizer, Tokenizer, TokenizerExt};
use crate::tags::id3v2;
use crate::types::{NativeTag, TagSystem};

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("AIFF");

    // "FORM", outer size
    t.skip(8)?;
    let form = t.read_fourcc()?;
    let compressed_form = &form == b"AIFC";

    loop {
        let mut probe = [0u8; 8];
        if t.peek_into(&mut probe)? < 8 {
            break;
        }
        let id = t.read_fourcc()?;
        let size = t.read_u32_be()? as usize;

        match &id {
            b"COMM" => {
                let body = t.read_vec(size)?;
                decode_comm(&body, compressed_form, c);
            }
            b"NAME" | b"AUTH" | b"ANNO" | b"(c) " => {
                let body = t.read_vec(size)?;
                if let Ok(text) = std::str::from_utf8(&body) {
                    let text = text.trim_end_matches('\0').trim();
                    if !text.is_empty() {
                        let id = String::from_utf8_lossy(&id).into_owned();
                        c.add_tag(TagSystem::Aiff, NativeTag::text(id, text));
                    }
                }
            }
            b"ID3 " | b"id3 " => {
                let body = t.read_vec(size)?;
                let mut tag = BufferTokenizer::new(&body);
                if let Err(e) = id3v2::parse(&mut tag, c) {
                    c.warn(format!("AIFF: embedded ID3v2: {e}"));
                }
            }
            b"SSND" => match t.skip(size as u64) {
                Ok(()) => {}
                Err(e) if e.is_truncation() => {
                    c.warn("AIFF: SSND chunk truncated");
                    break;
                }
                Err(e) => return Err(e),
            },
            _ => t.skip(size as u64)?,
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

fn decode_comm(body: &[u8], compressed_form: bool, c: &mut Collector) {
    if body.len() < 18 {
        c.warn("AIFF: COMM chunk too short");
        return;
    }
    let channels = u16::from_be_bytes(body[..2].try_into().unwrap());
    let frames = u32::from_be_bytes(body[2..6].try_into().unwrap());
    let bits = u16::from_be_bytes(body[6..8].try_into().unwrap());
    let rate_raw: [u8; 10] = body[8..18].try_into().unwrap();
    let sample_rate = extended_to_f64(&rate_raw);

    let (codec, lossless) = if compressed_form && body.len() >= 22 {
        let compression: [u8; 4] = body[18..22].try_into().unwrap();
        match &compression {
            b"NONE" => ("PCM", true),
            b"sowt" => ("PCM little-endian", true),
            b"fl32" | b"FL32" => ("PCM 32-bit float", true),
            b"fl64" | b"FL64" => ("PCM 64-bit float", true),
            b"alaw" | b"ALAW" => ("A-law", false),
            b"ulaw" | b"ULAW" => ("µ-law", false),
            b"ima4" => ("IMA 4:1 ADPCM", false),
            b"GSM " => ("GSM", false),
            other => {
                c.warn(format!(
                    "AIFF: unknown compression type {:?}",
                    String::from_utf8_lossy(other)
                ));
                ("AIFF-C", false)
            }
        }
    } else {
        ("PCM", true)
    };

    c.set_codec(codec);
    c.set_lossless(lossless);
    c.set_channels(u8::try_from(channels).unwrap_or(u8::MAX));
    if bits > 0 {
        c.set_bits_per_sample(u8::try_from(bits).unwrap_or(u8::MAX));
    }
    if sample_rate > 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rate = sample_rate.round() as u32;
        c.set_sample_rate(rate);
    }
    if frames > 0 {
        c.set_samples(u64::from(frames));
    }
}

/// Decode an 80-bit IEEE 754 extended float
fn extended_to_f64(raw: &[u8; 10]) -> f64 {
    let sign_exp = u16::from_be_bytes([raw[0], raw[1]]);
    let mantissa = u64::from_be_bytes(raw[2..10].try_into().unwrap());
    if sign_exp & 0x7FFF == 0 && mantissa == 0 {
        return 0.0;
    }
    let sign = if sign_exp & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = i32::from(sign_exp & 0x7FFF);
    #[allow(clippy::cast_precision_loss)]
    let mantissa = mantissa as f64;
    sign * mantissa * 2f64.powi(exponent - 16383 - 63)
}

#[cfg(test)]
pub(crate) mod build {
    //! AIFF fixture builders

    /// Encode a sample rate as an 80-bit extended float
    pub(crate) fn extended(value: f64) -> [u8; 10] {
        assert!(value > 0.0);
        let exponent = value.log2().floor() as i32;
        let mantissa = (value / 2f64.powi(exponent - 63)) as u64;
        let sign_exp = u16::try_from(exponent + 16383).unwrap();
        let mut out = [0u8; 10];
        out[..2].copy_from_slice(&sign_exp.to_be_bytes());
        out[2..].copy_from_slice(&mantissa.to_be_bytes());
        out
    }

    pub(crate) fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&u32::try_from(body.len()).unwrap().to_be_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    pub(crate) fn comm(channels: u16, frames: u32, bits: u16, rate: f64) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&channels.to_be_bytes());
        body.extend_from_slice(&frames.to_be_bytes());
        body.extend_from_slice(&bits.to_be_bytes());
        body.extend_from_slice(&extended(rate));
        chunk(b"COMM", &body)
    }

    pub(crate) fn file(form: &[u8; 4], chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = b"FORM".to_vec();
        out.extend_from_slice(&u32::try_from(body.len() + 4).unwrap().to_be_bytes());
        out.extend_from_slice(form);
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProbeOptions;

    fn probe(bytes: &[u8]) -> Collector {
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(bytes), &mut c).unwrap();
        c
    }

    #[test]
    fn test_extended_float_round_trip() {
        for rate in [8000.0, 22_050.0, 44_100.0, 48_000.0, 96_000.0] {
            let encoded = build::extended(rate);
            assert!((extended_to_f64(&encoded) - rate).abs() < 1e-6, "{rate}");
        }
        assert_eq!(extended_to_f64(&[0u8; 10]), 0.0);
    }

    #[test]
    fn test_comm_facts() {
        let bytes = build::file(b"AIFF", &[build::comm(2, 88_200, 16, 44_100.0)]);
        let c = probe(&bytes);

        assert_eq!(c.format.container.as_deref(), Some("AIFF"));
        assert_eq!(c.format.codec.as_deref(), Some("PCM"));
        assert_eq!(c.format.lossless, Some(true));
        assert_eq!(c.format.sample_rate, Some(44_100));
        assert_eq!(c.format.number_of_channels, Some(2));
        assert!((c.format.duration.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_aifc_compression_type() {
        let mut comm_body = Vec::new();
        comm_body.extend_from_slice(&2u16.to_be_bytes());
        comm_body.extend_from_slice(&1000u32.to_be_bytes());
        comm_body.extend_from_slice(&16u16.to_be_bytes());
        comm_body.extend_from_slice(&build::extended(44_100.0));
        comm_body.extend_from_slice(b"sowt");
        comm_body.push(0); // empty pascal string
        let bytes = build::file(b"AIFC", &[build::chunk(b"COMM", &comm_body)]);
        let c = probe(&bytes);
        assert_eq!(c.format.codec.as_deref(), Some("PCM little-endian"));
    }

    #[test]
    fn test_text_chunks() {
        let bytes = build::file(
            b"AIFF",
            &[
                build::comm(1, 100, 8, 8000.0),
                build::chunk(b"NAME", b"My Title"),
                build::chunk(b"AUTH", b"An Author"),
            ],
        );
        let c = probe(&bytes);
        assert_eq!(c.common.title.as_deref(), Some("My Title"));
        assert_eq!(c.common.artist.as_deref(), Some("An Author"));
        assert_eq!(c.format.tag_types, vec![TagSystem::Aiff]);
    }
}
