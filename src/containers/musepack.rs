//! Musepack SV7 / SV8 parser
//!
//! SV7 is a fixed little-endian header; SV8 is a packet stream whose `SH`
//! stream header carries varint-coded sample counts. Tags are in APEv2 or
//! ID3v1 trailers handled elsewhere.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};

/// SV7 frames hold 1152 samples per channel
const SV7_FRAME_SAMPLES: u64 = 1152;

/// Packets to inspect before giving up on the SV8 stream header
const MAX_SV8_PACKETS: u32 = 16;

static SAMPLE_RATES: [u32; 4] = [44_100, 48_000, 37_800, 32_000];

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("Musepack");
    c.set_lossless(false);

    let mut magic = [0u8; 4];
    t.peek_into(&mut magic)?;
    if &magic == b"MPCK" {
        parse_sv8(t, c)
    } else if &magic[..3] == b"MP+" {
        parse_sv7(t, c)
    } else {
        Err(ProbeError::decode("Musepack header", "unknown magic"))
    }
}

fn parse_sv7(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    let header = t.read_vec(12)?;
    let version = header[3] & 0x0F;
    if version != 7 {
        c.warn(format!("Musepack: stream version {version} treated as SV7"));
    }
    c.set_codec("Musepack SV7");

    let frames = u32::from_le_bytes(header[4..8].try_into().unwrap());
    let word = u32::from_le_bytes(header[8..12].try_into().unwrap());
    let rate_index = ((word >> 16) & 0x03) as usize;
    let sample_rate = SAMPLE_RATES[rate_index];

    c.set_sample_rate(sample_rate);
    c.set_channels(2);
    c.set_samples(u64::from(frames) * SV7_FRAME_SAMPLES);
    finish(t, c);
    Ok(())
}

fn parse_sv8(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_codec("Musepack SV8");
    t.skip(4)?; // "MPCK"

    for _ in 0..MAX_SV8_PACKETS {
        let mut key = [0u8; 2];
        t.read_into(&mut key)?;
        let (size, size_len) = read_varint(t)?;
        let body_len = size
            .checked_sub(2 + size_len)
            .ok_or_else(|| ProbeError::decode("Musepack packet", "size smaller than header"))?;

        if &key == b"SH" {
            let body = t.read_vec(usize::try_from(body_len).map_err(|_| {
                ProbeError::decode("Musepack packet", "stream header too large")
            })?)?;
            decode_stream_header(&body, c)?;
            finish(t, c);
            return Ok(());
        }
        if &key == b"AP" || &key == b"SE" {
            break;
        }
        t.skip(body_len)?;
    }
    c.warn("Musepack: no SV8 stream header found");
    Ok(())
}

/// `SH`: CRC, version, varint sample count and leading silence, then the
/// packed rate/channel bits
fn decode_stream_header(body: &[u8], c: &mut Collector) -> Result<()> {
    let mut pos = 5; // CRC (4) + version (1)
    let samples = read_varint_slice(body, &mut pos)?;
    let silence = read_varint_slice(body, &mut pos)?;

    let packed = *body
        .get(pos)
        .ok_or_else(|| ProbeError::decode("Musepack SH", "truncated"))?;
    let rate_index = usize::from(packed >> 5);
    let channels_byte = *body
        .get(pos + 1)
        .ok_or_else(|| ProbeError::decode("Musepack SH", "truncated"))?;
    let channels = (channels_byte >> 4) + 1;

    let sample_rate = *SAMPLE_RATES
        .get(rate_index)
        .ok_or_else(|| ProbeError::decode("Musepack SH", "reserved sample rate"))?;
    c.set_sample_rate(sample_rate);
    c.set_channels(channels);
    c.set_samples(samples.saturating_sub(silence));
    Ok(())
}

fn finish(t: &dyn Tokenizer, c: &mut Collector) {
    c.derive_duration();
    if let (Some(size), Some(duration)) =
        (c.stream_end.or_else(|| t.size_hint()), c.format.duration)
    {
        if duration > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let bitrate = size as f64 * 8.0 / duration;
            c.set_bitrate(bitrate);
        }
    }
}

/// SV8 varint: big-endian 7-bit groups, MSB set on continuation bytes
fn read_varint(t: &mut dyn Tokenizer) -> Result<(u64, u64)> {
    let mut value = 0u64;
    let mut read = 0u64;
    loop {
        let byte = t.read_u8()?;
        read += 1;
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, read));
        }
        if read > 9 {
            return Err(ProbeError::decode("Musepack varint", "too long"));
        }
    }
}

fn read_varint_slice(body: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value = 0u64;
    loop {
        let byte = *body
            .get(*pos)
            .ok_or_else(|| ProbeError::decode("Musepack varint", "truncated"))?;
        *pos += 1;
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}
