//! ADTS (raw AAC) parser
//!
//! Fixed 7/9-byte headers per frame. The first header gives profile,
//! sample rate and channel configuration; a bounded frame walk estimates
//! the average bitrate, extended to the whole stream when the `duration`
//! option asks for an exact count.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{Tokenizer, TokenizerExt};

/// Samples per AAC frame
const SAMPLES_PER_FRAME: u64 = 1024;

/// Frames sampled for the bitrate estimate without the `duration` option
const ESTIMATE_FRAMES: u32 = 128;

/// Bytes to scan for the first sync word
const MAX_SYNC_SCAN: u64 = 64 * 1024;

static SAMPLE_RATES: [u32; 13] = [
    96_000, 88_200, 64_000, 48_000, 44_100, 32_000, 24_000, 22_050, 16_000, 12_000, 11_025, 8000,
    7350,
];

static PROFILES: [&str; 4] = ["AAC Main", "AAC LC", "AAC SSR", "AAC LTP"];

#[derive(Debug, Clone, Copy)]
struct AdtsHeader {
    profile: u8,
    sample_rate: u32,
    channels: u8,
    frame_length: usize,
}

impl AdtsHeader {
    fn parse(b: &[u8; 7]) -> Option<Self> {
        if b[0] != 0xFF || b[1] & 0xF6 != 0xF0 {
            return None;
        }
        let profile = b[2] >> 6;
        let rate_index = usize::from((b[2] >> 2) & 0x0F);
        let sample_rate = *SAMPLE_RATES.get(rate_index)?;
        let channels = ((b[2] & 0x01) << 2) | (b[3] >> 6);
        let frame_length = (usize::from(b[3] & 0x03) << 11)
            | (usize::from(b[4]) << 3)
            | (usize::from(b[5]) >> 5);
        if frame_length < 7 {
            return None;
        }
        Some(Self {
            profile,
            sample_rate,
            channels,
            frame_length,
        })
    }
}

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("ADTS");
    c.set_codec("AAC");
    c.set_lossless(false);

    let Some(first) = find_first_frame(t)? else {
        c.warn("ADTS: no valid frame within the scan window");
        return Ok(());
    };

    c.set_codec_profile(PROFILES[usize::from(first.profile)].to_owned());
    c.set_sample_rate(first.sample_rate);
    if first.channels > 0 {
        c.set_channels(first.channels);
    }

    // walk frames: all of them for an exact duration, a sample otherwise
    let start = t.position();
    let mut frames = 0u64;
    let mut bytes = 0u64;
    t.skip(first.frame_length as u64 - 7)?;
    frames += 1;
    bytes += first.frame_length as u64;

    loop {
        if !c.opts.duration && frames >= u64::from(ESTIMATE_FRAMES) {
            break;
        }
        let mut raw = [0u8; 7];
        if t.peek_into(&mut raw)? < 7 {
            break;
        }
        let Some(header) = AdtsHeader::parse(&raw) else {
            break;
        };
        match t.skip(header.frame_length as u64) {
            Ok(()) => {
                frames += 1;
                bytes += header.frame_length as u64;
            }
            Err(e) if e.is_truncation() => {
                c.warn("ADTS: final frame truncated");
                break;
            }
            Err(e) => return Err(e),
        }
    }

    if frames == 0 {
        return Ok(());
    }
    let samples = frames * SAMPLES_PER_FRAME;
    #[allow(clippy::cast_precision_loss)]
    let walked_seconds = samples as f64 / f64::from(first.sample_rate);
    #[allow(clippy::cast_precision_loss)]
    let bitrate = bytes as f64 * 8.0 / walked_seconds;
    c.set_bitrate(bitrate);

    if c.opts.duration {
        c.set_samples(samples);
        c.override_duration(walked_seconds);
    } else if let Some(end) = c.stream_end.or_else(|| t.size_hint()) {
        // extend the sampled byte rate over the whole stream
        let stream_bytes = end.saturating_sub(start.saturating_sub(7));
        #[allow(clippy::cast_precision_loss)]
        let seconds = stream_bytes as f64 * 8.0 / bitrate;
        c.set_duration(seconds);
    }
    Ok(())
}

fn find_first_frame(t: &mut dyn Tokenizer) -> Result<Option<AdtsHeader>> {
    let mut scanned = 0u64;
    while scanned < MAX_SYNC_SCAN {
        let b = t.read_u8()?;
        scanned += 1;
        if b != 0xFF {
            continue;
        }
        let mut rest = [0u8; 6];
        if t.peek_into(&mut rest)? < 6 {
            return Ok(None);
        }
        let raw = [0xFF, rest[0], rest[1], rest[2], rest[3], rest[4], rest[5]];
        if let Some(header) = AdtsHeader::parse(&raw) {
            t.read_into(&mut rest)?;
            return Ok(Some(header));
        }
    }
    Ok(None)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferTokenizer;
    use crate::options::ProbeOptions;

    #[test]
    fn test_header_fields() {
        let frame = build::frame(256);
        let raw: [u8; 7] = frame[..7].try_into().unwrap();
        let h = AdtsHeader::parse(&raw).unwrap();
        assert_eq!(h.sample_rate, 44_100);
        assert_eq!(h.channels, 2);
        assert_eq!(h.profile, 1);
        assert_eq!(h.frame_length, 256);
    }

    #[test]
    fn test_facts_and_estimate() {
        let mut data = Vec::new();
        for _ in 0..20 {
            data.extend_from_slice(&build::frame(256));
        }
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(&data), &mut c).unwrap();

        assert_eq!(c.format.container.as_deref(), Some("ADTS"));
        assert_eq!(c.format.codec.as_deref(), Some("AAC"));
        assert_eq!(c.format.codec_profile.as_deref(), Some("AAC LC"));
        assert_eq!(c.format.sample_rate, Some(44_100));
        assert_eq!(c.format.number_of_channels, Some(2));
        assert!(c.format.bitrate.is_some());
        assert!(c.format.duration.is_some());
    }

    #[test]
    fn test_exact_duration_walk() {
        let mut data = Vec::new();
        for _ in 0..50 {
            data.extend_from_slice(&build::frame(128));
        }
        let mut opts = ProbeOptions::new();
        opts.duration = true;
        let mut c = Collector::new(opts);
        parse(&mut BufferTokenizer::new(&data), &mut c).unwrap();

        assert_eq!(c.format.number_of_samples, Some(50 * 1024));
        let expected = 50.0 * 1024.0 / 44_100.0;
        assert!((c.format.duration.unwrap() - expected).abs() < 1e-9);
    }
}
