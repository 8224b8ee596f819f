//! WavPack block parser
//!
//! Format facts come from the first 32-byte `wvpk` block header; tags live
//! in an APEv2 trailer handled by the shared decoder.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};

const FLAG_MONO: u32 = 0x0000_0004;
const FLAG_HYBRID: u32 = 0x0000_0008;
const FLAG_DSD: u32 = 0x8000_0000;

static SAMPLE_RATES: [u32; 15] = [
    6000, 8000, 9600, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000, 64_000,
    88_200, 96_000, 192_000,
];

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("WavPack");
    c.set_codec("WavPack");

    let header = t.read_vec(32)?;
    if &header[..4] != b"wvpk" {
        return Err(ProbeError::decode("WavPack block", "missing wvpk marker"));
    }

    let total_samples_high = header[11];
    let total_samples_low = u32::from_le_bytes(header[12..16].try_into().unwrap());
    let flags = u32::from_le_bytes(header[24..28].try_into().unwrap());

    let bytes_per_sample = (flags & 0x03) + 1;
    let channels: u8 = if flags & FLAG_MONO != 0 { 1 } else { 2 };
    let hybrid = flags & FLAG_HYBRID != 0;

    if flags & FLAG_DSD == 0 {
        let bits = u8::try_from(bytes_per_sample * 8).unwrap_or(32);
        c.set_bits_per_sample(bits);
    } else {
        c.set_bits_per_sample(1);
    }
    c.set_channels(channels);
    c.set_lossless(!hybrid);
    if hybrid {
        c.set_codec_profile("hybrid".to_owned());
    }

    let rate_index = ((flags >> 23) & 0x0F) as usize;
    if let Some(&rate) = SAMPLE_RATES.get(rate_index) {
        c.set_sample_rate(rate);
    }

    if total_samples_low != u32::MAX {
        let samples = (u64::from(total_samples_high) << 32) | u64::from(total_samples_low);
        if samples > 0 {
            c.set_samples(samples);
        }
    }

    c.derive_duration();
    if let (Some(size), Some(duration)) = (
        c.stream_end.or_else(|| t.size_hint()),
        c.format.duration,
    ) {
        if duration > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let bitrate = size as f64 * 8.0 / duration;
            c.set_bitrate(bitrate);
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufferTokenizer;
    use crate::options::ProbeOptions;

    #[test]
    fn test_block_header_facts() {
        let bytes = build::header(441_000, 9, 0); // 44.1 kHz
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(&bytes), &mut c).unwrap();

        assert_eq!(c.format.container.as_deref(), Some("WavPack"));
        assert_eq!(c.format.codec.as_deref(), Some("WavPack"));
        assert_eq!(c.format.sample_rate, Some(44_100));
        assert_eq!(c.format.number_of_channels, Some(2));
        assert_eq!(c.format.bits_per_sample, Some(16));
        assert_eq!(c.format.lossless, Some(true));
        assert!((c.format.duration.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_hybrid_is_lossy() {
        let bytes = build::header(1000, 9, super::FLAG_HYBRID);
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(&bytes), &mut c).unwrap();
        assert_eq!(c.format.lossless, Some(false));
        assert_eq!(c.format.codec_profile.as_deref(), Some("hybrid"));
    }

    #[test]
    fn test_unknown_sample_count() {
        let bytes = build::header(u32::MAX, 9, 0);
        let mut c = Collector::new(ProbeOptions::new());
        parse(&mut BufferTokenizer::new(&bytes), &mut c).unwrap();
        assert_eq!(c.format.number_of_samples, None);
        assert_eq!(c.format.duration, None);
    }
}
