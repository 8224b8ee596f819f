//! FLAC container parser
//!
//! A `fLaC` marker followed by metadata blocks, each with a one-byte
//! header (last-flag plus 7-bit type) and a 24-bit size. STREAMINFO is
//! required and first; VORBIS_COMMENT and PICTURE feed the tag decoders.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{Tokenizer, TokenizerExt};
use crate::tags::vorbis;
use crate::types::{NativeTag, TagSystem, TagValue};

const BLOCK_STREAMINFO: u8 = 0;
const BLOCK_PADDING: u8 = 1;
const BLOCK_APPLICATION: u8 = 2;
const BLOCK_SEEKTABLE: u8 = 3;
const BLOCK_VORBIS_COMMENT: u8 = 4;
const BLOCK_CUESHEET: u8 = 5;
const BLOCK_PICTURE: u8 = 6;

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("FLAC");
    c.set_codec("FLAC");
    c.set_lossless(true);

    // "fLaC", verified by the sniffer
    t.skip(4)?;

    loop {
        let header = t.read_u8()?;
        let last = header & 0x80 != 0;
        let block_type = header & 0x7F;
        let size = t.read_u24_be()? as usize;

        match block_type {
            BLOCK_STREAMINFO => decode_streaminfo(t, size, c)?,
            BLOCK_VORBIS_COMMENT => {
                let body = t.read_vec(size)?;
                vorbis::decode(&body, c)?;
            }
            BLOCK_PICTURE => {
                let body = t.read_vec(size)?;
                match vorbis::decode_flac_picture(&body, c.opts.skip_covers) {
                    Ok(picture) => c.add_tag(
                        TagSystem::Vorbis,
                        NativeTag::new("METADATA_BLOCK_PICTURE", TagValue::Picture(picture)),
                    ),
                    Err(e) => c.warn(format!("FLAC PICTURE block: {e}")),
                }
            }
            BLOCK_PADDING | BLOCK_APPLICATION | BLOCK_SEEKTABLE | BLOCK_CUESHEET => {
                t.skip(size as u64)?;
            }
            other => {
                c.warn(format!("FLAC: unknown block type {other}, skipped"));
                t.skip(size as u64)?;
            }
        }

        if last {
            break;
        }
    }

    c.derive_duration();
    if let (Some(file_size), Some(duration)) = (source_size(t, c), c.format.duration) {
        if duration > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let bitrate = file_size as f64 * 8.0 / duration;
            c.set_bitrate(bitrate);
        }
    }
    Ok(())
}

fn source_size(t: &dyn Tokenizer, c: &Collector) -> Option<u64> {
    c.opts.file_size.or_else(|| t.size_hint())
}

/// STREAMINFO: block/frame size bounds, then a packed 64-bit field with
/// sample rate (20 bits), channels (3), bits per sample (5) and total
/// samples (36), then the stream MD5
fn decode_streaminfo(t: &mut dyn Tokenizer, size: usize, c: &mut Collector) -> Result<()> {
    if size < 34 {
        c.warn("FLAC: STREAMINFO too short");
        t.skip(size as u64)?;
        return Ok(());
    }
    let block = t.read_vec(size)?;

    let sample_rate = (u32::from(block[10]) << 12)
        | (u32::from(block[11]) << 4)
        | (u32::from(block[12]) >> 4);
    let channels = ((block[12] >> 1) & 0x07) + 1;
    let bits_per_sample = (((block[12] & 0x01) << 4) | (block[13] >> 4)) + 1;
    let total_samples = (u64::from(block[13] & 0x0F) << 32)
        | u64::from(u32::from_be_bytes([block[14], block[15], block[16], block[17]]));

    if sample_rate == 0 {
        c.warn("FLAC: STREAMINFO declares a zero sample rate");
    } else {
        c.set_sample_rate(sample_rate);
    }
    c.set_channels(channels);
    c.set_bits_per_sample(bits_per_sample);
    if total_samples > 0 {
        c.set_samples(total_samples);
    }

    let md5: [u8; 16] = block[18..34].try_into().unwrap();
    if md5 != [0u8; 16] {
        c.set_audio_md5(md5);
    }
    Ok(())
}
