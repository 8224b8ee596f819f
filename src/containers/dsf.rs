//! DSF (DSD stream file) parser
//!
//! A `DSD ` header chunk with a pointer to trailing metadata, then a
//! `fmt ` chunk with the stream facts. The metadata pointer leads to an
//! ID3v2 tag at the end of the file.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::tags::id3v2;

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("DSF");
    c.set_codec("DSD");
    c.set_lossless(true);

    let header = t.read_vec(28)?;
    if &header[..4] != b"DSD " {
        return Err(ProbeError::decode("DSF header", "missing DSD marker"));
    }
    let metadata_pointer = u64::from_le_bytes(header[20..28].try_into().unwrap());

    let mut fmt_id = [0u8; 4];
    t.read_into(&mut fmt_id)?;
    if &fmt_id != b"fmt " {
        return Err(ProbeError::decode("DSF header", "missing fmt chunk"));
    }
    let fmt_size = t.read_u64_le()?;
    let body = t.read_vec(usize::try_from(fmt_size.saturating_sub(12)).map_err(|_| {
        ProbeError::decode("DSF fmt chunk", "unreasonable size")
    })?)?;
    if body.len() < 40 {
        c.warn("DSF: fmt chunk too short");
        return Ok(());
    }

    let channel_num = u32::from_le_bytes(body[12..16].try_into().unwrap());
    let sampling_freq = u32::from_le_bytes(body[16..20].try_into().unwrap());
    let bits = u32::from_le_bytes(body[20..24].try_into().unwrap());
    let sample_count = u64::from_le_bytes(body[24..32].try_into().unwrap());

    c.set_channels(u8::try_from(channel_num).unwrap_or(u8::MAX));
    c.set_sample_rate(sampling_freq);
    c.set_bits_per_sample(u8::try_from(bits).unwrap_or(1));
    if sample_count > 0 {
        c.set_samples(sample_count);
    }
    c.derive_duration();

    // the metadata pointer leads forward to a trailing ID3v2 tag
    if metadata_pointer > 0 && !c.opts.skip_post_headers {
        let position = t.position();
        if metadata_pointer >= position {
            match t.skip(metadata_pointer - position) {
                Ok(()) => {
                    if let Err(e) = id3v2::parse(t, c) {
                        if e.is_truncation() {
                            c.warn("DSF: trailing ID3v2 tag truncated");
                        } else {
                            c.warn(format!("DSF: trailing ID3v2 tag: {e}"));
                        }
                    }
                }
                Err(e) if e.is_truncation() => {
                    c.warn("DSF: metadata pointer past end of file");
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}
