//! Ogg container parser
//!
//! Pages carry a lacing table of segment sizes; packets are reassembled
//! across segments and pages. The first packet of the logical stream
//! names the codec, the second carries Vorbis-style comments for every
//! codec we care about.

use crate::collector::Collector;
use crate::error::{ProbeError, Result};
use crate::io::{Tokenizer, TokenizerExt};
use crate::tags::vorbis;

/// Opus granule positions always tick at 48 kHz
const OPUS_GRANULE_RATE: u32 = 48_000;

/// Pages to inspect before giving up on finding the comment packet
const MAX_HEADER_PAGES: u32 = 64;

struct PageHeader {
    granule: u64,
    segments: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Vorbis,
    Opus,
    Speex,
    Flac,
    Theora,
    Unknown,
}

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("Ogg");

    let mut packets = PacketReader::new();
    let first = packets
        .next_packet(t)?
        .ok_or_else(|| ProbeError::decode("Ogg stream", "no packets"))?;

    let (codec, granule_rate, pre_skip, nominal_bitrate) = identify(&first, c)?;

    if codec != Codec::Unknown {
        if let Some(second) = packets.next_packet(t)? {
            decode_comment_packet(codec, &second, c);
        }
    }

    if c.opts.duration {
        // walk the remaining pages for the final granule position
        let mut last_granule = packets.last_granule;
        loop {
            match read_page_header(t) {
                Ok(page) => {
                    let body: u64 = page.segments.iter().map(|&s| u64::from(s)).sum();
                    t.skip(body)?;
                    if page.granule != u64::MAX {
                        last_granule = page.granule;
                    }
                }
                Err(e) if e.is_truncation() => break,
                Err(e) => return Err(e),
            }
        }
        if let Some(rate) = granule_rate {
            let samples = last_granule.saturating_sub(u64::from(pre_skip));
            c.set_samples(samples);
            #[allow(clippy::cast_precision_loss)]
            let seconds = samples as f64 / f64::from(rate);
            c.override_duration(seconds);
        }
    } else if let (Some(bitrate), Some(size)) = (nominal_bitrate, source_size(t, c)) {
        // estimate from the declared nominal bitrate
        c.set_bitrate(f64::from(bitrate));
        #[allow(clippy::cast_precision_loss)]
        let seconds = size as f64 * 8.0 / f64::from(bitrate);
        c.set_duration(seconds);
    }

    Ok(())
}

fn source_size(t: &dyn Tokenizer, c: &Collector) -> Option<u64> {
    c.opts.file_size.or_else(|| t.size_hint())
}

/// Identify the codec from the first packet and record its format facts
///
/// Returns the codec, the rate granule positions tick at, any pre-skip,
/// and a nominal bitrate when the header declares one.
fn identify(packet: &[u8], c: &mut Collector) -> Result<(Codec, Option<u32>, u16, Option<u32>)> {
    if packet.starts_with(b"\x01vorbis") {
        if packet.len() < 30 {
            return Err(ProbeError::decode("Vorbis identification header", "too short"));
        }
        let channels = packet[11];
        let sample_rate = u32::from_le_bytes(packet[12..16].try_into().unwrap());
        let nominal = i32::from_le_bytes(packet[20..24].try_into().unwrap());
        c.set_codec("Vorbis");
        c.set_lossless(false);
        c.set_channels(channels);
        c.set_sample_rate(sample_rate);
        let nominal = u32::try_from(nominal).ok().filter(|&b| b > 0);
        return Ok((Codec::Vorbis, Some(sample_rate), 0, nominal));
    }

    if packet.starts_with(b"OpusHead") {
        if packet.len() < 19 {
            return Err(ProbeError::decode("Opus header", "too short"));
        }
        let channels = packet[9];
        let pre_skip = u16::from_le_bytes(packet[10..12].try_into().unwrap());
        let input_rate = u32::from_le_bytes(packet[12..16].try_into().unwrap());
        c.set_codec("Opus");
        c.set_lossless(false);
        c.set_channels(channels);
        c.set_sample_rate(if input_rate > 0 {
            input_rate
        } else {
            OPUS_GRANULE_RATE
        });
        return Ok((Codec::Opus, Some(OPUS_GRANULE_RATE), pre_skip, None));
    }

    if packet.starts_with(b"Speex   ") {
        if packet.len() < 52 {
            return Err(ProbeError::decode("Speex header", "too short"));
        }
        let rate = u32::from_le_bytes(packet[36..40].try_into().unwrap());
        let channels = u32::from_le_bytes(packet[48..52].try_into().unwrap());
        c.set_codec("Speex");
        c.set_lossless(false);
        c.set_sample_rate(rate);
        c.set_channels(u8::try_from(channels).unwrap_or(0));
        return Ok((Codec::Speex, Some(rate), 0, None));
    }

    if packet.starts_with(b"\x7FFLAC") {
        // 0x7F FLAC major minor nheaders(2) "fLaC" blockheader(4) STREAMINFO
        if packet.len() >= 13 + 4 + 34 && &packet[9..13] == b"fLaC" {
            let si = &packet[17..17 + 34];
            let sample_rate = (u32::from(si[10]) << 12)
                | (u32::from(si[11]) << 4)
                | (u32::from(si[12]) >> 4);
            let channels = ((si[12] >> 1) & 0x07) + 1;
            let bits = (((si[12] & 0x01) << 4) | (si[13] >> 4)) + 1;
            let total = (u64::from(si[13] & 0x0F) << 32)
                | u64::from(u32::from_be_bytes([si[14], si[15], si[16], si[17]]));
            c.set_codec("FLAC");
            c.set_lossless(true);
            c.set_sample_rate(sample_rate);
            c.set_channels(channels);
            c.set_bits_per_sample(bits);
            if total > 0 {
                c.set_samples(total);
                c.derive_duration();
            }
            return Ok((Codec::Flac, Some(sample_rate), 0, None));
        }
        return Err(ProbeError::decode("FLAC-in-Ogg header", "malformed"));
    }

    if packet.starts_with(b"\x80theora") {
        c.set_codec("Theora");
        return Ok((Codec::Theora, None, 0, None));
    }

    c.warn("Ogg: unrecognized codec in first packet");
    Ok((Codec::Unknown, None, 0, None))
}

fn decode_comment_packet(codec: Codec, packet: &[u8], c: &mut Collector) {
    let body = match codec {
        Codec::Vorbis => packet.strip_prefix(b"\x03vorbis"),
        Codec::Opus => packet.strip_prefix(b"OpusTags"),
        Codec::Speex => Some(packet),
        // a FLAC metadata block: 4-byte header, then the comment payload
        Codec::Flac => (packet.len() > 4 && packet[0] & 0x7F == 4).then(|| &packet[4..]),
        Codec::Theora => packet.strip_prefix(b"\x81theora"),
        Codec::Unknown => None,
    };
    match body {
        Some(body) => {
            if let Err(e) = vorbis::decode(body, c) {
                c.warn(format!("Ogg comment packet: {e}"));
            }
        }
        None => c.warn("Ogg: second packet is not a comment header"),
    }
}

/// Incremental packet reassembly across pages
struct PacketReader {
    pending: Vec<u8>,
    queue: std::collections::VecDeque<Vec<u8>>,
    pages_read: u32,
    last_granule: u64,
}

impl PacketReader {
    fn new() -> Self {
        Self {
            pending: Vec::new(),
            queue: std::collections::VecDeque::new(),
            pages_read: 0,
            last_granule: 0,
        }
    }

    /// The next complete packet, reading pages as needed
    fn next_packet(&mut self, t: &mut dyn Tokenizer) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(packet) = self.queue.pop_front() {
                return Ok(Some(packet));
            }
            if self.pages_read >= MAX_HEADER_PAGES {
                return Ok(None);
            }
            let page = read_page_header(t)?;
            self.pages_read += 1;
            if page.granule != u64::MAX {
                self.last_granule = page.granule;
            }
            for &lacing in &page.segments {
                let mut segment = t.read_vec(usize::from(lacing))?;
                self.pending.append(&mut segment);
                if lacing < 255 {
                    self.queue.push_back(std::mem::take(&mut self.pending));
                }
            }
        }
    }
}

fn read_page_header(t: &mut dyn Tokenizer) -> Result<PageHeader> {
    let magic = t.read_fourcc()?;
    if &magic != b"OggS" {
        return Err(ProbeError::decode("Ogg page", "missing OggS capture pattern"));
    }
    // version, header type
    t.skip(2)?;
    let granule = t.read_u64_le()?;
    // serial, sequence, CRC
    t.skip(12)?;
    let count = t.read_u8()?;
    let segments = t.read_vec(usize::from(count))?;
    Ok(PageHeader { granule, segments })
}
