//! MPEG audio (layers 1-3) parser
//!
//! Locates the first valid frame by sync word, derives format facts from
//! the header tables, and reads a Xing/Info/VBRI header for an exact frame
//! count when one is present. Without one, duration falls back to the CBR
//! byte-rate estimate, or to a full frame walk when the `duration` option
//! is set.

use crate::collector::Collector;
use crate::error::Result;
use crate::io::{Tokenizer, TokenizerExt};

/// Bytes to scan for the first sync word before giving up
const MAX_SYNC_SCAN: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    version: Version,
    layer: u8,
    bitrate: u32,
    sample_rate: u32,
    channels: u8,
    crc: bool,
    samples_per_frame: u32,
    frame_size: usize,
}

impl FrameHeader {
    fn parse(b: [u8; 4]) -> Option<Self> {
        if b[0] != 0xFF || b[1] & 0xE0 != 0xE0 {
            return None;
        }
        let version = match (b[1] >> 3) & 0x03 {
            0 => Version::V25,
            2 => Version::V2,
            3 => Version::V1,
            _ => return None,
        };
        let layer = match (b[1] >> 1) & 0x03 {
            1 => 3,
            2 => 2,
            3 => 1,
            _ => return None,
        };
        let crc = b[1] & 0x01 == 0;

        let bitrate_index = (b[2] >> 4) & 0x0F;
        let bitrate = u32::from(bitrate_kbps(version, layer, bitrate_index)?) * 1000;

        let sample_rate_index = (b[2] >> 2) & 0x03;
        let sample_rate = sample_rate(version, sample_rate_index)?;

        let padding = u32::from((b[2] >> 1) & 0x01);
        let channels: u8 = if (b[3] >> 6) & 0x03 == 3 { 1 } else { 2 };

        let samples_per_frame = match (layer, version) {
            (1, _) => 384,
            (2, _) | (3, Version::V1) => 1152,
            (3, _) => 576,
            _ => unreachable!("layer is constrained to 1..=3 above"),
        };

        let frame_size = if layer == 1 {
            (12 * bitrate / sample_rate + padding) * 4
        } else {
            samples_per_frame / 8 * bitrate / sample_rate + padding
        };

        Some(Self {
            version,
            layer,
            bitrate,
            sample_rate,
            channels,
            crc,
            samples_per_frame,
            frame_size: frame_size as usize,
        })
    }

    fn codec(&self) -> String {
        let version = match self.version {
            Version::V1 => "1",
            Version::V2 => "2",
            Version::V25 => "2.5",
        };
        format!("MPEG {version} Layer {}", self.layer)
    }

    /// Offset of a Xing/Info tag within the frame body, header excluded
    fn xing_offset(&self) -> usize {
        let side_info = match (self.version, self.channels) {
            (Version::V1, 1) => 17,
            (Version::V1, _) => 32,
            (_, 1) => 9,
            (_, _) => 17,
        };
        side_info + if self.crc { 2 } else { 0 }
    }
}

fn bitrate_kbps(version: Version, layer: u8, index: u8) -> Option<u16> {
    static V1_L1: [u16; 14] = [
        32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
    ];
    static V1_L2: [u16; 14] = [
        32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384,
    ];
    static V1_L3: [u16; 14] = [
        32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
    ];
    static V2_L1: [u16; 14] = [
        32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256,
    ];
    static V2_L23: [u16; 14] = [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

    if index == 0 || index == 15 {
        // free-form and invalid bitrates are not supported
        return None;
    }
    let table = match (version, layer) {
        (Version::V1, 1) => &V1_L1,
        (Version::V1, 2) => &V1_L2,
        (Version::V1, _) => &V1_L3,
        (_, 1) => &V2_L1,
        (_, _) => &V2_L23,
    };
    table.get(usize::from(index) - 1).copied()
}

fn sample_rate(version: Version, index: u8) -> Option<u32> {
    let base = match index {
        0 => 44_100,
        1 => 48_000,
        2 => 32_000,
        _ => return None,
    };
    Some(match version {
        Version::V1 => base,
        Version::V2 => base / 2,
        Version::V25 => base / 4,
    })
}

pub(crate) fn parse(t: &mut dyn Tokenizer, c: &mut Collector) -> Result<()> {
    c.set_container("MPEG");
    c.set_lossless(false);

    let Some(header) = find_first_frame(t)? else {
        c.warn("MPEG: no valid frame within the scan window");
        return Ok(());
    };
    let frame_start = t.position() - 4;

    c.set_codec(&header.codec());
    c.set_sample_rate(header.sample_rate);
    c.set_channels(header.channels);

    let body_len = header.frame_size.saturating_sub(4);
    let body = t.read_vec(body_len)?;

    let stream_end = c.stream_end.or_else(|| t.size_hint());
    let audio_bytes = stream_end.map(|end| end.saturating_sub(frame_start));

    if let Some(info) = read_xing(&body, &header) {
        apply_xing(&info, &header, audio_bytes, c);
        return Ok(());
    }
    if let Some(frames) = read_vbri(&body) {
        apply_frame_count(u64::from(frames), &header, audio_bytes, c);
        return Ok(());
    }

    if c.opts.duration {
        // exact duration by walking every frame header to the end
        let frames = 1 + walk_frames(t, &header, stream_end, c)?;
        apply_frame_count(frames, &header, audio_bytes, c);
        return Ok(());
    }

    // CBR estimate from the first frame header
    c.set_codec_profile("CBR".to_owned());
    c.set_bitrate(f64::from(header.bitrate));
    if let Some(bytes) = audio_bytes {
        #[allow(clippy::cast_precision_loss)]
        let seconds = bytes as f64 * 8.0 / f64::from(header.bitrate);
        c.set_duration(seconds);
    }
    Ok(())
}

fn find_first_frame(t: &mut dyn Tokenizer) -> Result<Option<FrameHeader>> {
    let mut scanned = 0u64;
    while scanned < MAX_SYNC_SCAN {
        let b = t.read_u8()?;
        scanned += 1;
        if b != 0xFF {
            continue;
        }
        let mut rest = [0u8; 3];
        if t.peek_into(&mut rest)? < 3 {
            return Ok(None);
        }
        if let Some(header) = FrameHeader::parse([0xFF, rest[0], rest[1], rest[2]]) {
            t.read_into(&mut rest)?;
            return Ok(Some(header));
        }
    }
    Ok(None)
}

struct XingInfo {
    frames: Option<u32>,
    bytes: Option<u32>,
    cbr: bool,
    tool: Option<String>,
}

/// Read a Xing/Info header from the first frame body
fn read_xing(body: &[u8], header: &FrameHeader) -> Option<XingInfo> {
    let offset = header.xing_offset();
    let tag = body.get(offset..offset + 4)?;
    let cbr = match tag {
        b"Xing" => false,
        b"Info" => true,
        _ => return None,
    };

    let mut pos = offset + 4;
    let flags = u32::from_be_bytes(body.get(pos..pos + 4)?.try_into().ok()?);
    pos += 4;

    let mut frames = None;
    if flags & 0x01 != 0 {
        frames = Some(u32::from_be_bytes(body.get(pos..pos + 4)?.try_into().ok()?));
        pos += 4;
    }
    let mut bytes = None;
    if flags & 0x02 != 0 {
        bytes = Some(u32::from_be_bytes(body.get(pos..pos + 4)?.try_into().ok()?));
        pos += 4;
    }
    if flags & 0x04 != 0 {
        pos += 100; // seek table
    }
    if flags & 0x08 != 0 {
        pos += 4; // quality
    }

    let tool = body.get(pos..pos + 9).and_then(|raw| {
        let s: String = raw
            .iter()
            .take_while(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| b as char)
            .collect();
        (s.len() >= 4).then_some(s)
    });

    Some(XingInfo {
        frames,
        bytes,
        cbr,
        tool,
    })
}

/// Read a VBRI frame count; the tag sits 32 bytes into the frame body
fn read_vbri(body: &[u8]) -> Option<u32> {
    if body.get(32..36)? != b"VBRI" {
        return None;
    }
    // version, delay, quality, total bytes
    let frames = u32::from_be_bytes(body.get(46..50)?.try_into().ok()?);
    Some(frames)
}

fn apply_xing(info: &XingInfo, header: &FrameHeader, audio_bytes: Option<u64>, c: &mut Collector) {
    c.set_codec_profile(if info.cbr { "CBR" } else { "VBR" }.to_owned());
    if let Some(tool) = &info.tool {
        c.set_tool(tool.clone());
    }
    if let Some(frames) = info.frames {
        let byte_count = info.bytes.map(u64::from).or(audio_bytes);
        apply_frame_count_with_bytes(u64::from(frames), header, byte_count, c);
    } else if info.cbr {
        c.set_bitrate(f64::from(header.bitrate));
    }
}

fn apply_frame_count(frames: u64, header: &FrameHeader, audio_bytes: Option<u64>, c: &mut Collector) {
    if c.format.codec_profile.is_none() {
        c.set_codec_profile("VBR".to_owned());
    }
    apply_frame_count_with_bytes(frames, header, audio_bytes, c);
}

fn apply_frame_count_with_bytes(
    frames: u64,
    header: &FrameHeader,
    byte_count: Option<u64>,
    c: &mut Collector,
) {
    let samples = frames * u64::from(header.samples_per_frame);
    c.set_samples(samples);
    #[allow(clippy::cast_precision_loss)]
    let seconds = samples as f64 / f64::from(header.sample_rate);
    c.override_duration(seconds);
    if seconds > 0.0 {
        if let Some(bytes) = byte_count {
            #[allow(clippy::cast_precision_loss)]
            let bitrate = bytes as f64 * 8.0 / seconds;
            c.set_bitrate(bitrate);
        }
    }
}

/// Walk frame headers to the end of the audio stream, returning the count
fn walk_frames(
    t: &mut dyn Tokenizer,
    first: &FrameHeader,
    stream_end: Option<u64>,
    c: &mut Collector,
) -> Result<u64> {
    let mut frames = 0u64;
    loop {
        if let Some(end) = stream_end {
            if t.position() + 4 > end {
                break;
            }
        }
        let mut raw = [0u8; 4];
        let n = t.peek_into(&mut raw)?;
        if n < 4 {
            break;
        }
        let Some(header) = FrameHeader::parse(raw) else {
            // sync lost: trailing tags or junk start here
            break;
        };
        if header.sample_rate != first.sample_rate {
            break;
        }
        match t.skip(header.frame_size as u64) {
            Ok(()) => frames += 1,
            Err(e) if e.is_truncation() => {
                c.warn("MPEG: final frame truncated");
                break;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(frames)
}

#[cfg(test)]
pub(crate) mod build {
    //! MPEG fixture builders

    /// MPEG-1 Layer 3, 128 kbps, 44.1 kHz, stereo, no CRC: FF FB 90 00,
    /// frame size 417 bytes
    pub(crate) fn frame() -> Vec<u8> {
        let mut out = vec![0xFF, 0xFB, 0x90, 0x00];
        out.resize(417, 0);
        out
    }

    /// First frame carrying a Xing header with a frame count
    pub(crate) fn xing_frame(frames: u32, cbr: bool) -> Vec<u8> {
        let mut out = frame();
        let offset = 4 + 32; // header + MPEG-1 stereo side info
        out[offset..offset + 4].copy_from_slice(if cbr { b"Info" } else { b"Xing" });
        out[offset + 4..offset + 8].copy_from_slice(&0x01u32.to_be_bytes());
        out[offset + 8..offset + 12].copy_from_slice(&frames.to_be_bytes());
        let tool = b"LAME3.99r";
        out[offset + 12..offset + 12 + tool.len()].copy_from_slice(tool);
        out
    }
}
