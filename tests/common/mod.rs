//! Shared fixture builders
//!
//! Every integration test synthesizes its input in memory; no binary
//! fixture files.

#![allow(dead_code)]

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("audioprobe=debug")
        .try_init();
}

pub fn syncsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

/// An ID3v2 tag wrapping the given frames
pub fn id3v2_tag(major: u8, frames: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = frames.concat();
    let mut out = Vec::new();
    out.extend_from_slice(b"ID3");
    out.push(major);
    out.push(0);
    out.push(0);
    out.extend_from_slice(&syncsafe(u32::try_from(body.len()).unwrap()));
    out.extend_from_slice(&body);
    out
}

/// A text frame with UTF-8 encoding
pub fn id3v2_text_frame(major: u8, id: &str, text: &str) -> Vec<u8> {
    let mut payload = vec![3u8];
    payload.extend_from_slice(text.as_bytes());
    id3v2_frame(major, id, &payload)
}

pub fn id3v2_frame(major: u8, id: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = id.as_bytes().to_vec();
    let len = u32::try_from(payload.len()).unwrap();
    if major == 4 {
        out.extend_from_slice(&syncsafe(len));
    } else {
        out.extend_from_slice(&len.to_be_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(payload);
    out
}

/// An APIC frame holding a JPEG
pub fn id3v2_apic(major: u8, image: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8];
    payload.extend_from_slice(b"image/jpeg\0");
    payload.push(3); // cover (front)
    payload.extend_from_slice(b"\0");
    payload.extend_from_slice(image);
    id3v2_frame(major, "APIC", &payload)
}

/// A 128-byte ID3v1 trailer
pub fn id3v1_tag(title: &str, artist: &str, year: &str, genre: u8) -> Vec<u8> {
    let mut tag = vec![0u8; 128];
    tag[..3].copy_from_slice(b"TAG");
    tag[3..3 + title.len()].copy_from_slice(title.as_bytes());
    tag[33..33 + artist.len()].copy_from_slice(artist.as_bytes());
    tag[93..93 + year.len()].copy_from_slice(year.as_bytes());
    tag[127] = genre;
    tag
}

/// One MPEG-1 Layer 3 frame: 128 kbps, 44.1 kHz, stereo, 417 bytes
pub fn mp3_frame() -> Vec<u8> {
    let mut out = vec![0xFF, 0xFB, 0x90, 0x00];
    out.resize(417, 0);
    out
}

pub fn mp3_frames(count: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for _ in 0..count {
        out.extend_from_slice(&mp3_frame());
    }
    out
}

/// FLAC STREAMINFO block body
pub fn flac_streaminfo(
    sample_rate: u32,
    channels: u8,
    bits: u8,
    total_samples: u64,
) -> Vec<u8> {
    let mut block = vec![0u8; 34];
    block[0..2].copy_from_slice(&4096u16.to_be_bytes());
    block[2..4].copy_from_slice(&4096u16.to_be_bytes());
    block[10] = (sample_rate >> 12) as u8;
    block[11] = (sample_rate >> 4) as u8;
    block[12] = ((sample_rate & 0x0F) << 4) as u8 | ((channels - 1) << 1) | ((bits - 1) >> 4);
    block[13] = ((bits - 1) & 0x0F) << 4 | ((total_samples >> 32) & 0x0F) as u8;
    block[14..18].copy_from_slice(&(total_samples as u32).to_be_bytes());
    block
}

/// A Vorbis comment block (vendor + entries), no packet framing
pub fn vorbis_comment_block(entries: &[&str]) -> Vec<u8> {
    let vendor = b"test vendor";
    let mut out = Vec::new();
    out.extend_from_slice(&u32::try_from(vendor.len()).unwrap().to_le_bytes());
    out.extend_from_slice(vendor);
    out.extend_from_slice(&u32::try_from(entries.len()).unwrap().to_le_bytes());
    for entry in entries {
        out.extend_from_slice(&u32::try_from(entry.len()).unwrap().to_le_bytes());
        out.extend_from_slice(entry.as_bytes());
    }
    out
}

/// Assemble a FLAC stream head from `(block type, body)` pairs
pub fn flac_file(blocks: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut out = b"fLaC".to_vec();
    for (i, (block_type, body)) in blocks.iter().enumerate() {
        let last = u8::from(i == blocks.len() - 1) << 7;
        out.push(last | block_type);
        out.extend_from_slice(&u32::try_from(body.len()).unwrap().to_be_bytes()[1..]);
        out.extend_from_slice(body);
    }
    out
}

/// The FLAC picture structure used by PICTURE blocks and
/// `METADATA_BLOCK_PICTURE`
pub fn flac_picture(picture_type: u32, mime: &str, description: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&picture_type.to_be_bytes());
    out.extend_from_slice(&u32::try_from(mime.len()).unwrap().to_be_bytes());
    out.extend_from_slice(mime.as_bytes());
    out.extend_from_slice(&u32::try_from(description.len()).unwrap().to_be_bytes());
    out.extend_from_slice(description.as_bytes());
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&u32::try_from(data.len()).unwrap().to_be_bytes());
    out.extend_from_slice(data);
    out
}

/// A complete APEv2 tag (header + items + footer)
pub fn ape_tag(items: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (key, value) in items {
        body.extend_from_slice(&u32::try_from(value.len()).unwrap().to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(key.as_bytes());
        body.push(0);
        body.extend_from_slice(value.as_bytes());
    }
    let size = u32::try_from(body.len() + 32).unwrap();
    let count = u32::try_from(items.len()).unwrap();

    let record = |flags: u32| {
        let mut out = Vec::new();
        out.extend_from_slice(b"APETAGEX");
        out.extend_from_slice(&2000u32.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&[0u8; 8]);
        out
    };

    let mut out = record(0xA000_0000);
    out.extend_from_slice(&body);
    out.extend_from_slice(&record(0x8000_0000));
    out
}

/// A WavPack block header
pub fn wavpack_header(total_samples: u32) -> Vec<u8> {
    let mut out = b"wvpk".to_vec();
    out.extend_from_slice(&24u32.to_le_bytes());
    out.extend_from_slice(&0x0410u16.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&total_samples.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    let flags: u32 = 0x0000_0001 | (9 << 23); // 16-bit, 44.1 kHz
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// One Ogg page holding whole packets
pub fn ogg_page(granule: u64, packets: &[&[u8]]) -> Vec<u8> {
    let mut lacing = Vec::new();
    for packet in packets {
        let mut left = packet.len();
        loop {
            if left >= 255 {
                lacing.push(255u8);
                left -= 255;
            } else {
                lacing.push(u8::try_from(left).unwrap());
                break;
            }
        }
    }
    let mut out = Vec::new();
    out.extend_from_slice(b"OggS");
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&granule.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(u8::try_from(lacing.len()).unwrap());
    out.extend_from_slice(&lacing);
    for packet in packets {
        out.extend_from_slice(packet);
    }
    out
}

/// A Vorbis identification packet
pub fn vorbis_id_packet(channels: u8, sample_rate: u32) -> Vec<u8> {
    let mut out = b"\x01vorbis".to_vec();
    out.extend_from_slice(&0u32.to_le_bytes());
    out.push(channels);
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&[0u8; 12]);
    out.push(0xB8); // blocksizes
    out.push(0x01); // framing bit
    out
}

/// A Vorbis comment packet from raw comment entries
pub fn vorbis_comment_packet(entries: &[&str]) -> Vec<u8> {
    let mut out = b"\x03vorbis".to_vec();
    out.extend_from_slice(&vorbis_comment_block(entries));
    out.push(1);
    out
}

/// A complete Ogg Vorbis stream head
pub fn ogg_vorbis(entries: &[&str]) -> Vec<u8> {
    let mut out = ogg_page(0, &[&vorbis_id_packet(2, 44_100)]);
    out.extend_from_slice(&ogg_page(0, &[&vorbis_comment_packet(entries)]));
    out
}

// ---- MP4 ----

pub fn mp4_atom(name: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&u32::try_from(body.len() + 8).unwrap().to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(body);
    out
}

pub fn mp4_data_atom(class: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&class.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(payload);
    mp4_atom(b"data", &body)
}

pub fn mp4_text_entry(name: &[u8; 4], value: &str) -> Vec<u8> {
    mp4_atom(name, &mp4_data_atom(1, value.as_bytes()))
}

pub fn mp4_pair_entry(name: &[u8; 4], no: u16, of: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 2];
    payload.extend_from_slice(&no.to_be_bytes());
    payload.extend_from_slice(&of.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    mp4_atom(name, &mp4_data_atom(0, &payload))
}

/// An `ftyp` + `moov/udta/meta/ilst` file
pub fn mp4_file(entries: &[Vec<u8>]) -> Vec<u8> {
    let ilst = mp4_atom(b"ilst", &entries.concat());
    let mut meta_body = vec![0u8; 4];
    meta_body.extend_from_slice(&ilst);
    let udta = mp4_atom(b"udta", &mp4_atom(b"meta", &meta_body));
    let moov = mp4_atom(b"moov", &udta);

    let mut out = mp4_atom(b"ftyp", b"M4A \0\0\0\0isomiso2");
    out.extend_from_slice(&moov);
    out
}
