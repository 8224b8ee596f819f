use audioprobe::{parse_from_buffer, ProbeOptions};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn syncsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

fn mp3_with_id3v23() -> Vec<u8> {
    // 1. Prepare data: a tag with text frames and a mid-size cover
    let mut frames = Vec::new();
    for (id, text) in [
        ("TIT2", "Benchmark Title"),
        ("TPE1", "Benchmark Artist"),
        ("TALB", "Benchmark Album"),
        ("TRCK", "3/12"),
        ("TCON", "(17)"),
    ] {
        frames.extend_from_slice(id.as_bytes());
        let payload_len = u32::try_from(text.len() + 1).unwrap();
        frames.extend_from_slice(&payload_len.to_be_bytes());
        frames.extend_from_slice(&[0, 0]);
        frames.push(3);
        frames.extend_from_slice(text.as_bytes());
    }
    let mut apic = b"APIC".to_vec();
    let image = vec![0xABu8; 32 * 1024];
    let payload_len = u32::try_from(1 + 11 + 1 + 1 + image.len()).unwrap();
    apic.extend_from_slice(&payload_len.to_be_bytes());
    apic.extend_from_slice(&[0, 0]);
    apic.push(0);
    apic.extend_from_slice(b"image/jpeg\0");
    apic.push(3);
    apic.push(0);
    apic.extend_from_slice(&image);
    frames.extend_from_slice(&apic);

    let mut out = b"ID3\x03\x00\x00".to_vec();
    out.extend_from_slice(&syncsafe(u32::try_from(frames.len()).unwrap()));
    out.extend_from_slice(&frames);

    for _ in 0..256 {
        let mut frame = vec![0xFF, 0xFB, 0x90, 0x00];
        frame.resize(417, 0);
        out.extend_from_slice(&frame);
    }
    out
}

fn flac_with_comments() -> Vec<u8> {
    let mut streaminfo = vec![0u8; 34];
    streaminfo[0..2].copy_from_slice(&4096u16.to_be_bytes());
    streaminfo[2..4].copy_from_slice(&4096u16.to_be_bytes());
    streaminfo[10] = 0x0A;
    streaminfo[11] = 0xC4;
    streaminfo[12] = 0x42;
    streaminfo[13] = 0xF0;
    streaminfo[14..18].copy_from_slice(&441_000u32.to_be_bytes());

    let mut comments = Vec::new();
    let vendor = b"bench vendor";
    comments.extend_from_slice(&u32::try_from(vendor.len()).unwrap().to_le_bytes());
    comments.extend_from_slice(vendor);
    let entries = [
        "TITLE=Benchmark",
        "ARTIST=First",
        "ARTIST=Second",
        "ALBUM=The Album",
        "TRACKNUMBER=4/11",
        "REPLAYGAIN_TRACK_GAIN=-6.2 dB",
        "REPLAYGAIN_TRACK_PEAK=0.977",
    ];
    comments.extend_from_slice(&u32::try_from(entries.len()).unwrap().to_le_bytes());
    for entry in entries {
        comments.extend_from_slice(&u32::try_from(entry.len()).unwrap().to_le_bytes());
        comments.extend_from_slice(entry.as_bytes());
    }

    let mut out = b"fLaC".to_vec();
    out.push(0);
    out.extend_from_slice(&u32::try_from(streaminfo.len()).unwrap().to_be_bytes()[1..]);
    out.extend_from_slice(&streaminfo);
    out.push(0x80 | 4);
    out.extend_from_slice(&u32::try_from(comments.len()).unwrap().to_be_bytes()[1..]);
    out.extend_from_slice(&comments);
    out
}

fn parse_benchmark(c: &mut Criterion) {
    let mp3 = mp3_with_id3v23();
    let flac = flac_with_comments();

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(mp3.len() as u64));
    group.bench_function("mp3_id3v23_with_cover", |b| {
        b.iter(|| parse_from_buffer(black_box(&mp3), None, ProbeOptions::new()).unwrap())
    });
    group.throughput(Throughput::Bytes(flac.len() as u64));
    group.bench_function("flac_vorbis_comments", |b| {
        b.iter(|| parse_from_buffer(black_box(&flac), None, ProbeOptions::new()).unwrap())
    });
    group.bench_function("mp3_skip_covers", |b| {
        b.iter(|| {
            parse_from_buffer(black_box(&mp3), None, ProbeOptions::new().skip_covers(true))
                .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, parse_benchmark);
criterion_main!(benches);
