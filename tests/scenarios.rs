//! End-to-end scenarios over synthesized files

use audioprobe::{parse_from_buffer, parse_from_stream, ProbeOptions, TagSystem};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::Write;

mod common;

#[test]
fn test_mp3_with_id3v23() {
    common::init_logging();
    let mut bytes = common::id3v2_tag(
        3,
        &[
            common::id3v2_text_frame(3, "TIT2", "Hello"),
            common::id3v2_text_frame(3, "TPE1", "World"),
            common::id3v2_text_frame(3, "TRCK", "3/12"),
        ],
    );
    bytes.extend_from_slice(&common::mp3_frames(10));

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert_eq!(result.format.container.as_deref(), Some("MPEG"));
    assert_eq!(result.format.codec.as_deref(), Some("MPEG 1 Layer 3"));
    assert_eq!(result.common.title.as_deref(), Some("Hello"));
    assert_eq!(result.common.artist.as_deref(), Some("World"));
    assert_eq!(result.common.track.no, Some(3));
    assert_eq!(result.common.track.of, Some(12));
    assert_eq!(result.format.tag_types, vec![TagSystem::Id3v23]);
}

#[test]
fn test_mp3_with_only_id3v1() {
    let mut bytes = common::mp3_frames(10);
    bytes.extend_from_slice(&common::id3v1_tag("Song", "Artist", "2001", 17));

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert_eq!(result.common.title.as_deref(), Some("Song"));
    assert_eq!(result.common.artist.as_deref(), Some("Artist"));
    assert_eq!(result.common.year, Some(2001));
    assert_eq!(result.common.genre, vec!["Rock"]);
    assert!(result.format.tag_types.contains(&TagSystem::Id3v1));
}

#[test]
fn test_flac_with_vorbis_comments() {
    let bytes = common::flac_file(&[
        (0, common::flac_streaminfo(44_100, 2, 16, 441_000)),
        (
            4,
            common::vorbis_comment_block(&["ARTIST=A", "ARTIST=B", "TITLE=X"]),
        ),
    ]);

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert!((result.format.duration.unwrap() - 10.0).abs() < 1e-3);
    assert_eq!(result.common.artists, vec!["A", "B"]);
    assert_eq!(result.common.title.as_deref(), Some("X"));
    assert_eq!(result.format.lossless, Some(true));
}

#[test]
fn test_mp4_ilst() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x10, 0x20, 0x30];
    let bytes = common::mp4_file(&[
        common::mp4_text_entry(b"\xA9nam", "T"),
        common::mp4_text_entry(b"\xA9ART", "A"),
        common::mp4_pair_entry(b"trkn", 2, 10),
        common::mp4_atom(b"covr", &common::mp4_data_atom(13, &jpeg)),
    ]);

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert_eq!(result.format.container.as_deref(), Some("MP4"));
    assert_eq!(result.common.title.as_deref(), Some("T"));
    assert_eq!(result.common.artist.as_deref(), Some("A"));
    assert_eq!(result.common.track.no, Some(2));
    assert_eq!(result.common.track.of, Some(10));
    assert_eq!(result.common.picture.len(), 1);
    assert_eq!(result.common.picture[0].mime, "image/jpeg");
    assert_eq!(result.common.picture[0].data, jpeg);
}

#[test]
fn test_ogg_vorbis_metadata_block_picture() {
    let image = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];
    let picture = common::flac_picture(3, "image/png", "front cover", &image);
    let entry = format!("METADATA_BLOCK_PICTURE={}", BASE64.encode(&picture));

    let bytes = common::ogg_vorbis(&[&entry, "TITLE=Pictured"]);
    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert_eq!(result.common.picture.len(), 1);
    let decoded = &result.common.picture[0];
    assert_eq!(decoded.mime, "image/png");
    assert_eq!(decoded.data, image);
    assert_eq!(decoded.description.as_deref(), Some("front cover"));
    assert_eq!(decoded.picture_type.as_deref(), Some("Cover (front)"));
}

#[test]
fn test_wavpack_with_ape_replaygain() {
    let mut bytes = common::wavpack_header(441_000);
    bytes.extend_from_slice(&common::ape_tag(&[
        ("REPLAYGAIN_TRACK_GAIN", "-6.00 dB"),
        ("REPLAYGAIN_TRACK_PEAK", "0.988"),
    ]));

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();

    assert_eq!(result.format.container.as_deref(), Some("WavPack"));
    let gain = result.common.replaygain_track_gain.unwrap();
    assert!((gain.db - -6.0).abs() < 1e-9);
    assert!((gain.ratio - 0.5012).abs() < 1e-3);
    let peak = result.common.replaygain_track_peak.unwrap();
    assert!((peak.ratio - 0.988).abs() < 1e-9);
}

#[test]
fn test_unsupported_container_is_fatal() {
    let bytes = b"definitely not audio".to_vec();
    let err = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap_err();
    assert!(matches!(err, audioprobe::ProbeError::UnsupportedContainer));
}

#[test]
fn test_native_view_preserves_duplicates_in_order() {
    let bytes = common::flac_file(&[
        (0, common::flac_streaminfo(44_100, 2, 16, 0)),
        (
            4,
            common::vorbis_comment_block(&["ARTIST=A", "ARTIST=B", "TITLE=X"]),
        ),
    ]);
    let result = parse_from_buffer(&bytes, None, ProbeOptions::new().native(true)).unwrap();

    let tags = result.native_tags(TagSystem::Vorbis).unwrap();
    let artists: Vec<_> = tags
        .iter()
        .filter(|t| t.id == "ARTIST")
        .filter_map(|t| t.value.as_text())
        .collect();
    assert_eq!(artists, vec!["A", "B"]);
}

#[test]
fn test_native_view_absent_by_default() {
    let bytes = common::flac_file(&[(0, common::flac_streaminfo(44_100, 2, 16, 0))]);
    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();
    assert!(result.native.is_none());
}

#[test]
fn test_parse_from_file_via_tempfile() {
    let mut bytes = common::id3v2_tag(4, &[common::id3v2_text_frame(4, "TIT2", "From disk")]);
    bytes.extend_from_slice(&common::mp3_frames(5));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();
    let on_disk = std::fs::read(file.path()).unwrap();

    let result = parse_from_buffer(
        &on_disk,
        Some("audio/mpeg"),
        ProbeOptions::new().path(file.path()),
    )
    .unwrap();
    assert_eq!(result.common.title.as_deref(), Some("From disk"));
}

#[test]
fn test_stream_parse_of_chained_envelope() {
    let mut bytes = common::id3v2_tag(4, &[common::id3v2_text_frame(4, "TALB", "Album")]);
    bytes.extend_from_slice(&common::mp3_frames(8));

    let result = parse_from_stream(
        std::io::Cursor::new(bytes.clone()),
        None,
        ProbeOptions::new().file_size(bytes.len() as u64),
    )
    .unwrap();

    assert_eq!(result.format.container.as_deref(), Some("MPEG"));
    assert_eq!(result.common.album.as_deref(), Some("Album"));
    // a size hint enables the CBR duration estimate even on streams
    assert!(result.format.duration.is_some());
}

#[test]
fn test_embedded_id3_in_aiff_chunks() {
    // FORM/AIFF with COMM and an ID3 chunk
    let comm = {
        let mut body = Vec::new();
        body.extend_from_slice(&2u16.to_be_bytes());
        body.extend_from_slice(&88_200u32.to_be_bytes());
        body.extend_from_slice(&16u16.to_be_bytes());
        // 44100 as an 80-bit extended float
        body.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);
        let mut chunk = b"COMM".to_vec();
        chunk.extend_from_slice(&u32::try_from(body.len()).unwrap().to_be_bytes());
        chunk.extend_from_slice(&body);
        chunk
    };
    let id3 = {
        let tag = common::id3v2_tag(3, &[common::id3v2_text_frame(3, "TIT2", "Embedded")]);
        let mut chunk = b"ID3 ".to_vec();
        chunk.extend_from_slice(&u32::try_from(tag.len()).unwrap().to_be_bytes());
        chunk.extend_from_slice(&tag);
        chunk
    };
    let mut body = comm;
    body.extend_from_slice(&id3);
    let mut bytes = b"FORM".to_vec();
    bytes.extend_from_slice(&u32::try_from(body.len() + 4).unwrap().to_be_bytes());
    bytes.extend_from_slice(b"AIFF");
    bytes.extend_from_slice(&body);

    let result = parse_from_buffer(&bytes, None, ProbeOptions::new()).unwrap();
    assert_eq!(result.format.container.as_deref(), Some("AIFF"));
    assert_eq!(result.common.title.as_deref(), Some("Embedded"));
    assert_eq!(result.format.sample_rate, Some(44_100));
}
