//! Format sniffer
//!
//! Picks a container parser from a peek at the leading bytes, without
//! consuming anything the parser still needs. ID3v2 is an envelope: after
//! the tag is decoded the sniffer runs again on the remaining stream.

use crate::types::ContainerKind;

/// How many leading bytes the dispatcher peeks for sniffing
pub(crate) const SNIFF_WINDOW: usize = 4096;

/// ASF top-level header object GUID
const ASF_GUID: [u8; 16] = [
    0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C,
];

/// Outcome of sniffing the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sniffed {
    /// An ID3v2 envelope; decode it, then sniff again
    Id3v2,
    /// A recognized audio container
    Container(ContainerKind),
}

/// Identify the container from peeked leading bytes
///
/// The MIME hint only breaks ties (MPEG sync vs. ADTS sync); magic numbers
/// always win.
pub(crate) fn sniff(header: &[u8], mime: Option<&str>) -> Option<Sniffed> {
    use ContainerKind as C;

    if header.starts_with(b"ID3") {
        return Some(Sniffed::Id3v2);
    }

    let magic = [
        (&b"fLaC"[..], C::Flac),
        (&b"OggS"[..], C::Ogg),
        (&b"MPCK"[..], C::Musepack),
        (&b"MP+"[..], C::Musepack),
        (&b"DSD "[..], C::Dsf),
        (&b"FRM8"[..], C::Dsdiff),
        (&b"wvpk"[..], C::Wavpack),
        (&b"APETAGEX"[..], C::Apev2),
    ];
    for (pattern, kind) in magic {
        if header.starts_with(pattern) {
            return Some(Sniffed::Container(kind));
        }
    }

    if header.starts_with(b"RIFF") && header.get(8..12) == Some(b"WAVE") {
        return Some(Sniffed::Container(C::Riff));
    }
    if header.starts_with(b"FORM")
        && matches!(header.get(8..12), Some(b"AIFF") | Some(b"AIFC"))
    {
        return Some(Sniffed::Container(C::Aiff));
    }
    if header.get(4..8) == Some(b"ftyp") {
        return Some(Sniffed::Container(C::Mp4));
    }
    if header.starts_with(&ASF_GUID) {
        return Some(Sniffed::Container(C::Asf));
    }

    // No magic matched; look for an MPEG/ADTS sync word in the window
    if let Some(kind) = sniff_sync(header, mime) {
        return Some(Sniffed::Container(kind));
    }

    None
}

/// Scan for an `0xFFE` sync word and classify it as MPEG audio or ADTS
fn sniff_sync(header: &[u8], mime: Option<&str>) -> Option<ContainerKind> {
    for window in header.windows(2) {
        if window[0] == 0xFF && window[1] & 0xE0 == 0xE0 {
            // the MIME hint is the tiebreaker between the two sync formats
            if let Some(mime) = mime {
                if mime.contains("aac") {
                    return Some(ContainerKind::Adts);
                }
                if mime.contains("mpeg") || mime.contains("mp3") {
                    return Some(ContainerKind::Mpeg);
                }
            }
            // layer bits 00 means ADTS, anything else is MPEG audio
            let layer = (window[1] >> 1) & 0x03;
            return Some(if layer == 0 {
                ContainerKind::Adts
            } else {
                ContainerKind::Mpeg
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_formats() {
        assert_eq!(
            sniff(b"fLaC\0\0\0\x22", None),
            Some(Sniffed::Container(ContainerKind::Flac))
        );
        assert_eq!(
            sniff(b"OggS\0\x02", None),
            Some(Sniffed::Container(ContainerKind::Ogg))
        );
        assert_eq!(
            sniff(b"wvpk\x20\0\0\0", None),
            Some(Sniffed::Container(ContainerKind::Wavpack))
        );
        assert_eq!(
            sniff(b"MP+\x07", None),
            Some(Sniffed::Container(ContainerKind::Musepack))
        );
        assert_eq!(
            sniff(b"APETAGEX\xD0\x07\0\0", None),
            Some(Sniffed::Container(ContainerKind::Apev2))
        );
    }

    #[test]
    fn test_id3_is_an_envelope() {
        assert_eq!(sniff(b"ID3\x04\0\0\0\0\0\0", None), Some(Sniffed::Id3v2));
    }

    #[test]
    fn test_riff_needs_wave_form() {
        assert_eq!(
            sniff(b"RIFF\x24\0\0\0WAVEfmt ", None),
            Some(Sniffed::Container(ContainerKind::Riff))
        );
        assert_eq!(sniff(b"RIFF\x24\0\0\0AVI LIST", None), None);
    }

    #[test]
    fn test_aiff_and_aifc() {
        assert_eq!(
            sniff(b"FORM\0\0\x10\0AIFFCOMM", None),
            Some(Sniffed::Container(ContainerKind::Aiff))
        );
        assert_eq!(
            sniff(b"FORM\0\0\x10\0AIFCCOMM", None),
            Some(Sniffed::Container(ContainerKind::Aiff))
        );
    }

    #[test]
    fn test_mp4_ftyp_at_offset_four() {
        assert_eq!(
            sniff(b"\0\0\0\x20ftypM4A ", None),
            Some(Sniffed::Container(ContainerKind::Mp4))
        );
    }

    #[test]
    fn test_mpeg_sync_with_layer_bits() {
        // MPEG-1 Layer 3: FF FB
        assert_eq!(
            sniff(&[0xFF, 0xFB, 0x90, 0x00], None),
            Some(Sniffed::Container(ContainerKind::Mpeg))
        );
        // ADTS: FF F1 (layer bits 00)
        assert_eq!(
            sniff(&[0xFF, 0xF1, 0x50, 0x80], None),
            Some(Sniffed::Container(ContainerKind::Adts))
        );
    }

    #[test]
    fn test_mime_breaks_sync_tie() {
        assert_eq!(
            sniff(&[0xFF, 0xF1, 0x50, 0x80], Some("audio/mpeg")),
            Some(Sniffed::Container(ContainerKind::Mpeg))
        );
        assert_eq!(
            sniff(&[0xFF, 0xFB, 0x90, 0x00], Some("audio/aac")),
            Some(Sniffed::Container(ContainerKind::Adts))
        );
    }

    #[test]
    fn test_sync_found_mid_window() {
        let mut header = vec![0u8; 100];
        header.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        assert_eq!(
            sniff(&header, None),
            Some(Sniffed::Container(ContainerKind::Mpeg))
        );
    }

    #[test]
    fn test_unknown_bytes() {
        assert_eq!(sniff(b"not audio at all", None), None);
        assert_eq!(sniff(&[], None), None);
    }
}
