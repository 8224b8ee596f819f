//! Audio-format facts

use super::TagSystem;

/// Facts about the audio stream, filled in once per parse
///
/// Fields are set at most once; a conflicting re-assignment keeps the first
/// value and records a warning (see the collector).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatInfo {
    /// Container name, e.g. `FLAC` or `MPEG`
    pub container: Option<String>,
    /// Tag systems found in the file, in discovery order
    pub tag_types: Vec<TagSystem>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Average bitrate in bits per second
    pub bitrate: Option<f64>,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Bits per audio sample
    pub bits_per_sample: Option<u8>,
    /// Channel count
    pub number_of_channels: Option<u8>,
    /// Total number of sample frames
    pub number_of_samples: Option<u64>,
    /// Codec name, e.g. `MPEG 1 Layer 3`
    pub codec: Option<String>,
    /// Codec profile, e.g. `CBR` or `V2`
    pub codec_profile: Option<String>,
    /// Encoder identification, e.g. `LAME 3.99r`
    pub tool: Option<String>,
    /// Whether the codec is lossless
    pub lossless: Option<bool>,
    /// MD5 of the decoded audio stream, when the container carries one
    pub audio_md5: Option<[u8; 16]>,
}

impl FormatInfo {
    /// Record a tag system, preserving discovery order without duplicates
    pub(crate) fn add_tag_type(&mut self, system: TagSystem) -> bool {
        if self.tag_types.contains(&system) {
            false
        } else {
            self.tag_types.push(system);
            true
        }
    }
}
