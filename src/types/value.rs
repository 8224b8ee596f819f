//! Native tag values

/// An embedded picture, typically cover art
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// MIME type of the image data, e.g. `image/jpeg`
    pub mime: String,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// Free-form description, if the tag carried one
    pub description: Option<String>,
    /// Picture type label, e.g. `Cover (front)`
    pub picture_type: Option<String>,
}

impl Picture {
    /// Create a picture with only MIME type and data
    #[must_use]
    pub fn new(mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            data,
            description: None,
            picture_type: None,
        }
    }

    /// Guess the MIME type from the leading bytes of image data
    #[must_use]
    pub fn sniff_mime(data: &[u8]) -> &'static str {
        match data {
            [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
            [0x89, b'P', b'N', b'G', ..] => "image/png",
            [b'G', b'I', b'F', b'8', ..] => "image/gif",
            [b'B', b'M', ..] => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

/// A normalized rating with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    /// Who assigned the rating, e.g. a POPM e-mail address
    pub source: Option<String>,
    /// Rating normalized to the range [0, 1]
    pub rating: f32,
}

/// An index within a known total, e.g. track 3 of 12
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartOf {
    /// Position, 1-based
    pub no: Option<u32>,
    /// Total count, if known
    pub of: Option<u32>,
}

impl PartOf {
    /// Parse a `"3/12"` or `"3"` composite
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.splitn(2, '/');
        let no = parts.next().and_then(|p| p.trim().parse().ok());
        let of = parts.next().and_then(|p| p.trim().parse().ok());
        Self { no, of }
    }

    /// Whether neither position nor total is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.no.is_none() && self.of.is_none()
    }
}

/// A loudness adjustment in both decibel and linear-ratio form
///
/// The two forms are kept mutually consistent: `ratio = 10^(dB/20)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    /// Adjustment in decibels
    pub db: f64,
    /// Equivalent linear ratio
    pub ratio: f64,
}

impl Gain {
    /// Build from a decibel value
    #[must_use]
    pub fn from_db(db: f64) -> Self {
        Self {
            db,
            ratio: 10f64.powf(db / 20.0),
        }
    }

    /// Build from a linear ratio
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        Self {
            db: 20.0 * ratio.log10(),
            ratio,
        }
    }
}

/// The ReplayGain undo pair written by MP3Gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayGainUndo {
    /// Left channel adjustment, in 1.5 dB steps
    pub left_channel_adjustment: i32,
    /// Right channel adjustment, in 1.5 dB steps
    pub right_channel_adjustment: i32,
}

/// The raw value of a native tag
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// UTF-8 text
    Text(String),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Uninterpreted bytes
    Binary(Vec<u8>),
    /// An embedded picture
    Picture(Picture),
    /// A normalized rating
    Rating(Rating),
    /// A pre-split track-of-total or disk-of-total composite
    Parts(PartOf),
}

impl TagValue {
    /// View the value as text, if it is text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce the value to an integer where the representation allows
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }
}

/// A tag exactly as its source system emitted it
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTag {
    /// The system's own identifier, e.g. `TIT2` or `ARTIST`
    pub id: String,
    /// The raw value
    pub value: TagValue,
}

impl NativeTag {
    /// Create a native tag
    #[must_use]
    pub fn new(id: impl Into<String>, value: TagValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }

    /// Create a text tag
    #[must_use]
    pub fn text(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(id, TagValue::Text(value.into()))
    }
}
