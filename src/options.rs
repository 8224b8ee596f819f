//! Parse options

use std::fmt;
use std::path::PathBuf;

use crate::types::{CommonMetadata, FormatInfo};

/// An incremental notification emitted while a parse is running
///
/// Events fire each time a common or format field is first populated or
/// replaced, in assignment order, carrying a snapshot of the view so far.
#[derive(Debug)]
pub enum ProbeEvent<'a> {
    /// A format fact was assigned
    Format {
        /// Name of the assigned field, e.g. `sampleRate`
        field: &'static str,
        /// The format facts after the assignment
        format: &'a FormatInfo,
    },
    /// A common-view field was assigned
    Common {
        /// Name of the assigned field, e.g. `title`
        field: &'static str,
        /// The common view after the assignment
        common: &'a CommonMetadata,
    },
}

/// Event sink invoked synchronously during a parse
pub type Observer = Box<dyn FnMut(&ProbeEvent<'_>) + Send>;

/// Options controlling a single parse
#[derive(Default)]
pub struct ProbeOptions {
    /// File path, used only for diagnostics
    pub path: Option<PathBuf>,
    /// Override the tokenizer size when the stream lacks one
    pub file_size: Option<u64>,
    /// Include the native tag view in the result (default false)
    pub native: bool,
    /// Scan to the end to compute duration when headers lack frame counts
    /// (default false)
    pub duration: bool,
    /// Drop picture payloads while still advancing over them (default false)
    pub skip_covers: bool,
    /// Do not scan past the main headers for trailing tags (default false)
    pub skip_post_headers: bool,
    /// Event sink for incremental field assignments
    pub observer: Option<Observer>,
    /// Byte offset of an APEv2 footer
    ///
    /// Normally filled in by the trailer scanner; a caller-supplied value
    /// wins over the scanned one.
    pub ape_offset: Option<u64>,
}

impl ProbeOptions {
    /// Create options with all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic file path
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the source size
    #[must_use]
    pub fn file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// Include the native tag view in the result
    #[must_use]
    pub fn native(mut self, native: bool) -> Self {
        self.native = native;
        self
    }

    /// Scan to the end of the audio stream for an exact duration
    #[must_use]
    pub fn duration(mut self, duration: bool) -> Self {
        self.duration = duration;
        self
    }

    /// Drop picture payloads
    #[must_use]
    pub fn skip_covers(mut self, skip: bool) -> Self {
        self.skip_covers = skip;
        self
    }

    /// Do not scan past the main headers for trailing tags
    #[must_use]
    pub fn skip_post_headers(mut self, skip: bool) -> Self {
        self.skip_post_headers = skip;
        self
    }

    /// Attach an observer for incremental field assignments
    #[must_use]
    pub fn observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Supply the byte offset of an APEv2 footer
    #[must_use]
    pub fn ape_offset(mut self, offset: u64) -> Self {
        self.ape_offset = Some(offset);
        self
    }
}

impl fmt::Debug for ProbeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeOptions")
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .field("native", &self.native)
            .field("duration", &self.duration)
            .field("skip_covers", &self.skip_covers)
            .field("skip_post_headers", &self.skip_post_headers)
            .field("observer", &self.observer.as_ref().map(|_| "<fn>"))
            .field("ape_offset", &self.ape_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let opts = ProbeOptions::new();
        assert!(!opts.native);
        assert!(!opts.duration);
        assert!(!opts.skip_covers);
        assert!(!opts.skip_post_headers);
        assert!(opts.ape_offset.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let opts = ProbeOptions::new()
            .native(true)
            .skip_covers(true)
            .file_size(1024)
            .ape_offset(512);
        assert!(opts.native);
        assert!(opts.skip_covers);
        assert_eq!(opts.file_size, Some(1024));
        assert_eq!(opts.ape_offset, Some(512));
    }

    #[test]
    fn test_debug_skips_observer_body() {
        let opts = ProbeOptions::new().observer(Box::new(|_| {}));
        let dbg = format!("{opts:?}");
        assert!(dbg.contains("<fn>"));
    }
}
