//! Parse-state collector
//!
//! One [`Collector`] lives for the duration of a parse. Parsers emit native
//! tags and format facts into it; the mapper folds each native tag into the
//! common view; the observer is notified synchronously on every assignment
//! that changes an observable value.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::mapping;
use crate::options::{ProbeEvent, ProbeOptions};
use crate::types::{CommonMetadata, FormatInfo, NativeTag, TagSystem};

enum Outcome {
    Assigned,
    Conflict(String),
    Unchanged,
}

/// Accumulated state of a running parse
pub(crate) struct Collector {
    pub(crate) opts: ProbeOptions,
    pub(crate) format: FormatInfo,
    pub(crate) common: CommonMetadata,
    pub(crate) native: Vec<(TagSystem, Vec<NativeTag>)>,
    pub(crate) warnings: Vec<String>,
    /// Absolute offset where the audio stream ends, i.e. the source size
    /// minus any trailing tags found by the trailer scanner
    pub(crate) stream_end: Option<u64>,
}

macro_rules! format_setter {
    ($(#[$doc:meta])* $name:ident, $field:ident, $ty:ty) => {
        $(#[$doc])*
        pub(crate) fn $name(&mut self, value: $ty) {
            let outcome = match &self.format.$field {
                None => {
                    self.format.$field = Some(value);
                    Outcome::Assigned
                }
                Some(existing) if *existing != value => Outcome::Conflict(format!(
                    "conflicting {}: kept {:?}, ignored {:?}",
                    stringify!($field),
                    existing,
                    value
                )),
                Some(_) => Outcome::Unchanged,
            };
            self.finish_format(stringify!($field), outcome);
        }
    };
}

impl Collector {
    pub(crate) fn new(opts: ProbeOptions) -> Self {
        Self {
            opts,
            format: FormatInfo::default(),
            common: CommonMetadata::default(),
            native: Vec::new(),
            warnings: Vec::new(),
            stream_end: None,
        }
    }

    /// Record a non-fatal defect
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(path = ?self.opts.path, "{message}");
        self.warnings.push(message);
    }

    /// Append a native tag and fold it into the common view
    pub(crate) fn add_tag(&mut self, system: TagSystem, tag: NativeTag) {
        if self.format.add_tag_type(system) {
            self.notify_format("tag_types");
        }
        match self.native.iter_mut().find(|(s, _)| *s == system) {
            Some((_, tags)) => tags.push(tag.clone()),
            None => self.native.push((system, vec![tag.clone()])),
        }
        mapping::map_tag(self, system, &tag);
    }

    format_setter!(set_duration, duration, f64);
    format_setter!(set_bitrate, bitrate, f64);
    format_setter!(set_sample_rate, sample_rate, u32);
    format_setter!(set_bits_per_sample, bits_per_sample, u8);
    format_setter!(set_channels, number_of_channels, u8);
    format_setter!(set_samples, number_of_samples, u64);
    format_setter!(set_codec_profile, codec_profile, String);
    format_setter!(set_tool, tool, String);
    format_setter!(set_lossless, lossless, bool);
    format_setter!(set_audio_md5, audio_md5, [u8; 16]);

    /// Set the container name, replacing any envelope-level value
    ///
    /// Envelope chaining legitimately re-assigns this field (ID3v2 →
    /// inner container), so it does not follow the write-once rule.
    pub(crate) fn set_container(&mut self, name: &str) {
        if self.format.container.as_deref() != Some(name) {
            self.format.container = Some(name.to_owned());
            self.notify_format("container");
        }
    }

    pub(crate) fn set_codec(&mut self, name: &str) {
        let outcome = match &self.format.codec {
            None => {
                self.format.codec = Some(name.to_owned());
                Outcome::Assigned
            }
            Some(existing) if existing != name => Outcome::Conflict(format!(
                "conflicting codec: kept {existing:?}, ignored {name:?}"
            )),
            Some(_) => Outcome::Unchanged,
        };
        self.finish_format("codec", outcome);
    }

    /// Replace the duration regardless of a previous estimate
    ///
    /// Used when an exact value becomes available (Xing frame count, full
    /// end-of-stream scan) after a header-based estimate was recorded.
    pub(crate) fn override_duration(&mut self, seconds: f64) {
        if self.format.duration != Some(seconds) {
            self.format.duration = Some(seconds);
            self.notify_format("duration");
        }
    }

    /// Derive duration from sample count and rate if both are known
    pub(crate) fn derive_duration(&mut self) {
        if self.format.duration.is_none() {
            if let (Some(samples), Some(rate)) =
                (self.format.number_of_samples, self.format.sample_rate)
            {
                if rate > 0 {
                    #[allow(clippy::cast_precision_loss)]
                    let seconds = samples as f64 / f64::from(rate);
                    self.set_duration(seconds);
                }
            }
        }
    }

    /// First-wins assignment of a scalar common field
    pub(crate) fn set_common_scalar<T: PartialEq + std::fmt::Debug>(
        &mut self,
        field: &'static str,
        slot: fn(&mut CommonMetadata) -> &mut Option<T>,
        value: T,
    ) {
        let slot = slot(&mut self.common);
        let outcome = match slot {
            None => {
                *slot = Some(value);
                Outcome::Assigned
            }
            Some(existing) if *existing != value => Outcome::Conflict(format!(
                "conflicting {field}: kept {existing:?}, ignored {value:?}"
            )),
            Some(_) => Outcome::Unchanged,
        };
        self.finish_common(field, outcome);
    }

    /// Quiet assignment of a scalar common field
    ///
    /// Used for values derived from another field (e.g. year from date),
    /// where a later differing value is not a tag conflict worth warning
    /// about.
    pub(crate) fn fill_common_scalar<T: PartialEq>(
        &mut self,
        field: &'static str,
        slot: fn(&mut CommonMetadata) -> &mut Option<T>,
        value: T,
    ) {
        let slot = slot(&mut self.common);
        if slot.is_none() {
            *slot = Some(value);
            self.notify_common(field);
        }
    }

    /// Merge a track/disk composite, field by field
    pub(crate) fn merge_common_part(
        &mut self,
        field: &'static str,
        slot: fn(&mut CommonMetadata) -> &mut crate::types::PartOf,
        part: crate::types::PartOf,
    ) {
        let existing = slot(&mut self.common);
        let mut assigned = false;
        let mut conflict = None;

        if let Some(no) = part.no {
            match existing.no {
                None => {
                    existing.no = Some(no);
                    assigned = true;
                }
                Some(old) if old != no => {
                    conflict = Some(format!("conflicting {field}.no: kept {old}, ignored {no}"));
                }
                Some(_) => {}
            }
        }
        if let Some(of) = part.of {
            match existing.of {
                None => {
                    existing.of = Some(of);
                    assigned = true;
                }
                Some(old) if old != of => {
                    conflict = Some(format!("conflicting {field}.of: kept {old}, ignored {of}"));
                }
                Some(_) => {}
            }
        }
        if assigned {
            self.notify_common(field);
        }
        if let Some(msg) = conflict {
            self.warn(msg);
        }
    }

    /// Appending assignment of a sequence common field, de-duplicating
    /// exact repeats
    pub(crate) fn push_common_seq<T: PartialEq>(
        &mut self,
        field: &'static str,
        slot: fn(&mut CommonMetadata) -> &mut Vec<T>,
        value: T,
    ) {
        let seq = slot(&mut self.common);
        if seq.contains(&value) {
            return;
        }
        seq.push(value);
        self.notify_common(field);
    }

    fn finish_format(&mut self, field: &'static str, outcome: Outcome) {
        match outcome {
            Outcome::Assigned => self.notify_format(field),
            Outcome::Conflict(msg) => self.warn(msg),
            Outcome::Unchanged => {}
        }
    }

    fn finish_common(&mut self, field: &'static str, outcome: Outcome) {
        match outcome {
            Outcome::Assigned => self.notify_common(field),
            Outcome::Conflict(msg) => self.warn(msg),
            Outcome::Unchanged => {}
        }
    }

    fn notify_format(&mut self, field: &'static str) {
        if let Some(observer) = &mut self.opts.observer {
            let event = ProbeEvent::Format {
                field,
                format: &self.format,
            };
            if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                self.warnings
                    .push(format!("observer panicked on format.{field}"));
            }
        }
    }

    fn notify_common(&mut self, field: &'static str) {
        if let Some(observer) = &mut self.opts.observer {
            let event = ProbeEvent::Common {
                field,
                common: &self.common,
            };
            if catch_unwind(AssertUnwindSafe(|| observer(&event))).is_err() {
                self.warnings
                    .push(format!("observer panicked on common.{field}"));
            }
        }
    }
}
