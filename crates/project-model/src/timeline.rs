//! Timeline skeleton: tracks of timed segments plus their effects.
//!
//! The skeleton is what the planner produces and the effect resolver
//! refines. Identifiers are not assigned here; the serializer does that
//! once the timeline is final.

use std::collections::BTreeMap;
use std::fmt;

use cutdraft_common::timebase::Micros;
use serde::{Deserialize, Serialize};

use crate::asset::AssetId;

/// What a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
    Effect,
}

impl TrackKind {
    pub fn label(self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
            TrackKind::Effect => "effect",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Effect family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Transition,
    Filter,
    SubtitleStyle,
}

/// A named numeric or string effect parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Number(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Int(value.min(i64::MAX as u64) as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// A parameterized transformation attached to a segment.
///
/// Transitions sit on the outgoing segment of the boundary they cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub kind: EffectKind,
    pub name: String,
    pub params: BTreeMap<String, ParamValue>,
}

impl EffectDescriptor {
    pub fn new(kind: EffectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }
}

/// A placed, timed reference to part of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// `None` for generated content (filters).
    pub asset_id: Option<AssetId>,

    pub timeline_start_micros: Micros,
    pub timeline_duration_micros: Micros,

    /// Offset into the source media where playback starts.
    pub source_in_micros: Micros,

    pub effects: Vec<EffectDescriptor>,

    /// Cue text (text track only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Segment {
    pub fn for_asset(asset_id: AssetId, start: Micros, duration: Micros, source_in: Micros) -> Self {
        Self {
            asset_id: Some(asset_id),
            timeline_start_micros: start,
            timeline_duration_micros: duration,
            source_in_micros: source_in,
            effects: vec![],
            text: None,
        }
    }

    pub fn generated(start: Micros, duration: Micros) -> Self {
        Self {
            asset_id: None,
            timeline_start_micros: start,
            timeline_duration_micros: duration,
            source_in_micros: 0,
            effects: vec![],
            text: None,
        }
    }

    pub fn end_micros(&self) -> Micros {
        self.timeline_start_micros + self.timeline_duration_micros
    }

    pub fn effects_of(&self, kind: EffectKind) -> impl Iterator<Item = &EffectDescriptor> {
        self.effects.iter().filter(move |e| e.kind == kind)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects_of(kind).next().is_some()
    }
}

/// Ordered, non-overlapping segments of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub kind: TrackKind,
    pub segments: Vec<Segment>,
}

/// A broken track invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineViolation {
    #[error("{track} track segment {index} has zero duration")]
    ZeroDuration { track: TrackKind, index: usize },

    #[error("{track} track segment {index} starts at {start}us before previous end {prev_end}us")]
    Overlap {
        track: TrackKind,
        index: usize,
        prev_end: Micros,
        start: Micros,
    },

    #[error("timeline has {count} video tracks, expected exactly one")]
    VideoTrackCount { count: usize },
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            segments: vec![],
        }
    }

    /// End of the last segment, 0 when empty.
    pub fn end_micros(&self) -> Micros {
        self.segments.last().map(Segment::end_micros).unwrap_or(0)
    }

    /// Drop everything at or past `end` and shorten the segment that
    /// straddles it.
    pub fn truncate_to(&mut self, end: Micros) {
        self.segments.retain(|s| s.timeline_start_micros < end);
        if let Some(last) = self.segments.last_mut() {
            if last.end_micros() > end {
                last.timeline_duration_micros = end - last.timeline_start_micros;
            }
        }
    }

    /// Sorted, non-overlapping, positive durations.
    pub fn validate(&self) -> Result<(), TimelineViolation> {
        let mut prev_end = 0;
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.timeline_duration_micros == 0 {
                return Err(TimelineViolation::ZeroDuration {
                    track: self.kind,
                    index,
                });
            }
            if segment.timeline_start_micros < prev_end {
                return Err(TimelineViolation::Overlap {
                    track: self.kind,
                    index,
                    prev_end,
                    start: segment.timeline_start_micros,
                });
            }
            prev_end = segment.end_micros();
        }
        Ok(())
    }

    /// Whether segments tile `[0, end)` with no gaps.
    pub fn is_gapless(&self) -> bool {
        let mut cursor = 0;
        for segment in &self.segments {
            if segment.timeline_start_micros != cursor {
                return false;
            }
            cursor = segment.end_micros();
        }
        true
    }
}

/// The planned multi-track timeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineSkeleton {
    pub tracks: Vec<Track>,
}

impl TimelineSkeleton {
    pub fn track(&self, kind: TrackKind) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind == kind)
    }

    pub fn track_mut(&mut self, kind: TrackKind) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.kind == kind)
    }

    /// The primary video track, if planned.
    pub fn video_track(&self) -> Option<&Track> {
        self.track(TrackKind::Video)
    }

    /// Total length, defined by the primary video track.
    pub fn duration_micros(&self) -> Micros {
        self.video_track().map(Track::end_micros).unwrap_or(0)
    }

    pub fn segment_count(&self) -> usize {
        self.tracks.iter().map(|t| t.segments.len()).sum()
    }

    pub fn validate(&self) -> Result<(), TimelineViolation> {
        let count = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Video)
            .count();
        if count != 1 {
            return Err(TimelineViolation::VideoTrackCount { count });
        }
        self.tracks.iter().try_for_each(Track::validate)
    }
}
