//! Draft document schema (`draft_content`, cutdraft schema v1).
//!
//! This is the externally fixed contract read by the editor. Field names
//! and nesting are pinned to one schema version; changing any of them is a
//! compatibility break. Times are integer microseconds.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::timeline::TrackKind;

/// Editor schema version this crate writes.
pub const DRAFT_SCHEMA_VERSION: u32 = 360_000;

/// Editor feature version string paired with [`DRAFT_SCHEMA_VERSION`].
pub const DRAFT_NEW_VERSION: &str = "110.0.0";

/// Root of the draft document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftContent {
    pub id: String,
    pub name: String,

    /// Unix seconds, from the request timestamp.
    pub create_time: i64,
    pub update_time: i64,

    /// Total length in microseconds.
    pub duration: u64,
    pub fps: f64,
    pub canvas_config: CanvasConfig,
    pub materials: Materials,
    pub tracks: Vec<DraftTrack>,
    pub version: u32,
    pub new_version: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub app_source: String,
    pub app_version: String,
}

/// Material tables referenced by segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    pub videos: Vec<VideoMaterial>,
    pub audios: Vec<AudioMaterial>,
    pub texts: Vec<TextMaterial>,
    pub transitions: Vec<TransitionMaterial>,
    pub filters: Vec<FilterMaterial>,
}

/// Video or still-image source (`type` is `video` or `photo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMaterial {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub material_name: String,
    pub duration: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMaterial {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub name: String,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMaterial {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub font: String,
    pub font_size: f64,
    pub text_color: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMaterial {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub duration: u64,
    pub is_overlap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterMaterial {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Strength in `[0.0, 1.0]`.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftTrack {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub attribute: u32,
    pub flag: u32,
    pub segments: Vec<DraftSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timerange {
    pub start: u64,
    pub duration: u64,
}

impl Timerange {
    pub fn end(&self) -> u64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub transform_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSegment {
    pub id: String,
    pub material_id: String,
    pub target_timerange: Timerange,
    pub source_timerange: Option<Timerange>,
    pub extra_material_refs: Vec<String>,
    pub render_index: u32,
    pub speed: f64,
    pub volume: f64,
    pub visible: bool,
    pub clip: Option<Clip>,
}

/// Errors reading a draft file back.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl DraftContent {
    /// Load a draft file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| DocumentError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| DocumentError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn track(&self, kind: TrackKind) -> Option<&DraftTrack> {
        self.tracks.iter().find(|t| t.kind == kind)
    }

    /// Segments on the first track of `kind`.
    pub fn segment_count(&self, kind: TrackKind) -> usize {
        self.track(kind).map(|t| t.segments.len()).unwrap_or(0)
    }

    fn material_ids(&self) -> HashSet<&str> {
        let m = &self.materials;
        m.videos
            .iter()
            .map(|v| v.id.as_str())
            .chain(m.audios.iter().map(|a| a.id.as_str()))
            .chain(m.texts.iter().map(|t| t.id.as_str()))
            .chain(m.transitions.iter().map(|t| t.id.as_str()))
            .chain(m.filters.iter().map(|f| f.id.as_str()))
            .collect()
    }

    /// Every cross-reference that does not resolve, plus duplicate ids.
    /// Empty means the document is self-consistent.
    pub fn dangling_references(&self) -> Vec<String> {
        let materials = self.material_ids();
        let mut problems = vec![];
        let mut seen = HashSet::new();

        let all_ids = self
            .tracks
            .iter()
            .map(|t| t.id.as_str())
            .chain(
                self.tracks
                    .iter()
                    .flat_map(|t| t.segments.iter().map(|s| s.id.as_str())),
            );
        for id in all_ids {
            if !seen.insert(id) || materials.contains(id) {
                problems.push(format!("duplicate id {id}"));
            }
        }

        for track in &self.tracks {
            for segment in &track.segments {
                if !materials.contains(segment.material_id.as_str()) {
                    problems.push(format!(
                        "{} segment {} references missing material {}",
                        track.kind, segment.id, segment.material_id
                    ));
                }
                for extra in &segment.extra_material_refs {
                    if !materials.contains(extra.as_str()) {
                        problems.push(format!(
                            "{} segment {} references missing extra material {extra}",
                            track.kind, segment.id
                        ));
                    }
                }
            }
        }
        problems
    }
}
