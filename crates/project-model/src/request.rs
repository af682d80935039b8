//! Request and response contract between the UI and the engine.
//!
//! Field names follow the UI's camelCase JSON. Unknown fields (the UI
//! attaches `name` and `type` to file entries) are ignored.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use cutdraft_common::error::{DraftError, DraftResult};
use serde::{Deserialize, Serialize};

use crate::asset::MediaKind;

/// Highest frame rate a request may ask for.
pub const MAX_FPS: u32 = 1000;

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRequest {
    pub files: FileManifest,
    pub config: ProjectConfig,

    /// ISO-8601 creation time stamped by the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// User-selected files, grouped by kind. Order is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileManifest {
    pub videos: Vec<FileEntry>,
    pub audios: Vec<FileEntry>,
    pub images: Vec<FileEntry>,
    pub subtitles: Vec<FileEntry>,
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: PathBuf,

    /// Source in-point (videos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,

    /// Trim length (videos) or display duration (images).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Editing preferences captured when the user pressed "generate".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default)]
    pub auto_subtitle: bool,

    #[serde(default)]
    pub background_music: bool,

    #[serde(default)]
    pub transitions: bool,

    #[serde(default)]
    pub filters: bool,

    /// Empty means "use the configured default directory".
    #[serde(default)]
    pub output_path: PathBuf,

    #[serde(default)]
    pub effects: EffectOverrides,
}

/// Per-request overrides of the engine's effect defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EffectOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_palette: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_intensity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_color: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_position_y: Option<f64>,
}

/// Canvas size, written as `"WxH"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Editor aspect label, e.g. `"9:16"`.
    pub fn ratio_label(&self) -> String {
        let g = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / g, self.height / g)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1080, 1920)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("resolution {s:?} is not WxH"))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("resolution width {w:?} is not a positive integer"))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("resolution height {h:?} is not a positive integer"))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution {s:?} has a zero dimension"));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn default_title() -> String {
    "Untitled Project".to_string()
}

fn default_fps() -> u32 {
    30
}

impl FileManifest {
    pub fn entries_of(&self, kind: MediaKind) -> &[FileEntry] {
        match kind {
            MediaKind::Video => &self.videos,
            MediaKind::Audio => &self.audios,
            MediaKind::Image => &self.images,
            MediaKind::Subtitle => &self.subtitles,
        }
    }

    /// Every entry tagged with the slot it was listed in, in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = (MediaKind, &FileEntry)> {
        MediaKind::ALL
            .into_iter()
            .flat_map(move |kind| self.entries_of(kind).iter().map(move |e| (kind, e)))
    }

    pub fn len(&self) -> usize {
        self.videos.len() + self.audios.len() + self.images.len() + self.subtitles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_ms: None,
            duration_ms: None,
        }
    }

    pub fn with_start_ms(mut self, start_ms: u64) -> Self {
        self.start_ms = Some(start_ms);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            resolution: Resolution::default(),
            fps: default_fps(),
            auto_subtitle: false,
            background_music: false,
            transitions: false,
            filters: false,
            output_path: PathBuf::new(),
            effects: EffectOverrides::default(),
        }
    }
}

impl DraftRequest {
    /// Start building a request the way the UI accumulates its state.
    pub fn builder(title: impl Into<String>) -> DraftRequestBuilder {
        DraftRequestBuilder::new(title)
    }

    /// Parse the JSON request argument.
    pub fn from_json(raw: &str) -> DraftResult<Self> {
        let request: Self = serde_json::from_str(raw)
            .map_err(|e| DraftError::request(format!("malformed request JSON: {e}")))?;
        request.validate()?;
        Ok(request)
    }

    /// Checks that serde cannot express.
    pub fn validate(&self) -> DraftResult<()> {
        let Resolution { width, height } = self.config.resolution;
        if width == 0 || height == 0 {
            return Err(DraftError::request(format!(
                "resolution {width}x{height} must have positive dimensions"
            )));
        }
        if self.config.fps == 0 || self.config.fps > MAX_FPS {
            return Err(DraftError::request(format!(
                "fps must be between 1 and {MAX_FPS}, got {}",
                self.config.fps
            )));
        }
        if self.config.title.trim().is_empty() {
            return Err(DraftError::request("title must not be empty"));
        }
        self.created_at()?;
        Ok(())
    }

    /// Parsed creation timestamp, if the caller supplied one.
    pub fn created_at(&self) -> DraftResult<Option<DateTime<Utc>>> {
        match &self.timestamp {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(|e| DraftError::request(format!("timestamp {raw:?} is not ISO-8601: {e}"))),
        }
    }
}

/// Accumulates immutable entries and settings before a single build.
#[derive(Debug, Clone)]
pub struct DraftRequestBuilder {
    files: FileManifest,
    config: ProjectConfig,
    timestamp: Option<String>,
}

impl DraftRequestBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            files: FileManifest::default(),
            config: ProjectConfig {
                title: title.into(),
                ..ProjectConfig::default()
            },
            timestamp: None,
        }
    }

    pub fn video(mut self, entry: FileEntry) -> Self {
        self.files.videos.push(entry);
        self
    }

    pub fn audio(mut self, entry: FileEntry) -> Self {
        self.files.audios.push(entry);
        self
    }

    pub fn image(mut self, entry: FileEntry) -> Self {
        self.files.images.push(entry);
        self
    }

    pub fn subtitle(mut self, entry: FileEntry) -> Self {
        self.files.subtitles.push(entry);
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.config.resolution = Resolution::new(width, height);
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.config.fps = fps;
        self
    }

    pub fn auto_subtitle(mut self, enabled: bool) -> Self {
        self.config.auto_subtitle = enabled;
        self
    }

    pub fn background_music(mut self, enabled: bool) -> Self {
        self.config.background_music = enabled;
        self
    }

    pub fn transitions(mut self, enabled: bool) -> Self {
        self.config.transitions = enabled;
        self
    }

    pub fn filters(mut self, enabled: bool) -> Self {
        self.config.filters = enabled;
        self
    }

    pub fn effects(mut self, overrides: EffectOverrides) -> Self {
        self.config.effects = overrides;
        self
    }

    pub fn output_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.output_path = path.as_ref().to_path_buf();
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn build(self) -> DraftRequest {
        DraftRequest {
            files: self.files,
            config: self.config,
            timestamp: self.timestamp,
        }
    }
}

/// The single JSON object written back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftResponse {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    /// Segments on the primary video track.
    pub segments: usize,
    pub output_path: String,
    pub duration_micros: u64,
    pub resolution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub success: bool,
    pub error_kind: String,
    pub message: String,
}

impl DraftResponse {
    pub fn success(
        segments: usize,
        output_path: &Path,
        duration_micros: u64,
        resolution: Resolution,
    ) -> Self {
        Self::Success(SuccessResponse {
            success: true,
            segments,
            output_path: output_path.display().to_string(),
            duration_micros,
            resolution: resolution.to_string(),
        })
    }

    pub fn failure(error_kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure(FailureResponse {
            success: false,
            error_kind: error_kind.into(),
            message: message.into(),
        })
    }

    pub fn from_error(err: &DraftError) -> Self {
        Self::failure(err.error_kind(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DraftResponse::Success(_))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"errorKind":"InternalError.INTERNAL","message":"{e}"}}"#)
        })
    }
}
