//! Engine configuration.
//!
//! Every field has a default so a partial `config.json` is valid; request
//! level overrides are merged on top by the effect resolver.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::timebase::{Micros, MICROS_PER_SECOND};

/// Global engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where generated drafts land when the request leaves `outputPath` empty.
    pub output: OutputDefaults,

    /// Media probing.
    pub probe: ProbeSettings,

    /// Timeline layout limits and defaults.
    pub layout: LayoutDefaults,

    /// Default effect parameters.
    pub effects: EffectDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Output location defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputDefaults {
    /// Directory used when the request has no output path.
    pub default_dir: PathBuf,

    /// Extension appended when the output path has none.
    pub extension: String,
}

/// Media probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// `ffprobe` binary (looked up on PATH when relative).
    pub ffprobe_path: PathBuf,

    /// Maximum concurrent probes; 0 means one per available core.
    pub workers: usize,
}

/// Layout defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDefaults {
    /// Display duration for images without a caller-supplied one.
    pub default_image_duration_micros: Micros,

    /// Sanity cap on the total timeline length.
    pub max_total_duration_micros: Micros,

    /// Optional cap on every video segment's length.
    pub max_clip_micros: Option<Micros>,

    /// Most segments the background music track may be split into.
    pub max_audio_segments: usize,
}

/// Default effect parameters, overridable per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDefaults {
    /// Transition inserted at internal video boundaries.
    pub transition_kind: String,

    /// Transition length before frame snapping and clamping.
    pub transition_duration_ms: u64,

    /// Filters assigned round-robin to video segments.
    pub filter_palette: Vec<String>,

    /// Filter strength in `[0, 100]`.
    pub filter_intensity: u32,

    /// Style attached to every subtitle cue.
    pub subtitle: SubtitleStyle,
}

/// Text style for subtitle cues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font: String,

    /// Font size in editor units, `(0, 100]`.
    pub size: f64,

    /// RGB, each component in `[0.0, 1.0]`.
    pub color: [f64; 3],

    /// Vertical placement, `-1.0` (bottom) to `1.0` (top).
    pub position_y: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cutdraft=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for OutputDefaults {
    fn default() -> Self {
        Self {
            default_dir: home_dir().join("Desktop"),
            extension: "veproj".to_string(),
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
            workers: 0,
        }
    }
}

impl ProbeSettings {
    /// Effective probe concurrency.
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            default_image_duration_micros: 3 * MICROS_PER_SECOND,
            max_total_duration_micros: 24 * 3600 * MICROS_PER_SECOND,
            max_clip_micros: None,
            max_audio_segments: 10_000,
        }
    }
}

impl Default for EffectDefaults {
    fn default() -> Self {
        Self {
            transition_kind: "dissolve".to_string(),
            transition_duration_ms: 500,
            filter_palette: vec![
                "natural".to_string(),
                "warm".to_string(),
                "cool".to_string(),
                "vivid".to_string(),
            ],
            filter_intensity: 60,
            subtitle: SubtitleStyle::default(),
        }
    }
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "System".to_string(),
            size: 5.0,
            color: [1.0, 1.0, 1.0],
            position_y: -0.8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {:#}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit file.
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("cutdraft").join("config.json")
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
}
