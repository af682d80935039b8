//! Media metadata probing.
//!
//! [`SystemProbe`] shells out to `ffprobe` for audio/video containers and
//! reads image headers directly. Tests substitute their own
//! [`MediaProbe`] implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use cutdraft_common::timebase::{parse_decimal_seconds, Micros};
use cutdraft_project_model::asset::MediaKind;
use serde::Deserialize;

/// Metadata extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub duration_micros: Option<Micros>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
}

/// Probe failures. All of them surface as `AssetError{CORRUPT}`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("unusable probe output: {0}")]
    Parse(String),

    #[error("unreadable image header: {0}")]
    Image(String),
}

/// Read-only metadata source. Must be safe to call from many threads.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path, kind: MediaKind) -> Result<ProbeReport, ProbeError>;

    /// Backend name for logs.
    fn name(&self) -> &str;
}

/// ffprobe for containers, header decoding for images.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    ffprobe: PathBuf,
}

impl SystemProbe {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    /// Whether the configured ffprobe binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.ffprobe)
            .arg("-version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn run_ffprobe(&self, path: &Path, kind: MediaKind) -> Result<ProbeReport, ProbeError> {
        let binary = self.ffprobe.display().to_string();
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=codec_type,codec_name,width,height,duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| ProbeError::Spawn {
                binary: binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                binary,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_json(&raw, kind)
    }
}

impl MediaProbe for SystemProbe {
    fn probe(&self, path: &Path, kind: MediaKind) -> Result<ProbeReport, ProbeError> {
        match kind {
            MediaKind::Video | MediaKind::Audio => self.run_ffprobe(path, kind),
            MediaKind::Image => probe_image_header(path),
            MediaKind::Subtitle => Ok(ProbeReport::default()),
        }
    }

    fn name(&self) -> &str {
        "ffprobe"
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Interpret `ffprobe -of json` output for a file expected to be `kind`.
pub fn parse_ffprobe_json(raw: &str, kind: MediaKind) -> Result<ProbeReport, ProbeError> {
    let parsed: FfprobeOutput =
        serde_json::from_str(raw).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let wanted = kind.label();
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some(wanted))
        .ok_or_else(|| ProbeError::Parse(format!("no {wanted} stream found")))?;

    let duration_micros = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(parse_decimal_seconds)
        .or_else(|| stream.duration.as_deref().and_then(parse_decimal_seconds));

    let (width, height) = match kind {
        MediaKind::Video => (stream.width, stream.height),
        _ => (None, None),
    };

    Ok(ProbeReport {
        duration_micros,
        width,
        height,
        codec: stream.codec_name.clone(),
    })
}

fn probe_image_header(path: &Path) -> Result<ProbeReport, ProbeError> {
    let (width, height) =
        image::image_dimensions(path).map_err(|e| ProbeError::Image(e.to_string()))?;
    let codec = image::ImageFormat::from_path(path)
        .ok()
        .map(|f| format!("{f:?}").to_ascii_lowercase());
    Ok(ProbeReport {
        duration_micros: None,
        width: Some(width),
        height: Some(height),
        codec,
    })
}
