//! Error types shared across cutdraft crates.
//!
//! Each pipeline stage has its own error family. [`DraftError`] wraps them
//! so a whole generation request can be reported with a single
//! `errorKind` string (`<Family>.<CODE>`).

use std::fmt;
use std::path::PathBuf;

/// Why an asset could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetErrorKind {
    /// The path does not exist or cannot be opened for reading.
    Unreadable,
    /// The extension is not in the allow-list for the manifest slot.
    Unsupported,
    /// Metadata probing or subtitle parsing failed.
    Corrupt,
}

impl AssetErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            AssetErrorKind::Unreadable => "UNREADABLE",
            AssetErrorKind::Unsupported => "UNSUPPORTED",
            AssetErrorKind::Corrupt => "CORRUPT",
        }
    }
}

impl fmt::Display for AssetErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Per-asset failure raised by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} asset {}: {message}", path.display())]
pub struct AssetError {
    pub kind: AssetErrorKind,
    pub path: PathBuf,
    pub message: String,
}

impl AssetError {
    pub fn unreadable(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self {
            kind: AssetErrorKind::Unreadable,
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn unsupported(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self {
            kind: AssetErrorKind::Unsupported,
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self {
            kind: AssetErrorKind::Corrupt,
            path: path.into(),
            message: msg.into(),
        }
    }
}

/// Structural failures of the timeline as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("At least one video asset is required")]
    EmptyVideoTrack,

    #[error("Total duration {total_micros}us exceeds the cap of {cap_micros}us")]
    DurationOverflow { total_micros: u64, cap_micros: u64 },

    #[error("Trim leaves no media for {}", path.display())]
    EmptySegment { path: PathBuf },
}

impl LayoutError {
    pub fn code(&self) -> &'static str {
        match self {
            LayoutError::EmptyVideoTrack => "EMPTY_VIDEO_TRACK",
            LayoutError::DurationOverflow { .. } => "DURATION_OVERFLOW",
            LayoutError::EmptySegment { .. } => "EMPTY_SEGMENT",
        }
    }
}

/// Effect configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("Invalid effect parameter {name}={value} (expected {expected})")]
    InvalidParameter {
        name: String,
        value: String,
        expected: String,
    },
}

impl EffectError {
    pub fn invalid(
        name: impl Into<String>,
        value: impl fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EffectError::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }
}

/// Terminal I/O failures of the project writer.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Cannot write project file at {}: {source}", path.display())]
    PathNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Disk full while writing {}", path.display())]
    DiskFull { path: PathBuf },

    #[error("Failed to encode draft document: {0}")]
    EncodeFailure(#[source] serde_json::Error),
}

impl WriteError {
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::PathNotWritable { .. } => "PATH_NOT_WRITABLE",
            WriteError::DiskFull { .. } => "DISK_FULL",
            WriteError::EncodeFailure(_) => "ENCODE_FAILURE",
        }
    }
}

/// Top-level error type for one generation request.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Invalid request: {message}")]
    Request { message: String },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Generation cancelled before {stage}")]
    Cancelled { stage: String },

    /// An upstream stage broke a timeline invariant. Never user-correctable.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias using DraftError.
pub type DraftResult<T> = Result<T, DraftError>;

impl DraftError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request {
            message: msg.into(),
        }
    }

    pub fn cancelled(stage: impl Into<String>) -> Self {
        Self::Cancelled {
            stage: stage.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }

    /// The `errorKind` reported to the caller, e.g. `AssetError.UNREADABLE`.
    pub fn error_kind(&self) -> String {
        match self {
            DraftError::Request { .. } => "RequestError.INVALID_REQUEST".to_string(),
            DraftError::Asset(e) => format!("AssetError.{}", e.kind.code()),
            DraftError::Layout(e) => format!("LayoutError.{}", e.code()),
            DraftError::Effect(e) => format!("EffectError.{}", e.code()),
            DraftError::Write(e) => format!("WriteError.{}", e.code()),
            DraftError::Cancelled { .. } => "Cancelled.CANCELLED".to_string(),
            DraftError::Internal { .. } => "InternalError.INTERNAL".to_string(),
        }
    }

    /// Whether fixing the request inputs can make a resubmission succeed.
    pub fn is_user_correctable(&self) -> bool {
        !matches!(self, DraftError::Internal { .. } | DraftError::Cancelled { .. })
    }
}
