//! cutdraft Asset Resolver
//!
//! Turns the user's manifest into immutable [`Asset`] values:
//! - **Validation:** Every path must exist and be readable
//! - **Classification:** Media kind from the extension allow-list
//! - **Probing:** Duration, dimensions, and codec via ffprobe / image headers
//! - **Subtitles:** SRT, WebVTT, and ASS files parsed into cue lists
//!
//! Probes run concurrently on the blocking pool; results are always
//! returned in manifest order.
//!
//! [`Asset`]: cutdraft_project_model::Asset

pub mod probe;
pub mod resolver;
pub mod subtitles;

pub use probe::{MediaProbe, ProbeError, ProbeReport, SystemProbe};
pub use resolver::{AssetResolver, ResolverSettings};
pub use subtitles::{parse_subtitles, SubtitleFormat, SubtitleParseError};
