//! Resolved media assets.
//!
//! An [`Asset`] is created once by the resolver and never mutated after.
//! Later stages refer to it through its [`AssetId`].

use std::fmt;
use std::path::{Path, PathBuf};

use cutdraft_common::timebase::Micros;
use serde::{Deserialize, Serialize};

/// Identifier assigned in manifest order by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset-{}", self.0)
    }
}

/// Media kind, classified from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Subtitle,
}

impl MediaKind {
    /// Manifest order: videos, audios, images, subtitles.
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::Image,
        MediaKind::Subtitle,
    ];

    /// Lowercase extensions accepted for this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &["mp4", "avi", "mov", "mkv", "webm"],
            MediaKind::Audio => &["mp3", "wav", "aac", "flac"],
            MediaKind::Image => &["jpg", "jpeg", "png", "gif", "bmp"],
            MediaKind::Subtitle => &["srt", "vtt", "ass"],
        }
    }

    /// Classify an extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One timed subtitle line. Timestamps are absolute timeline positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start_micros: Micros,
    pub end_micros: Micros,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start_micros: Micros, end_micros: Micros, text: impl Into<String>) -> Self {
        Self {
            start_micros,
            end_micros,
            text: text.into(),
        }
    }

    pub fn duration_micros(&self) -> Micros {
        self.end_micros.saturating_sub(self.start_micros)
    }
}

/// Portion of the source the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWindow {
    /// Source in-point.
    pub in_micros: Micros,

    /// Requested maximum length (trim for video, display time for images).
    pub duration_micros: Option<Micros>,
}

/// A resolved, metadata-enriched reference to one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub kind: MediaKind,

    /// Absolute, normalized path.
    pub source_path: PathBuf,

    /// Probed duration; for images, the display duration.
    pub duration_micros: Option<Micros>,

    pub width: Option<u32>,
    pub height: Option<u32>,

    /// File name shown in the editor's media panel.
    pub display_name: String,

    /// Codec hint from probing.
    pub codec: Option<String>,

    pub window: SourceWindow,

    /// Parsed cues (subtitle assets only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<SubtitleCue>,
}

impl Asset {
    pub fn display_name_for(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Resolver output, grouped by kind in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAssets {
    pub videos: Vec<Asset>,
    pub audios: Vec<Asset>,
    pub images: Vec<Asset>,
    pub subtitles: Vec<Asset>,
}

impl ResolvedAssets {
    /// Append an asset to the group matching its kind.
    pub fn push(&mut self, asset: Asset) {
        match asset.kind {
            MediaKind::Video => self.videos.push(asset),
            MediaKind::Audio => self.audios.push(asset),
            MediaKind::Image => self.images.push(asset),
            MediaKind::Subtitle => self.subtitles.push(asset),
        }
    }

    /// All assets in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.videos
            .iter()
            .chain(&self.audios)
            .chain(&self.images)
            .chain(&self.subtitles)
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.iter().find(|asset| asset.id == id)
    }

    pub fn len(&self) -> usize {
        self.videos.len() + self.audios.len() + self.images.len() + self.subtitles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: u32, kind: MediaKind, path: &str) -> Asset {
        Asset {
            id: AssetId(id),
            kind,
            source_path: PathBuf::from(path),
            duration_micros: Some(1_000_000),
            width: None,
            height: None,
            display_name: Asset::display_name_for(Path::new(path)),
            codec: None,
            window: SourceWindow::default(),
            cues: vec![],
        }
    }

    #[test]
    fn test_classify_extensions() {
        assert_eq!(MediaKind::from_extension("MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("flac"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension("jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("ass"), Some(MediaKind::Subtitle));
        assert_eq!(MediaKind::from_extension("txt"), None);
        assert_eq!(MediaKind::from_path(Path::new("/a/b/Clip.MoV")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("/a/b/noext")), None);
    }

    #[test]
    fn test_resolved_assets_iterate_in_manifest_order() {
        let mut assets = ResolvedAssets::default();
        assets.push(asset(2, MediaKind::Subtitle, "/s.srt"));
        assets.push(asset(1, MediaKind::Audio, "/a.mp3"));
        assets.push(asset(0, MediaKind::Video, "/v.mp4"));

        let ids: Vec<u32> = assets.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(assets.get(AssetId(1)).unwrap().display_name, "a.mp3");
        assert!(assets.get(AssetId(9)).is_none());
        assert_eq!(assets.len(), 3);
    }

    #[test]
    fn test_asset_id_display() {
        assert_eq!(AssetId(7).to_string(), "asset-7");
    }
}
