//! Manifest to [`ResolvedAssets`].
//!
//! Each manifest entry is checked, classified, and probed on tokio's
//! blocking pool with a bounded number of probes in flight. Results are
//! put back into manifest order before anything is returned, so asset ids
//! and error reporting never depend on which probe finished first.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cutdraft_common::cancel::CancelFlag;
use cutdraft_common::config::EngineConfig;
use cutdraft_common::error::{AssetError, DraftError, DraftResult};
use cutdraft_common::timebase::{ms_to_micros, Micros};
use cutdraft_project_model::asset::{Asset, AssetId, MediaKind, ResolvedAssets, SourceWindow};
use cutdraft_project_model::request::{FileEntry, FileManifest};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::probe::MediaProbe;
use crate::subtitles::{parse_subtitles, SubtitleFormat};

const STAGE: &str = "asset resolution";

/// How often the cancel flag is polled while probes are running.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Resolver tuning taken from the engine config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Display duration for images without `durationMs`.
    pub default_image_duration_micros: Micros,

    /// Maximum probes in flight.
    pub workers: usize,
}

impl ResolverSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            default_image_duration_micros: config.layout.default_image_duration_micros,
            workers: config.probe.worker_count(),
        }
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Resolves a manifest into immutable assets.
#[derive(Clone)]
pub struct AssetResolver {
    probe: Arc<dyn MediaProbe>,
    settings: ResolverSettings,
}

impl AssetResolver {
    pub fn new(probe: Arc<dyn MediaProbe>, settings: ResolverSettings) -> Self {
        Self { probe, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve every entry. The first failing entry in manifest order
    /// decides the reported error.
    pub async fn resolve(
        &self,
        manifest: &FileManifest,
        cancel: &CancelFlag,
    ) -> DraftResult<ResolvedAssets> {
        cancel.check(STAGE)?;

        let entries: Vec<(MediaKind, FileEntry)> = manifest
            .entries()
            .map(|(kind, entry)| (kind, entry.clone()))
            .collect();
        let total = entries.len();
        tracing::info!(
            assets = total,
            workers = self.settings.workers,
            probe = self.probe.name(),
            "Resolving assets"
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.workers.max(1)));
        let mut tasks = JoinSet::new();
        for (index, (kind, entry)) in entries.into_iter().enumerate() {
            let probe = Arc::clone(&self.probe);
            let semaphore = Arc::clone(&semaphore);
            let image_default = self.settings.default_image_duration_micros;
            let id = AssetId(index as u32);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let joined = tokio::task::spawn_blocking(move || {
                    resolve_entry(probe.as_ref(), kind, &entry, id, image_default)
                })
                .await;
                (index, joined)
            });
        }

        let mut slots: Vec<Option<Result<Asset, AssetError>>> = (0..total).map(|_| None).collect();
        loop {
            tokio::select! {
                joined = tasks.join_next() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    let (index, outcome) = joined
                        .map_err(|e| DraftError::internal(format!("probe task failed: {e}")))?;
                    let outcome = outcome
                        .map_err(|e| DraftError::internal(format!("probe worker failed: {e}")))?;
                    slots[index] = Some(outcome);
                }
                _ = tokio::time::sleep(CANCEL_POLL_INTERVAL) => {
                    if cancel.is_cancelled() {
                        tasks.abort_all();
                        cancel.check(STAGE)?;
                    }
                }
            }
        }

        let mut resolved = ResolvedAssets::default();
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(Ok(asset)) => resolved.push(asset),
                Some(Err(err)) => {
                    tracing::warn!(index, path = %err.path.display(), code = err.kind.code(), "Asset rejected");
                    return Err(err.into());
                }
                None => {
                    return Err(DraftError::internal(format!(
                        "no probe result for manifest entry {index}"
                    )))
                }
            }
        }

        tracing::info!(
            videos = resolved.videos.len(),
            audios = resolved.audios.len(),
            images = resolved.images.len(),
            subtitles = resolved.subtitles.len(),
            "Assets resolved"
        );
        Ok(resolved)
    }
}

/// Check, classify, and probe one manifest entry.
pub fn resolve_entry(
    probe: &dyn MediaProbe,
    slot: MediaKind,
    entry: &FileEntry,
    id: AssetId,
    default_image_duration_micros: Micros,
) -> Result<Asset, AssetError> {
    let path = entry.path.as_path();
    let source_path = check_readable(path)?;

    let kind = MediaKind::from_path(&source_path).ok_or_else(|| {
        AssetError::unsupported(path, "extension is not a supported media type")
    })?;
    if kind != slot {
        return Err(AssetError::unsupported(
            path,
            format!("{kind} file listed under {slot} files"),
        ));
    }

    let window = SourceWindow {
        in_micros: entry
            .start_ms
            .map(|ms| ms_to_micros(ms).unwrap_or(Micros::MAX))
            .unwrap_or(0),
        duration_micros: entry
            .duration_ms
            .map(|ms| ms_to_micros(ms).unwrap_or(Micros::MAX)),
    };

    let mut asset = Asset {
        id,
        kind,
        display_name: Asset::display_name_for(&source_path),
        source_path,
        duration_micros: None,
        width: None,
        height: None,
        codec: None,
        window,
        cues: vec![],
    };

    match kind {
        MediaKind::Video | MediaKind::Audio => {
            let report = probe
                .probe(&asset.source_path, kind)
                .map_err(|e| AssetError::corrupt(path, e.to_string()))?;
            match report.duration_micros {
                Some(d) if d > 0 => asset.duration_micros = Some(d),
                _ => return Err(AssetError::corrupt(path, "media reports no duration")),
            }
            asset.width = report.width;
            asset.height = report.height;
            asset.codec = report.codec;
        }
        MediaKind::Image => {
            let report = probe
                .probe(&asset.source_path, kind)
                .map_err(|e| AssetError::corrupt(path, e.to_string()))?;
            asset.duration_micros = Some(
                window
                    .duration_micros
                    .unwrap_or(default_image_duration_micros),
            );
            asset.width = report.width;
            asset.height = report.height;
            asset.codec = report.codec;
        }
        MediaKind::Subtitle => {
            asset.cues = load_cues(path, &asset.source_path)?;
            asset.duration_micros = asset.cues.iter().map(|c| c.end_micros).max();
            asset.codec = asset
                .source_path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase());
        }
    }

    tracing::debug!(
        id = %asset.id,
        kind = %asset.kind,
        path = %asset.source_path.display(),
        duration_micros = ?asset.duration_micros,
        "Resolved asset"
    );
    Ok(asset)
}

/// Normalize the path and confirm it is a readable regular file.
fn check_readable(path: &Path) -> Result<std::path::PathBuf, AssetError> {
    let canonical = std::fs::canonicalize(path)
        .map_err(|e| AssetError::unreadable(path, e.to_string()))?;
    if canonical.is_dir() {
        return Err(AssetError::unreadable(path, "path is a directory"));
    }
    std::fs::File::open(&canonical).map_err(|e| AssetError::unreadable(path, e.to_string()))?;
    Ok(canonical)
}

fn load_cues(
    path: &Path,
    source_path: &Path,
) -> Result<Vec<cutdraft_project_model::asset::SubtitleCue>, AssetError> {
    let format = SubtitleFormat::from_path(source_path)
        .ok_or_else(|| AssetError::unsupported(path, "unknown subtitle format"))?;
    let content = std::fs::read_to_string(source_path)
        .map_err(|e| AssetError::corrupt(path, format!("subtitle is not readable text: {e}")))?;
    parse_subtitles(&content, format)
        .map_err(|e| AssetError::corrupt(path, format!("subtitle parse failed at {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, ProbeReport};
    use cutdraft_common::error::AssetErrorKind;

    struct FixedProbe(Option<Micros>);

    impl MediaProbe for FixedProbe {
        fn probe(&self, _path: &Path, _kind: MediaKind) -> Result<ProbeReport, ProbeError> {
            Ok(ProbeReport {
                duration_micros: self.0,
                width: Some(640),
                height: Some(480),
                codec: Some("test".to_string()),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn touch(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_video_entry_carries_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "clip.MP4", "x");
        let entry = FileEntry::new(&path).with_start_ms(250).with_duration_ms(1000);

        let asset = resolve_entry(&FixedProbe(Some(4_000_000)), MediaKind::Video, &entry, AssetId(3), 0)
            .unwrap();
        assert_eq!(asset.id, AssetId(3));
        assert_eq!(asset.duration_micros, Some(4_000_000));
        assert_eq!(asset.window.in_micros, 250_000);
        assert_eq!(asset.window.duration_micros, Some(1_000_000));
        assert_eq!(asset.display_name, "clip.MP4");
        assert!(asset.source_path.is_absolute());
    }

    #[test]
    fn test_missing_duration_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "song.mp3", "x");
        for duration in [None, Some(0)] {
            let err = resolve_entry(&FixedProbe(duration), MediaKind::Audio, &FileEntry::new(&path), AssetId(0), 0)
                .unwrap_err();
            assert_eq!(err.kind, AssetErrorKind::Corrupt);
        }
    }

    #[test]
    fn test_classification_errors() {
        let dir = tempfile::tempdir().unwrap();
        let notes = touch(dir.path(), "notes.txt", "x");
        let err = resolve_entry(&FixedProbe(Some(1)), MediaKind::Video, &FileEntry::new(&notes), AssetId(0), 0)
            .unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::Unsupported);

        let song = touch(dir.path(), "song.wav", "x");
        let err = resolve_entry(&FixedProbe(Some(1)), MediaKind::Video, &FileEntry::new(&song), AssetId(0), 0)
            .unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::Unsupported);
        assert!(err.message.contains("audio"));

        let err = resolve_entry(
            &FixedProbe(Some(1)),
            MediaKind::Video,
            &FileEntry::new(dir.path().join("gone.mp4")),
            AssetId(0),
            0,
        )
        .unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::Unreadable);
    }

    #[test]
    fn test_image_display_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "still.png", "x");

        let asset = resolve_entry(&FixedProbe(None), MediaKind::Image, &FileEntry::new(&path), AssetId(0), 3_000_000)
            .unwrap();
        assert_eq!(asset.duration_micros, Some(3_000_000));
        assert_eq!(asset.width, Some(640));

        let entry = FileEntry::new(&path).with_duration_ms(1500);
        let asset = resolve_entry(&FixedProbe(None), MediaKind::Image, &entry, AssetId(0), 3_000_000).unwrap();
        assert_eq!(asset.duration_micros, Some(1_500_000));
    }

    #[test]
    fn test_subtitle_entry_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(
            dir.path(),
            "captions.srt",
            "1\n00:00:01,000 --> 00:00:02,000\nHi\n\n2\n00:00:03,000 --> 00:00:04,500\nThere\n",
        );
        let asset = resolve_entry(&FixedProbe(None), MediaKind::Subtitle, &FileEntry::new(&path), AssetId(0), 0)
            .unwrap();
        assert_eq!(asset.cues.len(), 2);
        assert_eq!(asset.duration_micros, Some(4_500_000));

        let broken = touch(dir.path(), "broken.srt", "1\nnot a timing --> line\nHi\n");
        let err = resolve_entry(&FixedProbe(None), MediaKind::Subtitle, &FileEntry::new(&broken), AssetId(0), 0)
            .unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::Corrupt);
    }
}
