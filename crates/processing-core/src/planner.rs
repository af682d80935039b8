//! Timeline layout: place resolved assets on tracks.
//!
//! # Layout
//!
//! 1. **Primary track:** video assets back-to-back in manifest order, then
//!    images for their display duration. Trims are snapped down to frames.
//! 2. **Background music:** audio assets repeated in manifest order until
//!    they cover the primary track exactly.
//! 3. **Subtitles:** cues from every subtitle asset merged by start time,
//!    made non-overlapping, and clipped to the total duration.
//!
//! All arithmetic is integer microseconds with checked accumulation.

use cutdraft_common::config::{EngineConfig, LayoutDefaults};
use cutdraft_common::error::LayoutError;
use cutdraft_common::timebase::{frame_duration_micros, snap_down_to_frame, Micros};
use cutdraft_project_model::asset::{Asset, AssetId, ResolvedAssets};
use cutdraft_project_model::request::ProjectConfig;
use cutdraft_project_model::timeline::{Segment, TimelineSkeleton, Track, TrackKind};

/// Layout limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSettings {
    /// Display duration for images whose asset carries none.
    pub default_image_duration_micros: Micros,

    /// Longest timeline accepted.
    pub max_total_duration_micros: Micros,

    /// Optional cap applied to every video segment.
    pub max_clip_micros: Option<Micros>,

    /// Most repetitions the music track may need.
    pub max_audio_segments: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self::from_defaults(&LayoutDefaults::default())
    }
}

impl LayoutSettings {
    pub fn from_defaults(defaults: &LayoutDefaults) -> Self {
        Self {
            default_image_duration_micros: defaults.default_image_duration_micros,
            max_total_duration_micros: defaults.max_total_duration_micros,
            max_clip_micros: defaults.max_clip_micros,
            max_audio_segments: defaults.max_audio_segments,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::from_defaults(&config.layout)
    }
}

/// Builds the timeline skeleton from resolved assets.
pub struct LayoutPlanner {
    settings: LayoutSettings,
}

impl LayoutPlanner {
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn with_defaults() -> Self {
        Self::new(LayoutSettings::default())
    }

    /// Plan all tracks. The primary video track is always first.
    pub fn plan(
        &self,
        assets: &ResolvedAssets,
        config: &ProjectConfig,
    ) -> Result<TimelineSkeleton, LayoutError> {
        if assets.videos.is_empty() {
            return Err(LayoutError::EmptyVideoTrack);
        }

        let video = self.plan_primary(assets, config.fps)?;
        let total = video.end_micros();
        let mut skeleton = TimelineSkeleton {
            tracks: vec![video],
        };

        if config.background_music {
            if assets.audios.is_empty() {
                tracing::debug!("Background music requested without audio assets");
            } else {
                let music =
                    plan_background_music(&assets.audios, total, self.settings.max_audio_segments)?;
                skeleton.tracks.push(music);
            }
        }

        if config.auto_subtitle {
            skeleton.tracks.push(plan_subtitles(&assets.subtitles, total));
        }

        tracing::info!(
            tracks = skeleton.tracks.len(),
            segments = skeleton.segment_count(),
            duration_micros = total,
            "Timeline planned"
        );
        Ok(skeleton)
    }

    fn plan_primary(&self, assets: &ResolvedAssets, fps: u32) -> Result<Track, LayoutError> {
        let mut track = Track::new(TrackKind::Video);
        let mut cursor: Micros = 0;
        let cap = self.settings.max_total_duration_micros;

        let videos = assets
            .videos
            .iter()
            .map(|asset| self.video_span(asset, fps));
        let images = assets.images.iter().map(|asset| Ok(self.image_span(asset, fps)));

        for span in videos.chain(images) {
            let (id, source_in, duration) = span?;
            tracing::debug!(asset = %id, start = cursor, duration, "Placed segment");
            track
                .segments
                .push(Segment::for_asset(id, cursor, duration, source_in));
            cursor = cursor
                .checked_add(duration)
                .ok_or(LayoutError::DurationOverflow {
                    total_micros: Micros::MAX,
                    cap_micros: cap,
                })?;
        }

        if cursor > cap {
            return Err(LayoutError::DurationOverflow {
                total_micros: cursor,
                cap_micros: cap,
            });
        }
        Ok(track)
    }

    /// `(asset, source in-point, timeline duration)` for one video.
    fn video_span(&self, asset: &Asset, fps: u32) -> Result<(AssetId, Micros, Micros), LayoutError> {
        let empty = || LayoutError::EmptySegment {
            path: asset.source_path.clone(),
        };
        let probed = asset.duration_micros.filter(|d| *d > 0).ok_or_else(empty)?;
        let source_in = asset.window.in_micros;
        if source_in >= probed {
            return Err(empty());
        }

        let available = probed - source_in;
        let mut duration = available;
        if let Some(requested) = asset.window.duration_micros {
            duration = duration.min(requested);
        }
        if let Some(max_clip) = self.settings.max_clip_micros {
            duration = duration.min(max_clip);
        }

        if duration != probed {
            duration = snap_down_to_frame(duration, fps);
        }
        if duration == 0 {
            return Err(empty());
        }
        Ok((asset.id, source_in, duration))
    }

    fn image_span(&self, asset: &Asset, fps: u32) -> (AssetId, Micros, Micros) {
        let display = asset
            .duration_micros
            .unwrap_or(self.settings.default_image_duration_micros);
        let duration = snap_down_to_frame(display, fps).max(frame_duration_micros(fps));
        (asset.id, 0, duration)
    }
}

/// Cycle audio assets in order until `total` is covered exactly.
///
/// Fails when covering `total` would take more than `max_segments` pieces.
fn plan_background_music(
    audios: &[Asset],
    total: Micros,
    max_segments: usize,
) -> Result<Track, LayoutError> {
    let mut track = Track::new(TrackKind::Audio);
    let playable: Vec<(AssetId, Micros)> = audios
        .iter()
        .filter_map(|a| a.duration_micros.filter(|d| *d > 0).map(|d| (a.id, d)))
        .collect();
    if playable.is_empty() {
        return Ok(track);
    }

    let mut cursor = 0;
    for (id, length) in playable.iter().cycle() {
        if cursor >= total {
            break;
        }
        if track.segments.len() >= max_segments {
            tracing::warn!(
                segments = max_segments,
                covered_micros = cursor,
                total_micros = total,
                "Background music too short to loop under the video"
            );
            return Err(LayoutError::DurationOverflow {
                total_micros: total,
                cap_micros: cursor,
            });
        }
        let duration = (*length).min(total - cursor);
        track
            .segments
            .push(Segment::for_asset(*id, cursor, duration, 0));
        cursor += duration;
    }

    tracing::debug!(
        segments = track.segments.len(),
        loops = track.segments.len().saturating_sub(1) / playable.len(),
        "Background music laid out"
    );
    Ok(track)
}

/// Merge cues from all subtitle assets into one non-overlapping track.
fn plan_subtitles(subtitles: &[Asset], total: Micros) -> Track {
    let mut track = Track::new(TrackKind::Text);

    let mut cues: Vec<(AssetId, &cutdraft_project_model::asset::SubtitleCue)> = subtitles
        .iter()
        .flat_map(|asset| asset.cues.iter().map(move |cue| (asset.id, cue)))
        .collect();
    // Stable: equal starts keep manifest order.
    cues.sort_by_key(|(_, cue)| cue.start_micros);

    let mut prev_end = 0;
    let mut adjusted = 0usize;
    let mut dropped = 0usize;
    for (id, cue) in cues {
        let start = cue.start_micros.max(prev_end);
        let end = cue.end_micros.min(total);
        if start != cue.start_micros || end != cue.end_micros {
            adjusted += 1;
        }
        if end <= start {
            dropped += 1;
            continue;
        }

        let mut segment = Segment::for_asset(id, start, end - start, 0);
        segment.text = Some(cue.text.clone());
        track.segments.push(segment);
        prev_end = end;
    }

    if adjusted > 0 {
        tracing::warn!(adjusted, dropped, total_micros = total, "Subtitle cues clipped to the timeline");
    }
    track
}
