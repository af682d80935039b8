//! Effect and transition resolution.
//!
//! Works on a planned [`TimelineSkeleton`] and returns a refined copy:
//! transitions at internal video boundaries (the outgoing segment's tail
//! is consumed and later segments are pulled earlier), round-robin filters
//! on an effect track mirroring the video segments, and a text style on
//! every subtitle cue.

use cutdraft_common::config::{EffectDefaults, SubtitleStyle};
use cutdraft_common::error::EffectError;
use cutdraft_common::timebase::{ms_to_micros, snap_down_to_frame, snap_to_nearest_frame, Micros};
use cutdraft_project_model::request::{EffectOverrides, ProjectConfig};
use cutdraft_project_model::timeline::{
    EffectDescriptor, EffectKind, Segment, TimelineSkeleton, Track, TrackKind,
};

/// Transition names the editor understands.
pub const TRANSITION_CATALOG: &[&str] = &[
    "dissolve",
    "fade_black",
    "fade_white",
    "wipe_left",
    "wipe_right",
    "slide_up",
    "zoom",
];

/// Accepted transition lengths in milliseconds.
pub const TRANSITION_DURATION_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=5000;

/// Effect parameters after merging request overrides over engine defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectSettings {
    pub transition_kind: String,
    pub transition_duration_ms: u64,
    pub filter_palette: Vec<String>,
    pub filter_intensity: u32,
    pub subtitle: SubtitleStyle,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::merge(&EffectDefaults::default(), &EffectOverrides::default())
    }
}

impl EffectSettings {
    /// Overlay `overrides` on `defaults` without validating.
    pub fn merge(defaults: &EffectDefaults, overrides: &EffectOverrides) -> Self {
        let mut subtitle = defaults.subtitle.clone();
        if let Some(font) = &overrides.subtitle_font {
            subtitle.font = font.clone();
        }
        if let Some(size) = overrides.subtitle_size {
            subtitle.size = size;
        }
        if let Some(color) = overrides.subtitle_color {
            subtitle.color = color;
        }
        if let Some(y) = overrides.subtitle_position_y {
            subtitle.position_y = y;
        }

        Self {
            transition_kind: overrides
                .transition_kind
                .clone()
                .unwrap_or_else(|| defaults.transition_kind.clone()),
            transition_duration_ms: overrides
                .transition_duration_ms
                .unwrap_or(defaults.transition_duration_ms),
            filter_palette: overrides
                .filter_palette
                .clone()
                .unwrap_or_else(|| defaults.filter_palette.clone()),
            filter_intensity: overrides
                .filter_intensity
                .unwrap_or(defaults.filter_intensity),
            subtitle,
        }
    }

    /// Merge and validate the families the request switches on.
    pub fn resolve(defaults: &EffectDefaults, config: &ProjectConfig) -> Result<Self, EffectError> {
        let settings = Self::merge(defaults, &config.effects);
        settings.validate(config)?;
        Ok(settings)
    }

    /// Range checks for every enabled effect family.
    pub fn validate(&self, config: &ProjectConfig) -> Result<(), EffectError> {
        if config.transitions {
            self.validate_transition()?;
        }
        if config.filters {
            self.validate_filters()?;
        }
        if config.auto_subtitle {
            self.validate_subtitle()?;
        }
        Ok(())
    }

    fn validate_transition(&self) -> Result<(), EffectError> {
        if !TRANSITION_CATALOG.contains(&self.transition_kind.as_str()) {
            return Err(EffectError::invalid(
                "transition_kind",
                &self.transition_kind,
                format!("one of {}", TRANSITION_CATALOG.join(", ")),
            ));
        }
        if !TRANSITION_DURATION_RANGE_MS.contains(&self.transition_duration_ms) {
            return Err(EffectError::invalid(
                "transition_duration_ms",
                self.transition_duration_ms,
                "100..=5000",
            ));
        }
        Ok(())
    }

    fn validate_filters(&self) -> Result<(), EffectError> {
        if self.filter_palette.is_empty() {
            return Err(EffectError::invalid("filter_palette", "[]", "at least one filter"));
        }
        if let Some(blank) = self.filter_palette.iter().find(|n| n.trim().is_empty()) {
            return Err(EffectError::invalid(
                "filter_palette",
                format!("{blank:?}"),
                "non-empty filter names",
            ));
        }
        if self.filter_intensity > 100 {
            return Err(EffectError::invalid("filter_intensity", self.filter_intensity, "0..=100"));
        }
        Ok(())
    }

    fn validate_subtitle(&self) -> Result<(), EffectError> {
        let style = &self.subtitle;
        if !(style.size.is_finite() && style.size > 0.0 && style.size <= 100.0) {
            return Err(EffectError::invalid("subtitle_size", style.size, "(0, 100]"));
        }
        if let Some(c) = style
            .color
            .iter()
            .find(|c| !(c.is_finite() && (0.0..=1.0).contains(*c)))
        {
            return Err(EffectError::invalid("subtitle_color", c, "components in [0, 1]"));
        }
        if !(style.position_y.is_finite() && (-1.0..=1.0).contains(&style.position_y)) {
            return Err(EffectError::invalid("subtitle_position_y", style.position_y, "[-1, 1]"));
        }
        Ok(())
    }
}

/// Applies transitions, filters, and subtitle styling.
pub struct EffectResolver {
    settings: EffectSettings,
}

impl EffectResolver {
    pub fn new(settings: EffectSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Return a refined copy of `skeleton`. The input is not modified.
    pub fn resolve(
        &self,
        skeleton: &TimelineSkeleton,
        config: &ProjectConfig,
    ) -> Result<TimelineSkeleton, EffectError> {
        self.settings.validate(config)?;
        let mut out = skeleton.clone();

        if config.transitions {
            let applied = self.apply_transitions(&mut out, config.fps);
            let total = out.duration_micros();
            for track in out.tracks.iter_mut() {
                if matches!(track.kind, TrackKind::Audio | TrackKind::Text) {
                    track.truncate_to(total);
                }
            }
            tracing::info!(transitions = applied, duration_micros = total, "Transitions applied");
        }

        if config.filters {
            if let Some(track) = self.filter_track(&out) {
                out.tracks.push(track);
            }
        }

        if let Some(text) = out.track_mut(TrackKind::Text) {
            let style = self.subtitle_descriptor();
            for segment in text.segments.iter_mut() {
                segment.effects.push(style.clone());
            }
        }

        Ok(out)
    }

    /// Insert a transition at every internal boundary of the video track.
    /// Returns the number inserted.
    fn apply_transitions(&self, skeleton: &mut TimelineSkeleton, fps: u32) -> usize {
        let Some(track) = skeleton.track_mut(TrackKind::Video) else {
            return 0;
        };
        let requested = ms_to_micros(self.settings.transition_duration_ms)
            .map(|d| snap_to_nearest_frame(d, fps))
            .unwrap_or(0);

        let lengths: Vec<Micros> = track
            .segments
            .iter()
            .map(|s| s.timeline_duration_micros)
            .collect();
        let mut applied = 0;
        let mut cursor = 0;
        let last = track.segments.len().saturating_sub(1);

        for (i, segment) in track.segments.iter_mut().enumerate() {
            segment.timeline_start_micros = cursor;
            if i < last {
                let half_shorter = lengths[i].min(lengths[i + 1]) / 2;
                let overlap = snap_down_to_frame(requested.min(half_shorter), fps);
                if overlap > 0 {
                    segment.timeline_duration_micros -= overlap;
                    segment.effects.push(
                        EffectDescriptor::new(EffectKind::Transition, &self.settings.transition_kind)
                            .with_param("duration_micros", overlap),
                    );
                    applied += 1;
                } else {
                    tracing::debug!(boundary = i, "Segments too short for a transition");
                }
            }
            cursor += segment.timeline_duration_micros;
        }
        applied
    }

    fn filter_track(&self, skeleton: &TimelineSkeleton) -> Option<Track> {
        let video = skeleton.video_track()?;
        let palette = &self.settings.filter_palette;
        if palette.is_empty() {
            return None;
        }

        let mut track = Track::new(TrackKind::Effect);
        for (i, segment) in video.segments.iter().enumerate() {
            let mut generated =
                Segment::generated(segment.timeline_start_micros, segment.timeline_duration_micros);
            generated.effects.push(
                EffectDescriptor::new(EffectKind::Filter, &palette[i % palette.len()])
                    .with_param("intensity", self.settings.filter_intensity as i64),
            );
            track.segments.push(generated);
        }
        Some(track)
    }

    fn subtitle_descriptor(&self) -> EffectDescriptor {
        let style = &self.settings.subtitle;
        EffectDescriptor::new(EffectKind::SubtitleStyle, &style.font)
            .with_param("size", style.size)
            .with_param("color_r", style.color[0])
            .with_param("color_g", style.color[1])
            .with_param("color_b", style.color[2])
            .with_param("position_y", style.position_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutdraft_project_model::asset::AssetId;

    fn skeleton(video: &[Micros], audio: &[Micros]) -> TimelineSkeleton {
        let lay = |kind, durations: &[Micros]| {
            let mut track = Track::new(kind);
            let mut cursor = 0;
            for (i, d) in durations.iter().enumerate() {
                track
                    .segments
                    .push(Segment::for_asset(AssetId(i as u32), cursor, *d, 0));
                cursor += d;
            }
            track
        };
        let mut s = TimelineSkeleton {
            tracks: vec![lay(TrackKind::Video, video)],
        };
        if !audio.is_empty() {
            s.tracks.push(lay(TrackKind::Audio, audio));
        }
        s
    }

    fn config(transitions: bool, filters: bool) -> ProjectConfig {
        ProjectConfig {
            transitions,
            filters,
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn test_transitions_shorten_timeline() {
        let input = skeleton(&[5_000_000, 3_000_000, 4_000_000], &[12_000_000]);
        let resolver = EffectResolver::new(EffectSettings::default());
        let out = resolver.resolve(&input, &config(true, false)).unwrap();

        let video = out.video_track().unwrap();
        assert_eq!(out.duration_micros(), 11_000_000);
        assert!(video.is_gapless());
        let count: usize = video
            .segments
            .iter()
            .map(|s| s.effects_of(EffectKind::Transition).count())
            .sum();
        assert_eq!(count, 2);
        assert!(!video.segments[2].has_effect(EffectKind::Transition));
        assert_eq!(
            video.segments[0].effects[0].param("duration_micros").and_then(|p| p.as_i64()),
            Some(500_000)
        );

        // Audio follows the new length; the input is untouched.
        assert_eq!(out.track(TrackKind::Audio).unwrap().end_micros(), 11_000_000);
        assert_eq!(input.duration_micros(), 12_000_000);
    }

    #[test]
    fn test_transition_clamped_to_half_shorter_segment() {
        let settings = EffectSettings {
            transition_duration_ms: 2000,
            ..EffectSettings::default()
        };
        let out = EffectResolver::new(settings)
            .resolve(&skeleton(&[5_000_000, 1_000_000], &[]), &config(true, false))
            .unwrap();
        assert_eq!(out.video_track().unwrap().segments[0].timeline_duration_micros, 4_500_000);
        assert_eq!(out.duration_micros(), 5_500_000);
    }

    #[test]
    fn test_no_transitions_when_disabled() {
        let out = EffectResolver::new(EffectSettings::default())
            .resolve(&skeleton(&[1_000_000, 1_000_000], &[]), &config(false, false))
            .unwrap();
        assert!(out
            .tracks
            .iter()
            .flat_map(|t| &t.segments)
            .all(|s| !s.has_effect(EffectKind::Transition)));
    }

    #[test]
    fn test_filters_round_robin_on_effect_track() {
        let settings = EffectSettings {
            filter_palette: vec!["warm".to_string(), "cool".to_string()],
            ..EffectSettings::default()
        };
        let out = EffectResolver::new(settings)
            .resolve(&skeleton(&[1_000_000; 3], &[]), &config(false, true))
            .unwrap();
        let effect = out.track(TrackKind::Effect).unwrap();
        let names: Vec<&str> = effect
            .segments
            .iter()
            .map(|s| s.effects[0].name.as_str())
            .collect();
        assert_eq!(names, vec!["warm", "cool", "warm"]);
        assert!(effect.segments.iter().all(|s| s.asset_id.is_none()));
        assert_eq!(effect.end_micros(), out.duration_micros());
    }

    #[test]
    fn test_subtitle_style_attached_to_cues() {
        let mut input = skeleton(&[2_000_000], &[]);
        let mut text = Track::new(TrackKind::Text);
        let mut cue = Segment::for_asset(AssetId(9), 0, 1_000_000, 0);
        cue.text = Some("hi".to_string());
        text.segments.push(cue);
        input.tracks.push(text);

        let out = EffectResolver::new(EffectSettings::default())
            .resolve(&input, &config(false, false))
            .unwrap();
        let styled = &out.track(TrackKind::Text).unwrap().segments[0];
        let style = styled.effects_of(EffectKind::SubtitleStyle).next().unwrap();
        assert_eq!(style.name, "System");
        assert_eq!(style.param("position_y").and_then(|p| p.as_f64()), Some(-0.8));
    }

    #[test]
    fn test_override_validation() {
        let defaults = EffectDefaults::default();
        let mut request = config(true, true);
        request.auto_subtitle = true;
        assert!(EffectSettings::resolve(&defaults, &request).is_ok());

        let cases = [
            EffectOverrides {
                transition_kind: Some("spin".to_string()),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                transition_duration_ms: Some(50),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                filter_palette: Some(vec![]),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                filter_intensity: Some(101),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                subtitle_size: Some(0.0),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                subtitle_color: Some([1.0, 1.5, 0.0]),
                ..EffectOverrides::default()
            },
            EffectOverrides {
                subtitle_position_y: Some(-1.2),
                ..EffectOverrides::default()
            },
        ];
        for overrides in cases {
            request.effects = overrides.clone();
            let err = EffectSettings::resolve(&defaults, &request).unwrap_err();
            assert_eq!(err.code(), "INVALID_PARAMETER", "{overrides:?}");
        }
    }

    #[test]
    fn test_disabled_family_is_not_validated() {
        let request = ProjectConfig {
            effects: EffectOverrides {
                transition_duration_ms: Some(60_000),
                ..EffectOverrides::default()
            },
            ..ProjectConfig::default()
        };
        assert!(EffectSettings::resolve(&EffectDefaults::default(), &request).is_ok());
    }
}
