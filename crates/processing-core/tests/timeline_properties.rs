use std::path::PathBuf;

use cutdraft_common::timebase::{snap_down_to_frame, Micros};
use cutdraft_processing_core::{EffectResolver, EffectSettings, LayoutPlanner};
use cutdraft_project_model::asset::{Asset, AssetId, MediaKind, ResolvedAssets, SourceWindow};
use cutdraft_project_model::request::ProjectConfig;
use cutdraft_project_model::timeline::{EffectKind, TimelineSkeleton, TrackKind};
use proptest::prelude::*;

fn asset(id: u32, kind: MediaKind, duration: Micros) -> Asset {
    Asset {
        id: AssetId(id),
        kind,
        source_path: PathBuf::from(format!("/media/{kind}-{id}")),
        duration_micros: Some(duration),
        width: Some(1920),
        height: Some(1080),
        display_name: format!("{kind}-{id}"),
        codec: None,
        window: SourceWindow::default(),
        cues: vec![],
    }
}

fn assets(videos: &[Micros], audios: &[Micros]) -> ResolvedAssets {
    let mut out = ResolvedAssets::default();
    let mut next = 0;
    for d in videos {
        out.push(asset(next, MediaKind::Video, *d));
        next += 1;
    }
    for d in audios {
        out.push(asset(next, MediaKind::Audio, *d));
        next += 1;
    }
    out
}

fn generate(assets: &ResolvedAssets, config: &ProjectConfig) -> TimelineSkeleton {
    let planned = LayoutPlanner::with_defaults().plan(assets, config).unwrap();
    EffectResolver::new(EffectSettings::default())
        .resolve(&planned, config)
        .unwrap()
}

fn transition_overlap(skeleton: &TimelineSkeleton) -> Micros {
    skeleton
        .video_track()
        .unwrap()
        .segments
        .iter()
        .flat_map(|s| s.effects_of(EffectKind::Transition))
        .filter_map(|e| e.param("duration_micros").and_then(|p| p.as_i64()))
        .map(|d| d as Micros)
        .sum()
}

#[test]
fn three_clips_with_transitions_last_eleven_seconds() {
    let config = ProjectConfig {
        transitions: true,
        ..ProjectConfig::default()
    };
    let skeleton = generate(&assets(&[5_000_000, 3_000_000, 4_000_000], &[]), &config);

    assert_eq!(skeleton.duration_micros(), 11_000_000);
    assert_eq!(transition_overlap(&skeleton), 1_000_000);
    let transitions = skeleton
        .video_track()
        .unwrap()
        .segments
        .iter()
        .filter(|s| s.has_effect(EffectKind::Transition))
        .count();
    assert_eq!(transitions, 2);
}

#[test]
fn short_music_loops_under_long_video() {
    let config = ProjectConfig {
        background_music: true,
        transitions: true,
        filters: true,
        ..ProjectConfig::default()
    };
    let skeleton = generate(&assets(&[30_000_000, 30_000_000], &[7_000_000]), &config);

    let audio = skeleton.track(TrackKind::Audio).unwrap();
    assert!(audio.is_gapless());
    assert_eq!(audio.end_micros(), skeleton.duration_micros());
    assert!(audio.segments.len() > 8);
    assert!(skeleton.validate().is_ok());
}

proptest! {
    #[test]
    fn video_track_is_gapless_and_sums(
        durations in prop::collection::vec(100_000u64..60_000_000, 1..12),
        transitions in any::<bool>(),
        fps in prop::sample::select(vec![24u32, 25, 30, 60]),
    ) {
        let config = ProjectConfig { transitions, fps, ..ProjectConfig::default() };
        let skeleton = generate(&assets(&durations, &[]), &config);
        let video = skeleton.video_track().unwrap();

        prop_assert!(video.validate().is_ok());
        prop_assert!(video.is_gapless());
        let ids: Vec<u32> = video.segments.iter().map(|s| s.asset_id.unwrap().0).collect();
        prop_assert_eq!(ids, (0..durations.len() as u32).collect::<Vec<_>>());

        let input_total: Micros = durations.iter().sum();
        prop_assert_eq!(skeleton.duration_micros(), input_total - transition_overlap(&skeleton));
        if !transitions {
            prop_assert_eq!(transition_overlap(&skeleton), 0);
        }
    }

    #[test]
    fn background_music_covers_video_exactly(
        videos in prop::collection::vec(100_000u64..20_000_000, 1..6),
        audios in prop::collection::vec(50_000u64..9_000_000, 1..4),
        transitions in any::<bool>(),
    ) {
        let config = ProjectConfig {
            background_music: true,
            transitions,
            ..ProjectConfig::default()
        };
        let skeleton = generate(&assets(&videos, &audios), &config);
        let audio = skeleton.track(TrackKind::Audio).unwrap();

        prop_assert!(audio.validate().is_ok());
        prop_assert!(audio.is_gapless());
        prop_assert_eq!(audio.end_micros(), skeleton.duration_micros());
    }

    #[test]
    fn trims_land_on_frame_boundaries(
        probed in 2_000_000u64..30_000_000,
        in_point in 0u64..1_000_000,
        requested in 40_000u64..5_000_000,
    ) {
        let mut input = assets(&[probed], &[]);
        input.videos[0].window = SourceWindow {
            in_micros: in_point,
            duration_micros: Some(requested),
        };
        let skeleton = generate(&input, &ProjectConfig::default());
        let wanted = requested.min(probed - in_point);
        let expected = if wanted == probed { probed } else { snap_down_to_frame(wanted, 30) };
        prop_assert_eq!(skeleton.duration_micros(), expected);
        prop_assert_eq!(skeleton.video_track().unwrap().segments[0].source_in_micros, in_point);
    }
}
