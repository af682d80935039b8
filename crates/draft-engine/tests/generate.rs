//! End-to-end generation against synthetic media.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cutdraft_asset_resolver::{MediaProbe, ProbeError, ProbeReport};
use cutdraft_common::cancel::CancelFlag;
use cutdraft_common::config::EngineConfig;
use cutdraft_draft_engine::{respond, DraftEngine};
use cutdraft_project_model::asset::MediaKind;
use cutdraft_project_model::document::DraftContent;
use cutdraft_project_model::request::{DraftRequest, FileEntry};
use cutdraft_project_model::timeline::TrackKind;

/// Durations keyed by file name.
struct FakeProbe(HashMap<String, u64>);

impl FakeProbe {
    fn new(entries: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self(
            entries.iter().map(|(n, d)| (n.to_string(), *d)).collect(),
        ))
    }
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &Path, kind: MediaKind) -> Result<ProbeReport, ProbeError> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if kind == MediaKind::Image {
            return Ok(ProbeReport {
                duration_micros: None,
                width: Some(800),
                height: Some(600),
                codec: Some("png".to_string()),
            });
        }
        self.0
            .get(&name)
            .map(|d| ProbeReport {
                duration_micros: Some(*d),
                width: (kind == MediaKind::Video).then_some(1920),
                height: (kind == MediaKind::Video).then_some(1080),
                codec: Some("fake".to_string()),
            })
            .ok_or_else(|| ProbeError::Parse(format!("unknown file {name}")))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new(names: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("media")).unwrap();
        for name in names {
            std::fs::write(dir.path().join("media").join(name), b"bytes").unwrap();
        }
        Self { dir }
    }

    fn media(&self, name: &str) -> PathBuf {
        self.dir.path().join("media").join(name)
    }

    fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }
}

fn engine(probe: Arc<FakeProbe>) -> DraftEngine {
    let mut config = EngineConfig::default();
    config.probe.workers = 2;
    DraftEngine::new(config, probe)
}

fn fnv1a_64(input: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[tokio::test]
async fn three_clips_with_music_and_transitions() {
    let fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4", "bgm.mp3"]);
    let probe = FakeProbe::new(&[
        ("a.mp4", 5_000_000),
        ("b.mp4", 3_000_000),
        ("c.mp4", 4_000_000),
        ("bgm.mp3", 2_500_000),
    ]);
    let request = DraftRequest::builder("Weekend")
        .video(FileEntry::new(fx.media("a.mp4")))
        .video(FileEntry::new(fx.media("b.mp4")))
        .video(FileEntry::new(fx.media("c.mp4")))
        .audio(FileEntry::new(fx.media("bgm.mp3")))
        .background_music(true)
        .transitions(true)
        .filters(true)
        .output_path(fx.output("weekend.veproj"))
        .timestamp("2026-03-01T10:15:30Z")
        .build();

    let outcome = engine(probe)
        .generate(&request, &CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(outcome.segments, 3);
    assert_eq!(outcome.duration_micros, 11_000_000);

    let doc = DraftContent::load(&outcome.output_path).unwrap();
    assert!(doc.dangling_references().is_empty());
    assert_eq!(doc.duration, 11_000_000);
    assert_eq!(doc.create_time, 1_772_360_130);
    assert_eq!(doc.materials.transitions.len(), 2);
    assert_eq!(doc.materials.filters.len(), 3);
    assert_eq!(doc.materials.audios.len(), 1);

    let audio = doc.track(TrackKind::Audio).unwrap();
    let end = audio.segments.last().unwrap().target_timerange.end();
    assert_eq!(end, 11_000_000);

    let response = respond(&Ok(outcome));
    let json: serde_json::Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["segments"], 3);
    assert_eq!(json["resolution"], "1080x1920");
}

#[tokio::test]
async fn identical_requests_produce_identical_bytes() {
    let fx = Fixture::new(&["a.mp4", "b.mov", "still.png", "subs.srt"]);
    std::fs::write(
        fx.media("subs.srt"),
        "1\n00:00:00,500 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nWorld\n",
    )
    .unwrap();
    let probe = FakeProbe::new(&[("a.mp4", 2_000_000), ("b.mov", 3_000_000)]);

    let build = |out: &str| {
        DraftRequest::builder("Deterministic")
            .video(FileEntry::new(fx.media("a.mp4")))
            .video(FileEntry::new(fx.media("b.mov")).with_start_ms(500))
            .image(FileEntry::new(fx.media("still.png")).with_duration_ms(1000))
            .subtitle(FileEntry::new(fx.media("subs.srt")))
            .auto_subtitle(true)
            .transitions(true)
            .output_path(fx.output(out))
            .timestamp("2026-01-01T00:00:00Z")
            .build()
    };

    let engine = engine(probe);
    let first = engine
        .generate(&build("one.veproj"), &CancelFlag::new())
        .await
        .unwrap();
    let second = engine
        .generate(&build("two.veproj"), &CancelFlag::new())
        .await
        .unwrap();

    let a = std::fs::read(&first.output_path).unwrap();
    let b = std::fs::read(&second.output_path).unwrap();
    assert_eq!(fnv1a_64(&a), fnv1a_64(&b));
    assert_eq!(a, b);

    let doc = DraftContent::load(&first.output_path).unwrap();
    assert_eq!(doc.segment_count(TrackKind::Video), 3);
    assert_eq!(doc.segment_count(TrackKind::Text), 2);
    assert_eq!(doc.materials.videos[2].kind, "photo");
}

#[tokio::test]
async fn empty_video_list_writes_nothing() {
    let fx = Fixture::new(&["bgm.mp3"]);
    let probe = FakeProbe::new(&[("bgm.mp3", 1_000_000)]);
    let output = fx.output("nothing.veproj");
    let request = DraftRequest::builder("Empty")
        .audio(FileEntry::new(fx.media("bgm.mp3")))
        .output_path(&output)
        .build();

    let result = engine(probe).generate(&request, &CancelFlag::new()).await;
    let err = result.as_ref().unwrap_err();
    assert_eq!(err.error_kind(), "LayoutError.EMPTY_VIDEO_TRACK");
    assert!(!output.exists());

    let json: serde_json::Value = serde_json::from_str(&respond(&result).to_json()).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["errorKind"], "LayoutError.EMPTY_VIDEO_TRACK");
}

#[tokio::test]
async fn duplicate_path_shares_one_material() {
    let fx = Fixture::new(&["loop.mp4"]);
    let probe = FakeProbe::new(&[("loop.mp4", 2_000_000)]);
    let request = DraftRequest::builder("Twice")
        .video(FileEntry::new(fx.media("loop.mp4")))
        .video(FileEntry::new(fx.media("loop.mp4")))
        .output_path(fx.output("twice.veproj"))
        .build();

    let outcome = engine(probe)
        .generate(&request, &CancelFlag::new())
        .await
        .unwrap();
    let doc = DraftContent::load(&outcome.output_path).unwrap();

    assert_eq!(doc.materials.videos.len(), 1);
    let segments = &doc.track(TrackKind::Video).unwrap().segments;
    assert_eq!(segments.len(), 2);
    assert_ne!(segments[0].id, segments[1].id);
    assert_eq!(segments[0].material_id, segments[1].material_id);
}

#[tokio::test]
async fn invalid_override_fails_before_any_io() {
    let fx = Fixture::new(&["a.mp4"]);
    let probe = FakeProbe::new(&[("a.mp4", 2_000_000)]);
    let mut request = DraftRequest::builder("Bad")
        .video(FileEntry::new(fx.media("a.mp4")))
        .transitions(true)
        .output_path(fx.output("bad.veproj"))
        .build();
    request.config.effects.transition_duration_ms = Some(9_000);

    let err = engine(probe)
        .generate(&request, &CancelFlag::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_kind(), "EffectError.INVALID_PARAMETER");
    assert!(!fx.output("bad.veproj").exists());
}

#[tokio::test]
async fn missing_file_is_unreadable() {
    let fx = Fixture::new(&[]);
    let request = DraftRequest::builder("Missing")
        .video(FileEntry::new(fx.media("ghost.mp4")))
        .output_path(fx.output("missing.veproj"))
        .build();

    let err = engine(FakeProbe::new(&[]))
        .generate(&request, &CancelFlag::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_kind(), "AssetError.UNREADABLE");
}

#[tokio::test]
async fn cancelled_request_writes_nothing() {
    let fx = Fixture::new(&["a.mp4"]);
    let request = DraftRequest::builder("Cancelled")
        .video(FileEntry::new(fx.media("a.mp4")))
        .output_path(fx.output("cancelled.veproj"))
        .build();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = engine(FakeProbe::new(&[("a.mp4", 1_000_000)]))
        .generate(&request, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.error_kind(), "Cancelled.CANCELLED");
    assert!(!fx.output("cancelled.veproj").exists());
}
