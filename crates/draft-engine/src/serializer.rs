//! Timeline skeleton to draft document.
//!
//! Identifiers are name-based UUIDs derived from a per-document counter,
//! so the same skeleton always serializes to the same bytes. Assets that
//! share a resolved source path become a single material.

use std::collections::HashMap;
use std::path::PathBuf;

use cutdraft_common::config::SubtitleStyle;
use cutdraft_common::error::{DraftError, DraftResult};
use cutdraft_project_model::asset::{Asset, MediaKind, ResolvedAssets};
use cutdraft_project_model::document::{
    AudioMaterial, CanvasConfig, Clip, DraftContent, DraftSegment, DraftTrack, FilterMaterial,
    Materials, Platform, TextMaterial, Timerange, TransitionMaterial, VideoMaterial,
    DRAFT_NEW_VERSION, DRAFT_SCHEMA_VERSION,
};
use cutdraft_project_model::request::Resolution;
use cutdraft_project_model::timeline::{EffectKind, Segment, TimelineSkeleton, Track, TrackKind};
use uuid::Uuid;

/// Namespace for draft identifiers.
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_5d3b_4c71_9e0a_b2d4_c8f6_1357);

/// Document-level fields that do not come from the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMeta {
    pub title: String,
    pub resolution: Resolution,
    pub fps: u32,

    /// Unix seconds.
    pub created_at: i64,
}

/// Deterministic identifier source for one document.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    seed: String,
    counter: u64,
}

impl IdAllocator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
        }
    }

    /// Next identifier, uppercase hyphenated like the editor's own.
    pub fn next_id(&mut self) -> String {
        let name = format!("{}/{}", self.seed, self.counter);
        self.counter += 1;
        Uuid::new_v5(&ID_NAMESPACE, name.as_bytes())
            .hyphenated()
            .to_string()
            .to_uppercase()
    }

    pub fn issued(&self) -> u64 {
        self.counter
    }
}

/// Build the draft document for a final skeleton.
///
/// Fails only with [`DraftError::Internal`] when an upstream stage broke
/// a timeline invariant.
pub fn serialize(
    skeleton: &TimelineSkeleton,
    assets: &ResolvedAssets,
    meta: &DraftMeta,
) -> DraftResult<DraftContent> {
    skeleton.validate().map_err(|violation| {
        tracing::error!(%violation, tracks = skeleton.tracks.len(), "Timeline invariant violated");
        DraftError::internal(violation.to_string())
    })?;

    let mut builder = DocumentBuilder {
        ids: IdAllocator::new(&meta.title),
        assets,
        materials: Materials::default(),
        by_path: HashMap::new(),
    };
    let document_id = builder.ids.next_id();

    let mut tracks = Vec::with_capacity(skeleton.tracks.len());
    for (index, track) in skeleton.tracks.iter().enumerate() {
        tracks.push(builder.track(track, index as u32)?);
    }

    let document = DraftContent {
        id: document_id,
        name: meta.title.clone(),
        create_time: meta.created_at,
        update_time: meta.created_at,
        duration: skeleton.duration_micros(),
        fps: meta.fps as f64,
        canvas_config: CanvasConfig {
            width: meta.resolution.width,
            height: meta.resolution.height,
            ratio: meta.resolution.ratio_label(),
        },
        materials: builder.materials,
        tracks,
        version: DRAFT_SCHEMA_VERSION,
        new_version: DRAFT_NEW_VERSION.to_string(),
        platform: Platform {
            app_source: "cutdraft".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    let problems = document.dangling_references();
    if !problems.is_empty() {
        tracing::error!(?problems, "Serialized draft is not self-consistent");
        return Err(DraftError::internal(format!(
            "draft has {} broken references: {}",
            problems.len(),
            problems.join("; ")
        )));
    }

    tracing::info!(
        tracks = document.tracks.len(),
        ids = builder.ids.issued(),
        duration_micros = document.duration,
        "Draft serialized"
    );
    Ok(document)
}

struct DocumentBuilder<'a> {
    ids: IdAllocator,
    assets: &'a ResolvedAssets,
    materials: Materials,
    by_path: HashMap<PathBuf, String>,
}

impl<'a> DocumentBuilder<'a> {
    fn track(&mut self, track: &Track, render_index: u32) -> DraftResult<DraftTrack> {
        let id = self.ids.next_id();
        let mut segments = Vec::with_capacity(track.segments.len());
        for (index, segment) in track.segments.iter().enumerate() {
            segments.push(self.segment(track.kind, index, segment, render_index)?);
        }
        Ok(DraftTrack {
            id,
            kind: track.kind,
            attribute: 0,
            flag: 0,
            segments,
        })
    }

    fn segment(
        &mut self,
        kind: TrackKind,
        index: usize,
        segment: &Segment,
        render_index: u32,
    ) -> DraftResult<DraftSegment> {
        let id = self.ids.next_id();
        let target = Timerange {
            start: segment.timeline_start_micros,
            duration: segment.timeline_duration_micros,
        };
        let source = Timerange {
            start: segment.source_in_micros,
            duration: segment.timeline_duration_micros,
        };

        let mut draft = DraftSegment {
            id,
            material_id: String::new(),
            target_timerange: target,
            source_timerange: None,
            extra_material_refs: vec![],
            render_index,
            speed: 1.0,
            volume: 1.0,
            visible: true,
            clip: None,
        };

        match kind {
            TrackKind::Video => {
                let asset = self.asset_for(kind, index, segment)?;
                draft.material_id = self.video_material(asset);
                draft.source_timerange = Some(source);
                if asset.kind == MediaKind::Image {
                    draft.volume = 0.0;
                }
                for transition in segment.effects_of(EffectKind::Transition) {
                    let duration = transition
                        .param("duration_micros")
                        .and_then(|p| p.as_i64())
                        .unwrap_or(0)
                        .max(0) as u64;
                    let material_id = self.ids.next_id();
                    self.materials.transitions.push(TransitionMaterial {
                        id: material_id.clone(),
                        kind: "transition".to_string(),
                        name: transition.name.clone(),
                        duration,
                        is_overlap: true,
                    });
                    draft.extra_material_refs.push(material_id);
                }
            }
            TrackKind::Audio => {
                let asset = self.asset_for(kind, index, segment)?;
                draft.material_id = self.audio_material(asset);
                draft.source_timerange = Some(source);
            }
            TrackKind::Text => {
                self.asset_for(kind, index, segment)?;
                let style = subtitle_style(segment);
                let material_id = self.ids.next_id();
                self.materials.texts.push(TextMaterial {
                    id: material_id.clone(),
                    kind: "subtitle".to_string(),
                    content: segment.text.clone().unwrap_or_default(),
                    font: style.font,
                    font_size: style.size,
                    text_color: style.color,
                });
                draft.material_id = material_id;
                draft.volume = 0.0;
                draft.clip = Some(Clip {
                    transform_y: style.position_y,
                });
            }
            TrackKind::Effect => {
                let filter = segment.effects_of(EffectKind::Filter).next().ok_or_else(|| {
                    tracing::error!(track = %kind, index, "Effect segment carries no filter");
                    DraftError::internal(format!("effect segment {index} carries no filter"))
                })?;
                let intensity = filter
                    .param("intensity")
                    .and_then(|p| p.as_f64())
                    .unwrap_or(100.0);
                let material_id = self.ids.next_id();
                self.materials.filters.push(FilterMaterial {
                    id: material_id.clone(),
                    kind: "filter".to_string(),
                    name: filter.name.clone(),
                    value: (intensity / 100.0).clamp(0.0, 1.0),
                });
                draft.material_id = material_id;
                draft.volume = 0.0;
            }
        }

        Ok(draft)
    }

    fn asset_for(&self, kind: TrackKind, index: usize, segment: &Segment) -> DraftResult<&'a Asset> {
        let assets = self.assets;
        segment
            .asset_id
            .and_then(|id| assets.get(id))
            .ok_or_else(|| {
                tracing::error!(
                    track = %kind,
                    index,
                    asset = ?segment.asset_id,
                    "Segment references an unknown asset"
                );
                DraftError::internal(format!(
                    "{kind} segment {index} references unknown asset {:?}",
                    segment.asset_id
                ))
            })
    }

    fn video_material(&mut self, asset: &Asset) -> String {
        if let Some(id) = self.by_path.get(&asset.source_path) {
            return id.clone();
        }
        let id = self.ids.next_id();
        self.materials.videos.push(VideoMaterial {
            id: id.clone(),
            kind: if asset.kind == MediaKind::Image {
                "photo".to_string()
            } else {
                "video".to_string()
            },
            path: asset.source_path.display().to_string(),
            material_name: asset.display_name.clone(),
            duration: asset.duration_micros.unwrap_or(0),
            width: asset.width.unwrap_or(0),
            height: asset.height.unwrap_or(0),
        });
        self.by_path.insert(asset.source_path.clone(), id.clone());
        id
    }

    fn audio_material(&mut self, asset: &Asset) -> String {
        if let Some(id) = self.by_path.get(&asset.source_path) {
            return id.clone();
        }
        let id = self.ids.next_id();
        self.materials.audios.push(AudioMaterial {
            id: id.clone(),
            kind: "music".to_string(),
            path: asset.source_path.display().to_string(),
            name: asset.display_name.clone(),
            duration: asset.duration_micros.unwrap_or(0),
        });
        self.by_path.insert(asset.source_path.clone(), id.clone());
        id
    }
}

/// Style from the segment's descriptor, falling back to the defaults.
fn subtitle_style(segment: &Segment) -> SubtitleStyle {
    let mut style = SubtitleStyle::default();
    let Some(descriptor) = segment.effects_of(EffectKind::SubtitleStyle).next() else {
        return style;
    };
    style.font = descriptor.name.clone();
    let number = |key: &str| descriptor.param(key).and_then(|p| p.as_f64());
    if let Some(size) = number("size") {
        style.size = size;
    }
    for (slot, key) in ["color_r", "color_g", "color_b"].iter().enumerate() {
        if let Some(c) = number(key) {
            style.color[slot] = c;
        }
    }
    if let Some(y) = number("position_y") {
        style.position_y = y;
    }
    style
}
