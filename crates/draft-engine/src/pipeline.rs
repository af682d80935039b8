//! End-to-end generation: request in, project file out.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use cutdraft_asset_resolver::{AssetResolver, MediaProbe, ResolverSettings, SystemProbe};
use cutdraft_common::cancel::CancelFlag;
use cutdraft_common::config::EngineConfig;
use cutdraft_common::error::{DraftError, DraftResult};
use cutdraft_common::timebase::{format_timecode, Micros};
use cutdraft_processing_core::{EffectResolver, EffectSettings, LayoutPlanner, LayoutSettings};
use cutdraft_project_model::request::{DraftRequest, DraftResponse, ProjectConfig, Resolution};
use cutdraft_project_model::timeline::TrackKind;

use crate::serializer::{serialize, DraftMeta};
use crate::writer::write_draft;

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub output_path: PathBuf,

    /// Segments on the primary video track.
    pub segments: usize,

    pub duration_micros: Micros,
    pub resolution: Resolution,
    pub bytes: u64,
}

impl GenerationOutcome {
    pub fn response(&self) -> DraftResponse {
        DraftResponse::success(
            self.segments,
            &self.output_path,
            self.duration_micros,
            self.resolution,
        )
    }
}

/// Map a generation result to the caller-facing response.
pub fn respond(result: &DraftResult<GenerationOutcome>) -> DraftResponse {
    match result {
        Ok(outcome) => outcome.response(),
        Err(err) => DraftResponse::from_error(err),
    }
}

/// Runs the five stages for one request at a time.
#[derive(Clone)]
pub struct DraftEngine {
    config: EngineConfig,
    probe: Arc<dyn MediaProbe>,
}

impl DraftEngine {
    pub fn new(config: EngineConfig, probe: Arc<dyn MediaProbe>) -> Self {
        Self { config, probe }
    }

    /// Engine backed by ffprobe and image headers.
    pub fn with_system_probe(config: EngineConfig) -> Self {
        let probe = SystemProbe::new(config.probe.ffprobe_path.clone());
        Self::new(config, Arc::new(probe))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Where the draft for `config` will be written.
    ///
    /// Empty means `<default dir>/<title>.<ext>`; an existing directory gets
    /// `<title>.<ext>` appended; a path without an extension gets one.
    pub fn resolve_output_path(&self, config: &ProjectConfig) -> PathBuf {
        let ext = self.config.output.extension.as_str();
        let file_name = format!("{}.{ext}", file_stem_for(&config.title));

        let requested = config.output_path.as_path();
        if requested.as_os_str().is_empty() {
            return self.config.output.default_dir.join(file_name);
        }
        if requested.is_dir() {
            return requested.join(file_name);
        }
        if requested.extension().is_none() {
            return requested.with_extension(ext);
        }
        requested.to_path_buf()
    }

    /// Generate and write the draft for `request`.
    pub async fn generate(
        &self,
        request: &DraftRequest,
        cancel: &CancelFlag,
    ) -> DraftResult<GenerationOutcome> {
        request.validate()?;
        let config = &request.config;
        let created_at = request
            .created_at()?
            .unwrap_or_else(Utc::now)
            .timestamp();
        let output_path = self.resolve_output_path(config);
        let effects = EffectSettings::resolve(&self.config.effects, config)?;

        tracing::info!(
            title = %config.title,
            files = request.files.len(),
            resolution = %config.resolution,
            fps = config.fps,
            output = %output_path.display(),
            "Generating draft"
        );

        let resolver = AssetResolver::new(
            Arc::clone(&self.probe),
            ResolverSettings::from_config(&self.config),
        );
        let assets = resolver.resolve(&request.files, cancel).await?;

        cancel.check("layout")?;
        let planned = LayoutPlanner::new(LayoutSettings::from_config(&self.config))
            .plan(&assets, config)?;

        cancel.check("effects")?;
        let timeline = EffectResolver::new(effects).resolve(&planned, config)?;

        cancel.check("serialization")?;
        let meta = DraftMeta {
            title: config.title.clone(),
            resolution: config.resolution,
            fps: config.fps,
            created_at,
        };
        let document = serialize(&timeline, &assets, &meta)?;

        cancel.check("write")?;
        let target = output_path.clone();
        let report = tokio::task::spawn_blocking(move || write_draft(&document, &target))
            .await
            .map_err(|e| DraftError::internal(format!("writer task failed: {e}")))??;

        let outcome = GenerationOutcome {
            output_path: report.path,
            segments: timeline
                .track(TrackKind::Video)
                .map(|t| t.segments.len())
                .unwrap_or(0),
            duration_micros: timeline.duration_micros(),
            resolution: config.resolution,
            bytes: report.bytes,
        };
        tracing::info!(
            segments = outcome.segments,
            duration = %format_timecode(outcome.duration_micros),
            path = %outcome.output_path.display(),
            "Draft generated"
        );
        Ok(outcome)
    }
}

/// Title made safe for use as a file name.
fn file_stem_for(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "Untitled Project".to_string()
    } else {
        cleaned
    }
}
