//! Probe media files the way generation would.

use std::path::PathBuf;

use cutdraft_asset_resolver::{MediaProbe, SystemProbe};
use cutdraft_common::config::EngineConfig;
use cutdraft_common::timebase::format_timecode;
use cutdraft_project_model::asset::MediaKind;

pub fn run(config: &EngineConfig, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let probe = SystemProbe::new(config.probe.ffprobe_path.clone());
    let mut failures = 0usize;

    for path in &paths {
        let Some(kind) = MediaKind::from_path(path) else {
            println!("{}: unsupported extension", path.display());
            failures += 1;
            continue;
        };
        if kind == MediaKind::Subtitle {
            println!("{}: subtitle (not probed)", path.display());
            continue;
        }

        match probe.probe(path, kind) {
            Ok(report) => {
                let mut line = format!("{}: {kind}", path.display());
                if let Some(d) = report.duration_micros {
                    line.push_str(&format!(", {}", format_timecode(d)));
                }
                if let (Some(w), Some(h)) = (report.width, report.height) {
                    line.push_str(&format!(", {w}x{h}"));
                }
                if let Some(codec) = &report.codec {
                    line.push_str(&format!(", {codec}"));
                }
                println!("{line}");
            }
            Err(e) => {
                println!("{}: {kind}, probe failed: {e}", path.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} file(s) could not be probed", paths.len());
    }
    Ok(())
}
