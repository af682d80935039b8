//! Show draft information.

use std::path::PathBuf;

use cutdraft_common::timebase::format_timecode;
use cutdraft_project_model::document::DraftContent;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let draft =
        DraftContent::load(&path).map_err(|e| anyhow::anyhow!("Failed to load draft: {e}"))?;

    println!("Draft: {}", draft.name);
    println!("  ID: {}", draft.id);
    println!("  Created: {}", draft.create_time);
    println!(
        "  Canvas: {}x{} ({}) @ {}fps",
        draft.canvas_config.width, draft.canvas_config.height, draft.canvas_config.ratio, draft.fps
    );
    println!("  Duration: {}", format_timecode(draft.duration));
    println!(
        "  Written by: {} {}",
        draft.platform.app_source, draft.platform.app_version
    );
    println!();

    println!("Tracks:");
    for track in &draft.tracks {
        let end = track
            .segments
            .last()
            .map(|s| s.target_timerange.end())
            .unwrap_or(0);
        println!(
            "  {}: {} segment(s), ends at {}",
            track.kind,
            track.segments.len(),
            format_timecode(end)
        );
    }
    println!();

    let m = &draft.materials;
    println!("Materials:");
    println!("  Videos: {}", m.videos.len());
    for video in &m.videos {
        println!(
            "    {} [{}] {}x{} ({})",
            video.material_name,
            video.kind,
            video.width,
            video.height,
            format_timecode(video.duration)
        );
    }
    println!("  Audios: {}", m.audios.len());
    for audio in &m.audios {
        println!("    {} ({})", audio.name, format_timecode(audio.duration));
    }
    println!("  Texts: {}", m.texts.len());
    println!("  Transitions: {}", m.transitions.len());
    println!("  Filters: {}", m.filters.len());

    Ok(())
}
