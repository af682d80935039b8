//! Validate a generated draft.

use std::path::PathBuf;

use cutdraft_project_model::document::DraftContent;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating draft at: {}", path.display());

    let draft =
        DraftContent::load(&path).map_err(|e| anyhow::anyhow!("Failed to load draft: {e}"))?;

    println!("  Name: {}", draft.name);
    println!("  Schema version: {}", draft.version);
    println!(
        "  Canvas: {}x{} ({})",
        draft.canvas_config.width, draft.canvas_config.height, draft.canvas_config.ratio
    );
    println!("  Tracks: {}", draft.tracks.len());

    let problems = draft.dangling_references();
    if problems.is_empty() {
        println!("  References: all resolve");
        println!("\nDraft is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for problem in &problems {
        println!("  - {problem}");
    }
    anyhow::bail!("{} issue(s) found", problems.len())
}
