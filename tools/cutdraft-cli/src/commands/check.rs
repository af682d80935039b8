//! Check system capabilities.

use cutdraft_asset_resolver::SystemProbe;
use cutdraft_common::config::{config_file_path, EngineConfig};

pub fn run(config: &EngineConfig) -> anyhow::Result<()> {
    println!("cutdraft System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let probe = SystemProbe::new(config.probe.ffprobe_path.clone());
    let ffprobe_ok = probe.is_available();
    if ffprobe_ok {
        println!("[OK] ffprobe: {}", config.probe.ffprobe_path.display());
    } else {
        println!(
            "[FAIL] ffprobe: {} not runnable (install ffmpeg or set probe.ffprobe_path)",
            config.probe.ffprobe_path.display()
        );
    }
    println!("[OK] Probe workers: {}", config.probe.worker_count());

    let out_dir = &config.output.default_dir;
    if out_dir.is_dir() {
        println!("[OK] Default output directory: {}", out_dir.display());
    } else {
        println!(
            "[WARN] Default output directory missing, will be created: {}",
            out_dir.display()
        );
    }

    println!();
    if ffprobe_ok {
        println!("All required capabilities are available. cutdraft is ready.");
        Ok(())
    } else {
        anyhow::bail!("required capabilities are missing, see above for fixes")
    }
}
