//! Write a default configuration file.

use std::path::PathBuf;

use chewtrack_common::config::{config_file_path, AppConfig};

pub fn run(output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(config_file_path);
    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = AppConfig::default();
    config
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    let p = &config.pipeline;
    println!("Config written to {}", path.display());
    println!("  Buffer capacity: {} samples", p.buffer_capacity);
    println!("  Warm-up: {} samples", p.warmup_samples);
    println!("  Low-pass cutoff: {} Hz", p.low_pass_cutoff_hz);
    println!("  Peak threshold: {}", p.peak_amplitude_threshold);
    println!(
        "  Correlation: window {} samples, reject at >= {}",
        p.correlation_window_size, p.correlation_threshold
    );
    println!("  Frequency window: {} peaks", p.frequency_window_size);

    Ok(())
}
