//! Generate a synthetic frame log.

use std::path::PathBuf;

use chewtrack_common::clock::SessionClock;
use chewtrack_common::config::AppConfig;
use chewtrack_session::synthetic::{generate, MAX_SYNTHETIC_FRAMES};
use chewtrack_session::{EyeMode, JsonlReplaySource, SyntheticConfig};
use chewtrack_signal_model::serialize_frames;
use clap::Args;

use super::analyze;
use crate::PipelineOverrides;

/// Shape of the generated signal.
#[derive(Args, Debug, Clone)]
pub struct SignalArgs {
    /// Length of the session (seconds)
    #[arg(long, default_value = "20.0")]
    duration_secs: f64,

    /// Provider cadence (Hz)
    #[arg(long, default_value = "30.0")]
    rate_hz: f64,

    /// Chewing frequency (Hz)
    #[arg(long, default_value = "1.2")]
    chew_hz: f64,

    /// Resting mouth distance
    #[arg(long, default_value = "5.0")]
    baseline: f64,

    /// Mouth opening amplitude
    #[arg(long, default_value = "4.0")]
    amplitude: f64,

    /// Uniform noise added to the mouth distance
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// Eye channel behaviour: flat|alternating|mirror
    #[arg(long, default_value = "flat")]
    eye: String,

    /// Cadence jitter (± milliseconds)
    #[arg(long, default_value = "0.0")]
    jitter_ms: f64,

    /// Drop the face every n-th frame (0 = never)
    #[arg(long, default_value = "0")]
    dropout_every: u64,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

impl SignalArgs {
    fn to_config(&self) -> anyhow::Result<SyntheticConfig> {
        let eye: EyeMode = self.eye.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if self.rate_hz <= 0.0 || !self.rate_hz.is_finite() {
            anyhow::bail!("--rate-hz must be positive, got {}", self.rate_hz);
        }
        let config = SyntheticConfig {
            rate_hz: self.rate_hz,
            duration_secs: self.duration_secs,
            chew_hz: self.chew_hz,
            baseline: self.baseline,
            amplitude: self.amplitude,
            noise: self.noise.abs(),
            eye,
            jitter_ms: self.jitter_ms.abs(),
            dropout_every: self.dropout_every,
            seed: self.seed,
        };
        if config.requested_frames() > MAX_SYNTHETIC_FRAMES {
            anyhow::bail!(
                "{} s at {} Hz is more than {MAX_SYNTHETIC_FRAMES} frames",
                self.duration_secs,
                self.rate_hz
            );
        }
        Ok(config)
    }
}

pub async fn run(
    output: PathBuf,
    signal: SignalArgs,
    analyze: bool,
    config: &AppConfig,
    overrides: &PipelineOverrides,
) -> anyhow::Result<()> {
    let synthetic = signal.to_config()?;
    let header = synthetic.header(SessionClock::start().epoch_wall());
    let frames = generate(synthetic);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = format!("# {}\n", serde_json::to_string(&header)?);
    content.push_str(&serialize_frames(&frames)?);
    std::fs::write(&output, content)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;

    let duration_ns = frames.last().map(|f| f.time_ns).unwrap_or(0);
    println!(
        "Wrote {} frames ({}) to {}",
        frames.len(),
        SessionClock::format_elapsed(duration_ns),
        output.display()
    );
    println!("  {}", header.source);

    if analyze {
        println!();
        let mut source = JsonlReplaySource::from_frames(frames);
        let summary = analyze::analyze_source(
            &mut source,
            overrides.apply(config.pipeline.clone()),
            config.session.queue_capacity,
            None,
        )
        .await?;
        analyze::print_summary(&summary);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct SignalCli {
        #[command(flatten)]
        signal: SignalArgs,
    }

    fn signal(args: &[&str]) -> SignalArgs {
        SignalCli::try_parse_from(std::iter::once("simulate").chain(args.iter().copied()))
            .unwrap()
            .signal
    }

    #[test]
    fn test_oversized_run_is_refused() {
        let err = signal(&["--duration-secs", "1e9", "--rate-hz", "1000"])
            .to_config()
            .unwrap_err();
        assert!(err.to_string().contains("frames"), "{err}");
    }

    #[test]
    fn test_default_signal_args() {
        let config = signal(&["--eye", "mirror"]).to_config().unwrap();
        assert_eq!(config.eye, EyeMode::Mirror);
        assert_eq!(config.frame_count(), 600);
    }
}
