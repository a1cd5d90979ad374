//! chewtrack CLI: command-line interface for chewing analysis.
//!
//! Usage:
//!   chewtrack analyze <FRAMES>    Run the chewing pipeline over a frame log
//!   chewtrack simulate [OPTIONS]  Write a synthetic frame log
//!   chewtrack init                Write a default configuration file

use std::path::PathBuf;

use chewtrack_common::config::AppConfig;
use chewtrack_signal_model::PipelineConfig;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chewtrack",
    about = "Chewing detection from face-landmark streams",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/chewtrack/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Pipeline options that override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineOverrides {
    /// Low-pass cutoff frequency (Hz)
    #[arg(long)]
    cutoff_hz: Option<f64>,

    /// Minimum filtered amplitude for a peak
    #[arg(long)]
    peak_threshold: Option<f64>,

    /// Correlation at or above which a peak is rejected
    #[arg(long)]
    correlation_threshold: Option<f64>,

    /// Samples per correlation window
    #[arg(long)]
    correlation_window: Option<usize>,

    /// Accepted peaks used by the frequency estimate
    #[arg(long)]
    frequency_window: Option<usize>,

    /// Raw samples collected before filtering starts
    #[arg(long)]
    warmup: Option<usize>,

    /// Samples kept per channel
    #[arg(long)]
    capacity: Option<usize>,
}

impl PipelineOverrides {
    /// `base` with every option given on the command line replaced.
    pub fn apply(&self, base: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            low_pass_cutoff_hz: self.cutoff_hz.unwrap_or(base.low_pass_cutoff_hz),
            peak_amplitude_threshold: self.peak_threshold.unwrap_or(base.peak_amplitude_threshold),
            correlation_threshold: self
                .correlation_threshold
                .unwrap_or(base.correlation_threshold),
            correlation_window_size: self
                .correlation_window
                .unwrap_or(base.correlation_window_size),
            frequency_window_size: self.frequency_window.unwrap_or(base.frequency_window_size),
            warmup_samples: self.warmup.unwrap_or(base.warmup_samples),
            buffer_capacity: self.capacity.unwrap_or(base.buffer_capacity),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chewing pipeline over a recorded frame log
    Analyze {
        /// Path to the JSONL frame log
        path: PathBuf,

        #[command(flatten)]
        pipeline: PipelineOverrides,

        /// Append one line per cycle to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic frame log
    Simulate {
        /// Output file
        #[arg(short, long, default_value = "frames.jsonl")]
        output: PathBuf,

        #[command(flatten)]
        signal: commands::simulate::SignalArgs,

        /// Also run the pipeline over the generated frames
        #[arg(long)]
        analyze: bool,

        #[command(flatten)]
        pipeline: PipelineOverrides,
    },

    /// Write a default configuration file
    Init {
        /// Destination (defaults to the standard config location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    chewtrack_common::logging::init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Analyze {
            path,
            pipeline,
            record,
            json,
        } => commands::analyze::run(path, &config, &pipeline, record, json).await,
        Commands::Simulate {
            output,
            signal,
            analyze,
            pipeline,
        } => commands::simulate::run(output, signal, analyze, &config, &pipeline).await,
        Commands::Init { output, force } => commands::init::run(output, force),
    }
}
