//! Run the chewing pipeline over a frame log.

use std::path::{Path, PathBuf};

use chewtrack_common::clock::SessionClock;
use chewtrack_common::config::AppConfig;
use chewtrack_processing_core::ChewingPipeline;
use chewtrack_session::{
    drive_source, CycleWriter, JsonlReplaySource, LandmarkSource, MonitoringSession,
    RecordingHeader, SessionSummary,
};
use chewtrack_signal_model::{Peak, PipelineConfig};

use crate::PipelineOverrides;

pub async fn run(
    path: PathBuf,
    config: &AppConfig,
    overrides: &PipelineOverrides,
    record: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    if !json {
        println!("Analyzing frames from: {}", path.display());
    }

    let mut source = JsonlReplaySource::open(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load frame log: {e}"))?;
    if !json {
        println!("  Loaded {} frames", source.remaining());
        if let Some(header) = source.header() {
            println!(
                "  Source: {} ({} Hz nominal)",
                header.source, header.nominal_rate_hz
            );
        }
    }

    let record = record.or_else(|| {
        config
            .session
            .record_cycles
            .then(|| default_recording_path(&path))
    });

    let summary = analyze_source(
        &mut source,
        overrides.apply(config.pipeline.clone()),
        config.session.queue_capacity,
        record,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*summary.last)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Feed every frame of `source` through a fresh monitoring session.
pub async fn analyze_source<S>(
    source: &mut S,
    pipeline_config: PipelineConfig,
    queue_capacity: usize,
    record: Option<PathBuf>,
) -> anyhow::Result<SessionSummary>
where
    S: LandmarkSource + ?Sized,
{
    let pipeline = ChewingPipeline::new(pipeline_config)
        .map_err(|e| anyhow::anyhow!("Invalid pipeline options: {e}"))?;

    let mut session = MonitoringSession::new(pipeline.clone()).with_queue_capacity(queue_capacity);
    if let Some(path) = &record {
        let clock = SessionClock::start();
        let header = RecordingHeader::new(clock.epoch_wall(), source.name(), pipeline.config().clone());
        let writer = CycleWriter::new(path, &header)
            .map_err(|e| anyhow::anyhow!("Failed to create recording: {e}"))?;
        session = session.with_recorder(writer);
    }

    let handle = session.start();
    let fed = drive_source(source, &handle).await;
    let summary = handle
        .finish()
        .await
        .map_err(|e| anyhow::anyhow!("Session failed: {e}"))?;
    fed.map_err(|e| anyhow::anyhow!("Failed to feed frames: {e}"))?;

    if let Some(path) = record {
        tracing::info!(path = %path.display(), "Cycle recording written");
    }
    Ok(summary)
}

fn default_recording_path(frames: &Path) -> PathBuf {
    let stem = frames
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string());
    frames.with_file_name(format!("{stem}.cycles.jsonl"))
}

pub fn print_summary(summary: &SessionSummary) {
    let snapshot = &summary.last;

    println!(
        "  Processed {} cycles ({} frames, {} dropped)",
        summary.cycles, summary.frames, summary.dropped
    );
    if let Some(last) = snapshot.raw.last() {
        println!(
            "  Signal duration: {}",
            SessionClock::format_elapsed(last.time_ns)
        );
    }
    match snapshot.sample_rate_hz {
        Some(rate) => println!("  Sample rate: {rate:.1} Hz"),
        None => println!("  Sample rate: unknown (still warming up)"),
    }

    println!("\nAccepted peaks: {}", snapshot.peaks.filtered.len());
    print_peaks(&snapshot.peaks.filtered);
    println!("Rejected peaks (eye movement): {}", snapshot.peaks.removed.len());
    print_peaks(&snapshot.peaks.removed);

    match snapshot.frequency_hz {
        Some(hz) => println!("\nChewing frequency: {hz:.2} Hz ({:.0} per minute)", hz * 60.0),
        None => println!("\nChewing frequency: not enough accepted peaks"),
    }
}

fn print_peaks(peaks: &[Peak]) {
    for peak in peaks {
        let correlation = peak.correlation_text();
        println!(
            "    t={:>8.3}s  value={:>7.3}  corr={}",
            SessionClock::ns_to_secs(peak.time_ns),
            peak.value,
            if correlation.is_empty() { "-" } else { correlation.as_str() }
        );
    }
}
