//! Append-only cycle recorder.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chewtrack_common::error::{ChewError, ChewResult};
use chewtrack_processing_core::{CycleStatus, PipelineState};
use chewtrack_signal_model::{LandmarkFrame, Peak, PipelineConfig, TimestampNs};
use serde::{Deserialize, Serialize};

/// Records between forced flushes.
const FLUSH_EVERY: u64 = 300;

/// First (comment) line of a cycle recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingHeader {
    pub schema_version: String,

    /// Wall-clock time at session start (ISO 8601).
    pub epoch_wall: String,

    /// Where the frames came from.
    #[serde(default)]
    pub source: String,

    /// Options the session ran with.
    pub pipeline: PipelineConfig,
}

impl RecordingHeader {
    pub fn new(epoch_wall: impl Into<String>, source: impl Into<String>, pipeline: PipelineConfig) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            epoch_wall: epoch_wall.into(),
            source: source.into(),
            pipeline,
        }
    }
}

/// One line of a cycle recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    #[serde(rename = "t")]
    pub time_ns: TimestampNs,

    /// Raw mouth distance of the frame.
    pub mouth: Option<f64>,

    /// Newest filtered mouth value.
    pub filtered: Option<f64>,

    pub sample_rate_hz: Option<f64>,
    pub status: CycleStatus,

    /// Peaks currently accepted as chewing, with their correlation.
    pub accepted_peaks: Vec<Peak>,

    /// Number of peaks rejected as artifacts.
    pub removed_peaks: usize,
    pub frequency_hz: Option<f64>,
}

impl CycleRecord {
    pub fn from_cycle(frame: &LandmarkFrame, state: &PipelineState) -> Self {
        Self {
            time_ns: frame.time_ns,
            mouth: frame.mouth,
            filtered: state.last_filtered().map(|s| s.value),
            sample_rate_hz: state.sample_rate_hz(),
            status: state.status(),
            accepted_peaks: state.peaks().filtered.clone(),
            removed_peaks: state.peaks().removed.len(),
            frequency_hz: state.frequency_hz(),
        }
    }
}

/// Writes cycle records to a JSONL file.
pub struct CycleWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl CycleWriter {
    /// Create the file, writing the header as the first line.
    pub fn new(path: impl Into<PathBuf>, header: &RecordingHeader) -> ChewResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| ChewError::recording(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            records_written: 0,
        })
    }

    /// Append the outcome of the cycle that just processed `frame`.
    pub fn write_cycle(&mut self, frame: &LandmarkFrame, state: &PipelineState) -> ChewResult<()> {
        self.write_record(&CycleRecord::from_cycle(frame, state))
    }

    pub fn write_record(&mut self, record: &CycleRecord) -> ChewResult<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| ChewError::recording(format!("Failed to write cycle: {e}")))?;
        self.records_written += 1;

        if self.records_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> ChewResult<()> {
        self.writer
            .flush()
            .map_err(|e| ChewError::recording(format!("Failed to flush cycles: {e}")))
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CycleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Read the records of a cycle recording, skipping the header.
pub fn read_records(content: &str) -> Result<Vec<CycleRecord>, serde_json::Error> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chewtrack_processing_core::ChewingPipeline;
    use chewtrack_signal_model::EyePoint;

    #[test]
    fn test_cycle_writer_roundtrip() {
        let dir = std::env::temp_dir().join("chewtrack_test_cycle_writer");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.join("cycles.jsonl");
        let pipeline = ChewingPipeline::with_defaults();
        let header = RecordingHeader::new("2026-01-01T00:00:00Z", "test", pipeline.config().clone());

        {
            let mut writer = CycleWriter::new(&path, &header).unwrap();
            let mut state = pipeline.initial_state();
            for i in 0..12u64 {
                let frame = LandmarkFrame::new(i * 33_333_333, 1.0, Some(EyePoint::new(0.3, 0.4)));
                state = pipeline.advance(state, &frame);
                writer.write_cycle(&frame, &state).unwrap();
            }
            assert_eq!(writer.records_written(), 12);
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("# "));

        let parsed: RecordingHeader = serde_json::from_str(&lines[0][2..]).unwrap();
        assert_eq!(parsed.pipeline, PipelineConfig::default());

        let records = read_records(&content).unwrap();
        assert_eq!(records[0].status, CycleStatus::WarmingUp);
        assert_eq!(records[0].filtered, None);
        assert!((records[11].filtered.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(records[11].mouth, Some(1.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_record_lists_accepted_peaks() {
        let pipeline = ChewingPipeline::new(PipelineConfig {
            peak_amplitude_threshold: 6.0,
            ..Default::default()
        })
        .unwrap();
        let frames: Vec<LandmarkFrame> = (0..300u64)
            .map(|i| {
                let t = (i * 33_333_333) as f64 / 1e9;
                let mouth = 5.0 + 4.0 * (std::f64::consts::PI * t).sin();
                LandmarkFrame::new(i * 33_333_333, mouth, Some(EyePoint::new(0.5, 0.0)))
            })
            .collect();
        let state = pipeline.run(&frames);

        let record = CycleRecord::from_cycle(&frames[299], &state);
        assert_eq!(record.accepted_peaks, state.peaks().filtered);
        assert_eq!(record.accepted_peaks.len(), 2);
        assert_eq!(record.removed_peaks, 0);

        let line = serde_json::to_string(&record).unwrap();
        let parsed = read_records(&line).unwrap();
        assert_eq!(parsed[0].accepted_peaks[0].time_ns, record.accepted_peaks[0].time_ns);
        assert_eq!(parsed[0].accepted_peaks[0].correlation, Some(0.0));
    }
}
