//! Landmark frames emitted by the landmark provider.
//!
//! One frame is produced per detection cycle. Frame logs are stored as
//! JSONL: an optional `# {header}` comment line followed by one frame
//! object per line.

use serde::{Deserialize, Serialize};

use crate::sample::{Sample, TimestampNs};

/// Raw 2D eye-region coordinate reported by the landmark provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyePoint {
    pub x: f64,
    pub y: f64,
}

impl EyePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance of the point from the origin.
    pub fn distance(&self) -> f64 {
        euclidean_distance(self.x, self.y)
    }
}

/// `sqrt(x² + y²)`.
pub fn euclidean_distance(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

/// Output of one landmark detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic nanoseconds since session start.
    #[serde(rename = "t")]
    pub time_ns: TimestampNs,

    /// Mouth-aperture distance. Absent when no face was found this cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouth: Option<f64>,

    /// Eye-region point, if tracked this cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye: Option<EyePoint>,
}

impl LandmarkFrame {
    pub fn new(time_ns: TimestampNs, mouth: f64, eye: Option<EyePoint>) -> Self {
        Self {
            time_ns,
            mouth: Some(mouth),
            eye,
        }
    }

    /// A frame with no mouth measurement.
    pub fn empty(time_ns: TimestampNs) -> Self {
        Self {
            time_ns,
            mouth: None,
            eye: None,
        }
    }

    /// Mouth-distance sample for this frame.
    pub fn mouth_sample(&self) -> Option<Sample> {
        self.mouth.map(|value| Sample::new(self.time_ns, value))
    }

    /// Eye-distance sample for this frame, stamped with the frame time.
    pub fn eye_sample(&self) -> Option<Sample> {
        self.eye.map(|p| Sample::new(self.time_ns, p.distance()))
    }
}

/// Metadata written as the first (comment) line of a frame log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at session start (ISO 8601).
    pub epoch_wall: String,

    /// Nominal detection cadence of the provider (Hz).
    pub nominal_rate_hz: f64,

    /// Free-form description of where the frames came from.
    #[serde(default)]
    pub source: String,
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<LandmarkFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Parse the `# {header}` line of a frame log, if present.
pub fn parse_header(jsonl: &str) -> Option<FrameStreamHeader> {
    let first = jsonl.lines().map(str::trim).find(|l| !l.is_empty())?;
    let json = first.strip_prefix('#')?.trim();
    serde_json::from_str(json).ok()
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[LandmarkFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
