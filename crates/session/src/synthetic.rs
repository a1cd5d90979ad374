//! Synthetic chewing signal for demos and soak tests.

use std::fmt;
use std::str::FromStr;

use chewtrack_common::error::ChewResult;
use chewtrack_signal_model::{EyePoint, FrameStreamHeader, LandmarkFrame, TimestampNs};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::LandmarkSource;

/// Smallest gap between two synthetic frames, whatever the jitter.
const MIN_FRAME_GAP_NS: u64 = 1_000_000;

/// Upper bound on the frames one synthetic run yields (a day at 120 Hz).
pub const MAX_SYNTHETIC_FRAMES: u64 = 10_368_000;

/// How the eye channel moves relative to the mouth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeMode {
    /// Eyes hold still; every mouth peak is genuine chewing.
    Flat,
    /// Eye distance flickers frame to frame, unrelated to the mouth.
    Alternating,
    /// Eye distance follows the mouth, as during a head movement.
    Mirror,
}

impl fmt::Display for EyeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Flat => "flat",
            Self::Alternating => "alternating",
            Self::Mirror => "mirror",
        };
        f.write_str(name)
    }
}

impl FromStr for EyeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "alternating" => Ok(Self::Alternating),
            "mirror" => Ok(Self::Mirror),
            other => Err(format!(
                "unknown eye mode '{other}' (expected flat, alternating or mirror)"
            )),
        }
    }
}

/// Shape of the generated signal.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Nominal provider cadence (Hz).
    pub rate_hz: f64,
    pub duration_secs: f64,
    /// Chewing frequency of the mouth signal (Hz).
    pub chew_hz: f64,
    pub baseline: f64,
    pub amplitude: f64,
    /// Uniform noise added to the mouth distance (±).
    pub noise: f64,
    pub eye: EyeMode,
    /// Uniform cadence jitter (± milliseconds).
    pub jitter_ms: f64,
    /// Every n-th frame has no face; 0 disables dropouts.
    pub dropout_every: u64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rate_hz: 30.0,
            duration_secs: 20.0,
            chew_hz: 1.2,
            baseline: 5.0,
            amplitude: 4.0,
            noise: 0.0,
            eye: EyeMode::Flat,
            jitter_ms: 0.0,
            dropout_every: 0,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Number of frames the source yields, at most [`MAX_SYNTHETIC_FRAMES`].
    pub fn frame_count(&self) -> u64 {
        self.requested_frames().min(MAX_SYNTHETIC_FRAMES)
    }

    /// `duration_secs * rate_hz`, before the cap.
    pub fn requested_frames(&self) -> u64 {
        if self.rate_hz <= 0.0 || self.duration_secs <= 0.0 {
            return 0;
        }
        (self.duration_secs * self.rate_hz).round() as u64
    }

    /// Header for a frame log written from this source.
    pub fn header(&self, epoch_wall: impl Into<String>) -> FrameStreamHeader {
        FrameStreamHeader {
            schema_version: "1.0".to_string(),
            epoch_wall: epoch_wall.into(),
            nominal_rate_hz: self.rate_hz,
            source: format!(
                "synthetic chew_hz={} eye={} jitter_ms={} seed={}",
                self.chew_hz, self.eye, self.jitter_ms, self.seed
            ),
        }
    }
}

/// Deterministic (seeded) generator of landmark frames.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    rng: StdRng,
    index: u64,
    time_ns: TimestampNs,
    total: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            total: config.frame_count(),
            index: 0,
            time_ns: 0,
            config,
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    fn next_frame(&mut self) -> LandmarkFrame {
        let c = &self.config;
        let t = self.time_ns as f64 / 1_000_000_000.0;
        let mut mouth =
            c.baseline + c.amplitude * (2.0 * std::f64::consts::PI * c.chew_hz * t).sin();
        if c.noise > 0.0 {
            mouth += self.rng.gen_range(-c.noise..c.noise);
        }

        let eye = match c.eye {
            EyeMode::Flat => EyePoint::new(0.5, 0.0),
            EyeMode::Alternating if self.index % 2 == 0 => EyePoint::new(c.baseline + 1.0, 0.0),
            EyeMode::Alternating => EyePoint::new(c.baseline - 1.0, 0.0),
            EyeMode::Mirror => EyePoint::new(mouth, 0.0),
        };

        let dropped = c.dropout_every > 0 && (self.index + 1) % c.dropout_every == 0;
        let frame = if dropped {
            LandmarkFrame::empty(self.time_ns)
        } else {
            LandmarkFrame::new(self.time_ns, mouth, Some(eye))
        };

        let nominal_ns = 1_000_000_000.0 / c.rate_hz;
        let jitter_ns = if c.jitter_ms > 0.0 {
            self.rng.gen_range(-c.jitter_ms..c.jitter_ms) * 1_000_000.0
        } else {
            0.0
        };
        let gap = (nominal_ns + jitter_ns).max(MIN_FRAME_GAP_NS as f64) as u64;

        self.time_ns += gap;
        self.index += 1;
        frame
    }
}

impl LandmarkSource for SyntheticSource {
    fn poll(&mut self) -> ChewResult<Option<LandmarkFrame>> {
        if self.is_exhausted() {
            return Ok(None);
        }
        Ok(Some(self.next_frame()))
    }

    fn name(&self) -> &str {
        "synthetic"
    }

    fn is_exhausted(&self) -> bool {
        self.index >= self.total
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Every frame of a synthetic run.
pub fn generate(config: SyntheticConfig) -> Vec<LandmarkFrame> {
    let mut source = SyntheticSource::new(config);
    std::iter::from_fn(|| (!source.is_exhausted()).then(|| source.next_frame())).collect()
}
