//! Signal - core input
//!
//! Fully buffered, already-filtered sample streams.

use serde::{Deserialize, Serialize};

/// Signal type tag
///
/// Selects the search band used by the spectral analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Photoplethysmography, band-limited to the cardiac band
    Ppg,
    /// Motion magnitude derived from tri-axial acceleration
    Motion,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Ppg => "ppg",
            SignalKind::Motion => "motion",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniformly sampled real-valued signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal type
    pub kind: SignalKind,

    /// Sample rate (Hz)
    pub sample_rate_hz: f64,

    /// Timestamp of the first sample (seconds)
    pub start_time_s: f64,

    /// Samples
    pub samples: Vec<f64>,
}

impl Signal {
    /// Create a signal starting at t = 0
    pub fn new(kind: SignalKind, sample_rate_hz: f64, samples: Vec<f64>) -> Self {
        Self {
            kind,
            sample_rate_hz,
            start_time_s: 0.0,
            samples,
        }
    }

    /// Create a PPG signal starting at t = 0
    pub fn ppg(sample_rate_hz: f64, samples: Vec<f64>) -> Self {
        Self::new(SignalKind::Ppg, sample_rate_hz, samples)
    }

    /// Create a motion signal starting at t = 0
    pub fn motion(sample_rate_hz: f64, samples: Vec<f64>) -> Self {
        Self::new(SignalKind::Motion, sample_rate_hz, samples)
    }

    /// Reduce tri-axial acceleration to a single motion channel
    pub fn motion_from_axes(
        sample_rate_hz: f64,
        axes: &[Vector3],
        reduction: MotionReduction,
    ) -> Self {
        let samples = axes.iter().map(|v| reduction.apply(v)).collect();
        Self::motion(sample_rate_hz, samples)
    }

    /// Shift the start timestamp
    pub fn with_start_time(mut self, start_time_s: f64) -> Self {
        self.start_time_s = start_time_s;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total covered duration (seconds)
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate_hz > 0.0 {
            self.samples.len() as f64 / self.sample_rate_hz
        } else {
            0.0
        }
    }
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

/// How tri-axial acceleration collapses into the motion channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionReduction {
    /// Euclidean norm of the three axes
    #[default]
    Magnitude,
    X,
    Y,
    Z,
}

impl MotionReduction {
    pub fn apply(&self, v: &Vector3) -> f64 {
        match self {
            MotionReduction::Magnitude => v.magnitude(),
            MotionReduction::X => v.x,
            MotionReduction::Y => v.y,
            MotionReduction::Z => v.z,
        }
    }
}
