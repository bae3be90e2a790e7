//! Analysis configuration contracts shared across the pipeline crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{FrequencyBand, SignalKind};

/// Complete core configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AnalysisConfig {
    /// Window segmentation
    #[serde(default)]
    #[validate(nested)]
    pub window: WindowConfig,

    /// Spectral peak search
    #[serde(default)]
    #[validate(nested)]
    pub spectral: SpectralConfig,

    /// Collision resolution policy
    #[serde(default)]
    #[validate(nested)]
    pub resolver: ResolverConfig,

    /// Execution strategy
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Sliding window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WindowConfig {
    /// Window duration in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub duration_s: f64,
    /// Step (hop) between consecutive window starts in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub step_s: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration_s: 8.0,
            step_s: 1.0,
        }
    }
}

/// Pre-FFT trend removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detrend {
    /// Subtract the mean (DC)
    #[default]
    Mean,
    /// Subtract the least-squares line
    Linear,
}

/// Taper applied before the DFT
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaperWindow {
    #[default]
    Hann,
    Hamming,
    /// No taper
    Rectangular,
}

/// Peak power scale; one scale applies to both signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerScale {
    /// |X(k)|
    #[default]
    Magnitude,
    /// |X(k)|²
    Squared,
}

/// Spectral analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SpectralConfig {
    /// PPG search band
    #[serde(default)]
    #[validate(nested)]
    pub cardiac_band: FrequencyBand,

    /// Motion search band
    #[serde(default)]
    #[validate(nested)]
    pub motion_band: FrequencyBand,

    /// Trend removal
    #[serde(default)]
    pub detrend: Detrend,

    /// Taper window
    #[serde(default)]
    pub taper: TaperWindow,

    /// DFT length; `None` = segment length, larger values zero-pad
    #[serde(default)]
    #[validate(range(min = 2))]
    pub fft_size: Option<usize>,

    /// Power scale
    #[serde(default)]
    pub power_scale: PowerScale,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            cardiac_band: FrequencyBand::default(),
            motion_band: FrequencyBand::default(),
            detrend: Detrend::default(),
            taper: TaperWindow::default(),
            fft_size: None,
            power_scale: PowerScale::default(),
        }
    }
}

impl SpectralConfig {
    /// Search band for a signal kind
    pub fn band_for(&self, kind: SignalKind) -> FrequencyBand {
        match kind {
            SignalKind::Ppg => self.cardiac_band,
            SignalKind::Motion => self.motion_band,
        }
    }
}

/// What to do when the motion channel has no detectable peak
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMotionPolicy {
    /// Discard the window as `insufficient_signal`
    #[default]
    Discard,
    /// Accept the cardiac peak as if no motion were present
    TrustCardiac,
}

/// Collision resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ResolverConfig {
    /// Peaks closer than or equal to this (cycles/minute) collide
    #[validate(range(min = 0.0))]
    pub collision_tolerance_bpm: f64,

    /// A peak dominates when its power is at least `ratio` times the other's
    #[validate(range(exclusive_min = 1.0))]
    pub dominance_ratio: f64,

    /// Motion harmonics checked for collision (1 = fundamental only)
    #[validate(range(min = 1, max = 8))]
    pub motion_harmonics: u32,

    /// Missing motion peak handling
    #[serde(default)]
    pub missing_motion: MissingMotionPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            collision_tolerance_bpm: 15.0,
            dominance_ratio: 2.0,
            motion_harmonics: 1,
            missing_motion: MissingMotionPolicy::default(),
        }
    }
}

/// Execution strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Evaluate windows concurrently
    pub parallel: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}
