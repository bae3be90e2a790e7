//! SpectralPeak - Spectral Analyzer output

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Seconds per minute, used for Hz <-> BPM conversion
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Convert Hz to cycles per minute
pub fn hz_to_bpm(hz: f64) -> f64 {
    hz * SECONDS_PER_MINUTE
}

/// Convert cycles per minute to Hz
pub fn bpm_to_hz(bpm: f64) -> f64 {
    bpm / SECONDS_PER_MINUTE
}

/// Dominant in-band spectral component of one signal in one window
///
/// "No peak" (flat segment, zero in-band energy) is modelled as
/// `Option::<SpectralPeak>::None` rather than a zero-power peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// Peak frequency (Hz)
    pub frequency_hz: f64,

    /// Magnitude (or magnitude squared), always > 0
    pub power: f64,
}

impl SpectralPeak {
    pub fn new(frequency_hz: f64, power: f64) -> Self {
        Self {
            frequency_hz,
            power,
        }
    }

    /// Build a peak from a cycles-per-minute frequency
    pub fn from_bpm(bpm: f64, power: f64) -> Self {
        Self::new(bpm_to_hz(bpm), power)
    }

    /// Peak frequency in cycles per minute
    pub fn bpm(&self) -> f64 {
        hz_to_bpm(self.frequency_hz)
    }
}

/// Inclusive frequency search band (Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct FrequencyBand {
    /// Lower edge (Hz)
    #[validate(range(min = 0.0))]
    pub min_hz: f64,

    /// Upper edge (Hz)
    #[validate(range(exclusive_min = 0.0))]
    pub max_hz: f64,
}

impl FrequencyBand {
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    /// Build a band from cycles-per-minute edges
    pub fn from_bpm(min_bpm: f64, max_bpm: f64) -> Self {
        Self::new(bpm_to_hz(min_bpm), bpm_to_hz(max_bpm))
    }

    pub fn contains(&self, frequency_hz: f64) -> bool {
        frequency_hz >= self.min_hz && frequency_hz <= self.max_hz
    }

    pub fn min_bpm(&self) -> f64 {
        hz_to_bpm(self.min_hz)
    }

    pub fn max_bpm(&self) -> f64 {
        hz_to_bpm(self.max_hz)
    }
}

impl Default for FrequencyBand {
    /// 30-240 cycles/minute
    fn default() -> Self {
        Self {
            min_hz: 0.5,
            max_hz: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_bpm_conversion() {
        let peak = SpectralPeak::new(1.2, 3.0);
        assert!((peak.bpm() - 72.0).abs() < 1e-9);

        let peak = SpectralPeak::from_bpm(150.0, 1.0);
        assert!((peak.frequency_hz - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_default_band_covers_cardiac_range() {
        let band = FrequencyBand::default();
        assert!((band.min_bpm() - 30.0).abs() < 1e-9);
        assert!((band.max_bpm() - 240.0).abs() < 1e-9);
        assert!(band.contains(0.5));
        assert!(band.contains(4.0));
        assert!(!band.contains(4.01));
    }

    #[test]
    fn test_band_validation() {
        assert!(FrequencyBand::new(0.5, 4.0).validate().is_ok());
        assert!(FrequencyBand::new(-1.0, 4.0).validate().is_err());
        assert!(FrequencyBand::new(0.0, 0.0).validate().is_err());
    }
}
