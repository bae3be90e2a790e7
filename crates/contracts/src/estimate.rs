//! Estimate - Collision Resolver output
//!
//! One record per analysis window.

use serde::{Deserialize, Serialize};

use crate::SpectralPeak;

/// Why a window was discarded (`None` for accepted windows)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateReason {
    /// Window accepted
    #[default]
    None,
    /// No detectable in-band peak in a required signal
    InsufficientSignal,
    /// Frequencies collide and motion energy overwhelms the cardiac channel
    MotionDominantCollision,
    /// Frequencies collide and neither power dominates
    AmbiguousCollision,
}

impl EstimateReason {
    /// All variants, in output order
    pub const ALL: [EstimateReason; 4] = [
        EstimateReason::None,
        EstimateReason::InsufficientSignal,
        EstimateReason::MotionDominantCollision,
        EstimateReason::AmbiguousCollision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateReason::None => "none",
            EstimateReason::InsufficientSignal => "insufficient_signal",
            EstimateReason::MotionDominantCollision => "motion_dominant_collision",
            EstimateReason::AmbiguousCollision => "ambiguous_collision",
        }
    }

    pub fn is_discard(&self) -> bool {
        !matches!(self, EstimateReason::None)
    }
}

impl std::fmt::Display for EstimateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a detected frequency collision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionInfo {
    /// Motion harmonic the cardiac peak collided with (1 = fundamental)
    pub harmonic: u32,

    /// |cardiac - harmonic * motion| in cycles per minute
    pub delta_bpm: f64,
}

/// Per-window heart-rate estimate
///
/// Invariant: `valid` ⇔ `reason == None` ⇔ `bpm.is_some()`. Build through
/// [`Estimate::accepted`] / [`Estimate::discarded`] to keep it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Window sequence number (ordering key)
    pub window_index: usize,

    /// Window start timestamp (seconds)
    pub timestamp_s: f64,

    /// Heart rate (cycles per minute), `None` when discarded
    pub bpm: Option<f64>,

    /// Whether the estimate can be trusted
    pub valid: bool,

    /// Discard reason
    pub reason: EstimateReason,

    /// Collision details, if the peaks collided
    pub collision: Option<CollisionInfo>,

    /// Dominant PPG peak
    pub cardiac_peak: Option<SpectralPeak>,

    /// Dominant motion peak
    pub motion_peak: Option<SpectralPeak>,
}

impl Estimate {
    /// Accepted window; BPM taken from the cardiac peak
    pub fn accepted(
        window_index: usize,
        timestamp_s: f64,
        cardiac: SpectralPeak,
        motion: Option<SpectralPeak>,
        collision: Option<CollisionInfo>,
    ) -> Self {
        Self {
            window_index,
            timestamp_s,
            bpm: Some(cardiac.bpm()),
            valid: true,
            reason: EstimateReason::None,
            collision,
            cardiac_peak: Some(cardiac),
            motion_peak: motion,
        }
    }

    /// Discarded window
    ///
    /// `reason` must not be [`EstimateReason::None`]; it is coerced to
    /// `InsufficientSignal` if it is, so the validity invariant always holds.
    pub fn discarded(
        window_index: usize,
        timestamp_s: f64,
        reason: EstimateReason,
        cardiac: Option<SpectralPeak>,
        motion: Option<SpectralPeak>,
        collision: Option<CollisionInfo>,
    ) -> Self {
        let reason = if reason.is_discard() {
            reason
        } else {
            EstimateReason::InsufficientSignal
        };
        Self {
            window_index,
            timestamp_s,
            bpm: None,
            valid: false,
            reason,
            collision,
            cardiac_peak: cardiac,
            motion_peak: motion,
        }
    }

    pub fn is_collision(&self) -> bool {
        self.collision.is_some()
    }

    /// Flatten into the export record
    pub fn to_record(&self) -> EstimateRecord {
        EstimateRecord::from(self)
    }
}

/// Flat export row
///
/// The persisted representation: keeps the nullable BPM and the reason code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub window_index: usize,
    pub timestamp_s: f64,
    pub bpm: Option<f64>,
    pub valid: bool,
    pub reason: EstimateReason,
    pub collision: bool,
    pub collision_harmonic: Option<u32>,
    pub cardiac_hz: Option<f64>,
    pub cardiac_power: Option<f64>,
    pub motion_hz: Option<f64>,
    pub motion_power: Option<f64>,
}

impl From<&Estimate> for EstimateRecord {
    fn from(estimate: &Estimate) -> Self {
        Self {
            window_index: estimate.window_index,
            timestamp_s: estimate.timestamp_s,
            bpm: estimate.bpm,
            valid: estimate.valid,
            reason: estimate.reason,
            collision: estimate.collision.is_some(),
            collision_harmonic: estimate.collision.map(|c| c.harmonic),
            cardiac_hz: estimate.cardiac_peak.map(|p| p.frequency_hz),
            cardiac_power: estimate.cardiac_peak.map(|p| p.power),
            motion_hz: estimate.motion_peak.map(|p| p.frequency_hz),
            motion_power: estimate.motion_peak.map(|p| p.power),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_invariant() {
        let est = Estimate::accepted(3, 3.0, SpectralPeak::new(1.2, 10.0), None, None);
        assert!(est.valid);
        assert_eq!(est.reason, EstimateReason::None);
        assert!((est.bpm.unwrap() - 72.0).abs() < 1e-9);
        assert!(!est.is_collision());
    }

    #[test]
    fn test_discarded_invariant() {
        let est = Estimate::discarded(
            0,
            0.0,
            EstimateReason::AmbiguousCollision,
            None,
            None,
            None,
        );
        assert!(!est.valid);
        assert!(est.bpm.is_none());
        assert_eq!(est.reason, EstimateReason::AmbiguousCollision);
    }

    #[test]
    fn test_discarded_never_carries_none_reason() {
        let est = Estimate::discarded(0, 0.0, EstimateReason::None, None, None, None);
        assert_eq!(est.reason, EstimateReason::InsufficientSignal);
    }

    #[test]
    fn test_reason_serde_snake_case() {
        let json = serde_json::to_string(&EstimateReason::MotionDominantCollision).unwrap();
        assert_eq!(json, "\"motion_dominant_collision\"");
        let back: EstimateReason = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(back, EstimateReason::None);
    }

    #[test]
    fn test_record_keeps_null_bpm() {
        let est = Estimate::discarded(
            7,
            7.0,
            EstimateReason::MotionDominantCollision,
            Some(SpectralPeak::new(2.0, 1.0)),
            Some(SpectralPeak::new(2.05, 5.0)),
            Some(CollisionInfo {
                harmonic: 1,
                delta_bpm: 3.0,
            }),
        );
        let record = est.to_record();
        assert!(record.collision);
        assert_eq!(record.collision_harmonic, Some(1));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["bpm"].is_null());
        assert_eq!(json["reason"], "motion_dominant_collision");
    }
}
