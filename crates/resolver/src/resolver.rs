//! Collision resolver

use contracts::ContractError;
use tracing::{debug, instrument, trace};

use crate::{
    CollisionInfo, Estimate, EstimateReason, MissingMotionPolicy, ResolverConfig, SpectralPeak,
};

/// Outcome of one window before it is stamped with index and time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// `EstimateReason::None` when the cardiac peak is accepted
    pub reason: EstimateReason,

    /// Set whenever the peaks collided, accepted or not
    pub collision: Option<CollisionInfo>,
}

impl Decision {
    fn accept(collision: Option<CollisionInfo>) -> Self {
        Self {
            reason: EstimateReason::None,
            collision,
        }
    }

    fn discard(reason: EstimateReason, collision: Option<CollisionInfo>) -> Self {
        Self { reason, collision }
    }

    pub fn is_valid(&self) -> bool {
        !self.reason.is_discard()
    }
}

/// Relative slack on the tolerance edge so bin frequencies that are not
/// exact binary fractions still land on the inclusive side.
const TOLERANCE_SLACK: f64 = 1e-9;

/// Frequency-collision tie-break
///
/// Boundaries are inclusive on both axes: a frequency gap equal to the
/// tolerance (up to float rounding) is a collision, and a power exactly
/// `ratio` times the other dominates.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    config: ResolverConfig,
}

impl CollisionResolver {
    /// # Errors
    /// `Configuration` for a negative or non-finite tolerance, a ratio not
    /// strictly above 1, or zero harmonics.
    pub fn new(config: ResolverConfig) -> Result<Self, ContractError> {
        let tolerance = config.collision_tolerance_bpm;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ContractError::configuration(
                "analysis.resolver.collision_tolerance_bpm",
                format!("must be a finite value >= 0, got {tolerance}"),
            ));
        }
        let ratio = config.dominance_ratio;
        if !ratio.is_finite() || ratio <= 1.0 {
            return Err(ContractError::configuration(
                "analysis.resolver.dominance_ratio",
                format!("must be a finite value > 1, got {ratio}"),
            ));
        }
        if config.motion_harmonics == 0 {
            return Err(ContractError::configuration(
                "analysis.resolver.motion_harmonics",
                "must be >= 1",
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Decide a window from its two peaks
    pub fn decide(&self, cardiac: Option<SpectralPeak>, motion: Option<SpectralPeak>) -> Decision {
        let Some(cardiac) = cardiac.filter(is_usable) else {
            return Decision::discard(EstimateReason::InsufficientSignal, None);
        };
        let Some(motion) = motion.filter(is_usable) else {
            return match self.config.missing_motion {
                MissingMotionPolicy::Discard => {
                    Decision::discard(EstimateReason::InsufficientSignal, None)
                }
                MissingMotionPolicy::TrustCardiac => Decision::accept(None),
            };
        };

        let Some(collision) = self.closest_collision(&cardiac, &motion) else {
            return Decision::accept(None);
        };

        let ratio = self.config.dominance_ratio;
        if cardiac.power >= ratio * motion.power {
            Decision::accept(Some(collision))
        } else if motion.power >= ratio * cardiac.power {
            Decision::discard(EstimateReason::MotionDominantCollision, Some(collision))
        } else {
            Decision::discard(EstimateReason::AmbiguousCollision, Some(collision))
        }
    }

    /// Resolve one window into an estimate
    #[instrument(
        name = "resolver_resolve",
        level = "trace",
        skip(self, cardiac, motion),
        fields(window = window_index)
    )]
    pub fn resolve(
        &self,
        window_index: usize,
        timestamp_s: f64,
        cardiac: Option<SpectralPeak>,
        motion: Option<SpectralPeak>,
    ) -> Estimate {
        let decision = self.decide(cardiac, motion);

        match cardiac {
            Some(peak) if decision.is_valid() => {
                trace!(bpm = peak.bpm(), collision = decision.collision.is_some(), "accepted");
                Estimate::accepted(window_index, timestamp_s, peak, motion, decision.collision)
            }
            _ => {
                debug!(
                    window = window_index,
                    reason = %decision.reason,
                    cardiac_bpm = cardiac.map(|p| p.bpm()),
                    motion_bpm = motion.map(|p| p.bpm()),
                    "window discarded"
                );
                Estimate::discarded(
                    window_index,
                    timestamp_s,
                    decision.reason,
                    cardiac,
                    motion,
                    decision.collision,
                )
            }
        }
    }

    /// Nearest motion harmonic within tolerance of the cardiac peak
    ///
    /// Equal gaps keep the lower harmonic.
    fn closest_collision(
        &self,
        cardiac: &SpectralPeak,
        motion: &SpectralPeak,
    ) -> Option<CollisionInfo> {
        let cardiac_bpm = cardiac.bpm();
        let motion_bpm = motion.bpm();
        let tolerance = self.config.collision_tolerance_bpm;
        let limit = tolerance + TOLERANCE_SLACK * tolerance.max(1.0);

        (1..=self.config.motion_harmonics)
            .map(|harmonic| CollisionInfo {
                harmonic,
                delta_bpm: (cardiac_bpm - harmonic as f64 * motion_bpm).abs(),
            })
            .filter(|c| c.delta_bpm <= limit)
            .fold(None, |best: Option<CollisionInfo>, c| match best {
                Some(b) if b.delta_bpm <= c.delta_bpm => Some(b),
                _ => Some(c),
            })
    }
}

/// Peaks with non-finite values or no power count as "no peak"
fn is_usable(peak: &SpectralPeak) -> bool {
    peak.frequency_hz.is_finite() && peak.power.is_finite() && peak.power > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolver() -> CollisionResolver {
        CollisionResolver::new(ResolverConfig::default()).unwrap()
    }

    fn peak(bpm: f64, power: f64) -> Option<SpectralPeak> {
        Some(SpectralPeak::from_bpm(bpm, power))
    }

    #[test]
    fn test_missing_cardiac_is_insufficient() {
        let est = resolver().resolve(0, 0.0, None, peak(120.0, 1.0));
        assert!(!est.valid);
        assert_eq!(est.reason, EstimateReason::InsufficientSignal);
        assert_eq!(est.bpm, None);
    }

    #[test]
    fn test_missing_motion_follows_policy() {
        let est = resolver().resolve(3, 3.0, peak(72.0, 1.0), None);
        assert_eq!(est.reason, EstimateReason::InsufficientSignal);

        let trusting = CollisionResolver::new(ResolverConfig {
            missing_motion: MissingMotionPolicy::TrustCardiac,
            ..Default::default()
        })
        .unwrap();
        let est = trusting.resolve(3, 3.0, peak(72.0, 1.0), None);
        assert!(est.valid);
        assert!((est.bpm.unwrap() - 72.0).abs() < 1e-9);
        assert!(est.collision.is_none());
    }

    #[test]
    fn test_zero_power_peak_treated_as_missing() {
        let est = resolver().resolve(0, 0.0, peak(72.0, 0.0), peak(130.0, 1.0));
        assert_eq!(est.reason, EstimateReason::InsufficientSignal);
    }

    #[test]
    fn test_weak_motion_far_away_is_valid() {
        let est = resolver().resolve(0, 0.0, peak(72.0, 10.0), peak(150.0, 1e-6));
        assert!(est.valid);
        assert!((est.bpm.unwrap() - 72.0).abs() < 1e-9);
        assert!(!est.is_collision());
    }

    #[test]
    fn test_distinct_frequencies_ignore_power() {
        let est = resolver().resolve(0, 0.0, peak(72.0, 1.0), peak(150.0, 1000.0));
        assert!(est.valid);
        assert!((est.bpm.unwrap() - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_motion_dominant_collision() {
        let est = resolver().resolve(0, 0.0, peak(130.0, 1.0), peak(131.0, 2.0));
        assert!(!est.valid);
        assert_eq!(est.reason, EstimateReason::MotionDominantCollision);
        assert_eq!(est.collision.unwrap().harmonic, 1);
    }

    #[test]
    fn test_cardiac_dominant_collision_is_valid() {
        let est = resolver().resolve(0, 0.0, peak(130.0, 5.0), peak(128.0, 1.0));
        assert!(est.valid);
        assert!((est.bpm.unwrap() - 130.0).abs() < 1e-9);
        assert!(est.is_collision());
    }

    #[test]
    fn test_comparable_powers_are_ambiguous() {
        let est = resolver().resolve(0, 0.0, peak(130.0, 1.0), peak(130.0, 1.5));
        assert_eq!(est.reason, EstimateReason::AmbiguousCollision);
        assert!(est.bpm.is_none());
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let r = resolver();
        // 60 vs 75 bpm: exactly on the 15 bpm tolerance
        let d = r.decide(
            Some(SpectralPeak::new(1.0, 1.0)),
            Some(SpectralPeak::new(1.25, 1.0)),
        );
        assert_eq!(d.reason, EstimateReason::AmbiguousCollision);
        let d = r.decide(
            Some(SpectralPeak::new(1.0, 1.0)),
            Some(SpectralPeak::new(1.3125, 1.0)),
        );
        assert!(d.is_valid());
        assert!(d.collision.is_none());
    }

    #[test]
    fn test_tolerance_boundary_on_inexact_grid() {
        // 100 Hz, 300-sample segment: one bin is exactly 20 bpm on paper
        let fs = 100.0;
        let n = 300.0;
        let r = CollisionResolver::new(ResolverConfig {
            collision_tolerance_bpm: 20.0,
            ..Default::default()
        })
        .unwrap();

        for k in 2..12 {
            let cardiac = SpectralPeak::new(k as f64 * fs / n, 1.0);
            let motion = SpectralPeak::new((k + 1) as f64 * fs / n, 1.0);
            let d = r.decide(Some(cardiac), Some(motion));
            assert_eq!(d.reason, EstimateReason::AmbiguousCollision, "bins {k}/{}", k + 1);
        }

        // two bins apart stays clear
        let d = r.decide(
            Some(SpectralPeak::new(5.0 * fs / n, 1.0)),
            Some(SpectralPeak::new(7.0 * fs / n, 1.0)),
        );
        assert!(d.collision.is_none());
    }

    #[test]
    fn test_ratio_boundary_is_inclusive() {
        let r = resolver();
        let d = r.decide(peak(100.0, 2.0), peak(100.0, 1.0));
        assert!(d.is_valid());
        let d = r.decide(peak(100.0, 1.0), peak(100.0, 2.0));
        assert_eq!(d.reason, EstimateReason::MotionDominantCollision);
    }

    #[test]
    fn test_harmonic_collision() {
        let r = CollisionResolver::new(ResolverConfig {
            motion_harmonics: 2,
            ..Default::default()
        })
        .unwrap();
        // cadence 70 spm, second harmonic 140 lands on the cardiac peak
        let est = r.resolve(0, 0.0, peak(141.0, 1.0), peak(70.0, 4.0));
        assert_eq!(est.reason, EstimateReason::MotionDominantCollision);
        let info = est.collision.unwrap();
        assert_eq!(info.harmonic, 2);
        assert!((info.delta_bpm - 1.0).abs() < 1e-9);

        // fundamental only: no collision
        assert!(resolver().resolve(0, 0.0, peak(141.0, 1.0), peak(70.0, 4.0)).valid);
    }

    #[test]
    fn test_closest_harmonic_reported() {
        let r = CollisionResolver::new(ResolverConfig {
            collision_tolerance_bpm: 60.0,
            motion_harmonics: 3,
            ..Default::default()
        })
        .unwrap();
        let d = r.decide(peak(118.0, 1.0), peak(60.0, 1.0));
        assert_eq!(d.collision.unwrap().harmonic, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        for config in [
            ResolverConfig {
                dominance_ratio: 1.0,
                ..Default::default()
            },
            ResolverConfig {
                collision_tolerance_bpm: -1.0,
                ..Default::default()
            },
            ResolverConfig {
                collision_tolerance_bpm: f64::NAN,
                ..Default::default()
            },
            ResolverConfig {
                motion_harmonics: 0,
                ..Default::default()
            },
        ] {
            assert!(CollisionResolver::new(config).unwrap_err().is_configuration());
        }
    }

    #[test]
    fn test_estimate_carries_index_and_peaks() {
        let est = resolver().resolve(9, 4.5, peak(72.0, 3.0), peak(150.0, 1.0));
        assert_eq!(est.window_index, 9);
        assert_eq!(est.timestamp_s, 4.5);
        assert!(est.cardiac_peak.is_some());
        assert!(est.motion_peak.is_some());
    }

    proptest! {
        #[test]
        fn prop_validity_matches_reason(
            c_bpm in 30.0f64..240.0,
            m_bpm in 30.0f64..240.0,
            c_pow in 1e-3f64..1e3,
            m_pow in 1e-3f64..1e3,
        ) {
            let est = resolver().resolve(0, 0.0, peak(c_bpm, c_pow), peak(m_bpm, m_pow));
            prop_assert_eq!(est.valid, est.reason == EstimateReason::None);
            prop_assert_eq!(est.valid, est.bpm.is_some());
        }

        #[test]
        fn prop_distinct_peaks_always_valid(
            c_bpm in 30.0f64..240.0,
            gap in 15.5f64..100.0,
            c_pow in 1e-3f64..1e3,
            m_pow in 1e-3f64..1e3,
        ) {
            let est = resolver().resolve(0, 0.0, peak(c_bpm, c_pow), peak(c_bpm + gap, m_pow));
            prop_assert!(est.valid);
            prop_assert!((est.bpm.unwrap() - c_bpm).abs() < 1e-9);
        }

        #[test]
        fn prop_colliding_decision_follows_power(
            c_bpm in 40.0f64..200.0,
            offset in -14.0f64..14.0,
            c_pow in 1e-3f64..1e3,
            m_pow in 1e-3f64..1e3,
        ) {
            let d = resolver().decide(peak(c_bpm, c_pow), peak(c_bpm + offset, m_pow));
            prop_assert!(d.collision.is_some());
            let expected = if c_pow >= 2.0 * m_pow {
                EstimateReason::None
            } else if m_pow >= 2.0 * c_pow {
                EstimateReason::MotionDominantCollision
            } else {
                EstimateReason::AmbiguousCollision
            };
            prop_assert_eq!(d.reason, expected);
        }
    }
}
