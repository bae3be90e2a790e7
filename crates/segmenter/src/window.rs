//! Fixed-duration sliding windows over a PPG / motion pair.

use std::ops::Range;

use contracts::{ContractError, Signal, SignalKind};
use tracing::{debug, instrument};

use crate::WindowConfig;

/// Relative tolerance used when comparing sample rates and start times
const ALIGNMENT_EPSILON: f64 = 1e-9;

/// Number of complete windows in `total_samples`
///
/// The trailing partial window is dropped.
pub fn count_windows(total_samples: usize, window_samples: usize, step_samples: usize) -> usize {
    if window_samples == 0 || step_samples == 0 || total_samples < window_samples {
        return 0;
    }
    (total_samples - window_samples) / step_samples + 1
}

/// Validated window segmentation parameters
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: WindowConfig,
}

impl Segmenter {
    /// Create a segmenter, rejecting non-positive durations
    pub fn new(config: WindowConfig) -> Result<Self, ContractError> {
        if !config.duration_s.is_finite() || config.duration_s <= 0.0 {
            return Err(ContractError::configuration(
                "analysis.window.duration_s",
                format!("must be > 0, got {}", config.duration_s),
            ));
        }
        if !config.step_s.is_finite() || config.step_s <= 0.0 {
            return Err(ContractError::configuration(
                "analysis.window.step_s",
                format!("must be > 0, got {}", config.step_s),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Resolve the segmentation for a concrete signal pair
    ///
    /// # Errors
    /// - `SignalMismatch` when the pair breaks the alignment contract
    /// - `Configuration` when the window does not fit the signal or a duration
    ///   rounds to zero samples
    #[instrument(
        name = "segmenter_plan",
        level = "debug",
        skip(self, ppg, motion),
        fields(ppg_len = ppg.len(), motion_len = motion.len())
    )]
    pub fn plan(&self, ppg: &Signal, motion: &Signal) -> Result<WindowPlan, ContractError> {
        check_alignment(ppg, motion)?;

        let sample_rate_hz = ppg.sample_rate_hz;
        let window_samples = self.to_samples(
            "analysis.window.duration_s",
            self.config.duration_s,
            sample_rate_hz,
        )?;
        let step_samples =
            self.to_samples("analysis.window.step_s", self.config.step_s, sample_rate_hz)?;

        let total_samples = ppg.len();
        if window_samples > total_samples {
            return Err(ContractError::configuration(
                "analysis.window.duration_s",
                format!(
                    "window of {}s ({} samples) exceeds signal duration of {:.3}s ({} samples)",
                    self.config.duration_s,
                    window_samples,
                    ppg.duration_s(),
                    total_samples
                ),
            ));
        }

        let plan = WindowPlan {
            window_samples,
            step_samples,
            count: count_windows(total_samples, window_samples, step_samples),
            sample_rate_hz,
            start_time_s: ppg.start_time_s,
        };

        debug!(
            windows = plan.count,
            window_samples, step_samples, "window plan resolved"
        );
        Ok(plan)
    }

    /// Plan and iterate in one step
    pub fn segment<'a>(
        &self,
        ppg: &'a Signal,
        motion: &'a Signal,
    ) -> Result<Windows<'a>, ContractError> {
        let plan = self.plan(ppg, motion)?;
        Ok(plan.windows(&ppg.samples, &motion.samples))
    }

    fn to_samples(
        &self,
        field: &str,
        seconds: f64,
        sample_rate_hz: f64,
    ) -> Result<usize, ContractError> {
        let samples = (seconds * sample_rate_hz).round();
        if samples < 1.0 {
            return Err(ContractError::configuration(
                field,
                format!("{seconds}s is shorter than one sample at {sample_rate_hz} Hz"),
            ));
        }
        Ok(samples as usize)
    }
}

fn check_alignment(ppg: &Signal, motion: &Signal) -> Result<(), ContractError> {
    if ppg.kind != SignalKind::Ppg || motion.kind != SignalKind::Motion {
        return Err(ContractError::signal_mismatch(format!(
            "expected (ppg, motion) signals, got ({}, {})",
            ppg.kind, motion.kind
        )));
    }

    for signal in [ppg, motion] {
        if !signal.sample_rate_hz.is_finite() || signal.sample_rate_hz <= 0.0 {
            return Err(ContractError::signal_mismatch(format!(
                "{} sample rate must be > 0, got {}",
                signal.kind, signal.sample_rate_hz
            )));
        }
    }

    if !approx_eq(ppg.sample_rate_hz, motion.sample_rate_hz) {
        return Err(ContractError::signal_mismatch(format!(
            "sample rates differ: ppg={} Hz, motion={} Hz",
            ppg.sample_rate_hz, motion.sample_rate_hz
        )));
    }
    if ppg.len() != motion.len() {
        return Err(ContractError::signal_mismatch(format!(
            "lengths differ: ppg={}, motion={}",
            ppg.len(),
            motion.len()
        )));
    }
    if !approx_eq(ppg.start_time_s, motion.start_time_s) {
        return Err(ContractError::signal_mismatch(format!(
            "start times differ: ppg={}s, motion={}s",
            ppg.start_time_s, motion.start_time_s
        )));
    }
    Ok(())
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= ALIGNMENT_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Segmentation resolved against a concrete signal length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPlan {
    window_samples: usize,
    step_samples: usize,
    count: usize,
    sample_rate_hz: f64,
    start_time_s: f64,
}

impl WindowPlan {
    /// Number of complete windows
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn step_samples(&self) -> usize {
        self.step_samples
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Sample range covered by window `index`
    pub fn range(&self, index: usize) -> Range<usize> {
        let start = index * self.step_samples;
        start..start + self.window_samples
    }

    /// Start timestamp of window `index` (seconds)
    pub fn start_time_s(&self, index: usize) -> f64 {
        self.start_time_s + (index * self.step_samples) as f64 / self.sample_rate_hz
    }

    /// Borrowing iterator over the window pairs
    ///
    /// Calling this again restarts the sequence from the first window.
    pub fn windows<'a>(&self, ppg: &'a [f64], motion: &'a [f64]) -> Windows<'a> {
        Windows {
            plan: *self,
            ppg,
            motion,
            next: 0,
        }
    }
}

/// One analysis window taken from both signals
#[derive(Debug, Clone, Copy)]
pub struct WindowPair<'a> {
    /// Window sequence number
    pub index: usize,
    /// Shared start timestamp (seconds)
    pub start_time_s: f64,
    /// PPG samples
    pub ppg: &'a [f64],
    /// Motion samples
    pub motion: &'a [f64],
}

/// Lazy, finite sequence of window pairs
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    plan: WindowPlan,
    ppg: &'a [f64],
    motion: &'a [f64],
    next: usize,
}

impl<'a> Windows<'a> {
    pub fn plan(&self) -> &WindowPlan {
        &self.plan
    }

    /// Random access to window `index`, independent of iteration state
    pub fn get(&self, index: usize) -> Option<WindowPair<'a>> {
        if index >= self.plan.count {
            return None;
        }
        let range = self.plan.range(index);
        Some(WindowPair {
            index,
            start_time_s: self.plan.start_time_s(index),
            ppg: &self.ppg[range.clone()],
            motion: &self.motion[range],
        })
    }

    /// Fresh iterator positioned at the first window
    pub fn restart(&self) -> Windows<'a> {
        Windows {
            next: 0,
            ..self.clone()
        }
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = WindowPair<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.get(self.next)?;
        self.next += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.count.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}
