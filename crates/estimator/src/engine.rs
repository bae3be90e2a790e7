//! Heart-rate estimation engine
//!
//! Wires segmenter, spectral analyzer and collision resolver into one batch
//! pass over two buffered signals.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use contracts::{AnalysisConfig, ContractError, Estimate, Signal};
use resolver::CollisionResolver;
use segmenter::{Segmenter, WindowPair, Windows};
use spectral::SpectralAnalyzer;

use crate::series::EstimateSeries;

/// Batch heart-rate estimator
///
/// Immutable once built: runs share no state, so the same estimator can be
/// used from several threads and produces identical output for identical
/// input.
#[derive(Debug, Clone)]
pub struct HeartRateEstimator {
    config: AnalysisConfig,
    segmenter: Segmenter,
    resolver: CollisionResolver,
}

impl HeartRateEstimator {
    /// # Errors
    /// `Configuration` for invalid window or resolver parameters. Band and
    /// DFT-length checks need the sample rate and run at the start of each
    /// run, before any window is processed.
    pub fn new(config: AnalysisConfig) -> Result<Self, ContractError> {
        let segmenter = Segmenter::new(config.window.clone())?;
        let resolver = CollisionResolver::new(config.resolver.clone())?;
        Ok(Self {
            config,
            segmenter,
            resolver,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Spectral analyzer for signals at `sample_rate_hz`
    pub fn analyzer(&self, sample_rate_hz: f64) -> Result<SpectralAnalyzer, ContractError> {
        let window_samples = (self.config.window.duration_s * sample_rate_hz).round() as usize;
        SpectralAnalyzer::new(&self.config.spectral, sample_rate_hz, window_samples)
    }

    /// Estimate every complete window, honouring `execution.parallel`
    #[instrument(
        name = "estimator_run",
        skip(self, ppg, motion),
        fields(
            samples = ppg.len(),
            sample_rate_hz = ppg.sample_rate_hz,
            parallel = self.config.execution.parallel
        )
    )]
    pub fn run(&self, ppg: &Signal, motion: &Signal) -> Result<EstimateSeries, ContractError> {
        let started = Instant::now();

        let series = if self.config.execution.parallel {
            self.run_parallel(ppg, motion)?
        } else {
            self.run_sequential(ppg, motion)?
        };

        for estimate in &series {
            observability::record_estimate_metrics(estimate);
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_run_duration_ms(elapsed_ms);

        info!(
            windows = series.len(),
            valid = series.valid_count(),
            discarded = series.discarded_count(),
            elapsed_ms,
            "estimation finished"
        );
        Ok(series)
    }

    /// One window after another on the calling thread
    pub fn run_sequential(
        &self,
        ppg: &Signal,
        motion: &Signal,
    ) -> Result<EstimateSeries, ContractError> {
        let (windows, analyzer) = self.prepare(ppg, motion)?;
        let expected = windows.len();
        let estimates = windows
            .map(|pair| self.evaluate(&analyzer, &pair))
            .collect();
        EstimateSeries::from_indexed(estimates, expected)
    }

    /// Windows evaluated on the rayon pool, merged back by index
    pub fn run_parallel(
        &self,
        ppg: &Signal,
        motion: &Signal,
    ) -> Result<EstimateSeries, ContractError> {
        let (windows, analyzer) = self.prepare(ppg, motion)?;
        let expected = windows.len();
        let estimates: Vec<Estimate> = (0..expected)
            .into_par_iter()
            .filter_map(|index| windows.get(index))
            .map(|pair| self.evaluate(&analyzer, &pair))
            .collect();
        EstimateSeries::from_indexed(estimates, expected)
    }

    /// Lazy, in-order estimates; stop consuming to stop the work
    ///
    /// Validation and planning happen eagerly, so errors surface here rather
    /// than mid-iteration.
    pub fn stream<'a>(
        &'a self,
        ppg: &'a Signal,
        motion: &'a Signal,
    ) -> Result<EstimateStream<'a>, ContractError> {
        let (windows, analyzer) = self.prepare(ppg, motion)?;
        Ok(EstimateStream {
            estimator: self,
            analyzer,
            windows,
        })
    }

    fn prepare<'a>(
        &self,
        ppg: &'a Signal,
        motion: &'a Signal,
    ) -> Result<(Windows<'a>, SpectralAnalyzer), ContractError> {
        let windows = self.segmenter.segment(ppg, motion)?;
        let plan = *windows.plan();
        let analyzer =
            SpectralAnalyzer::new(&self.config.spectral, plan.sample_rate_hz(), plan.window_samples())?;
        debug!(
            windows = plan.len(),
            fft_len = analyzer.fft_len(),
            bin_resolution_hz = analyzer.bin_resolution_hz(),
            "estimation prepared"
        );
        Ok((windows, analyzer))
    }

    fn evaluate(&self, analyzer: &SpectralAnalyzer, pair: &WindowPair<'_>) -> Estimate {
        let peaks = analyzer.analyze(pair);
        self.resolver
            .resolve(pair.index, pair.start_time_s, peaks.cardiac, peaks.motion)
    }
}

/// Lazy estimate iterator returned by [`HeartRateEstimator::stream`]
pub struct EstimateStream<'a> {
    estimator: &'a HeartRateEstimator,
    analyzer: SpectralAnalyzer,
    windows: Windows<'a>,
}

impl EstimateStream<'_> {
    /// Total number of windows in the run
    pub fn window_count(&self) -> usize {
        self.windows.plan().len()
    }
}

impl Iterator for EstimateStream<'_> {
    type Item = Estimate;

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.windows.next()?;
        let estimate = self.estimator.evaluate(&self.analyzer, &pair);
        observability::record_estimate_metrics(&estimate);
        Some(estimate)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.windows.size_hint()
    }
}

impl ExactSizeIterator for EstimateStream<'_> {}
