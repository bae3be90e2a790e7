//! Pipeline orchestrator - load, estimate, export.
//!
//! Runs synchronously; the `run` command drives it from a blocking task and
//! flips the cancel flag on shutdown.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{Estimate, PipelineBlueprint, SinkConfig, SinkType};
use estimator::{EstimateSeries, HeartRateEstimator};
use export::Exporter;
use observability::EstimateMetricsAggregator;
use tracing::{info, warn};

use super::PipelineStats;
use crate::input;

/// Sink name used for `--output`
pub const OUTPUT_SINK_NAME: &str = "cli_output";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated blueprint, CLI overrides applied
    pub blueprint: PipelineBlueprint,

    /// CSV recording
    pub input: PathBuf,

    /// Extra CSV output
    pub output: Option<PathBuf>,

    /// Maximum number of windows to estimate (None = all)
    pub max_windows: Option<usize>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    cancel: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops estimation after the current window
    ///
    /// Windows already estimated are still exported.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the pipeline to completion
    pub fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        let signals = input::load_signals(&self.config.input, &blueprint.input)
            .with_context(|| format!("Failed to load input {}", self.config.input.display()))?;

        let estimator = HeartRateEstimator::new(blueprint.analysis.clone())
            .context("Failed to build estimator")?;

        info!(
            samples = signals.ppg.len(),
            duration_s = signals.ppg.duration_s(),
            sample_rate_hz = blueprint.input.sample_rate_hz,
            "Estimating heart rate"
        );

        let (series, windows_total) = self.estimate(&estimator, &signals)?;
        let stopped_early = series.len() < windows_total;
        if stopped_early {
            warn!(
                estimated = series.len(),
                windows_total, "Estimation stopped before the last window"
            );
        }

        let exporter = Exporter::from_configs(&self.sink_configs())
            .context("Failed to create sinks")?;
        if exporter.is_empty() {
            warn!("No sinks configured - estimates are only summarized");
        }
        let export = exporter.export(&series);
        for failed in export.failed() {
            warn!(sink = %failed.name, error = ?failed.error, written = failed.written, "Sink failed");
        }

        let mut aggregator = EstimateMetricsAggregator::new();
        aggregator.extend(&series);

        Ok(PipelineStats {
            windows_total,
            windows_estimated: series.len(),
            stopped_early,
            duration: start_time.elapsed(),
            summary: aggregator.summary(),
            export,
        })
    }

    /// Full parallel batch, or an in-order stream when the run may stop early
    fn estimate(
        &self,
        estimator: &HeartRateEstimator,
        signals: &input::InputSignals,
    ) -> Result<(EstimateSeries, usize)> {
        let (ppg, motion) = (&signals.ppg, &signals.motion);

        if self.config.max_windows.is_none() && estimator.config().execution.parallel {
            let series = estimator
                .run(ppg, motion)
                .context("Heart-rate estimation failed")?;
            let total = series.len();
            return Ok((series, total));
        }

        let started = Instant::now();
        let stream = estimator
            .stream(ppg, motion)
            .context("Heart-rate estimation failed")?;
        let total = stream.window_count();
        let limit = self.config.max_windows.unwrap_or(total).min(total);

        let mut estimates: Vec<Estimate> = Vec::with_capacity(limit);
        for estimate in stream.take(limit) {
            estimates.push(estimate);
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
        }
        observability::record_run_duration_ms(started.elapsed().as_secs_f64() * 1000.0);

        let count = estimates.len();
        let series = EstimateSeries::from_indexed(estimates, count)
            .context("Estimate series out of order")?;
        Ok((series, total))
    }

    fn sink_configs(&self) -> Vec<SinkConfig> {
        let mut sinks = self.config.blueprint.sinks.clone();
        if let Some(ref path) = self.config.output {
            sinks.push(
                SinkConfig::new(OUTPUT_SINK_NAME, SinkType::Csv)
                    .with_param("path", path.display().to_string()),
            );
        }
        sinks
    }
}
