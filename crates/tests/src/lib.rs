//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试 (配置 / 导出记录格式)
//! - 合成信号 e2e 测试：Signal -> HeartRateEstimator -> Exporter
//! - 窗口计数与确定性的性质测试

#[cfg(test)]
mod synth {
    use std::f64::consts::PI;

    use contracts::Signal;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    pub const FS: f64 = 50.0;

    /// Sum of sinusoids `(frequency_hz, amplitude)` over `[from_s, to_s)`
    pub fn tones(from_s: f64, to_s: f64, components: &[(f64, f64)]) -> Vec<f64> {
        let start = (from_s * FS).round() as usize;
        let end = (to_s * FS).round() as usize;
        (start..end)
            .map(|i| {
                let t = i as f64 / FS;
                components
                    .iter()
                    .map(|&(f, a)| a * (2.0 * PI * f * t).sin())
                    .sum()
            })
            .collect()
    }

    /// Add seeded uniform noise in `[-amplitude, amplitude)`
    pub fn with_noise(mut samples: Vec<f64>, amplitude: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        for x in &mut samples {
            *x += rng.random_range(-amplitude..amplitude);
        }
        samples
    }

    pub fn pair(ppg: Vec<f64>, motion: Vec<f64>) -> (Signal, Signal) {
        (Signal::ppg(FS, ppg), Signal::motion(FS, motion))
    }

    /// 60 s walk: heart at 72 BPM, cadence at 120 steps/min
    pub fn walking() -> (Signal, Signal) {
        pair(
            with_noise(tones(0.0, 60.0, &[(1.2, 1.0)]), 0.2, 1),
            with_noise(tones(0.0, 60.0, &[(2.0, 1.5)]), 0.2, 2),
        )
    }

    /// 30 s walk followed by 30 s of cadence lock at 132 steps/min
    pub fn walk_then_lock() -> (Signal, Signal) {
        let mut ppg = tones(0.0, 30.0, &[(1.2, 1.0)]);
        ppg.extend(tones(30.0, 60.0, &[(1.2, 0.3), (2.2, 1.0)]));
        let mut motion = tones(0.0, 30.0, &[(2.0, 1.5)]);
        motion.extend(tones(30.0, 60.0, &[(2.2, 3.0)]));
        pair(ppg, motion)
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        Detrend, Estimate, EstimateReason, MissingMotionPolicy, SpectralPeak, TaperWindow,
    };
    use estimator::HeartRateEstimator;

    const FULL_TOML: &str = r#"
version = "V1"

[input]
sample_rate_hz = 500.0
start_time_s = 12.0
motion_reduction = "magnitude"

[analysis.window]
duration_s = 8.0
step_s = 2.0

[analysis.spectral]
fft_size = 4096
detrend = "linear"
taper = "hamming"
cardiac_band = { min_hz = 0.8, max_hz = 4.0 }
motion_band = { min_hz = 1.0, max_hz = 3.5 }

[analysis.resolver]
collision_tolerance_bpm = 10.0
dominance_ratio = 2.5
motion_harmonics = 2
missing_motion = "trust_cardiac"

[analysis.execution]
parallel = false

[[sinks]]
name = "csv"
sink_type = "csv"
params = { path = "out/hr.csv", detail = "true" }

[[sinks]]
name = "log"
sink_type = "log"
"#;

    #[test]
    fn test_full_config_builds_estimator() {
        let bp = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.input.start_time_s, 12.0);
        assert_eq!(bp.analysis.spectral.detrend, Detrend::Linear);
        assert_eq!(bp.analysis.spectral.taper, TaperWindow::Hamming);
        assert_eq!(
            bp.analysis.resolver.missing_motion,
            MissingMotionPolicy::TrustCardiac
        );
        assert_eq!(bp.sinks.len(), 2);

        let estimator = HeartRateEstimator::new(bp.analysis.clone()).unwrap();
        let analyzer = estimator.analyzer(bp.input.sample_rate_hz).unwrap();
        assert_eq!(analyzer.fft_len(), 4096);
        assert_eq!(analyzer.segment_len(), 4000);
    }

    #[test]
    fn test_config_survives_toml_and_json() {
        let bp = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();

        let toml = ConfigLoader::to_toml(&bp).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(from_toml.analysis, bp.analysis);

        let json = ConfigLoader::to_json(&bp).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json.analysis, bp.analysis);
        assert_eq!(from_json.sinks.len(), 2);
    }

    /// Export record field set is part of the output contract
    #[test]
    fn test_record_snapshot() {
        let estimate = Estimate::discarded(
            3,
            3.0,
            EstimateReason::AmbiguousCollision,
            Some(SpectralPeak::new(2.0, 1.0)),
            Some(SpectralPeak::new(2.0, 1.5)),
            None,
        );
        let value = serde_json::to_value(estimate.to_record()).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "bpm",
                "cardiac_hz",
                "cardiac_power",
                "collision",
                "collision_harmonic",
                "motion_hz",
                "motion_power",
                "reason",
                "timestamp_s",
                "valid",
                "window_index",
            ]
        );
        assert!(value["bpm"].is_null());
        assert_eq!(value["reason"], "ambiguous_collision");
    }
}

#[cfg(test)]
mod e2e_tests {
    use contracts::{
        AnalysisConfig, ContractError, EstimateReason, SinkConfig, SinkType,
    };
    use estimator::{EstimateSeries, HeartRateEstimator};
    use export::Exporter;
    use observability::EstimateMetricsAggregator;

    use crate::synth::{self, FS};

    /// One bin at 8 s windows
    const BIN_BPM: f64 = 60.0 / 8.0;

    fn estimate(ppg: &contracts::Signal, motion: &contracts::Signal) -> EstimateSeries {
        HeartRateEstimator::new(AnalysisConfig::default())
            .unwrap()
            .run(ppg, motion)
            .unwrap()
    }

    #[test]
    fn test_walking_tracks_heart_rate() {
        let (ppg, motion) = synth::walking();
        let series = estimate(&ppg, &motion);

        // (60 - 8) / 1 + 1
        assert_eq!(series.len(), 53);
        assert_eq!(series.valid_count(), 53);
        for (ts, bpm) in series.valid_bpm() {
            assert!((bpm - 72.0).abs() <= BIN_BPM, "t={ts}: {bpm} BPM");
        }
        assert!(series.iter().all(|e| !e.is_collision()));
    }

    #[test]
    fn test_cadence_lock_is_discarded() {
        let (ppg, motion) = synth::walk_then_lock();
        let series = estimate(&ppg, &motion);
        assert_eq!(series.len(), 53);

        // Windows entirely before the lock
        for estimate in series.iter().take(23) {
            assert!(estimate.valid, "window {}", estimate.window_index);
            assert!((estimate.bpm.unwrap() - 72.0).abs() <= BIN_BPM);
        }
        // Windows entirely inside the lock
        for estimate in series.iter().skip(30) {
            assert_eq!(
                estimate.reason,
                EstimateReason::MotionDominantCollision,
                "window {}",
                estimate.window_index
            );
            assert!(estimate.bpm.is_none());
            assert_eq!(estimate.collision.map(|c| c.harmonic), Some(1));
        }
    }

    #[test]
    fn test_strong_heart_survives_collision() {
        let (ppg, motion) = synth::pair(
            synth::tones(0.0, 20.0, &[(2.2, 1.0)]),
            synth::tones(0.0, 20.0, &[(2.2, 0.3)]),
        );
        let series = estimate(&ppg, &motion);
        assert!(!series.is_empty());
        for estimate in &series {
            assert!(estimate.valid);
            assert!(estimate.is_collision());
            assert!((estimate.bpm.unwrap() - 132.0).abs() <= BIN_BPM);
        }
    }

    #[test]
    fn test_comparable_powers_are_ambiguous() {
        let (ppg, motion) = synth::pair(
            synth::tones(0.0, 20.0, &[(2.2, 1.0)]),
            synth::tones(0.0, 20.0, &[(2.2, 1.2)]),
        );
        let series = estimate(&ppg, &motion);
        assert_eq!(series.discarded_count(), series.len());
        assert!(series
            .iter()
            .all(|e| e.reason == EstimateReason::AmbiguousCollision));
    }

    #[test]
    fn test_timestamps_follow_window_start() {
        let (ppg, motion) = synth::walking();
        let ppg = ppg.with_start_time(100.0);
        let motion = motion.with_start_time(100.0);
        let series = estimate(&ppg, &motion);

        assert_eq!(series.as_slice()[0].timestamp_s, 100.0);
        assert_eq!(series.at(110.0).map(|e| e.window_index), Some(10));
        for (i, estimate) in series.iter().enumerate() {
            assert_eq!(estimate.window_index, i);
        }
    }

    #[test]
    fn test_execution_paths_agree_byte_for_byte() {
        let (ppg, motion) = synth::walk_then_lock();

        let parallel = HeartRateEstimator::new(AnalysisConfig::default()).unwrap();
        let mut sequential_config = AnalysisConfig::default();
        sequential_config.execution.parallel = false;
        let sequential = HeartRateEstimator::new(sequential_config).unwrap();

        let a = serde_json::to_string(&parallel.run(&ppg, &motion).unwrap()).unwrap();
        let b = serde_json::to_string(&parallel.run(&ppg, &motion).unwrap()).unwrap();
        let c = serde_json::to_string(&sequential.run(&ppg, &motion).unwrap()).unwrap();
        let streamed: Vec<_> = parallel.stream(&ppg, &motion).unwrap().collect();
        let d = serde_json::to_string(&streamed).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn test_misaligned_signals_rejected() {
        let (ppg, _) = synth::walking();
        let motion = contracts::Signal::motion(FS, vec![0.0; ppg.len() - 1]);
        let err = HeartRateEstimator::new(AnalysisConfig::default())
            .unwrap()
            .run(&ppg, &motion)
            .unwrap_err();
        assert!(matches!(err, ContractError::SignalMismatch { .. }));
    }

    #[test]
    fn test_export_preserves_order_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("hr.csv");
        let jsonl_path = dir.path().join("hr.jsonl");

        let (ppg, motion) = synth::walk_then_lock();
        let series = estimate(&ppg, &motion);

        let report = Exporter::from_configs(&[
            SinkConfig::new("log", SinkType::Log),
            SinkConfig::new("csv", SinkType::Csv).with_param("path", csv_path.display().to_string()),
            SinkConfig::new("jsonl", SinkType::JsonLines)
                .with_param("path", jsonl_path.display().to_string()),
        ])
        .unwrap()
        .export(&series);
        assert!(report.is_ok());
        assert!(report.sinks.iter().all(|s| s.written == series.len() as u64));

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("window_index,timestamp_s,bpm,valid,reason,collision")
        );
        for (i, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(',').collect();
            assert_eq!(cells[0], i.to_string());
            assert_eq!(cells[2].is_empty(), cells[3] == "false", "row {i}: {line}");
        }

        let jsonl = std::fs::read_to_string(&jsonl_path).unwrap();
        let rows: Vec<serde_json::Value> = jsonl
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), series.len());
        for (row, estimate) in rows.iter().zip(&series) {
            assert_eq!(row["window_index"], estimate.window_index);
            assert_eq!(row["bpm"].is_null(), !estimate.valid);
            assert_eq!(row["reason"], estimate.reason.as_str());
        }
    }

    #[test]
    fn test_summary_counts() {
        let (ppg, motion) = synth::walk_then_lock();
        let series = estimate(&ppg, &motion);

        let mut aggregator = EstimateMetricsAggregator::new();
        aggregator.extend(&series);
        let summary = aggregator.summary();

        assert_eq!(summary.total_windows, series.len() as u64);
        assert_eq!(
            summary.valid_windows + summary.discarded_windows,
            summary.total_windows
        );
        assert_eq!(summary.valid_windows, series.valid_count() as u64);
        assert!((summary.median_bpm.unwrap() - 72.0).abs() <= BIN_BPM);
        assert!(summary.to_string().contains("motion_dominant_collision"));
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{AnalysisConfig, WindowConfig};
    use estimator::HeartRateEstimator;
    use proptest::prelude::*;

    use crate::synth::{self, FS};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// One estimate per complete window, for any window / step
        #[test]
        fn prop_one_estimate_per_window(
            duration_s in 2.0f64..10.0,
            step_s in 0.2f64..5.0,
            extra_s in 0.0f64..12.0,
            seed in any::<u64>(),
        ) {
            let total_s = duration_s + extra_s;
            let ppg = synth::with_noise(synth::tones(0.0, total_s, &[(1.3, 1.0)]), 0.5, seed);
            let motion = synth::with_noise(synth::tones(0.0, total_s, &[(2.1, 1.0)]), 0.5, !seed);
            let (ppg, motion) = synth::pair(ppg, motion);

            let config = AnalysisConfig {
                window: WindowConfig { duration_s, step_s },
                ..AnalysisConfig::default()
            };
            let estimator = HeartRateEstimator::new(config).unwrap();
            let series = estimator.run(&ppg, &motion).unwrap();

            let expected = segmenter::count_windows(
                ppg.len(),
                (duration_s * FS).round() as usize,
                (step_s * FS).round() as usize,
            );
            prop_assert_eq!(series.len(), expected);
            prop_assert_eq!(series.valid_count() + series.discarded_count(), expected);
            for estimate in &series {
                prop_assert_eq!(estimate.valid, estimate.bpm.is_some());
            }
        }
    }
}
