//! `run` command implementation.

use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use contracts::PipelineBlueprint;
use tracing::{info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    info!(
        sample_rate_hz = blueprint.input.sample_rate_hz,
        window_s = blueprint.analysis.window.duration_s,
        step_s = blueprint.analysis.window.step_s,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        input: args.input.clone(),
        output: args.output.clone(),
        max_windows: (args.max_windows > 0).then_some(args.max_windows),
    });
    let cancel = pipeline.cancel_handle();

    info!(input = %args.input.display(), "Starting estimation...");
    let mut task = tokio::task::spawn_blocking(move || pipeline.run());

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, finishing current window...");
            cancel.store(true, Ordering::Relaxed);
            task.await
        }
    };

    let stats = joined.context("Estimation task panicked")??;
    info!(
        windows = stats.windows_estimated,
        valid = stats.summary.valid_windows,
        duration_secs = stats.duration.as_secs_f64(),
        "Estimation completed"
    );
    stats.print_summary();

    let failed = stats.export.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} sink(s) failed; see the summary above");
    }

    info!("ppg-hr finished");
    Ok(())
}

/// Config file (or defaults at `--sample-rate`) with CLI overrides applied
fn resolve_blueprint(args: &RunArgs) -> Result<PipelineBlueprint> {
    let mut blueprint = match (&args.config, args.sample_rate) {
        (Some(path), _) => {
            info!(config = %path.display(), "Loading configuration");
            load_config(path)?
        }
        (None, Some(rate)) => PipelineBlueprint::with_sample_rate(rate),
        (None, None) => return Err(CliError::MissingConfig.into()),
    };

    apply_overrides(&mut blueprint, args);

    config_loader::ConfigLoader::validate(&blueprint)
        .context("Invalid configuration after CLI overrides")?;
    Ok(blueprint)
}

fn apply_overrides(blueprint: &mut PipelineBlueprint, args: &RunArgs) {
    if let Some(rate) = args.sample_rate {
        info!(sample_rate_hz = rate, "Overriding sample rate from CLI");
        blueprint.input.sample_rate_hz = rate;
    }
    let analysis = &mut blueprint.analysis;
    if let Some(window) = args.window {
        info!(window_s = window, "Overriding window duration from CLI");
        analysis.window.duration_s = window;
    }
    if let Some(step) = args.step {
        info!(step_s = step, "Overriding step from CLI");
        analysis.window.step_s = step;
    }
    if let Some(tolerance) = args.tolerance_bpm {
        analysis.resolver.collision_tolerance_bpm = tolerance;
    }
    if let Some(ratio) = args.dominance_ratio {
        analysis.resolver.dominance_ratio = ratio;
    }
    if args.sequential {
        analysis.execution.parallel = false;
    }
}

/// Resolves on Ctrl+C or SIGTERM; never resolves if no handler can be installed
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run", "--input", "rec.csv"];
        argv.extend_from_slice(extra);
        RunArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_from_sample_rate() {
        let bp = resolve_blueprint(&run_args(&["--sample-rate", "125"])).unwrap();
        assert_eq!(bp.input.sample_rate_hz, 125.0);
        assert_eq!(bp.analysis.window.duration_s, 8.0);
        assert!(bp.analysis.execution.parallel);
    }

    #[test]
    fn test_overrides_applied_to_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[input]\nsample_rate_hz = 500.0\n").unwrap();
        let path_arg = path.display().to_string();

        let args = run_args(&[
            "--config",
            &path_arg,
            "--window",
            "10",
            "--step",
            "1",
            "--tolerance-bpm",
            "6",
            "--dominance-ratio",
            "3",
            "--sequential",
        ]);
        let bp = resolve_blueprint(&args).unwrap();
        assert_eq!(bp.input.sample_rate_hz, 500.0);
        assert_eq!(bp.analysis.window.duration_s, 10.0);
        assert_eq!(bp.analysis.window.step_s, 1.0);
        assert_eq!(bp.analysis.resolver.collision_tolerance_bpm, 6.0);
        assert_eq!(bp.analysis.resolver.dominance_ratio, 3.0);
        assert!(!bp.analysis.execution.parallel);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = resolve_blueprint(&run_args(&["--sample-rate", "100", "--dominance-ratio", "0.5"]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("dominance_ratio"), "got: {err:#}");
    }

    #[test]
    fn test_missing_config_and_rate() {
        let err = resolve_blueprint(&run_args(&[])).unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_missing_config_file() {
        let err = resolve_blueprint(&run_args(&["--config", "/nonexistent/config.toml"]))
            .unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }
}
