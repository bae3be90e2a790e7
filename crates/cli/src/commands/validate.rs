//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sample_rate_hz: f64,
    window_s: f64,
    step_s: f64,
    cardiac_band_hz: [f64; 2],
    motion_band_hz: [f64; 2],
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_config(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let spectral = &blueprint.analysis.spectral;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sample_rate_hz: blueprint.input.sample_rate_hz,
                    window_s: blueprint.analysis.window.duration_s,
                    step_s: blueprint.analysis.window.step_s,
                    cardiac_band_hz: [spectral.cardiac_band.min_hz, spectral.cardiac_band.max_hz],
                    motion_band_hz: [spectral.motion_band.min_hz, spectral.motion_band.max_hz],
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &PipelineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let analysis = &blueprint.analysis;

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - estimates are only summarized".to_string());
    }
    if !blueprint
        .sinks
        .iter()
        .any(|s| s.sink_type != SinkType::Log)
    {
        warnings.push("No file sink configured - pass --output to keep results".to_string());
    }

    if analysis.window.step_s > analysis.window.duration_s {
        warnings.push(format!(
            "step ({}s) exceeds window ({}s) - samples between windows are skipped",
            analysis.window.step_s, analysis.window.duration_s
        ));
    }

    let resolution_bpm = 60.0 / analysis.window.duration_s;
    if analysis.spectral.fft_size.is_none()
        && resolution_bpm > analysis.resolver.collision_tolerance_bpm
    {
        warnings.push(format!(
            "bin spacing ({resolution_bpm:.1} BPM) is coarser than the collision tolerance ({} BPM); consider spectral.fft_size",
            analysis.resolver.collision_tolerance_bpm
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sample rate: {} Hz", summary.sample_rate_hz);
            println!("  Window / step: {}s / {}s", summary.window_s, summary.step_s);
            println!(
                "  Cardiac band: {}-{} Hz",
                summary.cardiac_band_hz[0], summary.cardiac_band_hz[1]
            );
            println!(
                "  Motion band: {}-{} Hz",
                summary.motion_band_hz[0], summary.motion_band_hz[1]
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkConfig;
    use std::path::PathBuf;

    fn args_for(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_valid_file_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[input]\nsample_rate_hz = 100.0\n\n[[sinks]]\nname = \"out\"\nsink_type = \"csv\"\nparams = { path = \"out.csv\" }\n",
        )
        .unwrap();

        let result = validate_config(&args_for(path));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.sample_rate_hz, 100.0);
        assert_eq!(summary.sink_count, 1);
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_invalid_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[input]\nsample_rate_hz = 6.0\n").unwrap();

        let result = validate_config(&args_for(path));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("Nyquist"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args_for(PathBuf::from("/nonexistent/config.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_warnings() {
        let mut bp = PipelineBlueprint::with_sample_rate(100.0);
        bp.analysis.window.step_s = 10.0;
        bp.analysis.resolver.collision_tolerance_bpm = 5.0;
        let warnings = collect_warnings(&bp);
        assert!(warnings.iter().any(|w| w.contains("No sinks")));
        assert!(warnings.iter().any(|w| w.contains("skipped")));
        assert!(warnings.iter().any(|w| w.contains("fft_size")));

        bp.sinks.push(SinkConfig::new("log", SinkType::Log));
        let warnings = collect_warnings(&bp);
        assert!(!warnings.iter().any(|w| w.contains("No sinks")));
        assert!(warnings.iter().any(|w| w.contains("No file sink")));
    }
}
