//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use observability::ObservabilityConfig;
use std::path::PathBuf;

/// ppg-hr - Motion-robust heart-rate estimation from PPG and accelerometer data
#[derive(Parser, Debug)]
#[command(
    name = "ppg-hr",
    author,
    version,
    about = "Motion-robust PPG heart-rate estimation",
    long_about = "Estimates heart rate from an already-filtered PPG recording.\n\n\
                  Each sliding window's dominant cardiac frequency is compared with the \n\
                  dominant motion frequency; windows where the two collide are resolved \n\
                  by relative spectral power or discarded."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PPG_HR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PPG_HR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate heart rate for a recording
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display effective analysis parameters
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    ///
    /// Optional when `--sample-rate` is given; defaults are used then.
    #[arg(short, long, env = "PPG_HR_CONFIG")]
    pub config: Option<PathBuf>,

    /// CSV recording with a `ppg` column and either `motion` or `ax,ay,az`
    #[arg(short, long, env = "PPG_HR_INPUT")]
    pub input: PathBuf,

    /// Additional CSV output, written alongside the configured sinks
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Stop after this many windows (0 = all)
    #[arg(long, default_value = "0", env = "PPG_HR_MAX_WINDOWS")]
    pub max_windows: usize,

    /// Override sample rate (Hz)
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Override window duration (seconds)
    #[arg(long)]
    pub window: Option<f64>,

    /// Override step between window starts (seconds)
    #[arg(long)]
    pub step: Option<f64>,

    /// Override collision tolerance (BPM)
    #[arg(long)]
    pub tolerance_bpm: Option<f64>,

    /// Override dominance ratio
    #[arg(long)]
    pub dominance_ratio: Option<f64>,

    /// Evaluate windows on the calling thread only
    #[arg(long)]
    pub sequential: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PPG_HR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "PPG_HR_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "PPG_HR_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

impl Cli {
    /// Logging setup from `--quiet`, `-v` and `--log-format`
    ///
    /// `--quiet` pins the level to `warn` even when RUST_LOG is set.
    pub fn observability_config(&self) -> ObservabilityConfig {
        let default_log_level = if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };

        ObservabilityConfig {
            log_format: self.log_format.clone().into(),
            metrics_port: None,
            default_log_level: default_log_level.to_string(),
            respect_env: !self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "ppg-hr",
            "run",
            "--input",
            "rec.csv",
            "--sample-rate",
            "125",
            "--window",
            "10",
            "--tolerance-bpm",
            "9",
            "--max-windows",
            "3",
            "--sequential",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.config.is_none());
        assert_eq!(args.input, PathBuf::from("rec.csv"));
        assert_eq!(args.sample_rate, Some(125.0));
        assert_eq!(args.window, Some(10.0));
        assert_eq!(args.step, None);
        assert_eq!(args.tolerance_bpm, Some(9.0));
        assert_eq!(args.max_windows, 3);
        assert!(args.sequential);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_run_requires_input() {
        assert!(Cli::try_parse_from(["ppg-hr", "run"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["ppg-hr", "-q", "-v", "info"]).is_err());
    }

    #[test]
    fn test_global_log_format() {
        let cli =
            Cli::try_parse_from(["ppg-hr", "validate", "--log-format", "json", "--json"]).unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        assert!(args.json);
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_observability_config_from_flags() {
        let cli = Cli::try_parse_from(["ppg-hr", "-vv", "info"]).unwrap();
        let config = cli.observability_config();
        assert_eq!(config.default_log_level, "trace");
        assert_eq!(config.log_format, observability::LogFormat::Pretty);
        assert!(config.respect_env);

        let cli =
            Cli::try_parse_from(["ppg-hr", "--quiet", "--log-format", "compact", "info"]).unwrap();
        let config = cli.observability_config();
        assert_eq!(config.default_log_level, "warn");
        assert_eq!(config.log_format, observability::LogFormat::Compact);
        assert!(!config.respect_env);
    }
}
