//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{hz_to_bpm, FrequencyBand, PipelineBlueprint};
use estimator::HeartRateEstimator;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Effective analysis parameters for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sample_rate_hz: f64,
    window: WindowInfo,
    spectral: SpectralInfo,
    resolver: ResolverInfo,
    parallel: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct WindowInfo {
    duration_s: f64,
    step_s: f64,
    window_samples: usize,
    step_samples: usize,
}

#[derive(Serialize)]
struct SpectralInfo {
    fft_len: usize,
    bin_resolution_hz: f64,
    bin_resolution_bpm: f64,
    cardiac_band_bpm: [f64; 2],
    motion_band_bpm: [f64; 2],
    detrend: String,
    taper: String,
    power_scale: String,
}

#[derive(Serialize)]
struct ResolverInfo {
    collision_tolerance_bpm: f64,
    dominance_ratio: f64,
    motion_harmonics: u32,
    missing_motion: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_config(&args.config)?;
    let info = build_config_info(&blueprint)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn band_bpm(band: FrequencyBand) -> [f64; 2] {
    [band.min_bpm(), band.max_bpm()]
}

fn build_config_info(blueprint: &PipelineBlueprint) -> Result<ConfigInfo> {
    let analysis = &blueprint.analysis;
    let rate = blueprint.input.sample_rate_hz;

    let estimator =
        HeartRateEstimator::new(analysis.clone()).context("Failed to build estimator")?;
    let analyzer = estimator
        .analyzer(rate)
        .context("Spectral parameters do not fit the sample rate")?;

    let spectral = &analysis.spectral;
    let resolver = &analysis.resolver;

    Ok(ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sample_rate_hz: rate,
        window: WindowInfo {
            duration_s: analysis.window.duration_s,
            step_s: analysis.window.step_s,
            window_samples: analyzer.segment_len(),
            step_samples: (analysis.window.step_s * rate).round() as usize,
        },
        spectral: SpectralInfo {
            fft_len: analyzer.fft_len(),
            bin_resolution_hz: analyzer.bin_resolution_hz(),
            bin_resolution_bpm: hz_to_bpm(analyzer.bin_resolution_hz()),
            cardiac_band_bpm: band_bpm(spectral.cardiac_band),
            motion_band_bpm: band_bpm(spectral.motion_band),
            detrend: format!("{:?}", spectral.detrend),
            taper: format!("{:?}", spectral.taper),
            power_scale: format!("{:?}", spectral.power_scale),
        },
        resolver: ResolverInfo {
            collision_tolerance_bpm: resolver.collision_tolerance_bpm,
            dominance_ratio: resolver.dominance_ratio,
            motion_harmonics: resolver.motion_harmonics,
            missing_motion: format!("{:?}", resolver.missing_motion),
        },
        parallel: analysis.execution.parallel,
        sinks: blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                path: s.params.get("path").cloned(),
            })
            .collect(),
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 PPG Heart-Rate Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📥 Input");
    println!("   ├─ Version: {}", info.version);
    println!("   └─ Sample rate: {} Hz", info.sample_rate_hz);

    let window = &info.window;
    println!("\n🪟 Window");
    println!(
        "   ├─ Duration: {}s ({} samples)",
        window.duration_s, window.window_samples
    );
    println!("   └─ Step: {}s ({} samples)", window.step_s, window.step_samples);

    let spectral = &info.spectral;
    println!("\n📈 Spectral");
    println!("   ├─ FFT length: {}", spectral.fft_len);
    println!(
        "   ├─ Bin resolution: {:.4} Hz ({:.2} BPM)",
        spectral.bin_resolution_hz, spectral.bin_resolution_bpm
    );
    println!(
        "   ├─ Cardiac band: {:.0}-{:.0} BPM",
        spectral.cardiac_band_bpm[0], spectral.cardiac_band_bpm[1]
    );
    println!(
        "   ├─ Motion band: {:.0}-{:.0} BPM",
        spectral.motion_band_bpm[0], spectral.motion_band_bpm[1]
    );
    println!(
        "   └─ Detrend / taper / scale: {} / {} / {}",
        spectral.detrend, spectral.taper, spectral.power_scale
    );

    let resolver = &info.resolver;
    println!("\n⚖️  Collision Resolver");
    println!("   ├─ Tolerance: {} BPM", resolver.collision_tolerance_bpm);
    println!("   ├─ Dominance ratio: {}", resolver.dominance_ratio);
    println!("   ├─ Motion harmonics: {}", resolver.motion_harmonics);
    println!("   └─ Missing motion: {}", resolver.missing_motion);

    println!(
        "\n⚙️  Execution: {}",
        if info.parallel { "parallel" } else { "sequential" }
    );

    if !info.sinks.is_empty() {
        println!("\n📤 Sinks ({})", info.sinks.len());
        for (i, sink) in info.sinks.iter().enumerate() {
            let prefix = if i == info.sinks.len() - 1 { "└─" } else { "├─" };
            match &sink.path {
                Some(path) => println!("   {} {} ({}) -> {}", prefix, sink.name, sink.sink_type, path),
                None => println!("   {} {} ({})", prefix, sink.name, sink.sink_type),
            }
        }
    }

    println!();
}
