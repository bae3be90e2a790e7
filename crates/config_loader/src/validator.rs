//! 配置校验模块
//!
//! 校验规则：
//! - 字段级范围 (validator derive)
//! - 采样率 / 窗口 / 步长为有限正数，窗口至少 2 个样本
//! - 频带 min < max，且不超过 Nyquist
//! - fft_size >= 窗口样本数
//! - 判决参数：容差 >= 0，dominance_ratio > 1
//! - sink 名称非空且唯一，文件类 sink 必须提供 `path`

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, FrequencyBand, PipelineBlueprint};

/// 校验 PipelineBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_input(blueprint)?;
    validate_window(blueprint)?;
    validate_bands(blueprint)?;
    validate_resolver(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 字段级范围校验
fn validate_fields(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let message = errors.to_string();
        // "analysis.window.step_s: Validation error: ..." -> field path
        let field = message
            .split_once(':')
            .map(|(field, _)| field.trim().to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        ContractError::configuration(field, message)
    })
}

/// 校验采样率
fn validate_input(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let rate = blueprint.input.sample_rate_hz;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ContractError::configuration(
            "input.sample_rate_hz",
            format!("sample_rate_hz must be a finite value > 0, got {rate}"),
        ));
    }
    if !blueprint.input.start_time_s.is_finite() {
        return Err(ContractError::configuration(
            "input.start_time_s",
            "start_time_s must be finite",
        ));
    }
    Ok(())
}

/// 校验窗口与 FFT 长度
fn validate_window(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let window = &blueprint.analysis.window;
    let rate = blueprint.input.sample_rate_hz;

    for (field, value) in [
        ("analysis.window.duration_s", window.duration_s),
        ("analysis.window.step_s", window.step_s),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ContractError::configuration(
                field,
                format!("must be a finite value > 0, got {value}"),
            ));
        }
    }

    let window_samples = (window.duration_s * rate).round();
    if window_samples < 2.0 {
        return Err(ContractError::configuration(
            "analysis.window.duration_s",
            format!(
                "window of {}s spans {window_samples} samples at {rate} Hz, need at least 2",
                window.duration_s
            ),
        ));
    }
    if (window.step_s * rate).round() < 1.0 {
        return Err(ContractError::configuration(
            "analysis.window.step_s",
            format!("step of {}s is shorter than one sample at {rate} Hz", window.step_s),
        ));
    }

    if let Some(fft_size) = blueprint.analysis.spectral.fft_size {
        if (fft_size as f64) < window_samples {
            return Err(ContractError::configuration(
                "analysis.spectral.fft_size",
                format!("fft_size ({fft_size}) must be >= window length ({window_samples} samples)"),
            ));
        }
    }
    Ok(())
}

/// 校验频带
fn validate_bands(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let spectral = &blueprint.analysis.spectral;
    let nyquist = blueprint.input.sample_rate_hz / 2.0;

    for (field, band) in [
        ("analysis.spectral.cardiac_band", spectral.cardiac_band),
        ("analysis.spectral.motion_band", spectral.motion_band),
    ] {
        validate_band(field, band, nyquist)?;
    }
    Ok(())
}

fn validate_band(field: &str, band: FrequencyBand, nyquist: f64) -> Result<(), ContractError> {
    if !band.min_hz.is_finite() || !band.max_hz.is_finite() || band.min_hz < 0.0 {
        return Err(ContractError::configuration(
            field,
            format!("band edges must be finite and >= 0, got {}-{} Hz", band.min_hz, band.max_hz),
        ));
    }
    if band.min_hz >= band.max_hz {
        return Err(ContractError::configuration(
            field,
            format!("min_hz ({}) must be < max_hz ({})", band.min_hz, band.max_hz),
        ));
    }
    if band.max_hz > nyquist {
        return Err(ContractError::configuration(
            field,
            format!("max_hz ({}) exceeds Nyquist ({nyquist} Hz)", band.max_hz),
        ));
    }
    Ok(())
}

/// 校验判决参数
fn validate_resolver(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let resolver = &blueprint.analysis.resolver;

    let tolerance = resolver.collision_tolerance_bpm;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ContractError::configuration(
            "analysis.resolver.collision_tolerance_bpm",
            format!("must be a finite value >= 0, got {tolerance}"),
        ));
    }

    let ratio = resolver.dominance_ratio;
    if !ratio.is_finite() || ratio <= 1.0 {
        return Err(ContractError::configuration(
            "analysis.resolver.dominance_ratio",
            format!("dominance_ratio must be a finite value > 1, got {ratio}"),
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::configuration(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::configuration(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        let has_path = sink
            .params
            .get("path")
            .is_some_and(|p| !p.trim().is_empty());
        if sink.sink_type.requires_path() && !has_path {
            return Err(ContractError::configuration(
                format!("sinks[{}].params.path", sink.name),
                format!("{:?} sink requires a 'path' param", sink.sink_type),
            ));
        }
    }
    Ok(())
}
