//! PipelineBlueprint - Config Loader 输出
//!
//! 描述一次完整的离线估计任务：输入信号参数、分析参数、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{AnalysisConfig, MotionReduction};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的任务配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 输入信号设置
    #[validate(nested)]
    pub input: InputConfig,

    /// 分析参数 (窗口 / 频谱 / 碰撞判决)
    #[serde(default)]
    #[validate(nested)]
    pub analysis: AnalysisConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl PipelineBlueprint {
    /// 使用默认分析参数构建蓝图
    pub fn with_sample_rate(sample_rate_hz: f64) -> Self {
        Self {
            version: ConfigVersion::V1,
            input: InputConfig {
                sample_rate_hz,
                start_time_s: 0.0,
                motion_reduction: MotionReduction::Magnitude,
            },
            analysis: AnalysisConfig::default(),
            sinks: Vec::new(),
        }
    }
}

/// 输入信号配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InputConfig {
    /// 采样率 (Hz)，PPG 与运动信号共用
    #[validate(range(exclusive_min = 0.0))]
    pub sample_rate_hz: f64,

    /// 首个样本时间戳 (秒)
    #[serde(default)]
    pub start_time_s: f64,

    /// 三轴加速度 -> 运动通道的归约方式
    #[serde(default)]
    pub motion_reduction: MotionReduction,
}

/// Sink 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 类型特定参数 (例如 file sink 的 `path`)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// 创建无参数的 sink 配置
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::new(),
        }
    }

    /// 追加参数
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// CSV 文件输出
    Csv,
    /// JSON Lines 文件输出
    JsonLines,
}

impl SinkType {
    /// 是否需要 `path` 参数
    pub fn requires_path(&self) -> bool {
        matches!(self, SinkType::Csv | SinkType::JsonLines)
    }
}
