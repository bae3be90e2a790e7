//! 心率估计指标收集模块
//!
//! 基于逐窗口的 `Estimate` 记录 Prometheus 指标，并在内存中聚合运行摘要。

use std::collections::HashMap;

use contracts::{Estimate, EstimateReason};
use metrics::{counter, gauge, histogram};

/// 从单个 Estimate 记录指标
///
/// 每个窗口完成判决后调用一次。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_estimate_metrics;
///
/// for estimate in series.iter() {
///     record_estimate_metrics(estimate);
/// }
/// ```
pub fn record_estimate_metrics(estimate: &Estimate) {
    counter!(
        "ppg_hr_windows_total",
        "outcome" => estimate.reason.as_str()
    )
    .increment(1);

    if let Some(bpm) = estimate.bpm {
        histogram!("ppg_hr_bpm").record(bpm);
        gauge!("ppg_hr_last_bpm").set(bpm);
    }

    if let Some(collision) = estimate.collision {
        counter!(
            "ppg_hr_collisions_total",
            "harmonic" => collision.harmonic.to_string()
        )
        .increment(1);
        histogram!("ppg_hr_collision_delta_bpm").record(collision.delta_bpm);
    }

    // 频谱峰功率比 (cardiac / motion)
    if let (Some(cardiac), Some(motion)) = (estimate.cardiac_peak, estimate.motion_peak) {
        if motion.power > 0.0 {
            histogram!("ppg_hr_power_ratio").record(cardiac.power / motion.power);
        }
    }
}

/// 记录 sink 写入结果
pub fn record_sink_write(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "ppg_hr_sink_records_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录一次完整运行的耗时
pub fn record_run_duration_ms(duration_ms: f64) {
    histogram!("ppg_hr_run_duration_ms").record(duration_ms);
}

/// 估计结果聚合器
///
/// 在内存中聚合结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct EstimateMetricsAggregator {
    /// 总窗口数
    pub total_windows: u64,

    /// 有效窗口数
    pub valid_windows: u64,

    /// 发生频率碰撞的窗口数 (无论是否接受)
    pub collisions: u64,

    /// 各丢弃原因计数
    pub reason_counts: HashMap<EstimateReason, u64>,

    /// 有效 BPM 统计
    pub bpm_stats: RunningStats,

    /// 有效 BPM 原始值 (用于中位数)
    bpm_values: Vec<f64>,
}

impl EstimateMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, estimate: &Estimate) {
        self.total_windows += 1;
        *self.reason_counts.entry(estimate.reason).or_insert(0) += 1;

        if estimate.collision.is_some() {
            self.collisions += 1;
        }

        if let Some(bpm) = estimate.bpm {
            self.valid_windows += 1;
            self.bpm_stats.push(bpm);
            self.bpm_values.push(bpm);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> EstimateSummary {
        let discarded = self.total_windows - self.valid_windows;
        EstimateSummary {
            total_windows: self.total_windows,
            valid_windows: self.valid_windows,
            discarded_windows: discarded,
            collisions: self.collisions,
            discard_rate: if self.total_windows > 0 {
                discarded as f64 / self.total_windows as f64 * 100.0
            } else {
                0.0
            },
            reason_counts: EstimateReason::ALL
                .iter()
                .filter(|r| r.is_discard())
                .map(|r| (*r, self.reason_counts.get(r).copied().unwrap_or(0)))
                .collect(),
            bpm: StatsSummary::from(&self.bpm_stats),
            median_bpm: median(&self.bpm_values),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl<'a> Extend<&'a Estimate> for EstimateMetricsAggregator {
    fn extend<I: IntoIterator<Item = &'a Estimate>>(&mut self, iter: I) {
        for estimate in iter {
            self.update(estimate);
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 运行摘要
#[derive(Debug, Clone, Default)]
pub struct EstimateSummary {
    pub total_windows: u64,
    pub valid_windows: u64,
    pub discarded_windows: u64,
    pub collisions: u64,
    /// 丢弃率 (%)
    pub discard_rate: f64,
    /// 各丢弃原因计数 (不含 `none`)
    pub reason_counts: Vec<(EstimateReason, u64)>,
    pub bpm: StatsSummary,
    pub median_bpm: Option<f64>,
}

impl std::fmt::Display for EstimateSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Heart Rate Summary ===")?;
        writeln!(f, "Total windows: {}", self.total_windows)?;
        writeln!(f, "Valid windows: {}", self.valid_windows)?;
        writeln!(
            f,
            "Discarded windows: {} ({:.2}%)",
            self.discarded_windows, self.discard_rate
        )?;
        for (reason, count) in &self.reason_counts {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        writeln!(f, "Collisions: {}", self.collisions)?;
        writeln!(f, "BPM: {}", self.bpm)?;
        match self.median_bpm {
            Some(median) => writeln!(f, "Median BPM: {:.2}", median)?,
            None => writeln!(f, "Median BPM: N/A")?,
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
