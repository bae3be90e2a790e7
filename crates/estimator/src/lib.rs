//! # Estimator
//!
//! 心率估计主流程。
//!
//! 负责：
//! - Segmenter → Spectral Analyzer → Collision Resolver 串联
//! - 窗口级并行 (rayon)，按窗口序号确定性合并
//! - 惰性逐窗口输出 (`stream`)
//! - 按时间戳索引的有序结果序列 (`EstimateSeries`)
//!
//! ## 使用示例
//!
//! ```ignore
//! use estimator::HeartRateEstimator;
//!
//! let estimator = HeartRateEstimator::new(blueprint.analysis.clone())?;
//! let series = estimator.run(&ppg, &motion)?;
//! for estimate in &series {
//!     println!("{} {:?} {}", estimate.timestamp_s, estimate.bpm, estimate.reason);
//! }
//! ```

mod engine;
mod series;

pub use contracts::{AnalysisConfig, Estimate, EstimateReason, EstimateRecord, Signal};
pub use engine::{EstimateStream, HeartRateEstimator};
pub use series::EstimateSeries;
