//! # Segmenter
//!
//! Window segmentation of two time-aligned signals.
//!
//! 负责：
//! - 校验 PPG / 运动信号的对齐契约（采样率、长度、起始时间）
//! - 把窗口 / 步长 (秒) 换算成样本数
//! - 产出惰性、可重启的窗口对序列，尾部不完整窗口直接丢弃
//!
//! ## 使用示例
//!
//! ```ignore
//! use segmenter::{Segmenter, WindowConfig};
//!
//! let segmenter = Segmenter::new(WindowConfig::default())?;
//! for pair in segmenter.segment(&ppg, &motion)? {
//!     // pair.ppg / pair.motion share pair.start_time_s
//! }
//! ```

mod window;

pub use contracts::{Signal, WindowConfig};
pub use window::{count_windows, Segmenter, WindowPair, WindowPlan, Windows};
