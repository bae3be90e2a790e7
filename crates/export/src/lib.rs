//! # Export
//!
//! 估计结果输出模块。
//!
//! 负责：
//! - 按窗口顺序把 `Estimate` 序列写入多个 sink
//! - 保留空 BPM 与丢弃原因
//! - 隔离失败的 sink，不影响其它输出

pub mod error;
pub mod exporter;
pub mod sinks;

pub use contracts::{Estimate, EstimateSink, SinkConfig, SinkType};
pub use error::ExportError;
pub use exporter::{create_sink, ExportReport, Exporter, SinkReport};
pub use sinks::{CsvSink, JsonLinesSink, LogSink};
