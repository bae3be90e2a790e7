//! Run statistics.

use std::time::Duration;

use export::ExportReport;
use observability::EstimateSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Complete windows in the recording
    pub windows_total: usize,

    /// Windows actually estimated (fewer on `--max-windows` or shutdown)
    pub windows_estimated: usize,

    /// Estimation ended before the last window
    pub stopped_early: bool,

    /// Total duration of the run, including input loading and export
    pub duration: Duration,

    /// Per-reason totals and BPM statistics
    pub summary: EstimateSummary,

    /// Per-sink outcome
    pub export: ExportReport,
}

impl PipelineStats {
    /// Windows estimated per second of wall time
    pub fn windows_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.windows_estimated as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Heart-Rate Estimation                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!(
            "   ├─ Windows: {} of {}{}",
            self.windows_estimated,
            self.windows_total,
            if self.stopped_early { " (stopped early)" } else { "" }
        );
        println!("   └─ Throughput: {:.1} windows/s", self.windows_per_sec());

        println!("\n{}", self.summary);

        if !self.export.sinks.is_empty() {
            println!("📤 Sinks");
            let last = self.export.sinks.len() - 1;
            for (i, sink) in self.export.sinks.iter().enumerate() {
                let prefix = if i == last { "└─" } else { "├─" };
                match &sink.error {
                    None => println!("   {} {}: {} records", prefix, sink.name, sink.written),
                    Some(error) => println!(
                        "   {} {}: FAILED after {} records ({})",
                        prefix, sink.name, sink.written, error
                    ),
                }
            }
        }

        println!();
    }
}
