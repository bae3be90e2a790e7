//! LogSink - logs estimate summary via tracing

use contracts::{ContractError, Estimate, EstimateSink};
use tracing::{info, instrument};

/// Sink that logs estimates for debugging
pub struct LogSink {
    name: String,
    written: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: 0,
        }
    }

    fn log_estimate(&self, estimate: &Estimate) {
        info!(
            sink = %self.name,
            window = estimate.window_index,
            timestamp_s = estimate.timestamp_s,
            bpm = estimate.bpm,
            valid = estimate.valid,
            reason = %estimate.reason,
            collision = estimate.is_collision(),
            "Estimate"
        );
    }
}

impl EstimateSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        level = "trace",
        skip(self, estimate),
        fields(sink = %self.name, window = estimate.window_index)
    )]
    fn write(&mut self, estimate: &Estimate) -> Result<(), ContractError> {
        self.log_estimate(estimate);
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, written = self.written, "LogSink closed");
        Ok(())
    }
}
