//! EstimateSink trait - export interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, Estimate};

/// Data output trait
///
/// Sinks receive estimates strictly in window order and must persist them in
/// that order, keeping null BPM values and reason codes intact.
pub trait EstimateSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one estimate
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, estimate: &Estimate) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    fn close(&mut self) -> Result<(), ContractError>;
}
