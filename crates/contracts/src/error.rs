//! Layered error definitions
//!
//! Categorized by source: config / signal / sink

use thiserror::Error;

/// Unified error type
///
/// Only setup and contract violations are represented here. Per-window signal
/// quality problems are never errors; they surface as discarded `Estimate`s.
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid window / step / band / resolver parameter
    #[error("configuration error at '{field}': {message}")]
    Configuration { field: String, message: String },

    // ===== Signal Errors =====
    /// Input signals violate the alignment contract
    #[error("signal mismatch: {message}")]
    SignalMismatch { message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create signal mismatch error
    pub fn signal_mismatch(message: impl Into<String>) -> Self {
        Self::SignalMismatch {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by parameter checks at setup time
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::ConfigParse { .. })
    }
}
