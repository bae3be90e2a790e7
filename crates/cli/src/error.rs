//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Neither a config file nor a sample rate was given
    #[error("No configuration: pass --config <file> or --sample-rate <hz>")]
    MissingConfig,

    /// Input recording not found
    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    /// Input columns do not match any supported layout
    #[error("Unsupported input layout in {path}: {message}")]
    InputLayout { path: String, message: String },

    /// A cell could not be parsed
    #[error("Invalid value in {path} at line {line}: {message}")]
    InputParse {
        path: String,
        line: u64,
        message: String,
    },

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input_not_found(path: impl Into<String>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    pub fn input_layout(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputLayout {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn input_parse(path: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        Self::InputParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
