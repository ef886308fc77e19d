//! Error types for the fusion engine.

use thiserror::Error;

/// Main error type for signal loading, fusion runs and exports.
#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid record for {symbol}: {reason}")]
    InvalidRecord { symbol: String, reason: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl FusionError {
    /// Shorthand for a record-level validation failure.
    pub fn invalid_record(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        FusionError::InvalidRecord {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;
