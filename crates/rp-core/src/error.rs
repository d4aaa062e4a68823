//! Error types for RelPlan

use thiserror::Error;

/// RelPlan error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reference catalog lookup or consistency error
    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
