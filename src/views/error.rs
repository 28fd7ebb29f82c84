//! View engine error types

use thiserror::Error;

/// View rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Template could not be parsed or rendered
    #[error("Template error: {0}")]
    TemplateError(String),

    /// An embedded template is not valid UTF-8
    #[error("Invalid template encoding: {0}")]
    InvalidEncoding(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
