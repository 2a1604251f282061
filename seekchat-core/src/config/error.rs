//! Configuration error types with detailed error reporting

use std::fmt;
use thiserror::Error;

/// Main configuration error type with detailed context
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config from '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in '{path}' at line {}, column {}: {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Validation error: {0}")]
    Invalid(#[from] FieldError),

    #[error("Environment variable '{var}' not found")]
    EnvVarNotFound { var: String },

    #[error("Settings store error: {message}")]
    Store { message: String },
}

impl ConfigError {
    /// Create a settings store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

/// A configuration field that failed validation
#[derive(Debug, Error)]
pub struct FieldError {
    /// Path to the offending field (e.g., "base_url")
    pub field_path: String,
    /// What is wrong with it
    pub kind: FieldErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed at '{}': {}", self.field_path, self.kind)
    }
}

/// Specific validation error types
#[derive(Debug, Error)]
pub enum FieldErrorKind {
    #[error("required field is missing")]
    RequiredFieldMissing,

    #[error("value out of range: {message}")]
    OutOfRange { message: String },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },
}

impl FieldError {
    /// Create a new validation error
    pub fn new(field_path: impl Into<String>, kind: FieldErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
        }
    }

    /// Helper to create a required field error
    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, FieldErrorKind::RequiredFieldMissing)
    }

    /// Helper to create an out of range error
    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            FieldErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    /// Helper to create an invalid URL error
    pub fn invalid_url(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            FieldErrorKind::InvalidUrl {
                message: message.into(),
            },
        )
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
