//! Error types for the Augmento augmentation pipeline.
//!
//! Errors are split by when they can happen. Configuration and operation
//! construction errors are fatal and surface before any worker thread starts.
//! Pipeline errors describe a single image-iteration failing and are
//! recoverable: workers log them and move on to the next task.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Augmento operations.
#[derive(Error, Debug)]
pub enum AugmentoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline construction errors
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Per-image processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors raised while building operations from a name and parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// No operation is registered under this name
    #[error("Unknown operation: \"{0}\"")]
    UnknownOperation(String),

    /// Wrong parameter count or out-of-range parameter values
    #[error("Invalid parameters for {operation}: {message}")]
    InvalidParameters { operation: String, message: String },
}

impl OperationError {
    pub(crate) fn invalid(operation: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// Per-image processing errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// An operation could not be applied to this image
    #[error("{operation} failed on {image}: {message}")]
    Operation {
        operation: &'static str,
        image: String,
        message: String,
    },

    /// Writing the augmented image failed
    #[error("Save error for {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// A worker task panicked; the panic was contained at the task boundary
    #[error("Task panicked while processing {task}: {message}")]
    Panicked { task: String, message: String },
}

/// Convenience type alias for Augmento results.
pub type Result<T> = std::result::Result<T, AugmentoError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
