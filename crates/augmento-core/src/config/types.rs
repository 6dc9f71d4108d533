//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Image format for augmented files ("png", "jpg", "webp", "bmp", "tiff")
    pub format: String,

    /// Images the consumer buffers before writing a batch
    pub batch_size: usize,

    /// Log a progress line every N saved images
    pub progress_interval: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            batch_size: 12,
            progress_interval: 25,
        }
    }
}

/// Input discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input formats
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "bmp".to_string(),
                "tif".to_string(),
                "tiff".to_string(),
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// One pipeline step as written in the config file.
///
/// An empty `params` list asks the factory to pick parameters itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Operation name, matched case-insensitively
    pub name: String,

    /// Numeric parameters; meaning depends on the operation
    #[serde(default)]
    pub params: Vec<f64>,

    /// Chance in [0, 1] that the step runs for a given image
    #[serde(default = "default_probability", alias = "prob")]
    pub probability: f64,
}

impl OperationSpec {
    /// Create a spec with explicit parameters.
    pub fn new(name: impl Into<String>, params: Vec<f64>, probability: f64) -> Self {
        Self {
            name: name.into(),
            params,
            probability,
        }
    }
}

fn default_probability() -> f64 {
    1.0
}
