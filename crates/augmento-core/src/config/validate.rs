//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(invalid("missing required field output_dir"));
        }
        if self.input_dir.is_none() && self.image_paths.is_empty() {
            return Err(invalid(
                "missing required field input_dir (or a non-empty image_paths list)",
            ));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations must be >= 1"));
        }
        if self.num_threads == 0 {
            return Err(invalid("num_threads must be >= 1"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be >= 1"));
        }
        if self.output.batch_size == 0 {
            return Err(invalid("output.batch_size must be >= 1"));
        }
        if crate::pipeline::OutputImageFormat::parse(&self.output.format).is_none() {
            return Err(invalid(format!(
                "output.format \"{}\" is not one of png, jpg, jpeg, webp, bmp, tiff",
                self.output.format
            )));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "logging.level \"{}\" is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("logging.format must be \"pretty\" or \"json\""));
        }
        if self.pipeline.is_empty() {
            return Err(invalid("missing required field pipeline"));
        }
        for (index, spec) in self.pipeline.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(invalid(format!("pipeline[{index}] has an empty name")));
            }
            if !spec.probability.is_finite() || !(0.0..=1.0).contains(&spec.probability) {
                return Err(invalid(format!(
                    "pipeline[{index}] ({}): probability must be between 0 and 1, got {}",
                    spec.name, spec.probability
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration(message.into())
}
