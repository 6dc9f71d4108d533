//! Configuration management for Augmento.
//!
//! A run is described by a single JSON file (TOML is accepted when the file
//! extension is `.toml`). Every field except `output_dir`, the inputs and
//! `pipeline` has a default, so a minimal config only names where images come
//! from, where they go, and which operations to apply.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Augmento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory augmented images are written to (required)
    pub output_dir: PathBuf,

    /// Directory scanned recursively for input images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,

    /// Explicit input files, used alongside or instead of `input_dir`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub image_paths: Vec<PathBuf>,

    /// Augmented variants produced per input image
    pub iterations: u32,

    /// Number of producer threads
    pub num_threads: usize,

    /// Capacity of the augmented-image queue (backpressure bound)
    pub queue_capacity: usize,

    /// Log run progress at info level
    pub verbose: bool,

    /// Base seed for the pipeline; random per run when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Write `manifest.jsonl` with each saved image's operation history
    pub save_history: bool,

    /// Output settings
    pub output: OutputConfig,

    /// Input discovery settings
    pub processing: ProcessingConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Ordered operation list
    pub pipeline: Vec<OperationSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            input_dir: None,
            image_paths: Vec::new(),
            iterations: 1,
            num_threads: default_num_threads(),
            queue_capacity: 128,
            verbose: true,
            seed: None,
            save_history: false,
            output: OutputConfig::default(),
            processing: ProcessingConfig::default(),
            logging: LoggingConfig::default(),
            pipeline: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file path and validate it.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config: Config = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Output directory with `~` expanded.
    pub fn output_path(&self) -> PathBuf {
        expand(&self.output_dir)
    }

    /// Input directory with `~` expanded.
    pub fn input_path(&self) -> Option<PathBuf> {
        self.input_dir.as_deref().map(expand)
    }

    /// Explicit input files with `~` expanded.
    pub fn image_path_list(&self) -> Vec<PathBuf> {
        self.image_paths.iter().map(|p| expand(p)).collect()
    }

    /// The configured seed, or a fresh random one when none was given.
    pub fn seed_or_random(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Serialize the config to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "output_dir": "out",
        "input_dir": "in",
        "pipeline": [{"name": "reflect", "probability": 1.0}]
    }"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.iterations, 1);
        assert_eq!(config.queue_capacity, 128);
        assert!(config.num_threads >= 1);
        assert!(config.verbose);
        assert!(config.seed.is_none());
        assert_eq!(config.output.format, "png");
    }

    #[test]
    fn test_minimal_json_config() {
        let config = Config::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.input_dir, Some(PathBuf::from("in")));
        assert_eq!(config.pipeline.len(), 1);
        assert_eq!(config.pipeline[0].name, "reflect");
        assert!(config.pipeline[0].params.is_empty());
    }

    #[test]
    fn test_prob_alias_and_params() {
        let json = r#"{
            "output_dir": "out",
            "image_paths": ["a.png", "b.png"],
            "seed": 42,
            "iterations": 3,
            "pipeline": [
                {"name": "Rotate", "params": [-10, 10, 0], "prob": 0.5},
                {"name": "blur"}
            ]
        }"#;
        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.iterations, 3);
        assert_eq!(config.image_paths.len(), 2);
        assert_eq!(config.pipeline[0].params, vec![-10.0, 10.0, 0.0]);
        assert!((config.pipeline[0].probability - 0.5).abs() < f64::EPSILON);
        assert!((config.pipeline[1].probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_from_json_and_toml_files() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("augment.json");
        std::fs::write(&json_path, MINIMAL).unwrap();
        let config = Config::load_from(&json_path).unwrap();
        assert_eq!(config.pipeline.len(), 1);

        let toml_path = dir.path().join("augment.toml");
        std::fs::write(
            &toml_path,
            r#"
output_dir = "out"
input_dir = "in"
iterations = 2

[[pipeline]]
name = "blur"
params = [3.0, 5.0]
probability = 0.25
"#,
        )
        .unwrap();
        let config = Config::load_from(&toml_path).unwrap();
        assert_eq!(config.iterations, 2);
        assert_eq!(config.pipeline[0].params, vec![3.0, 5.0]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load_from(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_seed_or_random_prefers_configured_seed() {
        let mut config = Config::default();
        config.seed = Some(7);
        assert_eq!(config.seed_or_random(), 7);
    }

    #[test]
    fn test_config_to_json_roundtrips_fields() {
        let config = Config::from_json_str(MINIMAL).unwrap();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"output_dir\""));
        assert!(json.contains("\"reflect\""));
    }
}
