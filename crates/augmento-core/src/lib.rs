//! Augmento Core - embeddable image augmentation library.
//!
//! Augmento applies randomized, probability-gated sequences of image
//! operations to a set of input images, producing a configurable number of
//! augmented variants per input.
//!
//! # Architecture
//!
//! ```text
//! Config → Pipeline (operations + probabilities)
//!        → ThreadController: paths → producers (load, augment) → consumer → sink
//! ```
//!
//! Every image gets a process-unique id, and its random stream is seeded
//! from the pipeline's base seed and that id. Results are therefore the same
//! regardless of how many threads run or in which order they finish.
//!
//! # Usage
//!
//! ```rust,no_run
//! use augmento_core::{Config, DirectorySink, FileDiscovery, OutputImageFormat, Pipeline, ThreadController};
//!
//! fn main() -> augmento_core::Result<()> {
//!     let config = Config::load_from(std::path::Path::new("augment.json"))?;
//!     let pipeline = Pipeline::from_specs(&config.pipeline, config.seed_or_random())?;
//!     let paths = FileDiscovery::new(config.processing.clone()).discover_inputs(&config);
//!
//!     let mut sink = DirectorySink::new(config.output_path(), OutputImageFormat::Png)?;
//!     let summary = ThreadController::from_config(&config).run(&paths, config.iterations, &pipeline, &mut sink)?;
//!     println!("saved {} images", summary.saved);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod image;
pub mod ops;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use crate::image::{IdCounter, Image};
pub use config::{Config, OperationSpec};
pub use error::{AugmentoError, ConfigError, OperationError, PipelineError, PipelineResult, Result};
pub use ops::{Operation, OperationFactory};
pub use output::OutputWriter;
pub use pipeline::{
    BoundedQueue, ControllerState, DirectorySink, FileDiscovery, ImageCodec, ImageSink, OperationEntry,
    OutputImageFormat, Pipeline, ThreadController,
};
pub use types::{AugmentedRecord, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
