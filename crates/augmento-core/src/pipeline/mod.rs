//! Augmentation pipeline components.
//!
//! - **augment**: the ordered, probability-gated operation sequence
//! - **codec**: decode inputs and encode augmented outputs
//! - **discovery**: find input images
//! - **queue**: bounded blocking queue for backpressure
//! - **worker**: producer and consumer loops
//! - **controller**: runs the worker pool over a set of inputs
//! - **sink**: where finished images are written

pub mod augment;
pub mod codec;
pub mod controller;
pub mod discovery;
pub mod queue;
pub mod sink;
pub mod worker;

// Re-exports for convenient access
pub use augment::{OperationEntry, Pipeline};
pub use codec::{ImageCodec, OutputImageFormat};
pub use controller::{ControllerState, ThreadController};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use queue::{BoundedQueue, QueueClosed};
pub use sink::{DirectorySink, ImageSink};
pub use worker::{augment_task, PathTask};
