//! Thread orchestration: N producers augment images, one consumer saves them.
//!
//! ```text
//! paths × iterations ─▶ [path queue] ─▶ producers ×N ─▶ [image queue] ─▶ consumer ─▶ sink
//! ```
//!
//! Shutdown runs in two phases. The path queue is closed as soon as it is
//! filled, so producers exit once it drains. Only after every producer has
//! joined is the image queue closed, which lets the consumer drain the
//! remaining images and exit.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use super::augment::Pipeline;
use super::queue::BoundedQueue;
use super::sink::ImageSink;
use super::worker::{consumer_loop, producer_loop, PathTask, ProducerStats};
use crate::config::Config;
use crate::error::{AugmentoError, ConfigError, Result};
use crate::image::IdCounter;
use crate::types::RunSummary;

/// Lifecycle of a [`ThreadController`]. A controller runs once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Draining,
    Done,
}

/// Runs a pipeline over a set of input paths with a bounded worker pool.
#[derive(Debug)]
pub struct ThreadController {
    num_threads: usize,
    queue_capacity: usize,
    batch_size: usize,
    progress_interval: usize,
    ids: Option<Arc<IdCounter>>,
    state: ControllerState,
}

impl ThreadController {
    pub fn new(num_threads: usize, queue_capacity: usize) -> Self {
        Self {
            num_threads,
            queue_capacity: queue_capacity.max(1),
            batch_size: 12,
            progress_interval: 25,
            ids: None,
            state: ControllerState::Idle,
        }
    }

    /// Controller sized by the config's thread, queue and output settings.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.num_threads, config.queue_capacity)
            .with_batch_size(config.output.batch_size)
            .with_progress_interval(config.output.progress_interval)
    }

    /// Images the consumer buffers before writing.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Log progress every `interval` saves; 0 disables progress lines.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Assign image ids from `ids` instead of the process-wide counter.
    pub fn with_id_counter(mut self, ids: Arc<IdCounter>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Augment every path `iterations` times and hand the results to `sink`.
    ///
    /// Configuration problems fail before any thread starts. Failures on
    /// individual images are logged and counted in the summary.
    pub fn run<S: ImageSink + ?Sized>(
        &mut self,
        paths: &[PathBuf],
        iterations: u32,
        pipeline: &Pipeline,
        sink: &mut S,
    ) -> Result<RunSummary> {
        if self.state != ControllerState::Idle {
            return Err(invalid("controller has already been run"));
        }
        if self.num_threads == 0 {
            return Err(invalid("num_threads must be >= 1"));
        }
        if iterations == 0 {
            return Err(invalid("iterations must be >= 1"));
        }

        let start = Instant::now();
        if paths.is_empty() {
            tracing::warn!("No input images found, nothing to augment");
            self.state = ControllerState::Done;
            return Ok(RunSummary {
                elapsed: start.elapsed(),
                ..RunSummary::default()
            });
        }

        let total = paths.len() * iterations as usize;
        let ids = self.ids.as_deref().unwrap_or(IdCounter::global());
        let tasks = BoundedQueue::new(total);
        for iteration in 0..iterations {
            for path in paths {
                // capacity equals the task count, so this never blocks
                let _ = tasks.push(PathTask {
                    path: path.clone(),
                    iteration,
                    image_id: ids.next_id(),
                });
            }
        }
        tasks.shutdown();

        let images = BoundedQueue::new(self.queue_capacity);
        let stats = ProducerStats::default();
        let (batch_size, progress_interval) = (self.batch_size, self.progress_interval);

        tracing::info!(
            "Augmenting {} images x {} iterations ({} tasks) on {} threads",
            paths.len(),
            iterations,
            total,
            self.num_threads
        );
        self.state = ControllerState::Running;

        let consumer_stats = std::thread::scope(|scope| {
            let producers: Vec<_> = (0..self.num_threads)
                .map(|worker| {
                    let (tasks, images, stats) = (&tasks, &images, &stats);
                    scope.spawn(move || producer_loop(worker, tasks, images, pipeline, stats))
                })
                .collect();
            let consumer = scope.spawn(|| consumer_loop(&images, sink, batch_size, progress_interval, total));

            for producer in producers {
                if producer.join().is_err() {
                    tracing::warn!("A producer thread exited abnormally");
                }
            }
            images.shutdown();
            self.state = ControllerState::Draining;
            tracing::debug!("Producers joined, draining {} queued images", images.len());

            consumer.join()
        });
        self.state = ControllerState::Done;

        let consumer_stats = consumer_stats.map_err(|_| {
            AugmentoError::Pipeline(crate::error::PipelineError::Panicked {
                task: "consumer".to_string(),
                message: "consumer thread exited abnormally".to_string(),
            })
        })?;

        let summary = RunSummary {
            total_tasks: total,
            augmented: stats.augmented.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            saved: consumer_stats.saved,
            save_failed: consumer_stats.save_failed,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Finished: {} saved, {} failed, {} save errors in {:.2?}",
            summary.saved,
            summary.failed,
            summary.save_failed,
            summary.elapsed
        );
        Ok(summary)
    }
}

fn invalid(message: &str) -> AugmentoError {
    ConfigError::InvalidConfiguration(message.to_string()).into()
}
