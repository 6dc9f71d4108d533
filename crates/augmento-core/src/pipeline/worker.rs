//! Producer and consumer loops run by the thread controller.
//!
//! Every task boundary is a failure boundary: errors and panics from one
//! image are logged and counted, and the loop moves on to the next task.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::augment::Pipeline;
use super::queue::BoundedQueue;
use super::sink::ImageSink;
use crate::error::{PipelineError, PipelineResult};
use crate::image::Image;

/// One unit of producer work: augment `path` once.
///
/// The image id is reserved when the task is queued, so the random stream an
/// input gets does not depend on which producer picks the task up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTask {
    pub path: PathBuf,
    /// Zero-based iteration index for this path
    pub iteration: u32,
    /// Id given to the loaded image
    pub image_id: u64,
}

impl PathTask {
    fn label(&self) -> String {
        format!("{} (iteration {})", self.path.display(), self.iteration + 1)
    }
}

/// Task counters shared by all producers.
#[derive(Debug, Default)]
pub(crate) struct ProducerStats {
    pub augmented: AtomicUsize,
    pub failed: AtomicUsize,
}

/// Totals reported by the consumer.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsumerStats {
    pub saved: usize,
    pub save_failed: usize,
}

/// Load and augment one task.
pub fn augment_task(task: &PathTask, pipeline: &Pipeline) -> PipelineResult<Image> {
    let mut image = Image::load_with_id(&task.path, task.image_id)?;
    pipeline.apply(&mut image)?;
    Ok(image)
}

/// Run `f`, turning a panic into [`PipelineError::Panicked`].
fn contain<T>(task: impl FnOnce() -> String, f: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(PipelineError::Panicked {
            task: task(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Pop tasks until the path queue is drained, pushing augmented images.
pub(crate) fn producer_loop(
    worker: usize,
    tasks: &BoundedQueue<PathTask>,
    images: &BoundedQueue<Image>,
    pipeline: &Pipeline,
    stats: &ProducerStats,
) {
    tracing::debug!("Producer {} started", worker);
    while let Some(task) = tasks.pop() {
        let result = contain(|| task.label(), || augment_task(&task, pipeline));
        match result {
            Ok(image) => {
                tracing::debug!(
                    "Producer {}: augmented {} ({} ops)",
                    worker,
                    task.label(),
                    image.history().len()
                );
                if let Err(rejected) = images.push(image) {
                    tracing::warn!(
                        "Image queue closed, dropping {}",
                        rejected.into_inner().name()
                    );
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                } else {
                    stats.augmented.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to augment {}: {}", task.label(), e);
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
    tracing::debug!("Producer {} finished", worker);
}

/// Drain the image queue into `sink`, writing in batches of `batch_size`.
pub(crate) fn consumer_loop<S: ImageSink + ?Sized>(
    images: &BoundedQueue<Image>,
    sink: &mut S,
    batch_size: usize,
    progress_interval: usize,
    expected: usize,
) -> ConsumerStats {
    let batch_size = batch_size.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut stats = ConsumerStats::default();

    while let Some(image) = images.pop() {
        batch.push(image);
        if batch.len() >= batch_size {
            flush(&mut batch, sink, &mut stats, progress_interval, expected);
        }
    }
    flush(&mut batch, sink, &mut stats, progress_interval, expected);

    if let Err(e) = contain(|| "sink finish".to_string(), || sink.finish()) {
        tracing::warn!("Failed to finalize output: {}", e);
    }
    stats
}

fn flush<S: ImageSink + ?Sized>(
    batch: &mut Vec<Image>,
    sink: &mut S,
    stats: &mut ConsumerStats,
    progress_interval: usize,
    expected: usize,
) {
    for image in batch.drain(..) {
        match contain(|| image.name().to_string(), || sink.save(&image)) {
            Ok(path) => {
                stats.saved += 1;
                tracing::debug!("Saved {:?}", path);
                if progress_interval > 0 && stats.saved % progress_interval == 0 {
                    tracing::info!("Saved {}/{} images", stats.saved, expected);
                }
            }
            Err(e) => {
                stats.save_failed += 1;
                tracing::warn!("Failed to save {}: {}", image.name(), e);
            }
        }
    }
}
