//! The unit of work flowing through the augmentation pipeline.
//!
//! An [`Image`] wraps a decoded raster together with its name, a
//! process-unique id and the log of operations applied to it. The id feeds
//! the per-image seed derivation, so two images constructed concurrently can
//! never end up on the same random stream.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::ImageCodec;
use crate::error::PipelineResult;

/// Monotonic source of image ids.
///
/// The process-wide instance behind [`Image::new`] is never reset. Tests that
/// need a predictable sequence construct their own counter and pass it to
/// [`Image::with_counter`].
#[derive(Debug)]
pub struct IdCounter {
    next: AtomicU64,
}

impl IdCounter {
    /// Create a counter whose first id is `start`.
    pub const fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The process-wide counter used when no other is supplied.
    pub fn global() -> &'static IdCounter {
        &GLOBAL_IDS
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

static GLOBAL_IDS: IdCounter = IdCounter::new(0);

/// An image plus identity and history metadata.
#[derive(Debug, Clone)]
pub struct Image {
    data: DynamicImage,
    name: String,
    id: u64,
    history: Vec<String>,
    source: Option<PathBuf>,
}

impl Image {
    /// Wrap an owned raster, taking an id from the process-wide counter.
    pub fn new(data: DynamicImage, name: impl Into<String>) -> Self {
        Self::with_counter(data, name, &GLOBAL_IDS)
    }

    /// Wrap an owned raster, taking an id from `ids`.
    pub fn with_counter(data: DynamicImage, name: impl Into<String>, ids: &IdCounter) -> Self {
        Self::with_id(data, name, ids.next_id())
    }

    /// Wrap an owned raster under an id reserved by the caller.
    pub fn with_id(data: DynamicImage, name: impl Into<String>, id: u64) -> Self {
        Self {
            data,
            name: name.into(),
            id,
            history: Vec::new(),
            source: None,
        }
    }

    /// Copy a borrowed raster into a new image.
    pub fn from_buffer(data: &DynamicImage, name: impl Into<String>) -> Self {
        Self::new(data.clone(), name)
    }

    /// Decode an image from disk, taking an id from the process-wide counter.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        Self::load_with_counter(path, &GLOBAL_IDS)
    }

    /// Decode an image from disk, taking an id from `ids`.
    pub fn load_with_counter(path: &Path, ids: &IdCounter) -> PipelineResult<Self> {
        Self::load_with_id(path, ids.next_id())
    }

    /// Decode an image from disk under an id reserved by the caller.
    pub fn load_with_id(path: &Path, id: u64) -> PipelineResult<Self> {
        let data = ImageCodec::load(path)?;
        let mut image = Self::with_id(data, path.to_string_lossy(), id);
        image.source = Some(path.to_path_buf());
        Ok(image)
    }

    pub fn data(&self) -> &DynamicImage {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DynamicImage {
        &mut self.data
    }

    /// Replace the raster.
    pub fn set_data(&mut self, data: DynamicImage) {
        self.data = data;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Process-unique id assigned at construction.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Operations applied so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Append an entry to the operation history.
    pub fn log_operation(&mut self, entry: impl Into<String>) {
        self.history.push(entry.into());
    }

    /// Path the image was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// File stem used when saving: `<name-stem>_<id>`, or `image_<id>` for
    /// unnamed images. Including the id keeps every iteration of the same
    /// input on its own file.
    pub fn output_stem(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty());
        match stem {
            Some(stem) => format!("{}_{}", stem, self.id),
            None => format!("image_{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_injected_counter_is_sequential() {
        let ids = IdCounter::new(100);
        let a = Image::with_counter(DynamicImage::new_rgb8(2, 2), "a.png", &ids);
        let b = Image::with_counter(DynamicImage::new_rgb8(2, 2), "b.png", &ids);
        assert_eq!(a.id(), 100);
        assert_eq!(b.id(), 101);
    }

    #[test]
    fn test_concurrent_construction_yields_unique_ids() {
        let ids = Arc::new(IdCounter::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| Image::with_counter(DynamicImage::new_luma8(1, 1), "", &ids).id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 2000);
    }

    #[test]
    fn test_global_ids_are_distinct() {
        let a = Image::new(DynamicImage::new_rgb8(1, 1), "x");
        let b = Image::new(DynamicImage::new_rgb8(1, 1), "x");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_from_buffer_copies() {
        let buffer = DynamicImage::new_rgb8(3, 2);
        let mut image = Image::from_buffer(&buffer, "copy");
        image.set_data(DynamicImage::new_rgb8(5, 5));
        assert_eq!(buffer.width(), 3);
        assert_eq!(image.width(), 5);
    }

    #[test]
    fn test_history_log() {
        let mut image = Image::new(DynamicImage::new_rgb8(1, 1), "h");
        assert!(image.history().is_empty());
        image.log_operation("Reflect: horizontal");
        image.log_operation("Blur: k=3");
        assert_eq!(image.history(), ["Reflect: horizontal", "Blur: k=3"]);
    }

    #[test]
    fn test_output_stem() {
        let ids = IdCounter::new(7);
        let named = Image::with_counter(DynamicImage::new_rgb8(1, 1), "/data/in/cat.jpg", &ids);
        assert_eq!(named.output_stem(), "cat_7");

        let unnamed = Image::with_counter(DynamicImage::new_rgb8(1, 1), "", &ids);
        assert_eq!(unnamed.output_stem(), "image_8");
    }
}
