//! Where the consumer thread sends finished images.

use std::path::{Path, PathBuf};

use super::codec::{ImageCodec, OutputImageFormat};
use crate::error::{PipelineError, PipelineResult};
use crate::image::Image;
use crate::output::{OutputWriter, MANIFEST_FILE};
use crate::types::AugmentedRecord;

/// Persistence target driven by the consumer thread.
///
/// Only the consumer touches the sink, so implementations need `Send` but
/// not `Sync`.
pub trait ImageSink: Send {
    /// Persist one image and return where it went.
    fn save(&mut self, image: &Image) -> PipelineResult<PathBuf>;

    /// Called once after the last image.
    fn finish(&mut self) -> PipelineResult<()> {
        Ok(())
    }
}

impl<S: ImageSink + ?Sized> ImageSink for Box<S> {
    fn save(&mut self, image: &Image) -> PipelineResult<PathBuf> {
        (**self).save(image)
    }

    fn finish(&mut self) -> PipelineResult<()> {
        (**self).finish()
    }
}

/// Writes images into a directory, optionally recording a manifest.
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputImageFormat,
    manifest: Option<OutputWriter<std::io::BufWriter<std::fs::File>>>,
}

impl DirectorySink {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>, format: OutputImageFormat) -> PipelineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::Save {
            path: dir.clone(),
            message: format!("Failed to create output directory: {}", e),
        })?;
        Ok(Self {
            dir,
            format,
            manifest: None,
        })
    }

    /// Also write one [`AugmentedRecord`] per saved image to `manifest.jsonl`.
    pub fn with_manifest(mut self) -> PipelineResult<Self> {
        let path = self.dir.join(MANIFEST_FILE);
        let writer = OutputWriter::create(&path).map_err(|e| PipelineError::Save {
            path,
            message: e.to_string(),
        })?;
        self.manifest = Some(writer);
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_error(&self, e: std::io::Error) -> PipelineError {
        PipelineError::Save {
            path: self.dir.join(MANIFEST_FILE),
            message: e.to_string(),
        }
    }
}

impl ImageSink for DirectorySink {
    fn save(&mut self, image: &Image) -> PipelineResult<PathBuf> {
        let output = ImageCodec::save(image, &self.dir, self.format)?;
        if let Some(manifest) = self.manifest.as_mut() {
            let record = AugmentedRecord {
                id: image.id(),
                source: image.source().map(Path::to_path_buf),
                output: output.clone(),
                width: image.width(),
                height: image.height(),
                history: image.history().to_vec(),
            };
            if let Err(e) = manifest.write(&record) {
                return Err(self.manifest_error(e));
            }
        }
        Ok(output)
    }

    fn finish(&mut self) -> PipelineResult<()> {
        if let Some(manifest) = self.manifest.as_mut() {
            if let Err(e) = manifest.flush() {
                return Err(self.manifest_error(e));
            }
            tracing::debug!("Manifest: {} records", manifest.items_written());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::IdCounter;
    use image::DynamicImage;

    #[test]
    fn test_directory_sink_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let mut sink = DirectorySink::new(&out, OutputImageFormat::Png).unwrap();
        assert!(out.is_dir());

        let ids = IdCounter::new(4);
        let image = Image::with_counter(DynamicImage::new_rgb8(3, 3), "cat.jpg", &ids);
        let path = sink.save(&image).unwrap();
        sink.finish().unwrap();

        assert_eq!(path, out.join("cat_4.png"));
        assert!(path.is_file());
        assert!(!out.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_manifest_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path(), OutputImageFormat::Bmp)
            .unwrap()
            .with_manifest()
            .unwrap();

        let ids = IdCounter::new(0);
        for name in ["a.png", "b.png"] {
            let mut image = Image::with_counter(DynamicImage::new_rgb8(2, 2), name, &ids);
            image.log_operation("Sharpen");
            sink.save(&image).unwrap();
        }
        sink.finish().unwrap();

        let content = std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let records: Vec<AugmentedRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 1);
        assert_eq!(records[1].history, vec!["Sharpen".to_string()]);
        assert!(records[0].output.ends_with("a_0.bmp"));
    }
}
