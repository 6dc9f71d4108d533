//! Image decoding and encoding.
//!
//! Decoding sniffs the format from file content and only falls back to the
//! extension when the header is not recognised. Encoding uses one fixed
//! quality setting per output format.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::image::Image;

/// JPEG quality for augmented output.
pub const JPEG_QUALITY: u8 = 95;

/// Formats augmented images can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputImageFormat {
    Png,
    Jpeg,
    WebP,
    Bmp,
    Tiff,
}

impl OutputImageFormat {
    /// Parse format from string (case-insensitive, leading dot allowed).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }
}

/// Stateless image load/save helpers.
pub struct ImageCodec;

impl ImageCodec {
    /// Decode the image at `path`.
    pub fn load(path: &Path) -> PipelineResult<DynamicImage> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;
        Self::decode_bytes(bytes, path)
    }

    /// Decode an in-memory buffer; `path` is used for format fallback and errors.
    pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> PipelineResult<DynamicImage> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        if reader.format().is_none() {
            let format =
                ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    format: path
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                })?;
            reader.set_format(format);
        }
        reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write `image` into `dir` as `<output_stem>.<ext>` and return the path.
    ///
    /// The directory is created if missing.
    pub fn save(image: &Image, dir: &Path, format: OutputImageFormat) -> PipelineResult<PathBuf> {
        let path = dir.join(format!("{}.{}", image.output_stem(), format.extension()));
        let save_err = |message: String| PipelineError::Save {
            path: path.clone(),
            message,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(save_err("image has no pixels".to_string()));
        }
        std::fs::create_dir_all(dir).map_err(|e| save_err(format!("Cannot create directory: {}", e)))?;

        let file = File::create(&path).map_err(|e| save_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        Self::encode(image.data(), &mut writer, format).map_err(save_err)?;
        writer.flush().map_err(|e| save_err(e.to_string()))?;
        Ok(path)
    }

    /// Encode with the fixed per-format parameters.
    fn encode<W: Write>(
        data: &DynamicImage,
        writer: &mut W,
        format: OutputImageFormat,
    ) -> Result<(), String> {
        let result = match format {
            OutputImageFormat::Jpeg => {
                // Baseline JPEG: 8-bit gray or RGB, no alpha
                let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
                match data.color() {
                    ColorType::L8 | ColorType::Rgb8 => data.write_with_encoder(encoder),
                    _ => DynamicImage::ImageRgb8(data.to_rgb8()).write_with_encoder(encoder),
                }
            }
            OutputImageFormat::Png => {
                let encoder =
                    PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
                data.write_with_encoder(encoder)
            }
            OutputImageFormat::WebP => {
                // The lossless WebP encoder accepts 8-bit RGB(A) only
                let rgba = DynamicImage::ImageRgba8(data.to_rgba8());
                rgba.write_with_encoder(WebPEncoder::new_lossless(writer))
            }
            OutputImageFormat::Bmp => {
                let mut buffer = Cursor::new(Vec::new());
                data.write_to(&mut buffer, ImageFormat::Bmp)
                    .and_then(|_| writer.write_all(buffer.get_ref()).map_err(image::ImageError::IoError))
            }
            OutputImageFormat::Tiff => {
                let mut buffer = Cursor::new(Vec::new());
                data.write_to(&mut buffer, ImageFormat::Tiff)
                    .and_then(|_| writer.write_all(buffer.get_ref()).map_err(image::ImageError::IoError))
            }
        };
        result.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::IdCounter;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputImageFormat::parse("png"), Some(OutputImageFormat::Png));
        assert_eq!(OutputImageFormat::parse(".JPG"), Some(OutputImageFormat::Jpeg));
        assert_eq!(OutputImageFormat::parse("jpeg"), Some(OutputImageFormat::Jpeg));
        assert_eq!(OutputImageFormat::parse("TIF"), Some(OutputImageFormat::Tiff));
        assert_eq!(OutputImageFormat::parse("gif"), None);
        assert_eq!(OutputImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImageCodec::load(Path::new("/no/such/image.png")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(ImageCodec::load(&path).is_err());
    }

    #[test]
    fn test_format_detected_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let misnamed = dir.path().join("actually_png.jpg");
        DynamicImage::new_rgb8(4, 3).save_with_format(&misnamed, ImageFormat::Png).unwrap();

        let decoded = ImageCodec::load(&misnamed).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_save_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let ids = IdCounter::new(1);
        let image = Image::with_counter(DynamicImage::new_rgba8(8, 6), "photo.png", &ids);

        for format in [
            OutputImageFormat::Png,
            OutputImageFormat::Jpeg,
            OutputImageFormat::WebP,
            OutputImageFormat::Bmp,
            OutputImageFormat::Tiff,
        ] {
            let path = ImageCodec::save(&image, dir.path(), format).unwrap();
            assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("photo_1.{}", format.extension()));
            let reloaded = ImageCodec::load(&path).unwrap();
            assert_eq!((reloaded.width(), reloaded.height()), (8, 6));
        }
    }

    #[test]
    fn test_save_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let image = Image::new(DynamicImage::new_rgb8(2, 2), "n.png");
        let path = ImageCodec::save(&image, &nested, OutputImageFormat::Png).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_rejects_empty_raster() {
        let dir = tempfile::tempdir().unwrap();
        let image = Image::new(DynamicImage::new_rgb8(0, 0), "empty.png");
        let err = ImageCodec::save(&image, dir.path(), OutputImageFormat::Png).unwrap_err();
        assert!(matches!(err, PipelineError::Save { .. }));
    }
}
