//! The closed set of augmentation operations.
//!
//! An [`Operation`] holds parameter *ranges* fixed when the pipeline is built.
//! Concrete values are drawn at apply time from the RNG the caller passes in,
//! so one operation value can be shared by every worker thread while each
//! application stays reproducible from its seed.

use std::fmt;

use rand::Rng;

use super::factory::MAX_DIMENSION;
use super::kernels::{self, RotateMode};
use crate::error::{PipelineError, PipelineResult};
use crate::image::Image;

/// Target size for [`Operation::Resize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeRange {
    /// Uniform scale factor drawn from `[min, max]`
    Scale { min: f64, max: f64 },
    /// Width and height drawn independently from their ranges
    Absolute {
        min_width: u32,
        max_width: u32,
        min_height: u32,
        max_height: u32,
    },
}

/// Region for [`Operation::Crop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropRegion {
    /// Fixed size at a position drawn uniformly over the valid range
    Random { width: u32, height: u32 },
    /// Fixed rectangle
    Fixed { x: u32, y: u32, width: u32, height: u32 },
}

/// A single augmentation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Rotate {
        min_angle: f64,
        max_angle: f64,
        mode: RotateMode,
    },
    Reflect,
    Resize(ResizeRange),
    Crop(CropRegion),
    /// Forward 2×3 matrix `[a, b, c, d, e, f]` mapping `(x, y)` to
    /// `(a·x + b·y + c, d·x + e·y + f)`.
    AffineTransform { matrix: [f64; 6] },
    /// Symmetric jitter ranges: brightness offset in pixel units, contrast and
    /// saturation as factor deviations from 1, hue in degrees.
    ColorJitter {
        brightness: f64,
        contrast: f64,
        saturation: f64,
        hue: i32,
    },
    HistogramEqualization,
    WhiteBalance,
    ToGrayscale,
    AdjustBrightness { min: f64, max: f64 },
    AdjustContrast { min: f64, max: f64 },
    AdjustSaturation { min: f64, max: f64 },
    AdjustHue { min: i32, max: i32 },
    InjectNoise {
        mean_min: f64,
        mean_max: f64,
        stdev_min: f64,
        stdev_max: f64,
    },
    /// Box blur with an odd kernel size drawn from `[min_kernel, max_kernel]`
    Blur { min_kernel: u32, max_kernel: u32 },
    Sharpen,
    RandomErase {
        min_height: u32,
        max_height: u32,
        min_width: u32,
        max_width: u32,
    },
}

impl Operation {
    /// Canonical operation name, as accepted by the factory.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rotate { .. } => "rotate",
            Self::Reflect => "reflect",
            Self::Resize(_) => "resize",
            Self::Crop(_) => "crop",
            Self::AffineTransform { .. } => "affine transform",
            Self::ColorJitter { .. } => "color jitter",
            Self::HistogramEqualization => "histogram equalization",
            Self::WhiteBalance => "white balance",
            Self::ToGrayscale => "to grayscale",
            Self::AdjustBrightness { .. } => "adjust brightness",
            Self::AdjustContrast { .. } => "adjust contrast",
            Self::AdjustSaturation { .. } => "adjust saturation",
            Self::AdjustHue { .. } => "adjust hue",
            Self::InjectNoise { .. } => "inject noise",
            Self::Blur { .. } => "blur",
            Self::Sharpen => "sharpen",
            Self::RandomErase { .. } => "random erase",
        }
    }

    /// One-line description of what the operation does.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Rotate { .. } => "Rotates the image by a random angle",
            Self::Reflect => "Flips the image horizontally or vertically",
            Self::Resize(_) => "Resizes the image by a random scale or to random dimensions",
            Self::Crop(_) => "Crops a rectangular region",
            Self::AffineTransform { .. } => "Warps the image with an affine matrix",
            Self::ColorJitter { .. } => "Randomly shifts brightness, contrast, saturation and hue",
            Self::HistogramEqualization => "Equalizes the luminance histogram",
            Self::WhiteBalance => "Balances colour channels with the gray-world assumption",
            Self::ToGrayscale => "Converts the image to grayscale",
            Self::AdjustBrightness { .. } => "Adds a random brightness offset",
            Self::AdjustContrast { .. } => "Scales pixel values by a random contrast factor",
            Self::AdjustSaturation { .. } => "Scales saturation by a random factor",
            Self::AdjustHue { .. } => "Shifts hue by a random number of degrees",
            Self::InjectNoise { .. } => "Adds Gaussian noise",
            Self::Blur { .. } => "Applies a box blur with a random odd kernel",
            Self::Sharpen => "Sharpens edges with a 3x3 kernel",
            Self::RandomErase { .. } => "Zeroes a randomly placed rectangle",
        }
    }

    /// Draw parameters from `rng`, transform `image` in place and append a
    /// history entry.
    ///
    /// Fails without touching the image when the drawn parameters do not fit
    /// it (crop or erase larger than the image, singular matrix, empty raster).
    pub fn apply<R: Rng + ?Sized>(&self, image: &mut Image, rng: &mut R) -> PipelineResult<()> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(self.fail(image, "image has no pixels"));
        }

        let entry = match *self {
            Self::Rotate {
                min_angle,
                max_angle,
                mode,
            } => {
                let angle = uniform(rng, min_angle, max_angle);
                kernels::rotate(image.data_mut(), angle, mode);
                format!("Rotate: {angle:.2} deg ({})", mode.label())
            }
            Self::Reflect => {
                if rng.gen::<bool>() {
                    kernels::reflect_horizontal(image.data_mut());
                    "Reflect: horizontal".to_string()
                } else {
                    kernels::reflect_vertical(image.data_mut());
                    "Reflect: vertical".to_string()
                }
            }
            Self::Resize(ResizeRange::Scale { min, max }) => {
                let scale = uniform(rng, min, max);
                let (w, h) = kernels::scaled_size(width, height, scale);
                if w > MAX_DIMENSION || h > MAX_DIMENSION {
                    return Err(self.fail(
                        image,
                        format!("resize x{scale:.3} gives {w}x{h}, above the {MAX_DIMENSION}px limit"),
                    ));
                }
                kernels::resize(image.data_mut(), w, h);
                format!("Resize: x{scale:.3} -> {w}x{h}")
            }
            Self::Resize(ResizeRange::Absolute {
                min_width,
                max_width,
                min_height,
                max_height,
            }) => {
                let w = uniform_u32(rng, min_width, max_width);
                let h = uniform_u32(rng, min_height, max_height);
                kernels::resize(image.data_mut(), w, h);
                format!("Resize: {w}x{h}")
            }
            Self::Crop(CropRegion::Random {
                width: cw,
                height: ch,
            }) => {
                if cw > width || ch > height {
                    return Err(self.fail(
                        image,
                        format!("crop {cw}x{ch} exceeds image {width}x{height}"),
                    ));
                }
                let x = uniform_u32(rng, 0, width - cw);
                let y = uniform_u32(rng, 0, height - ch);
                kernels::crop(image.data_mut(), x, y, cw, ch);
                format!("Crop: {cw}x{ch} at ({x}, {y})")
            }
            Self::Crop(CropRegion::Fixed {
                x,
                y,
                width: cw,
                height: ch,
            }) => {
                let fits = x.checked_add(cw).is_some_and(|r| r <= width)
                    && y.checked_add(ch).is_some_and(|b| b <= height);
                if !fits {
                    return Err(self.fail(
                        image,
                        format!("crop {cw}x{ch} at ({x}, {y}) exceeds image {width}x{height}"),
                    ));
                }
                kernels::crop(image.data_mut(), x, y, cw, ch);
                format!("Crop: {cw}x{ch} at ({x}, {y})")
            }
            Self::AffineTransform { ref matrix } => {
                if !kernels::affine(image.data_mut(), matrix) {
                    return Err(self.fail(image, "matrix is not invertible"));
                }
                format!("AffineTransform: {matrix:?}")
            }
            Self::ColorJitter {
                brightness,
                contrast,
                saturation,
                hue,
            } => {
                let offset = uniform(rng, -brightness, brightness);
                let c = uniform(rng, 1.0 - contrast, 1.0 + contrast).max(0.0);
                let s = uniform(rng, 1.0 - saturation, 1.0 + saturation).max(0.0);
                let h = uniform_i32(rng, -hue, hue);
                kernels::color_jitter(image.data_mut(), offset, c, s, h);
                format!("ColorJitter: brightness {offset:+.1}, contrast x{c:.3}, saturation x{s:.3}, hue {h:+}")
            }
            Self::HistogramEqualization => {
                kernels::equalize_histogram(image.data_mut());
                "HistogramEqualization".to_string()
            }
            Self::WhiteBalance => {
                kernels::white_balance(image.data_mut());
                "WhiteBalance: gray world".to_string()
            }
            Self::ToGrayscale => {
                kernels::to_grayscale(image.data_mut());
                "ToGrayscale".to_string()
            }
            Self::AdjustBrightness { min, max } => {
                let offset = uniform(rng, min, max);
                kernels::adjust_brightness(image.data_mut(), offset);
                format!("AdjustBrightness: {offset:+.1}")
            }
            Self::AdjustContrast { min, max } => {
                let factor = uniform(rng, min, max);
                kernels::adjust_contrast(image.data_mut(), factor);
                format!("AdjustContrast: x{factor:.3}")
            }
            Self::AdjustSaturation { min, max } => {
                let factor = uniform(rng, min, max);
                kernels::adjust_saturation(image.data_mut(), factor);
                format!("AdjustSaturation: x{factor:.3}")
            }
            Self::AdjustHue { min, max } => {
                let degrees = uniform_i32(rng, min, max);
                kernels::adjust_hue(image.data_mut(), degrees);
                format!("AdjustHue: {degrees:+} deg")
            }
            Self::InjectNoise {
                mean_min,
                mean_max,
                stdev_min,
                stdev_max,
            } => {
                let mean = uniform(rng, mean_min, mean_max);
                let stdev = uniform(rng, stdev_min, stdev_max);
                if !kernels::inject_noise(image.data_mut(), mean, stdev, rng) {
                    return Err(self.fail(image, format!("invalid noise stdev {stdev}")));
                }
                format!("InjectNoise: mean {mean:.2}, stdev {stdev:.2}")
            }
            Self::Blur {
                min_kernel,
                max_kernel,
            } => {
                let drawn = uniform_u32(rng, min_kernel, max_kernel);
                let kernel = if drawn % 2 == 0 { drawn + 1 } else { drawn };
                kernels::blur(image.data_mut(), kernel);
                format!("Blur: kernel {kernel}")
            }
            Self::Sharpen => {
                kernels::sharpen(image.data_mut());
                "Sharpen".to_string()
            }
            Self::RandomErase {
                min_height,
                max_height,
                min_width,
                max_width,
            } => {
                let eh = uniform_u32(rng, min_height, max_height);
                let ew = uniform_u32(rng, min_width, max_width);
                if eh > height || ew > width {
                    return Err(self.fail(
                        image,
                        format!("erase {ew}x{eh} exceeds image {width}x{height}"),
                    ));
                }
                let x = uniform_u32(rng, 0, width - ew);
                let y = uniform_u32(rng, 0, height - eh);
                kernels::erase(image.data_mut(), x, y, ew, eh);
                format!("RandomErase: {ew}x{eh} at ({x}, {y})")
            }
        };

        image.log_operation(entry);
        Ok(())
    }

    fn fail(&self, image: &Image, message: impl Into<String>) -> PipelineError {
        PipelineError::Operation {
            operation: self.kind(),
            image: image.name().to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rotate {
                min_angle,
                max_angle,
                mode,
            } => write!(f, "rotate [{min_angle}, {max_angle}] deg, {}", mode.label()),
            Self::Resize(ResizeRange::Scale { min, max }) => write!(f, "resize x[{min}, {max}]"),
            Self::Resize(ResizeRange::Absolute {
                min_width,
                max_width,
                min_height,
                max_height,
            }) => write!(
                f,
                "resize to [{min_width}, {max_width}]x[{min_height}, {max_height}]"
            ),
            Self::Crop(CropRegion::Random { width, height }) => {
                write!(f, "crop {width}x{height} at random position")
            }
            Self::Crop(CropRegion::Fixed {
                x,
                y,
                width,
                height,
            }) => write!(f, "crop {width}x{height} at ({x}, {y})"),
            Self::AffineTransform { matrix } => write!(f, "affine transform {matrix:?}"),
            Self::ColorJitter {
                brightness,
                contrast,
                saturation,
                hue,
            } => write!(
                f,
                "color jitter brightness ±{brightness}, contrast ±{contrast}, saturation ±{saturation}, hue ±{hue}"
            ),
            Self::AdjustBrightness { min, max }
            | Self::AdjustContrast { min, max }
            | Self::AdjustSaturation { min, max } => write!(f, "{} [{min}, {max}]", self.kind()),
            Self::AdjustHue { min, max } => write!(f, "adjust hue [{min}, {max}] deg"),
            Self::InjectNoise {
                mean_min,
                mean_max,
                stdev_min,
                stdev_max,
            } => write!(
                f,
                "inject noise mean [{mean_min}, {mean_max}], stdev [{stdev_min}, {stdev_max}]"
            ),
            Self::Blur {
                min_kernel,
                max_kernel,
            } => write!(f, "blur kernel [{min_kernel}, {max_kernel}]"),
            Self::RandomErase {
                min_height,
                max_height,
                min_width,
                max_width,
            } => write!(
                f,
                "random erase [{min_width}, {max_width}]x[{min_height}, {max_height}]"
            ),
            Self::Reflect
            | Self::HistogramEqualization
            | Self::WhiteBalance
            | Self::ToGrayscale
            | Self::Sharpen => f.write_str(self.kind()),
        }
    }
}

/// Uniform draw from `[min, max]`; degenerate ranges yield `min` without
/// consuming randomness.
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

fn uniform_u32<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

fn uniform_i32<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    }
}
