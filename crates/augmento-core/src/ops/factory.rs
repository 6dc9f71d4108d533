//! Builds [`Operation`]s from a name, a parameter list and a probability.
//!
//! Two sources of randomness are kept apart here. Parameter *ranges* chosen
//! by [`OperationFactory::create_default`] come from the factory's own RNG at
//! configuration time. Values drawn from those ranges come from the
//! pipeline's seeded stream at apply time.

use rand::Rng;

use super::kernels::RotateMode;
use super::operation::{CropRegion, Operation, ResizeRange};
use crate::config::OperationSpec;
use crate::error::OperationError;
use crate::pipeline::OperationEntry;

/// Every canonical operation name, in display order.
pub const OPERATION_NAMES: &[&str] = &[
    "rotate",
    "reflect",
    "resize",
    "crop",
    "affine transform",
    "color jitter",
    "histogram equalization",
    "white balance",
    "to grayscale",
    "adjust brightness",
    "adjust contrast",
    "adjust saturation",
    "adjust hue",
    "inject noise",
    "blur",
    "sharpen",
    "random erase",
];

/// Largest accepted resize scale factor.
pub const MAX_RESIZE_SCALE: f64 = 8.0;

/// Largest accepted side, in pixels, for an absolute resize or a scaled result.
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest accepted blur kernel width.
pub const MAX_BLUR_KERNEL: u32 = 101;

/// Stateless constructor for pipeline entries.
pub struct OperationFactory;

impl OperationFactory {
    /// Build an entry from explicit parameters.
    ///
    /// Arity is checked by exact count; see [`OperationFactory::arity`].
    /// Affine transform, color jitter, inject noise, blur and random erase
    /// also accept an empty list and fall back to generated defaults.
    pub fn create(name: &str, params: &[f64], probability: f64) -> Result<OperationEntry, OperationError> {
        let kind = canonical_name(name)?;
        let operation = build(kind, params, &mut rand::thread_rng())?;
        Ok(OperationEntry::new(operation, probability))
    }

    /// Build an entry with parameters generated from fixed per-kind ranges.
    pub fn create_default(name: &str, probability: f64) -> Result<OperationEntry, OperationError> {
        Self::create_default_with_rng(name, probability, &mut rand::thread_rng())
    }

    /// [`OperationFactory::create_default`] with an explicit RNG.
    pub fn create_default_with_rng<R: Rng + ?Sized>(
        name: &str,
        probability: f64,
        rng: &mut R,
    ) -> Result<OperationEntry, OperationError> {
        let kind = canonical_name(name)?;
        let operation = default_operation(kind, rng)?;
        Ok(OperationEntry::new(operation, probability))
    }

    /// Build from a config entry: empty params ask for defaults.
    pub fn from_spec(spec: &OperationSpec) -> Result<OperationEntry, OperationError> {
        if spec.params.is_empty() {
            Self::create_default(&spec.name, spec.probability)
        } else {
            Self::create(&spec.name, &spec.params, spec.probability)
        }
    }

    /// Accepted parameter counts for an operation, for help and error text.
    pub fn arity(name: &str) -> Result<&'static str, OperationError> {
        canonical_name(name).map(arity_hint)
    }
}

/// Resolve a user-facing name to its canonical form.
///
/// Case is ignored and runs of spaces, hyphens and underscores compare equal.
pub fn canonical_name(name: &str) -> Result<&'static str, OperationError> {
    let key = name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    let kind = match key.as_str() {
        "rotate" | "rotation" => "rotate",
        "reflect" | "flip" | "mirror" => "reflect",
        "resize" | "scale" => "resize",
        "crop" => "crop",
        "affine" | "affine transform" => "affine transform",
        "color jitter" | "colour jitter" | "jitter" => "color jitter",
        "histogram equalization" | "equalize histogram" | "equalize" => "histogram equalization",
        "white balance" => "white balance",
        "to grayscale" | "grayscale" | "to greyscale" | "greyscale" => "to grayscale",
        "adjust brightness" | "brightness" => "adjust brightness",
        "adjust contrast" | "contrast" => "adjust contrast",
        "adjust saturation" | "saturation" => "adjust saturation",
        "adjust hue" | "hue" => "adjust hue",
        "inject noise" | "noise" | "gaussian noise" => "inject noise",
        "blur" | "blur image" | "box blur" => "blur",
        "sharpen" | "sharpen image" => "sharpen",
        "random erase" | "erase" => "random erase",
        _ => return Err(OperationError::UnknownOperation(name.to_string())),
    };
    Ok(kind)
}

fn arity_hint(kind: &str) -> &'static str {
    match kind {
        "rotate" => "3",
        "resize" | "crop" => "2 or 4",
        "affine transform" => "0 or 6",
        "color jitter" | "inject noise" | "random erase" => "0 or 4",
        "adjust brightness" | "adjust contrast" | "adjust saturation" | "adjust hue" => "2",
        "blur" => "0 or 2",
        _ => "0",
    }
}

fn build<R: Rng + ?Sized>(kind: &'static str, params: &[f64], rng: &mut R) -> Result<Operation, OperationError> {
    if let Some(bad) = params.iter().find(|p| !p.is_finite()) {
        return Err(OperationError::invalid(kind, format!("parameter {bad} is not finite")));
    }

    let operation = match (kind, params) {
        ("rotate", &[min_angle, max_angle, mode]) => {
            ordered(kind, "angle", min_angle, max_angle)?;
            let code = whole(kind, "mode", mode)?;
            let mode = u32::try_from(code)
                .ok()
                .and_then(RotateMode::from_code)
                .ok_or_else(|| OperationError::invalid(kind, format!("mode must be 0, 1 or 2, got {code}")))?;
            Operation::Rotate {
                min_angle,
                max_angle,
                mode,
            }
        }
        ("resize", &[min, max]) => {
            if min <= 0.0 {
                return Err(OperationError::invalid(kind, "scale must be > 0"));
            }
            if max > MAX_RESIZE_SCALE {
                return Err(OperationError::invalid(
                    kind,
                    format!("scale must be <= {MAX_RESIZE_SCALE}, got {max}"),
                ));
            }
            ordered(kind, "scale", min, max)?;
            Operation::Resize(ResizeRange::Scale { min, max })
        }
        ("resize", &[min_w, max_w, min_h, max_h]) => {
            let (min_width, max_width) = dimension_range(kind, "width", min_w, max_w, 1)?;
            let (min_height, max_height) = dimension_range(kind, "height", min_h, max_h, 1)?;
            at_most(kind, "width", max_width, MAX_DIMENSION)?;
            at_most(kind, "height", max_height, MAX_DIMENSION)?;
            Operation::Resize(ResizeRange::Absolute {
                min_width,
                max_width,
                min_height,
                max_height,
            })
        }
        ("crop", &[width, height]) => Operation::Crop(CropRegion::Random {
            width: dimension(kind, "width", width, 1)?,
            height: dimension(kind, "height", height, 1)?,
        }),
        ("crop", &[x, y, width, height]) => Operation::Crop(CropRegion::Fixed {
            x: dimension(kind, "x", x, 0)?,
            y: dimension(kind, "y", y, 0)?,
            width: dimension(kind, "width", width, 1)?,
            height: dimension(kind, "height", height, 1)?,
        }),
        ("affine transform", &[]) => default_affine(rng),
        ("affine transform", &[a, b, c, d, e, f]) => {
            if (a * e - b * d).abs() < 1e-9 {
                return Err(OperationError::invalid(kind, "matrix is not invertible"));
            }
            Operation::AffineTransform {
                matrix: [a, b, c, d, e, f],
            }
        }
        ("color jitter", &[]) => default_operation(kind, rng)?,
        ("color jitter", &[brightness, contrast, saturation, hue]) => {
            for (label, value) in [
                ("brightness", brightness),
                ("contrast", contrast),
                ("saturation", saturation),
                ("hue", hue),
            ] {
                if value < 0.0 {
                    return Err(OperationError::invalid(kind, format!("{label} range must be >= 0")));
                }
            }
            let hue = whole(kind, "hue", hue)?;
            Operation::ColorJitter {
                brightness,
                contrast,
                saturation,
                hue: to_i32(kind, "hue", hue)?,
            }
        }
        ("histogram equalization", &[]) => Operation::HistogramEqualization,
        ("white balance", &[]) => Operation::WhiteBalance,
        ("to grayscale", &[]) => Operation::ToGrayscale,
        ("reflect", &[]) => Operation::Reflect,
        ("sharpen", &[]) => Operation::Sharpen,
        ("adjust brightness", &[min, max]) => {
            ordered(kind, "offset", min, max)?;
            Operation::AdjustBrightness { min, max }
        }
        ("adjust contrast", &[min, max]) => {
            factor_range(kind, min, max)?;
            Operation::AdjustContrast { min, max }
        }
        ("adjust saturation", &[min, max]) => {
            factor_range(kind, min, max)?;
            Operation::AdjustSaturation { min, max }
        }
        ("adjust hue", &[min, max]) => {
            ordered(kind, "degrees", min, max)?;
            Operation::AdjustHue {
                min: to_i32(kind, "min", whole(kind, "min", min)?)?,
                max: to_i32(kind, "max", whole(kind, "max", max)?)?,
            }
        }
        ("inject noise", &[]) => default_operation(kind, rng)?,
        ("inject noise", &[mean_min, mean_max, stdev_min, stdev_max]) => {
            ordered(kind, "mean", mean_min, mean_max)?;
            ordered(kind, "stdev", stdev_min, stdev_max)?;
            if stdev_min < 0.0 {
                return Err(OperationError::invalid(kind, "stdev must be >= 0"));
            }
            Operation::InjectNoise {
                mean_min,
                mean_max,
                stdev_min,
                stdev_max,
            }
        }
        ("blur", &[]) => default_operation(kind, rng)?,
        ("blur", &[min, max]) => {
            let (min_kernel, max_kernel) = dimension_range(kind, "kernel", min, max, 1)?;
            at_most(kind, "kernel", max_kernel, MAX_BLUR_KERNEL)?;
            Operation::Blur {
                min_kernel,
                max_kernel,
            }
        }
        ("random erase", &[]) => default_operation(kind, rng)?,
        ("random erase", &[min_h, max_h, min_w, max_w]) => {
            let (min_height, max_height) = dimension_range(kind, "height", min_h, max_h, 0)?;
            let (min_width, max_width) = dimension_range(kind, "width", min_w, max_w, 0)?;
            Operation::RandomErase {
                min_height,
                max_height,
                min_width,
                max_width,
            }
        }
        (kind, params) => {
            return Err(OperationError::invalid(
                kind,
                format!("expected {} parameter(s), got {}", arity_hint(kind), params.len()),
            ))
        }
    };
    Ok(operation)
}

fn default_operation<R: Rng + ?Sized>(kind: &'static str, rng: &mut R) -> Result<Operation, OperationError> {
    let operation = match kind {
        "rotate" => {
            let span = rng.gen_range(5.0..=30.0);
            let mode = RotateMode::from_code(rng.gen_range(0..3)).unwrap_or(RotateMode::Clip);
            Operation::Rotate {
                min_angle: -span,
                max_angle: span,
                mode,
            }
        }
        "reflect" => Operation::Reflect,
        "resize" => Operation::Resize(ResizeRange::Scale {
            min: rng.gen_range(0.5..=1.0),
            max: rng.gen_range(1.0..=1.5),
        }),
        "crop" => {
            return Err(OperationError::invalid(
                kind,
                "requires explicit dimensions (width, height or x, y, width, height)",
            ))
        }
        "affine transform" => default_affine(rng),
        "color jitter" => Operation::ColorJitter {
            brightness: rng.gen_range(0.0..=32.0),
            contrast: rng.gen_range(0.0..=0.3),
            saturation: rng.gen_range(0.0..=0.3),
            hue: rng.gen_range(0..=18),
        },
        "histogram equalization" => Operation::HistogramEqualization,
        "white balance" => Operation::WhiteBalance,
        "to grayscale" => Operation::ToGrayscale,
        "adjust brightness" => {
            let span = rng.gen_range(10.0..=40.0);
            Operation::AdjustBrightness { min: -span, max: span }
        }
        "adjust contrast" => Operation::AdjustContrast {
            min: rng.gen_range(0.7..=1.0),
            max: rng.gen_range(1.0..=1.3),
        },
        "adjust saturation" => Operation::AdjustSaturation {
            min: rng.gen_range(0.7..=1.0),
            max: rng.gen_range(1.0..=1.3),
        },
        "adjust hue" => {
            let span = rng.gen_range(5..=30);
            Operation::AdjustHue { min: -span, max: span }
        }
        "inject noise" => {
            let mean = rng.gen_range(0.0..=10.0);
            Operation::InjectNoise {
                mean_min: -mean,
                mean_max: mean,
                stdev_min: 0.0,
                stdev_max: rng.gen_range(5.0..=20.0),
            }
        }
        "blur" => Operation::Blur {
            min_kernel: 3,
            max_kernel: [3, 5, 7, 9][rng.gen_range(0..4)],
        },
        "sharpen" => Operation::Sharpen,
        "random erase" => Operation::RandomErase {
            min_height: 1,
            max_height: rng.gen_range(8..=32),
            min_width: 1,
            max_width: rng.gen_range(8..=32),
        },
        other => return Err(OperationError::UnknownOperation(other.to_string())),
    };
    Ok(operation)
}

/// Near-identity matrix: small scale, shear and translation.
fn default_affine<R: Rng + ?Sized>(rng: &mut R) -> Operation {
    Operation::AffineTransform {
        matrix: [
            1.0 + rng.gen_range(-0.1..=0.1),
            rng.gen_range(-0.15..=0.15),
            rng.gen_range(-10.0..=10.0),
            rng.gen_range(-0.15..=0.15),
            1.0 + rng.gen_range(-0.1..=0.1),
            rng.gen_range(-10.0..=10.0),
        ],
    }
}

fn ordered(kind: &str, label: &str, min: f64, max: f64) -> Result<(), OperationError> {
    if min > max {
        return Err(OperationError::invalid(
            kind,
            format!("{label} min ({min}) must not exceed max ({max})"),
        ));
    }
    Ok(())
}

fn factor_range(kind: &str, min: f64, max: f64) -> Result<(), OperationError> {
    if min < 0.0 {
        return Err(OperationError::invalid(kind, "factor must be >= 0"));
    }
    ordered(kind, "factor", min, max)
}

fn whole(kind: &str, label: &str, value: f64) -> Result<i64, OperationError> {
    if value.fract() != 0.0 {
        return Err(OperationError::invalid(
            kind,
            format!("{label} must be a whole number, got {value}"),
        ));
    }
    Ok(value as i64)
}

fn to_i32(kind: &str, label: &str, value: i64) -> Result<i32, OperationError> {
    i32::try_from(value).map_err(|_| OperationError::invalid(kind, format!("{label} is out of range")))
}

fn dimension(kind: &str, label: &str, value: f64, at_least: u32) -> Result<u32, OperationError> {
    let value = whole(kind, label, value)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v >= at_least)
        .ok_or_else(|| OperationError::invalid(kind, format!("{label} must be >= {at_least}, got {value}")))
}

fn at_most(kind: &str, label: &str, value: u32, limit: u32) -> Result<(), OperationError> {
    if value > limit {
        return Err(OperationError::invalid(kind, format!("{label} must be <= {limit}, got {value}")));
    }
    Ok(())
}

fn dimension_range(kind: &str, label: &str, min: f64, max: f64, at_least: u32) -> Result<(u32, u32), OperationError> {
    ordered(kind, label, min, max)?;
    Ok((dimension(kind, label, min, at_least)?, dimension(kind, label, max, at_least)?))
}
