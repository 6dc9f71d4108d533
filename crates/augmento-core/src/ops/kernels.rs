//! Pixel kernels behind the augmentation operations.
//!
//! Kernels take concrete values only. Drawing those values from a range is
//! the operation's job, so everything here is deterministic apart from
//! [`inject_noise`], which takes the caller's RNG explicitly.
//!
//! Every kernel hands back an image of the same [`ColorType`] it was given.
//! Sources deeper than 8 bits per channel are processed at 16 bits or in
//! floating point, never squeezed through an 8-bit buffer.

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, Rgba};
use imageproc::geometric_transformations::{
    rotate_about_center, warp, warp_into, Interpolation, Projection,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// How rotation treats the corners that leave the original frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateMode {
    /// Grow the canvas so nothing is cut off
    Expand,
    /// Crop to the largest axis-aligned rectangle without fill-in
    Crop,
    /// Keep the original frame; corners are clipped and filled
    Clip,
}

impl RotateMode {
    /// Map the numeric config code (0, 1, 2) to a mode.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Expand),
            1 => Some(Self::Crop),
            2 => Some(Self::Clip),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Expand => "no crop",
            Self::Crop => "crop",
            Self::Clip => "fill-in",
        }
    }
}

/// Run `$body` on an RGBA copy of `$image`, 16-bit when the source is deeper
/// than 8 bits and 8-bit otherwise, then convert back to the source colour type.
macro_rules! at_working_depth {
    ($image:expr, |$buffer:ident| $body:expr) => {{
        let color = $image.color();
        let processed = if is_deep(color) {
            let $buffer = $image.to_rgba16();
            DynamicImage::ImageRgba16($body)
        } else {
            let $buffer = $image.to_rgba8();
            DynamicImage::ImageRgba8($body)
        };
        *$image = restore(processed, color);
    }};
}

fn is_deep(color: ColorType) -> bool {
    color.bytes_per_pixel() > color.channel_count()
}

fn is_float(color: ColorType) -> bool {
    matches!(color, ColorType::Rgb32F | ColorType::Rgba32F)
}

/// Convert a working image back to `color`.
fn restore(image: DynamicImage, color: ColorType) -> DynamicImage {
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        ColorType::Rgb32F => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        ColorType::Rgba32F => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        _ => image,
    }
}

/// Apply `f` to the colour channels of a normalized float copy of `image`.
fn map_normalized(image: &mut DynamicImage, mut f: impl FnMut(&mut [f32])) {
    let color = image.color();
    let mut rgba = image.to_rgba32f();
    for p in rgba.pixels_mut() {
        f(&mut p.0[..3]);
        for c in &mut p.0[..3] {
            *c = c.clamp(0.0, 1.0);
        }
    }
    *image = restore(DynamicImage::ImageRgba32F(rgba), color);
}

// ── Geometric ───────────────────────────────────────────────────────────────

pub fn rotate(image: &mut DynamicImage, degrees: f64, mode: RotateMode) {
    let theta = (degrees as f32).to_radians();
    let (width, height) = image.dimensions();
    match mode {
        RotateMode::Clip => at_working_depth!(image, |buffer| {
            rotate_about_center(&buffer, theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]))
        }),
        RotateMode::Expand => {
            let (projection, out_w, out_h) = expand_projection(width, height, theta);
            at_working_depth!(image, |buffer| {
                let mut out = ImageBuffer::new(out_w, out_h);
                warp_into(&buffer, &projection, Interpolation::Bilinear, Rgba([0, 0, 0, 0]), &mut out);
                out
            })
        }
        RotateMode::Crop => {
            let (w, h) = largest_inscribed_rect(width, height, degrees);
            let (x, y) = ((width - w) / 2, (height - h) / 2);
            at_working_depth!(image, |buffer| {
                let rotated =
                    rotate_about_center(&buffer, theta, Interpolation::Bilinear, Rgba([0, 0, 0, 0]));
                image::imageops::crop_imm(&rotated, x, y, w, h).to_image()
            })
        }
    }
}

/// Projection that rotates about the centre into a canvas large enough for every corner.
fn expand_projection(width: u32, height: u32, theta: f32) -> (Projection, u32, u32) {
    let (w, h) = (width as f32, height as f32);
    let (sin, cos) = theta.sin_cos();
    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-w / 2.0, -h / 2.0);
    (projection, out_w, out_h)
}

/// Largest axis-aligned rectangle inside a `width`×`height` frame rotated by
/// `degrees`, clamped to the frame.
pub fn largest_inscribed_rect(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let rad = degrees.to_radians();
    let (sin_a, cos_a) = (rad.sin().abs(), rad.cos().abs());
    let width_longer = w >= h;
    let (long_side, short_side) = if width_longer { (w, h) } else { (h, w) };

    let (wr, hr) = if short_side <= 2.0 * sin_a * cos_a * long_side || (sin_a - cos_a).abs() < 1e-10 {
        let x = 0.5 * short_side;
        if width_longer {
            (x / sin_a, x / cos_a)
        } else {
            (x / cos_a, x / sin_a)
        }
    } else {
        let cos_2a = cos_a * cos_a - sin_a * sin_a;
        ((w * cos_a - h * sin_a) / cos_2a, (h * cos_a - w * sin_a) / cos_2a)
    };

    let fit = |v: f64, max: u32| -> u32 {
        if v.is_finite() {
            (v.floor() as u32).clamp(1, max.max(1))
        } else {
            max.max(1)
        }
    };
    (fit(wr, width), fit(hr, height))
}

pub fn reflect_horizontal(image: &mut DynamicImage) {
    *image = image.fliph();
}

pub fn reflect_vertical(image: &mut DynamicImage) {
    *image = image.flipv();
}

pub fn resize(image: &mut DynamicImage, width: u32, height: u32) {
    *image = image.resize_exact(width.max(1), height.max(1), FilterType::Triangle);
}

/// Size after a uniform scale; each side stays at least one pixel.
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let side = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (side(width), side(height))
}

/// Crop a region that the caller has already bounds-checked.
pub fn crop(image: &mut DynamicImage, x: u32, y: u32, width: u32, height: u32) {
    *image = image.crop_imm(x, y, width, height);
}

/// Warp with a 2×3 forward affine matrix `[a, b, c, d, e, f]`.
///
/// Returns `false` when the matrix is not invertible.
pub fn affine(image: &mut DynamicImage, matrix: &[f64; 6]) -> bool {
    let m: [f32; 9] = [
        matrix[0] as f32,
        matrix[1] as f32,
        matrix[2] as f32,
        matrix[3] as f32,
        matrix[4] as f32,
        matrix[5] as f32,
        0.0,
        0.0,
        1.0,
    ];
    let Some(projection) = Projection::from_matrix(m) else {
        return false;
    };
    at_working_depth!(image, |buffer| {
        warp(&buffer, &projection, Interpolation::Bilinear, Rgba([0, 0, 0, 0]))
    });
    true
}

// ── Colour & intensity ──────────────────────────────────────────────────────

/// Shift every colour channel by `offset`, in 8-bit units.
pub fn adjust_brightness(image: &mut DynamicImage, offset: f64) {
    let color = image.color();
    if is_float(color) {
        let shifted = DynamicImage::ImageRgba16(image.to_rgba16()).brighten((offset * 257.0).round() as i32);
        *image = restore(shifted, color);
    } else {
        let scale = if is_deep(color) { 257.0 } else { 1.0 };
        *image = image.brighten((offset * scale).round() as i32);
    }
}

/// Stretch channel values away from mid-gray by `factor` (1.0 is identity).
pub fn adjust_contrast(image: &mut DynamicImage, factor: f64) {
    // the library takes a percentage whose square is the stretch factor
    let percent = 100.0 * (factor.max(0.0).sqrt() - 1.0);
    *image = image.adjust_contrast(percent as f32);
}

/// Blend each pixel with its luma: 0.0 is grayscale, 1.0 is identity.
pub fn adjust_saturation(image: &mut DynamicImage, factor: f64) {
    let luma = image.to_luma32f();
    let factor = factor as f32;
    let mut gray = luma.pixels().map(|p| p.0[0]);
    map_normalized(image, |rgb| {
        let g = gray.next().unwrap_or_default();
        for c in rgb {
            *c = g + (*c - g) * factor;
        }
    });
}

pub fn adjust_hue(image: &mut DynamicImage, degrees: i32) {
    *image = image.huerotate(degrees);
}

/// Brightness shift, contrast stretch, saturation scale and hue shift, in that order.
pub fn color_jitter(image: &mut DynamicImage, offset: f64, contrast: f64, saturation: f64, hue: i32) {
    adjust_brightness(image, offset);
    adjust_contrast(image, contrast);
    adjust_saturation(image, saturation);
    adjust_hue(image, hue);
}

/// Equalize the luma histogram. Each pixel's channels move by the same amount
/// as its luma, so chroma is kept.
pub fn equalize_histogram(image: &mut DynamicImage) {
    let before = image.to_luma8();
    let after = imageproc::contrast::equalize_histogram(&before);
    let mut shifts = before
        .pixels()
        .zip(after.pixels())
        .map(|(b, a)| (a.0[0] as f32 - b.0[0] as f32) / 255.0);
    map_normalized(image, |rgb| {
        let shift = shifts.next().unwrap_or_default();
        for c in rgb {
            *c += shift;
        }
    });
}

/// Gray-world white balance: scale each channel so the channel means match.
pub fn white_balance(image: &mut DynamicImage) {
    let rgb = image.to_rgb32f();
    let count = (rgb.width() as f64 * rgb.height() as f64).max(1.0);
    let mut sums = [0f64; 3];
    for p in rgb.pixels() {
        for (sum, &c) in sums.iter_mut().zip(&p.0) {
            *sum += c as f64;
        }
    }
    let means = sums.map(|s| s / count);
    let gray = means.iter().sum::<f64>() / 3.0;
    let gains = means.map(|m| if m > 0.0 { (gray / m) as f32 } else { 1.0 });
    map_normalized(image, |rgb| {
        for (c, gain) in rgb.iter_mut().zip(gains) {
            *c *= gain;
        }
    });
}

pub fn to_grayscale(image: &mut DynamicImage) {
    *image = image.grayscale();
}

// ── Noise & filtering ───────────────────────────────────────────────────────

/// Add per-channel Gaussian noise drawn from `rng`, in 8-bit units.
///
/// Returns `false` when `stdev` is negative or not finite.
pub fn inject_noise<R: Rng + ?Sized>(image: &mut DynamicImage, mean: f64, stdev: f64, rng: &mut R) -> bool {
    let Ok(normal) = Normal::new(mean, stdev) else {
        return false;
    };
    map_normalized(image, |rgb| {
        for c in rgb {
            *c += (normal.sample(rng) / 255.0) as f32;
        }
    });
    true
}

/// Gaussian blur sized by an odd `kernel` width.
pub fn blur(image: &mut DynamicImage, kernel: u32) {
    if kernel <= 1 {
        return;
    }
    *image = image.blur(kernel_sigma(kernel));
}

/// Standard deviation that fills a `kernel`-wide Gaussian window.
fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

pub fn sharpen(image: &mut DynamicImage) {
    *image = image.filter3x3(&[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0]);
}

/// Zero the colour channels inside a rectangle the caller has bounds-checked.
pub fn erase(image: &mut DynamicImage, x: u32, y: u32, width: u32, height: u32) {
    at_working_depth!(image, |buffer| {
        let mut buffer = buffer;
        for py in y..y + height {
            for px in x..x + width {
                let p = buffer.get_pixel_mut(px, py);
                p.0[0] = 0;
                p.0[1] = 0;
                p.0[2] = 0;
            }
        }
        buffer
    });
}
