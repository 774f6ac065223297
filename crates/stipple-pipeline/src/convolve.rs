//! Kernel convolution over RGBA pixel buffers.
//!
//! Only interior pixels are convolved: a pixel at `(x, y)` is written iff
//! `radius <= x < width - radius` and `radius <= y < height - radius`.
//! The band of width `radius` around the edge is copied through
//! unmodified, so the kernel window never samples outside the image.
//! Alpha is never blurred; each output pixel keeps its input alpha.
//!
//! Weighted channel sums are truncated toward zero, not rounded, when
//! they are stored back as `u8`.
//!
//! [`convolve`] evaluates the full 2D window per pixel,
//! `O(width * height * radius²)`. [`convolve_separable`] exploits the
//! separability of the Gaussian and runs a horizontal then a vertical
//! 1D pass, `O(width * height * radius)`. It accumulates in `f64` and
//! truncates once at the end, so its output matches the direct path to
//! within one unit per channel.

use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::kernel::Kernel;
use crate::types::{FilterError, RgbaImage};

/// Strategy for evaluating a Gaussian blur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlurMethod {
    /// Full 2D kernel window per pixel.
    #[default]
    Direct,
    /// Horizontal pass followed by a vertical pass.
    Separable,
}

impl fmt::Display for BlurMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::Separable => f.write_str("Separable"),
        }
    }
}

/// Gaussian-blur an image with the given kernel radius and method.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `radius` is 0 or above
/// [`MAX_RADIUS`](crate::kernel::MAX_RADIUS).
pub fn blur(image: &RgbaImage, radius: u32, method: BlurMethod) -> Result<RgbaImage, FilterError> {
    match method {
        BlurMethod::Direct => Ok(convolve(image, &Kernel::gaussian(radius)?)),
        BlurMethod::Separable => convolve_separable(image, radius),
    }
}

/// Convolve the RGB channels of an image with a 2D kernel.
///
/// Images too small to have an interior (`width <= 2 * radius` or
/// `height <= 2 * radius`) are returned unchanged.
#[must_use = "returns the convolved image"]
pub fn convolve(image: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let mut output = image.clone();
    let (w, h) = image.dimensions();
    let r = kernel.radius();
    if !has_interior(w, h, r) {
        return output;
    }

    let side = kernel.side() as usize;
    for y in r..h - r {
        for x in r..w - r {
            let mut acc = [0.0_f64; 3];
            for (ky, row) in (0_u32..).zip(kernel.weights().chunks_exact(side)) {
                // Row ky holds offset dy = ky - r; sample at y - dy.
                let sy = y + r - ky;
                for (kx, &weight) in (0_u32..).zip(row) {
                    let sample = *image.get_pixel(x + r - kx, sy);
                    accumulate(&mut acc, sample, weight);
                }
            }
            let alpha = image.get_pixel(x, y).0[3];
            output.put_pixel(x, y, store(acc, alpha));
        }
    }
    output
}

/// Gaussian blur via two 1D passes over the same interior as [`convolve`].
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `radius` is 0 or above
/// [`MAX_RADIUS`](crate::kernel::MAX_RADIUS).
pub fn convolve_separable(image: &RgbaImage, radius: u32) -> Result<RgbaImage, FilterError> {
    let taps = Kernel::gaussian_1d(radius)?;
    let mut output = image.clone();
    let (w, h) = image.dimensions();
    let r = radius;
    if !has_interior(w, h, r) {
        return Ok(output);
    }

    // Horizontal pass over every row, but only the interior columns:
    // the vertical pass needs rows y - r ..= y + r for each interior y.
    let cols = (w - 2 * r) as usize;
    let mut horizontal = vec![[0.0_f64; 3]; cols * h as usize];
    for y in 0..h {
        let row_start = y as usize * cols;
        for (x, cell) in (r..w - r).zip(&mut horizontal[row_start..row_start + cols]) {
            for (kx, &weight) in (0_u32..).zip(&taps) {
                accumulate(cell, *image.get_pixel(x + r - kx, y), weight);
            }
        }
    }

    for y in r..h - r {
        for (col, x) in (r..w - r).enumerate() {
            let mut acc = [0.0_f64; 3];
            for (ky, &weight) in (0_u32..).zip(&taps) {
                let sy = (y + r - ky) as usize;
                for (sum, value) in acc.iter_mut().zip(horizontal[sy * cols + col]) {
                    *sum += value * weight;
                }
            }
            let alpha = image.get_pixel(x, y).0[3];
            output.put_pixel(x, y, store(acc, alpha));
        }
    }
    Ok(output)
}

/// Whether a `w x h` image has at least one pixel at distance `>= r` from
/// every edge.
#[must_use]
pub fn has_interior(w: u32, h: u32, r: u32) -> bool {
    let band = 2 * u64::from(r);
    u64::from(w) > band && u64::from(h) > band
}

fn accumulate(acc: &mut [f64; 3], sample: Rgba<u8>, weight: f64) {
    for (sum, &channel) in acc.iter_mut().zip(&sample.0[..3]) {
        *sum += f64::from(channel) * weight;
    }
}

fn store(acc: [f64; 3], alpha: u8) -> Rgba<u8> {
    let [r, g, b] = acc.map(truncate_channel);
    Rgba([r, g, b, alpha])
}

/// Truncate toward zero and saturate to `0..=255`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn truncate_channel(value: f64) -> u8 {
    // Float-to-int `as` truncates and saturates (NaN becomes 0).
    value as u8
}
