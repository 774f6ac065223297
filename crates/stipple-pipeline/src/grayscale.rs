//! Grayscale reduction by plain channel averaging.
//!
//! Every colour channel carries the same weight: `luma = (r + g + b) / 3`,
//! truncated. The result stays RGBA (`r = g = b = luma`) so it can flow
//! straight into the convolver and the stipple compositor. Alpha passes
//! through untouched, and fully transparent pixels are reduced like any
//! other.

use image::Rgba;

use crate::types::RgbaImage;

/// Truncated average of the red, green and blue channels.
#[must_use]
pub fn luma_average(pixel: Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    let sum = u16::from(r) + u16::from(g) + u16::from(b);
    u8::try_from(sum / 3).unwrap_or(u8::MAX)
}

/// Reduce a single pixel, keeping its alpha.
#[must_use]
pub fn gray_pixel(pixel: Rgba<u8>) -> Rgba<u8> {
    let luma = luma_average(pixel);
    Rgba([luma, luma, luma, pixel.0[3]])
}

/// Convert an image to channel-average grayscale.
///
/// Idempotent: reducing an already-gray image returns it unchanged.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbaImage) -> RgbaImage {
    imageproc::map::map_pixels(image, gray_pixel)
}

/// In-place variant of [`to_grayscale`], used for the compositor's
/// post-processing pass.
pub fn to_grayscale_in_place(image: &mut RgbaImage) {
    imageproc::map::map_pixels_mut(image, gray_pixel);
}
