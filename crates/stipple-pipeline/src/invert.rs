//! Colour inversion.

use image::Rgba;

use crate::types::RgbaImage;

/// Invert every channel of every pixel (`255 - v`), alpha included.
///
/// Inverting twice returns the original image exactly. Because alpha is
/// inverted too, an opaque image comes back fully transparent; callers
/// that want visible output should start from a transparent source or
/// flatten afterwards.
#[must_use = "returns the inverted image"]
pub fn invert_colors(image: &RgbaImage) -> RgbaImage {
    imageproc::map::map_pixels(image, |pixel: Rgba<u8>| Rgba(pixel.0.map(|c| u8::MAX - c)))
}
