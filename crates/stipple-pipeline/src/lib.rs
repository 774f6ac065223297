//! stipple-pipeline: Pure image filter engine (sans-IO).
//!
//! Turns raster images into stipple art renditions through:
//! grayscale -> Gaussian blur -> sharp/blurred compositing ->
//! optional grayscale pass. Colour inversion, grayscale and blur are
//! also exposed as standalone filters.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! [`RgbaImage`] buffers. Decoding and encoding files lives in
//! `stipple-io`.

pub mod channel;
pub mod convolve;
pub mod diagnostics;
pub mod grayscale;
pub mod invert;
pub mod kernel;
pub mod stipple;
pub mod types;

pub use channel::Overflow;
pub use convolve::BlurMethod;
pub use grayscale::to_grayscale;
pub use invert::invert_colors;
pub use kernel::Kernel;
pub use stipple::{CleanBias, Polarity, StippleStyle};
pub use types::{Dimensions, Filter, FilterConfig, FilterError, FilterRequest, RgbaImage};

/// Gaussian-blur an image with direct 2D convolution.
///
/// The outer `radius` pixels on every side are left untouched.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `radius` is 0 or above
/// [`kernel::MAX_RADIUS`].
pub fn gaussian_blur(image: &RgbaImage, radius: u32) -> Result<RgbaImage, FilterError> {
    convolve::blur(image, radius, BlurMethod::Direct)
}

/// Stipple art with black outlines on a white background.
///
/// Legal clean range is `1..=10`; values of 3 or more are recommended.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `clean` is out of range.
pub fn stipple_black_on_white(image: &RgbaImage, clean: u8) -> Result<RgbaImage, FilterError> {
    stipple::stipple(
        image,
        StippleStyle::BlackOnWhite,
        clean,
        &FilterConfig::default(),
    )
}

/// Stipple art with black outlines, keeping any compositing tint.
///
/// Legal clean range is `1..=10`; values of 7 or more are recommended.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `clean` is out of range.
pub fn stipple_black_on_yellow_white(
    image: &RgbaImage,
    clean: u8,
) -> Result<RgbaImage, FilterError> {
    stipple::stipple(
        image,
        StippleStyle::BlackOnYellowishWhite,
        clean,
        &FilterConfig::default(),
    )
}

/// Stipple art with white outlines.
///
/// Legal clean range is `3..=10`; values of 4 or more are recommended.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `clean` is out of range.
pub fn stipple_white_figure(image: &RgbaImage, clean: u8) -> Result<RgbaImage, FilterError> {
    stipple::stipple(
        image,
        StippleStyle::WhiteFigure,
        clean,
        &FilterConfig::default(),
    )
}

/// Check a filter's parameters without touching any pixels.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] for the same out-of-range
/// radius or clean bias that [`apply`] would reject.
pub fn validate(filter: &Filter, config: &FilterConfig) -> Result<(), FilterError> {
    match *filter {
        Filter::Invert | Filter::Grayscale => {}
        Filter::Blur { radius } => {
            kernel::validate_radius(radius)?;
        }
        Filter::Stipple { style, clean } => {
            CleanBias::new(clean, style)?;
            kernel::validate_radius(config.blur_radius)?;
        }
    }
    Ok(())
}

/// Apply any [`Filter`] with the given configuration.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if a radius or clean bias is
/// out of range. Validation happens before any pixel work.
pub fn apply(
    image: &RgbaImage,
    filter: &Filter,
    config: &FilterConfig,
) -> Result<RgbaImage, FilterError> {
    tracing::trace!(%filter, width = image.width(), height = image.height(), "applying filter");
    match *filter {
        Filter::Invert => Ok(invert_colors(image)),
        Filter::Grayscale => Ok(to_grayscale(image)),
        Filter::Blur { radius } => convolve::blur(image, radius, config.blur_method),
        Filter::Stipple { style, clean } => stipple::stipple(image, style, clean, config),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    fn portrait() -> RgbaImage {
        // A dark disc on a light background, big enough for radius 10.
        RgbaImage::from_fn(40, 40, |x, y| {
            let dx = f64::from(x) - 20.0;
            let dy = f64::from(y) - 20.0;
            if dx.hypot(dy) < 6.0 {
                Rgba([30, 40, 50, 255])
            } else {
                Rgba([220, 210, 200, 255])
            }
        })
    }

    #[test]
    fn invert_twice_is_identity() {
        let img = portrait();
        assert_eq!(invert_colors(&invert_colors(&img)), img);
    }

    #[test]
    fn gaussian_blur_rejects_zero_radius() {
        assert!(matches!(
            gaussian_blur(&portrait(), 0),
            Err(FilterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn stipple_outputs_keep_dimensions() {
        let img = portrait();
        for out in [
            stipple_black_on_white(&img, 4).unwrap(),
            stipple_black_on_yellow_white(&img, 7).unwrap(),
            stipple_white_figure(&img, 4).unwrap(),
        ] {
            assert_eq!(out.dimensions(), (40, 40));
        }
    }

    #[test]
    fn black_on_white_outlines_the_disc() {
        let out = stipple_black_on_white(&portrait(), 4).unwrap();
        // Inside the disc, just within its rim, blurred is much brighter
        // than sharp, so the outline survives.
        assert!(out.get_pixel(20, 15).0[0] > 0);
        // Far from the disc, the background collapses to black.
        assert_eq!(out.get_pixel(11, 11).0, [0, 0, 0, 255]);
    }

    #[test]
    fn white_figure_rejects_clean_two() {
        assert!(matches!(
            stipple_white_figure(&portrait(), 2),
            Err(FilterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn apply_dispatches_each_filter() {
        let img = portrait();
        let config = FilterConfig::default();
        assert_eq!(
            apply(&img, &Filter::Invert, &config).unwrap(),
            invert_colors(&img)
        );
        assert_eq!(
            apply(&img, &Filter::Grayscale, &config).unwrap(),
            to_grayscale(&img)
        );
        assert_eq!(
            apply(&img, &Filter::Blur { radius: 2 }, &config).unwrap(),
            gaussian_blur(&img, 2).unwrap()
        );
        let stipple = Filter::Stipple {
            style: StippleStyle::BlackOnWhite,
            clean: 4,
        };
        assert_eq!(
            apply(&img, &stipple, &config).unwrap(),
            stipple_black_on_white(&img, 4).unwrap()
        );
    }

    #[test]
    fn validate_matches_apply() {
        let config = FilterConfig::default();
        assert!(validate(&Filter::Invert, &config).is_ok());
        assert!(validate(&Filter::Blur { radius: 0 }, &config).is_err());
        let bad_clean = Filter::Stipple {
            style: StippleStyle::WhiteFigure,
            clean: 2,
        };
        assert!(validate(&bad_clean, &config).is_err());
        let bad_radius = FilterConfig {
            blur_radius: 0,
            ..FilterConfig::default()
        };
        let good = Filter::Stipple {
            style: StippleStyle::BlackOnWhite,
            clean: 4,
        };
        assert!(validate(&good, &config).is_ok());
        assert!(validate(&good, &bad_radius).is_err());
    }

    #[test]
    fn apply_honours_blur_method() {
        let img = portrait();
        let config = FilterConfig {
            blur_method: BlurMethod::Separable,
            ..FilterConfig::default()
        };
        let out = apply(&img, &Filter::Blur { radius: 3 }, &config).unwrap();
        assert_eq!(out, convolve::convolve_separable(&img, 3).unwrap());
    }
}
