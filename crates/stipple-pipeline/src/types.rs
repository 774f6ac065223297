//! Shared types for the stipple filter engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::Overflow;
use crate::convolve::BlurMethod;
use crate::stipple::StippleStyle;

/// Re-export `RgbaImage` so downstream crates can pass pixel buffers
/// around without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing pixel buffer.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single filter operation with its per-invocation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    /// Invert all four channels, alpha included.
    Invert,
    /// Channel-average grayscale.
    Grayscale,
    /// Gaussian blur with the given kernel radius.
    Blur {
        /// Kernel radius in pixels.
        radius: u32,
    },
    /// Stipple rendition in the given style.
    Stipple {
        /// Output style (polarity and post-processing).
        style: StippleStyle,
        /// Clean bias; see [`StippleStyle::min_clean`] for the legal range.
        clean: u8,
    },
}

impl Filter {
    /// Short kebab-case name, used for output file suffixes and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invert => "invert",
            Self::Grayscale => "grayscale",
            Self::Blur { .. } => "blur",
            Self::Stipple { style, .. } => style.name(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blur { radius } => write!(f, "blur (radius {radius})"),
            Self::Stipple { style, clean } => write!(f, "{} (clean {clean})", style.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// Tunables shared by every filter invocation.
///
/// Only the stipple styles read `blur_radius`; a plain [`Filter::Blur`]
/// carries its own radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Radius of the Gaussian blur applied to the sharp grayscale image
    /// before stipple compositing.
    pub blur_radius: u32,

    /// How the convolution is evaluated.
    pub blur_method: BlurMethod,

    /// What happens to composited channel values outside `0..=255`.
    pub overflow: Overflow,
}

impl FilterConfig {
    /// Default stipple blur radius.
    pub const DEFAULT_BLUR_RADIUS: u32 = 10;

    /// Default convolution strategy.
    pub const DEFAULT_BLUR_METHOD: BlurMethod = BlurMethod::Direct;

    /// Default overflow handling.
    pub const DEFAULT_OVERFLOW: Overflow = Overflow::Clamp;
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            blur_radius: Self::DEFAULT_BLUR_RADIUS,
            blur_method: Self::DEFAULT_BLUR_METHOD,
            overflow: Self::DEFAULT_OVERFLOW,
        }
    }
}

/// A complete filter invocation: what to run and how.
///
/// This is the shape accepted by the CLI's `--config-json` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// The filter to apply.
    pub filter: Filter,
    /// Shared tunables.
    #[serde(default)]
    pub config: FilterConfig,
}

/// Errors that can occur while running a filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// A parameter (clean bias, kernel radius) is outside its legal range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The compositor was handed buffers of different sizes.
    #[error("dimension mismatch: sharp image is {sharp}, blurred image is {blurred}")]
    DimensionMismatch {
        /// Dimensions of the unblurred input.
        sharp: Dimensions,
        /// Dimensions of the blurred input.
        blurred: Dimensions,
    },
}
