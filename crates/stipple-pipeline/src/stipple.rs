//! Stipple compositing: sharp grayscale vs. blurred grayscale.
//!
//! The input is reduced to grayscale (`sharp`), a copy is Gaussian-blurred
//! (`blurred`), and every colour channel of the output is a biased
//! difference of the two:
//!
//! - [`Polarity::BlackFigure`]: `blurred - (sharp + clean)`
//! - [`Polarity::WhiteFigure`]: `(blurred + clean) - sharp`
//!
//! Where sharp and blurred agree (flat regions) the result collapses to
//! the bias itself; where they diverge (edges, fine detail) it survives.
//! Raising the clean bias suppresses more of the background at the cost
//! of detail.
//!
//! Output alpha is the sharp pixel's alpha. Channel values are clamped to
//! `0..=255` unless [`Overflow::Wrap`] is selected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::{self, Overflow};
use crate::convolve;
use crate::grayscale;
use crate::kernel;
use crate::types::{Dimensions, FilterConfig, FilterError, RgbaImage};

/// Largest legal clean bias for every style.
pub const MAX_CLEAN: u8 = 10;

/// Which way round the difference is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Dark outlines: `blurred - (sharp + clean)`.
    BlackFigure,
    /// Light outlines: `(blurred + clean) - sharp`.
    WhiteFigure,
}

impl Polarity {
    /// Composited channel value before overflow handling.
    #[must_use]
    pub fn difference(self, sharp: u8, blurred: u8, clean: i32) -> i32 {
        let (sharp, blurred) = (i32::from(sharp), i32::from(blurred));
        match self {
            Self::BlackFigure => blurred - (sharp + clean),
            Self::WhiteFigure => (blurred + clean) - sharp,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlackFigure => f.write_str("BlackFigure"),
            Self::WhiteFigure => f.write_str("WhiteFigure"),
        }
    }
}

/// The three stipple renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StippleStyle {
    /// Black outlines, re-reduced to grayscale.
    BlackOnWhite,
    /// Black outlines, no grayscale re-reduction, so any tint the
    /// compositing introduced is kept.
    BlackOnYellowishWhite,
    /// White outlines, re-reduced to grayscale.
    WhiteFigure,
}

impl StippleStyle {
    /// Every style, in presentation order.
    pub const ALL: [Self; 3] = [
        Self::BlackOnWhite,
        Self::BlackOnYellowishWhite,
        Self::WhiteFigure,
    ];

    /// Kebab-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BlackOnWhite => "black-on-white",
            Self::BlackOnYellowishWhite => "black-on-yellowish-white",
            Self::WhiteFigure => "white-figure",
        }
    }

    /// Sign convention used by this style.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::BlackOnWhite | Self::BlackOnYellowishWhite => Polarity::BlackFigure,
            Self::WhiteFigure => Polarity::WhiteFigure,
        }
    }

    /// Whether the composited result gets a final grayscale pass.
    #[must_use]
    pub const fn post_grayscale(self) -> bool {
        !matches!(self, Self::BlackOnYellowishWhite)
    }

    /// Smallest legal clean bias.
    #[must_use]
    pub const fn min_clean(self) -> u8 {
        match self {
            Self::BlackOnWhite | Self::BlackOnYellowishWhite => 1,
            Self::WhiteFigure => 3,
        }
    }

    /// Smallest clean bias that usually gives a tidy background.
    ///
    /// Tuning guidance only; anything in the legal range is accepted.
    #[must_use]
    pub const fn recommended_clean(self) -> u8 {
        match self {
            Self::BlackOnWhite => 3,
            Self::BlackOnYellowishWhite => 7,
            Self::WhiteFigure => 4,
        }
    }
}

impl fmt::Display for StippleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A clean bias already checked against a style's legal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanBias(u8);

impl CleanBias {
    /// Validate `value` for `style`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `value` is outside
    /// `style.min_clean()..=MAX_CLEAN`.
    pub fn new(value: u8, style: StippleStyle) -> Result<Self, FilterError> {
        let min = style.min_clean();
        if !(min..=MAX_CLEAN).contains(&value) {
            return Err(FilterError::InvalidArgument(format!(
                "clean for {style} must be in {min}..={MAX_CLEAN}, got {value} \
                 (values of {} or more recommended)",
                style.recommended_clean(),
            )));
        }
        if value < style.recommended_clean() {
            tracing::debug!(
                %style,
                clean = value,
                recommended = style.recommended_clean(),
                "clean bias below the recommended value; background may be noisy"
            );
        }
        Ok(Self(value))
    }

    /// The bias value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Fully validated compositing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StippleParams {
    /// Clean bias.
    pub clean: CleanBias,
    /// Difference sign convention.
    pub polarity: Polarity,
    /// Whether to re-reduce the composite to grayscale.
    pub post_grayscale: bool,
}

impl StippleParams {
    /// Parameters for one of the predefined styles.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `clean` is outside the
    /// style's legal range.
    pub fn for_style(style: StippleStyle, clean: u8) -> Result<Self, FilterError> {
        Ok(Self {
            clean: CleanBias::new(clean, style)?,
            polarity: style.polarity(),
            post_grayscale: style.post_grayscale(),
        })
    }
}

/// Counts of composited channel values that fell outside `0..=255`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeStats {
    /// Channel values below 0.
    pub below_range: u64,
    /// Channel values above 255.
    pub above_range: u64,
}

impl CompositeStats {
    fn record(&mut self, value: i32) {
        if value < 0 {
            self.below_range += 1;
        } else if value > channel::MAX_CHANNEL {
            self.above_range += 1;
        }
    }
}

/// Combine a sharp grayscale image with its blurred counterpart.
///
/// # Errors
///
/// Returns [`FilterError::DimensionMismatch`] if the two images differ in
/// size.
pub fn composite(
    sharp: &RgbaImage,
    blurred: &RgbaImage,
    clean: CleanBias,
    polarity: Polarity,
    overflow: Overflow,
) -> Result<RgbaImage, FilterError> {
    composite_with_stats(sharp, blurred, clean, polarity, overflow).map(|(image, _)| image)
}

/// [`composite`], also reporting how many channel values left the valid
/// range before overflow handling.
///
/// # Errors
///
/// Returns [`FilterError::DimensionMismatch`] if the two images differ in
/// size.
pub fn composite_with_stats(
    sharp: &RgbaImage,
    blurred: &RgbaImage,
    clean: CleanBias,
    polarity: Polarity,
    overflow: Overflow,
) -> Result<(RgbaImage, CompositeStats), FilterError> {
    let (sharp_dims, blurred_dims) = (Dimensions::of(sharp), Dimensions::of(blurred));
    if sharp_dims != blurred_dims {
        return Err(FilterError::DimensionMismatch {
            sharp: sharp_dims,
            blurred: blurred_dims,
        });
    }

    let bias = i32::from(clean.get());
    let mut stats = CompositeStats::default();
    let mut output = RgbaImage::new(sharp_dims.width, sharp_dims.height);
    for ((out, s), b) in output.pixels_mut().zip(sharp.pixels()).zip(blurred.pixels()) {
        let [r, g, bl] = std::array::from_fn(|c| polarity.difference(s.0[c], b.0[c], bias));
        for value in [r, g, bl] {
            stats.record(value);
        }

        // The packed alpha byte can be corrupted by wrapping; keep the sharp one.
        let alpha = s.0[3];
        *out = channel::from_word(overflow.pack(i32::from(alpha), r, g, bl));
        out.0[3] = alpha;
    }
    Ok((output, stats))
}

/// Render an image as stipple art.
///
/// Steps: grayscale, blur a copy with `config.blur_radius`, composite,
/// then a grayscale pass for the styles that call for it.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] if `clean` is outside the
/// style's legal range or `config.blur_radius` is not a valid kernel
/// radius. Both are checked before any pixel is touched.
pub fn stipple(
    image: &RgbaImage,
    style: StippleStyle,
    clean: u8,
    config: &FilterConfig,
) -> Result<RgbaImage, FilterError> {
    let params = StippleParams::for_style(style, clean)?;
    kernel::validate_radius(config.blur_radius)?;

    let sharp = grayscale::to_grayscale(image);
    let blurred = convolve::blur(&sharp, config.blur_radius, config.blur_method)?;
    let mut output = composite(
        &sharp,
        &blurred,
        params.clean,
        params.polarity,
        config.overflow,
    )?;
    if params.post_grayscale {
        grayscale::to_grayscale_in_place(&mut output);
    }
    Ok(output)
}
