//! Gaussian convolution kernel construction.
//!
//! A kernel of radius `r` is a `(2r + 1) x (2r + 1)` matrix of weights
//! `exp(-(x² + y²) / 2σ²) / 2πσ²`, normalized so the weights sum to one.
//!
//! Sigma is derived from the radius as `max(r / 2, 1)` where `r / 2` is
//! integer division. Radius 1 therefore gets sigma 1 (not 0.5), and odd
//! radii share the sigma of the even radius below them.

use crate::types::FilterError;

/// Largest accepted kernel radius.
///
/// Keeps the kernel side representable as `i32` offsets and bounds the
/// kernel allocation to roughly 32 MB.
pub const MAX_RADIUS: u32 = 1024;

/// Check that a kernel radius is within `1..=MAX_RADIUS`.
///
/// # Errors
///
/// Returns [`FilterError::InvalidArgument`] for radius 0 or a radius
/// above [`MAX_RADIUS`].
pub fn validate_radius(radius: u32) -> Result<u32, FilterError> {
    if radius == 0 || radius > MAX_RADIUS {
        return Err(FilterError::InvalidArgument(format!(
            "kernel radius must be in 1..={MAX_RADIUS}, got {radius}"
        )));
    }
    Ok(radius)
}

/// Sigma used for a kernel of the given radius.
#[must_use]
pub fn sigma_for_radius(radius: u32) -> f64 {
    f64::from((radius / 2).max(1))
}

/// Side length of a kernel of the given radius.
#[must_use]
pub const fn kernel_side(radius: u32) -> u32 {
    2 * radius + 1
}

/// A normalized, square, immutable convolution kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    radius: u32,
    sigma: f64,
    /// Row-major, `side * side` entries; row index is the y offset.
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a normalized 2D Gaussian kernel.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `radius` is 0 or
    /// exceeds [`MAX_RADIUS`].
    pub fn gaussian(radius: u32) -> Result<Self, FilterError> {
        let radius = validate_radius(radius)?;
        let sigma = sigma_for_radius(radius);
        let two_sigma_sq = 2.0 * sigma * sigma;
        let scale = std::f64::consts::PI * two_sigma_sq;

        let offsets = offsets(radius);
        let side = offsets.len();
        let mut weights = Vec::with_capacity(side * side);
        for &dy in &offsets {
            for &dx in &offsets {
                let dist_sq = f64::from(dx * dx + dy * dy);
                weights.push((-dist_sq / two_sigma_sq).exp() / scale);
            }
        }

        normalize(&mut weights);
        Ok(Self {
            radius,
            sigma,
            weights,
        })
    }

    /// Build the normalized 1D Gaussian whose outer product with itself
    /// equals [`Kernel::gaussian`] for the same radius.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `radius` is 0 or
    /// exceeds [`MAX_RADIUS`].
    pub fn gaussian_1d(radius: u32) -> Result<Vec<f64>, FilterError> {
        let radius = validate_radius(radius)?;
        let sigma = sigma_for_radius(radius);
        let two_sigma_sq = 2.0 * sigma * sigma;

        let mut taps: Vec<f64> = offsets(radius)
            .into_iter()
            .map(|d| (-f64::from(d * d) / two_sigma_sq).exp())
            .collect();
        normalize(&mut taps);
        Ok(taps)
    }

    /// Kernel radius (half-width excluding the centre).
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Standard deviation the weights were generated with.
    #[must_use]
    pub const fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Side length, `2 * radius + 1`.
    #[must_use]
    pub const fn side(&self) -> u32 {
        kernel_side(self.radius)
    }

    /// All weights in row-major order (rows are y offsets).
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weight at offset `(dx, dy)` from the centre, or `None` outside the
    /// kernel window.
    #[must_use]
    pub fn weight(&self, dx: i32, dy: i32) -> Option<f64> {
        let r = i64::from(self.radius);
        let (dx, dy) = (i64::from(dx), i64::from(dy));
        if dx.abs() > r || dy.abs() > r {
            return None;
        }
        let side = 2 * r + 1;
        let index = usize::try_from((dy + r) * side + (dx + r)).ok()?;
        self.weights.get(index).copied()
    }

    /// Sum of all weights (1.0 up to floating-point error).
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Offsets `-radius..=radius`. Callers validate the radius first, so the
/// conversion to `i32` cannot fail.
fn offsets(radius: u32) -> Vec<i32> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    (-r..=r).collect()
}

fn normalize(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= sum;
    }
}
