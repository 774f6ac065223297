//! Filter diagnostics: timing and per-stage metrics.
//!
//! [`apply_with_diagnostics`] runs the same stages as [`crate::apply`]
//! but times each one through a caller-supplied [`Clock`], so this crate
//! stays free of any particular time source.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::Overflow;
use crate::convolve::{self, BlurMethod};
use crate::grayscale;
use crate::invert;
use crate::kernel;
use crate::stipple::{self, Polarity, StippleParams};
use crate::types::{Dimensions, Filter, FilterConfig, FilterError, RgbaImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single filter run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDiagnostics {
    /// The filter that ran.
    pub filter: Filter,
    /// Stages in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Input image summary.
    pub summary: ImageSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Colour inversion.
    Invert {
        /// Pixels processed.
        pixel_count: u64,
    },
    /// Grayscale reduction of the input.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur.
    Blur {
        /// Kernel radius.
        radius: u32,
        /// Sigma derived from the radius.
        sigma: f64,
        /// Kernel side length.
        kernel_side: u32,
        /// Direct or separable evaluation.
        method: BlurMethod,
        /// Pixels actually convolved (border band excluded).
        interior_pixels: u64,
    },
    /// Sharp/blurred compositing.
    Composite {
        /// Difference sign convention.
        polarity: Polarity,
        /// Clean bias.
        clean: u8,
        /// Overflow handling.
        overflow: Overflow,
        /// Channel values that came out below 0.
        below_range: u64,
        /// Channel values that came out above 255.
        above_range: u64,
    },
    /// Grayscale pass over the composite.
    PostGrayscale {
        /// Pixels processed.
        pixel_count: u64,
    },
}

impl StageMetrics {
    /// Human-readable stage name.
    #[must_use]
    pub const fn stage_name(&self) -> &'static str {
        match self {
            Self::Invert { .. } => "Invert",
            Self::Grayscale { .. } => "Grayscale",
            Self::Blur { .. } => "Blur",
            Self::Composite { .. } => "Composite",
            Self::PostGrayscale { .. } => "Post Grayscale",
        }
    }
}

/// Summary of the input image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
}

impl FilterDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Filter Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Filter: {}", self.filter));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.width, self.summary.height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let name = stage.metrics.stage_name();
            let details = format_metrics(&stage.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }

    /// Duration of the first stage with the given name, if it ran.
    #[must_use]
    pub fn stage_duration(&self, name: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|s| s.metrics.stage_name() == name)
            .map(|s| s.duration)
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
const fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Invert { pixel_count } | StageMetrics::PostGrayscale { pixel_count } => {
            format!("{pixel_count} pixels")
        }
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur {
            radius,
            sigma,
            kernel_side,
            method,
            interior_pixels,
        } => format!(
            "r={radius} sigma={sigma:.1} kernel={kernel_side}x{kernel_side} {method} interior={interior_pixels}",
        ),
        StageMetrics::Composite {
            polarity,
            clean,
            overflow,
            below_range,
            above_range,
        } => format!(
            "{polarity} clean={clean} {overflow} below={below_range} above={above_range}",
        ),
    }
}

/// Pixels a blur of radius `r` actually convolves.
fn interior_pixels(dims: Dimensions, r: u32) -> u64 {
    let band = 2 * u64::from(r);
    let w = u64::from(dims.width).saturating_sub(band);
    let h = u64::from(dims.height).saturating_sub(band);
    w * h
}

/// Run one stage and record its duration and metrics.
fn timed<C: Clock, T>(
    clock: &C,
    stages: &mut Vec<StageDiagnostics>,
    stage: impl FnOnce() -> Result<(T, StageMetrics), FilterError>,
) -> Result<T, FilterError> {
    let start = clock.now();
    let (output, metrics) = stage()?;
    stages.push(StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics,
    });
    Ok(output)
}

fn blur_stage(
    image: &RgbaImage,
    radius: u32,
    method: BlurMethod,
) -> Result<(RgbaImage, StageMetrics), FilterError> {
    let blurred = convolve::blur(image, radius, method)?;
    let metrics = StageMetrics::Blur {
        radius,
        sigma: kernel::sigma_for_radius(radius),
        kernel_side: kernel::kernel_side(radius),
        method,
        interior_pixels: interior_pixels(Dimensions::of(image), radius),
    };
    Ok((blurred, metrics))
}

/// Apply a filter while collecting per-stage diagnostics.
///
/// Produces exactly the same image as [`crate::apply`].
///
/// # Errors
///
/// Same as [`crate::apply`]; parameters are validated before the first
/// stage runs.
pub fn apply_with_diagnostics<C: Clock>(
    image: &RgbaImage,
    filter: &Filter,
    config: &FilterConfig,
    clock: &C,
) -> Result<(RgbaImage, FilterDiagnostics), FilterError> {
    let start = clock.now();
    let dims = Dimensions::of(image);
    let mut stages = Vec::new();

    let output = match *filter {
        Filter::Invert => timed(clock, &mut stages, || {
            let metrics = StageMetrics::Invert {
                pixel_count: dims.pixel_count(),
            };
            Ok((invert::invert_colors(image), metrics))
        })?,
        Filter::Grayscale => timed(clock, &mut stages, || {
            let metrics = StageMetrics::Grayscale {
                width: dims.width,
                height: dims.height,
            };
            Ok((grayscale::to_grayscale(image), metrics))
        })?,
        Filter::Blur { radius } => timed(clock, &mut stages, || {
            blur_stage(image, radius, config.blur_method)
        })?,
        Filter::Stipple { style, clean } => {
            let params = StippleParams::for_style(style, clean)?;
            kernel::validate_radius(config.blur_radius)?;

            let sharp = timed(clock, &mut stages, || {
                let metrics = StageMetrics::Grayscale {
                    width: dims.width,
                    height: dims.height,
                };
                Ok((grayscale::to_grayscale(image), metrics))
            })?;
            let blurred = timed(clock, &mut stages, || {
                blur_stage(&sharp, config.blur_radius, config.blur_method)
            })?;
            let mut output = timed(clock, &mut stages, || {
                let (output, stats) = stipple::composite_with_stats(
                    &sharp,
                    &blurred,
                    params.clean,
                    params.polarity,
                    config.overflow,
                )?;
                let metrics = StageMetrics::Composite {
                    polarity: params.polarity,
                    clean: params.clean.get(),
                    overflow: config.overflow,
                    below_range: stats.below_range,
                    above_range: stats.above_range,
                };
                Ok((output, metrics))
            })?;
            if params.post_grayscale {
                timed(clock, &mut stages, || {
                    grayscale::to_grayscale_in_place(&mut output);
                    let metrics = StageMetrics::PostGrayscale {
                        pixel_count: dims.pixel_count(),
                    };
                    Ok(((), metrics))
                })?;
            }
            output
        }
    };

    let diagnostics = FilterDiagnostics {
        filter: *filter,
        stages,
        total_duration: clock.elapsed(&start),
        summary: ImageSummary {
            width: dims.width,
            height: dims.height,
            pixel_count: dims.pixel_count(),
        },
    };
    Ok((output, diagnostics))
}
