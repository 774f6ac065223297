//! stipple: batch CLI that turns images into stipple art renditions.
//!
//! Decodes each input image, runs one filter over it, and writes the
//! result. Inputs may be files or directories; a failing image is logged
//! and skipped, and the exit status reports whether any image failed.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin stipple -- [OPTIONS] <INPUTS>...
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

#![allow(clippy::print_stdout)]

mod batch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use stipple_io::OutputFormat;
use stipple_pipeline::{BlurMethod, Filter, FilterConfig, FilterRequest, Overflow, StippleStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batch::{Destination, StdClock};

/// Default stipple clean bias.
const DEFAULT_CLEAN: u8 = 4;

/// Turn raster images into stipple art.
///
/// Each input is processed independently. Outputs are written next to
/// their input as `<stem>-<filter>.<ext>` unless `--output-dir` or
/// `--in-place` says otherwise.
#[derive(Parser)]
#[command(name = "stipple", version)]
struct Cli {
    /// Image files or directories of images (PNG, JPEG, BMP, WebP).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Filter to apply.
    #[arg(long, value_enum, default_value_t = FilterKind::BlackOnWhite)]
    filter: FilterKind,

    /// Clean bias for the stipple filters (1-10; white-figure needs 3+).
    #[arg(long, default_value_t = DEFAULT_CLEAN)]
    clean: u8,

    /// Blur radius: the kernel radius for `blur`, and the pre-composite
    /// blur for the stipple filters.
    #[arg(long, default_value_t = FilterConfig::DEFAULT_BLUR_RADIUS)]
    radius: u32,

    /// How the Gaussian blur is evaluated.
    #[arg(long, value_enum, default_value_t = Method::Direct)]
    blur_method: Method,

    /// Handling of composited channel values outside 0-255.
    #[arg(long, value_enum, default_value_t = OverflowMode::Clamp)]
    overflow: OverflowMode,

    /// Output image format (png, jpg/jpeg, bmp, webp).
    #[arg(long, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Write outputs into this directory instead of beside each input.
    #[arg(long, conflicts_with = "in_place")]
    output_dir: Option<PathBuf>,

    /// Overwrite each input with its filtered result.
    #[arg(long)]
    in_place: bool,

    /// Full filter request as a JSON string.
    ///
    /// When provided, `--filter`, `--clean`, `--radius`, `--blur-method`
    /// and `--overflow` are ignored. The JSON must be a valid
    /// `FilterRequest` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Collect per-stage timings and print a report for each image.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long, requires = "diagnostics")]
    json: bool,
}

/// Filter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FilterKind {
    /// Invert every channel.
    Invert,
    /// Channel-average grayscale.
    Grayscale,
    /// Gaussian blur with `--radius`.
    Blur,
    /// Black outlines on white.
    BlackOnWhite,
    /// Black outlines on a tinted white.
    BlackOnYellowishWhite,
    /// White outlines on black.
    WhiteFigure,
}

/// Blur evaluation strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    /// Full 2D kernel per pixel.
    Direct,
    /// Horizontal then vertical 1D passes (faster, within 1 level).
    Separable,
}

/// Out-of-range channel handling.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OverflowMode {
    /// Saturate each channel.
    Clamp,
    /// Legacy bit-packing; yields the yellowish-white background.
    Wrap,
}

/// Build a [`FilterRequest`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual filter flags are ignored. Otherwise the request is
/// assembled from the flags.
fn request_from_cli(cli: &Cli) -> Result<FilterRequest, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("error parsing --config-json: {e}"));
    }

    let stipple = |style| Filter::Stipple {
        style,
        clean: cli.clean,
    };
    let filter = match cli.filter {
        FilterKind::Invert => Filter::Invert,
        FilterKind::Grayscale => Filter::Grayscale,
        FilterKind::Blur => Filter::Blur { radius: cli.radius },
        FilterKind::BlackOnWhite => stipple(StippleStyle::BlackOnWhite),
        FilterKind::BlackOnYellowishWhite => stipple(StippleStyle::BlackOnYellowishWhite),
        FilterKind::WhiteFigure => stipple(StippleStyle::WhiteFigure),
    };

    Ok(FilterRequest {
        filter,
        config: FilterConfig {
            blur_radius: cli.radius,
            blur_method: match cli.blur_method {
                Method::Direct => BlurMethod::Direct,
                Method::Separable => BlurMethod::Separable,
            },
            overflow: match cli.overflow {
                OverflowMode::Clamp => Overflow::Clamp,
                OverflowMode::Wrap => Overflow::Wrap,
            },
        },
    })
}

fn destination_from_cli(cli: &Cli) -> Destination {
    if cli.in_place {
        Destination::InPlace
    } else if let Some(ref dir) = cli.output_dir {
        Destination::Directory(dir.clone())
    } else {
        Destination::Beside
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stipple=info,stipple_io=info,stipple_pipeline=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let request = match request_from_cli(&cli) {
        Ok(r) => r,
        Err(msg) => {
            tracing::error!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = stipple_pipeline::validate(&request.filter, &request.config) {
        tracing::error!("{e}");
        return ExitCode::FAILURE;
    }

    let destination = destination_from_cli(&cli);
    if let Destination::Directory(ref dir) = destination
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        tracing::error!(dir = %dir.display(), "cannot create output directory: {e}");
        return ExitCode::FAILURE;
    }

    let (inputs, unreadable) = batch::collect_inputs(&cli.inputs, request.filter.name());
    for (dir, e) in &unreadable {
        tracing::error!(dir = %dir.display(), "cannot list directory: {e}");
    }
    if inputs.is_empty() {
        tracing::error!("no input images found");
        return ExitCode::FAILURE;
    }

    tracing::info!(filter = %request.filter, images = inputs.len(), "starting batch");

    let clock = cli.diagnostics.then_some(&StdClock);
    let mut failed = unreadable.len();

    for input in &inputs {
        let format = batch::output_format(input, &destination, cli.format);
        let output = batch::output_path(input, &destination, request.filter.name(), format);

        match batch::process_image(input, &output, format, &request, clock) {
            Ok(diagnostics) => {
                tracing::info!(input = %input.display(), output = %output.display(), "wrote image");
                if let Some(diagnostics) = diagnostics {
                    if cli.json {
                        match serde_json::to_string_pretty(&diagnostics) {
                            Ok(json) => println!("{json}"),
                            Err(e) => tracing::error!("error serializing diagnostics: {e}"),
                        }
                    } else {
                        println!("{}\n{}", input.display(), diagnostics.report());
                    }
                }
            }
            Err(e) => {
                tracing::error!(input = %input.display(), "skipping image: {e}");
                failed += 1;
            }
        }
    }

    tracing::info!(processed = inputs.len(), failed, "batch finished");

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stipple").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_build_black_on_white() {
        let cli = parse(&["photo.png"]);
        let request = request_from_cli(&cli).unwrap();
        assert_eq!(
            request.filter,
            Filter::Stipple {
                style: StippleStyle::BlackOnWhite,
                clean: DEFAULT_CLEAN
            }
        );
        assert_eq!(request.config, FilterConfig::default());
        assert_eq!(destination_from_cli(&cli), Destination::Beside);
    }

    #[test]
    fn flags_map_onto_request() {
        let cli = parse(&[
            "--filter",
            "white-figure",
            "--clean",
            "6",
            "--radius",
            "5",
            "--blur-method",
            "separable",
            "--overflow",
            "wrap",
            "in",
        ]);
        let request = request_from_cli(&cli).unwrap();
        assert_eq!(
            request.filter,
            Filter::Stipple {
                style: StippleStyle::WhiteFigure,
                clean: 6
            }
        );
        assert_eq!(request.config.blur_radius, 5);
        assert_eq!(request.config.blur_method, BlurMethod::Separable);
        assert_eq!(request.config.overflow, Overflow::Wrap);
    }

    #[test]
    fn blur_filter_uses_radius_flag() {
        let cli = parse(&["--filter", "blur", "--radius", "3", "in.png"]);
        let request = request_from_cli(&cli).unwrap();
        assert_eq!(request.filter, Filter::Blur { radius: 3 });
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "--filter",
            "invert",
            "--config-json",
            r#"{"filter": {"kind": "grayscale"}}"#,
            "in.png",
        ]);
        let request = request_from_cli(&cli).unwrap();
        assert_eq!(request.filter, Filter::Grayscale);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["--config-json", "{not json", "in.png"]);
        let err = request_from_cli(&cli).unwrap_err();
        assert!(err.contains("--config-json"));
    }

    #[test]
    fn output_dir_and_in_place_conflict() {
        let result = Cli::try_parse_from(["stipple", "--output-dir", "out", "--in-place", "a.png"]);
        assert!(result.is_err());
    }

    #[test]
    fn json_requires_diagnostics() {
        assert!(Cli::try_parse_from(["stipple", "--json", "a.png"]).is_err());
        assert!(Cli::try_parse_from(["stipple", "--diagnostics", "--json", "a.png"]).is_ok());
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["stipple"]).is_err());
    }

    #[test]
    fn destination_follows_flags() {
        let cli = parse(&["--output-dir", "out", "a.png"]);
        assert_eq!(
            destination_from_cli(&cli),
            Destination::Directory(PathBuf::from("out"))
        );
        let cli = parse(&["--in-place", "a.png"]);
        assert_eq!(destination_from_cli(&cli), Destination::InPlace);
    }

    #[test]
    fn format_flag_parses_output_format() {
        assert_eq!(parse(&["a.png"]).format, OutputFormat::Png);
        let cli = parse(&["--format", "webp", "a.png"]);
        assert_eq!(cli.format, OutputFormat::WebP);
        let cli = parse(&["--format", "JPEG", "a.png"]);
        assert_eq!(cli.format, OutputFormat::Jpeg);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = Cli::try_parse_from(["stipple", "--format", "gif", "a.png"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("unsupported image format: gif"));
    }
}
