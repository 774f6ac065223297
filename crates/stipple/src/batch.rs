//! Per-image batch processing: input discovery, output naming, and the
//! decode -> filter -> encode round for a single file.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use stipple_io::{CodecError, OutputFormat};
use stipple_pipeline::diagnostics::{self, Clock, FilterDiagnostics};
use stipple_pipeline::{FilterError, FilterRequest};

/// Why a single image could not be processed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Reading, decoding, encoding, or writing failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The filter rejected its parameters.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Where results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Next to each input, as `<stem>-<filter>.<ext>`.
    Beside,
    /// Into one directory, as `<stem>-<filter>.<ext>`.
    Directory(PathBuf),
    /// Over the input file itself.
    InPlace,
}

/// Expand the command-line inputs into a list of image files.
///
/// Files are kept as given. Directories are listed non-recursively and
/// contribute their entries with a supported image extension, in sorted
/// order, skipping earlier outputs whose stem already ends in
/// `-<suffix>`. Directories that cannot be listed are returned alongside
/// their I/O error; the remaining inputs are still collected.
pub fn collect_inputs(
    paths: &[PathBuf],
    suffix: &str,
) -> (Vec<PathBuf>, Vec<(PathBuf, std::io::Error)>) {
    let mut files = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        if path.is_dir() {
            match list_images(path, suffix) {
                Ok(found) => {
                    tracing::debug!(dir = %path.display(), count = found.len(), "listed directory");
                    files.extend(found);
                }
                Err(e) => failures.push((path.clone(), e)),
            }
        } else {
            files.push(path.clone());
        }
    }

    (files, failures)
}

fn list_images(dir: &Path, suffix: &str) -> std::io::Result<Vec<PathBuf>> {
    let marker = format!("-{suffix}");
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || OutputFormat::from_path(&path).is_none() {
            continue;
        }
        let stem = path.file_stem().map(|s| s.to_string_lossy());
        if stem.is_some_and(|s| s.ends_with(&marker)) {
            tracing::debug!(path = %path.display(), "skipping earlier output");
            continue;
        }
        found.push(path);
    }
    found.sort();
    Ok(found)
}

/// Output path for `input` under the given destination.
#[must_use]
pub fn output_path(
    input: &Path,
    destination: &Destination,
    suffix: &str,
    format: OutputFormat,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let name = format!("{stem}-{suffix}.{}", format.extension());

    match destination {
        Destination::Beside => input.with_file_name(name),
        Destination::Directory(dir) => dir.join(name),
        Destination::InPlace => input.to_path_buf(),
    }
}

/// Format to write for `input`.
///
/// In-place writes keep the input's own format when its extension names
/// one, so the file contents match the name.
#[must_use]
pub fn output_format(
    input: &Path,
    destination: &Destination,
    requested: OutputFormat,
) -> OutputFormat {
    match destination {
        Destination::InPlace => OutputFormat::from_path(input).unwrap_or(requested),
        Destination::Beside | Destination::Directory(_) => requested,
    }
}

/// Decode `input`, apply the requested filter, and write `output`.
///
/// With `clock` set, per-stage diagnostics are collected and returned.
///
/// # Errors
///
/// Returns [`ProcessError`] if any step fails. Nothing is written unless
/// the filter succeeded.
pub fn process_image<C: Clock>(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    request: &FilterRequest,
    clock: Option<&C>,
) -> Result<Option<FilterDiagnostics>, ProcessError> {
    let image = stipple_io::decode(input)?;

    let (filtered, diagnostics) = match clock {
        Some(clock) => {
            let (out, diag) = diagnostics::apply_with_diagnostics(
                &image,
                &request.filter,
                &request.config,
                clock,
            )?;
            (out, Some(diag))
        }
        None => (
            stipple_pipeline::apply(&image, &request.filter, &request.config)?,
            None,
        ),
    };

    stipple_io::encode(&filtered, format, output)?;
    Ok(diagnostics)
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgba, RgbaImage};
    use stipple_pipeline::{Filter, FilterConfig, StippleStyle};

    use super::*;

    fn write_png(path: &Path) {
        let img = RgbaImage::from_fn(30, 30, |x, y| {
            if (10..20).contains(&x) && (10..20).contains(&y) {
                Rgba([20, 20, 20, 255])
            } else {
                Rgba([230, 230, 230, 255])
            }
        });
        stipple_io::encode(&img, OutputFormat::Png, path).unwrap();
    }

    fn stipple_request() -> FilterRequest {
        FilterRequest {
            filter: Filter::Stipple {
                style: StippleStyle::BlackOnWhite,
                clean: 4,
            },
            config: FilterConfig {
                blur_radius: 3,
                ..FilterConfig::default()
            },
        }
    }

    #[test]
    fn output_names_carry_filter_suffix() {
        let input = Path::new("shots/cat.jpeg");
        assert_eq!(
            output_path(
                input,
                &Destination::Beside,
                "white-figure",
                OutputFormat::Png
            ),
            PathBuf::from("shots/cat-white-figure.png")
        );
        assert_eq!(
            output_path(
                input,
                &Destination::Directory(PathBuf::from("out")),
                "invert",
                OutputFormat::Jpeg
            ),
            PathBuf::from("out/cat-invert.jpg")
        );
        assert_eq!(
            output_path(input, &Destination::InPlace, "invert", OutputFormat::Png),
            PathBuf::from("shots/cat.jpeg")
        );
    }

    #[test]
    fn in_place_keeps_input_format() {
        let input = Path::new("cat.bmp");
        assert_eq!(
            output_format(input, &Destination::InPlace, OutputFormat::Png),
            OutputFormat::Bmp
        );
        assert_eq!(
            output_format(input, &Destination::Beside, OutputFormat::WebP),
            OutputFormat::WebP
        );
    }

    #[test]
    fn directories_are_listed_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.webp"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let (files, failures) = collect_inputs(&[dir.path().to_path_buf()], "invert");
        assert!(failures.is_empty());
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.JPG", "b.png", "c.webp"]);
    }

    #[test]
    fn directory_listing_skips_earlier_outputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "cat.png",
            "cat-black-on-white.png",
            "cat-white-figure.png",
            "dog.jpg",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let (files, _) = collect_inputs(&[dir.path().to_path_buf()], "black-on-white");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["cat-white-figure.png", "cat.png", "dog.jpg"]);
    }

    #[test]
    fn explicit_files_are_kept_as_given() {
        let files = vec![PathBuf::from("z.png"), PathBuf::from("readme")];
        let (collected, failures) = collect_inputs(&files, "invert");
        assert_eq!(collected, files);
        assert!(failures.is_empty());
    }

    #[test]
    fn process_image_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("square.png");
        let output = dir.path().join("square-black-on-white.png");
        write_png(&input);

        let diag = process_image::<StdClock>(
            &input,
            &output,
            OutputFormat::Png,
            &stipple_request(),
            None,
        )
        .unwrap();
        assert!(diag.is_none());

        let out = stipple_io::decode(&output).unwrap();
        assert_eq!(out.dimensions(), (30, 30));
    }

    #[test]
    fn process_image_collects_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("square.png");
        let output = dir.path().join("out.png");
        write_png(&input);

        let diag = process_image(
            &input,
            &output,
            OutputFormat::Png,
            &stipple_request(),
            Some(&StdClock),
        )
        .unwrap()
        .unwrap();
        assert!(diag.stage_duration("Blur").is_some());
    }

    #[test]
    fn invalid_clean_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("square.png");
        let output = dir.path().join("out.png");
        write_png(&input);

        let request = FilterRequest {
            filter: Filter::Stipple {
                style: StippleStyle::WhiteFigure,
                clean: 2,
            },
            config: FilterConfig::default(),
        };
        let result = process_image::<StdClock>(&input, &output, OutputFormat::Png, &request, None);
        assert!(matches!(result, Err(ProcessError::Filter(_))));
        assert!(!output.exists());
    }

    #[test]
    fn undecodable_input_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not an image").unwrap();

        let result = process_image::<StdClock>(
            &input,
            &dir.path().join("out.png"),
            OutputFormat::Png,
            &stipple_request(),
            None,
        );
        assert!(matches!(
            result,
            Err(ProcessError::Codec(CodecError::Decode { .. }))
        ));
    }
}
