//! stipple-io: the codec boundary between files and pixel buffers.
//!
//! Decodes PNG, JPEG, BMP and WebP files into [`RgbaImage`] buffers for
//! `stipple-pipeline`, and encodes results back. Every failure is
//! returned as a [`CodecError`]; nothing here logs and carries on.

pub mod format;

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use stipple_pipeline::RgbaImage;

pub use format::OutputFormat;

/// Errors that can occur while reading or writing images.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input image data was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The data is not a supported or well-formed raster image.
    #[error("failed to decode {origin}: {source}")]
    Decode {
        /// Where the data came from (a path, or `<memory>`).
        origin: String,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// Encoding to the requested format failed.
    #[error("failed to encode {format}: {source}")]
    Encode {
        /// Requested output format.
        format: OutputFormat,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// The destination file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A format name or extension that the codec does not handle.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Decode an image file into an RGBA buffer.
///
/// The format is sniffed from the file contents, not the extension.
///
/// # Errors
///
/// Returns [`CodecError::Read`] if the file cannot be read,
/// [`CodecError::EmptyInput`] if it is empty, and [`CodecError::Decode`]
/// if it is not a supported, well-formed image.
pub fn decode(path: &Path) -> Result<RgbaImage, CodecError> {
    let bytes = std::fs::read(path).map_err(|source| CodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decode_from(&bytes, &path.display().to_string())?;
    tracing::debug!(
        path = %path.display(),
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "decoded image"
    );
    Ok(image)
}

/// Decode in-memory image bytes into an RGBA buffer.
///
/// # Errors
///
/// Returns [`CodecError::EmptyInput`] if `bytes` is empty and
/// [`CodecError::Decode`] if the data is not a supported image.
pub fn decode_bytes(bytes: &[u8]) -> Result<RgbaImage, CodecError> {
    decode_from(bytes, "<memory>")
}

fn decode_from(bytes: &[u8], origin: &str) -> Result<RgbaImage, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyInput);
    }
    let image = image::load_from_memory(bytes).map_err(|source| CodecError::Decode {
        origin: origin.to_string(),
        source,
    })?;
    Ok(image.into_rgba8())
}

/// Encode an RGBA buffer in the given format.
///
/// JPEG output drops the alpha channel.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the encoder rejects the image.
pub fn encode_to_vec(image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    let result = if format.supports_alpha() {
        image.write_to(&mut buf, format.to_image_format())
    } else {
        DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .write_to(&mut buf, format.to_image_format())
    };
    result.map_err(|source| CodecError::Encode { format, source })?;
    Ok(buf.into_inner())
}

/// Encode an RGBA buffer and write it to `path`.
///
/// The file is written in `format` regardless of the path's extension.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if encoding fails and
/// [`CodecError::Write`] if the file cannot be written.
pub fn encode(image: &RgbaImage, format: OutputFormat, path: &Path) -> Result<(), CodecError> {
    let bytes = encode_to_vec(image, format)?;
    std::fs::write(path, &bytes).map_err(|source| CodecError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        %format,
        bytes = bytes.len(),
        "encoded image"
    );
    Ok(())
}
