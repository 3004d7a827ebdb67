//! Image output for rendered float buffers.
//!
//! The renderer hands over a dense row-major RGB float buffer covering
//! `bounds`; the output format is chosen from the file extension.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lumen_math::{Bounds2i, IVec2};
use thiserror::Error;

/// Errors that can occur while writing an image.
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Buffer holds {actual} floats, expected {expected} for a {width}x{height} image")]
    SizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
}

pub type ImageIoResult<T> = Result<T, ImageIoError>;

/// Write `rgb` (three floats per pixel, row-major, top row first) to `path`.
///
/// Supported extensions: `png` (sRGB-encoded 8-bit), `exr` (32-bit float) and
/// `pfm` (32-bit float, rows stored bottom-up as the format requires).
pub fn write_image(
    path: impl AsRef<Path>,
    rgb: &[f32],
    bounds: Bounds2i,
    full_resolution: IVec2,
) -> ImageIoResult<()> {
    let path = path.as_ref();
    let extent = bounds.diagonal();
    let (width, height) = (extent.x as u32, extent.y as u32);

    let expected = 3 * width as usize * height as usize;
    if rgb.len() != expected {
        return Err(ImageIoError::SizeMismatch {
            actual: rgb.len(),
            expected,
            width,
            height,
        });
    }

    if extent != full_resolution {
        log::debug!(
            "Writing {}x{} crop at ({}, {}) of a {}x{} image",
            width,
            height,
            bounds.min.x,
            bounds.min.y,
            full_resolution.x,
            full_resolution.y
        );
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => write_png(path, rgb, width, height)?,
        "exr" => write_exr(path, rgb, width, height)?,
        "pfm" => write_pfm(path, rgb, width, height)?,
        other => return Err(ImageIoError::UnsupportedFormat(other.to_string())),
    }

    log::info!("Wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}

/// Linear to sRGB transfer function.
pub fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn to_srgb8(v: f32) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (255.0 * linear_to_srgb(v.max(0.0))).round().min(255.0) as u8
}

fn write_png(path: &Path, rgb: &[f32], width: u32, height: u32) -> ImageIoResult<()> {
    let bytes: Vec<u8> = rgb.iter().map(|&v| to_srgb8(v)).collect();
    let img = image::RgbImage::from_raw(width, height, bytes).ok_or(ImageIoError::SizeMismatch {
        actual: rgb.len(),
        expected: 3 * (width * height) as usize,
        width,
        height,
    })?;
    img.save(path)?;
    Ok(())
}

fn write_exr(path: &Path, rgb: &[f32], width: u32, height: u32) -> ImageIoResult<()> {
    let img = image::Rgb32FImage::from_raw(width, height, rgb.to_vec()).ok_or(
        ImageIoError::SizeMismatch {
            actual: rgb.len(),
            expected: 3 * (width * height) as usize,
            width,
            height,
        },
    )?;
    image::DynamicImage::ImageRgb32F(img).save(path)?;
    Ok(())
}

fn write_pfm(path: &Path, rgb: &[f32], width: u32, height: u32) -> ImageIoResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    encode_pfm(&mut out, rgb, width, height)?;
    out.flush()?;
    Ok(())
}

/// PFM body: header, then rows from the bottom of the image to the top.
/// A negative scale marks little-endian samples.
fn encode_pfm<W: Write>(out: &mut W, rgb: &[f32], width: u32, height: u32) -> std::io::Result<()> {
    let scale = if cfg!(target_endian = "little") { -1.0 } else { 1.0 };
    write!(out, "PF\n{} {}\n{}\n", width, height, scale)?;

    let row_len = 3 * width as usize;
    if row_len == 0 {
        return Ok(());
    }
    for row in rgb.chunks_exact(row_len).rev() {
        out.write_all(bytemuck::cast_slice(row))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(to_srgb8(0.0), 0);
        assert_eq!(to_srgb8(1.0), 255);
        assert_eq!(to_srgb8(4.0), 255);
        assert_eq!(to_srgb8(-1.0), 0);
        assert_eq!(to_srgb8(f32::NAN), 0);
        // Mid grey encodes well above 127
        assert!(to_srgb8(0.2) > 110);
    }

    #[test]
    fn test_pfm_layout() {
        // 1x2 image: top pixel red, bottom pixel blue
        let rgb = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let mut bytes = Vec::new();
        encode_pfm(&mut bytes, &rgb, 1, 2).unwrap();

        let header = if cfg!(target_endian = "little") {
            "PF\n1 2\n-1\n"
        } else {
            "PF\n1 2\n1\n"
        };
        assert!(bytes.starts_with(header.as_bytes()));

        let body: Vec<f32> = bytes[header.len()..]
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        // Bottom row first
        assert_eq!(body, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_size_mismatch() {
        let bounds = Bounds2i::from_resolution(IVec2::new(2, 2));
        let result = write_image("unused.png", &[0.0; 3], bounds, IVec2::new(2, 2));
        assert!(matches!(result, Err(ImageIoError::SizeMismatch { expected: 12, .. })));
    }

    #[test]
    fn test_unsupported_extension() {
        let bounds = Bounds2i::from_resolution(IVec2::new(1, 1));
        let result = write_image("out.bmpx", &[0.0; 3], bounds, IVec2::new(1, 1));
        assert!(matches!(result, Err(ImageIoError::UnsupportedFormat(_))));
    }
}
