//! Pure Rust codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honored) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6, quality honored) |
//! | Encode → everything else | `DynamicImage::write_to` (quality ignored) |
//!
//! JPEG and AVIF have no quality 0; a configured 0 is encoded as 1.

use super::codec::{Codec, CodecError};
use super::params::EncodeOptions;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Codec over [`DynamicImage`].
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a payload format string (`"png"`, `"jpg"`, ...) to an encodable format.
pub fn output_format(format: &str) -> Result<ImageFormat, CodecError> {
    ImageFormat::from_extension(format.to_ascii_lowercase())
        .filter(|f| f.writing_enabled())
        .ok_or_else(|| CodecError::UnsupportedFormat(format.to_string()))
}

/// JPEG has no alpha channel and only takes 8-bit samples.
fn to_rgb8_if_needed(img: &DynamicImage) -> Option<DynamicImage> {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => None,
        other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// WebP and AVIF encoders want 8-bit RGB or RGBA.
fn to_rgba8_if_needed(img: &DynamicImage) -> Option<DynamicImage> {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => None,
        other => Some(DynamicImage::ImageRgba8(other.to_rgba8())),
    }
}

fn encode_error(format: ImageFormat, e: image::ImageError) -> CodecError {
    CodecError::Encode(format!("{format:?}: {e}"))
}

impl Codec for RustCodec {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: &str,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let target = output_format(format)?;
        let quality = options.quality.value().max(1) as u8;
        let mut buf = Vec::new();

        match target {
            ImageFormat::Jpeg => {
                let converted = to_rgb8_if_needed(image);
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
                converted
                    .as_ref()
                    .unwrap_or(image)
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageFormat::Avif => {
                let converted = to_rgba8_if_needed(image);
                let encoder =
                    image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut buf, 6, quality);
                converted
                    .as_ref()
                    .unwrap_or(image)
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(target, e))?;
            }
            ImageFormat::WebP | ImageFormat::Gif => {
                let converted = to_rgba8_if_needed(image);
                converted
                    .as_ref()
                    .unwrap_or(image)
                    .write_to(&mut Cursor::new(&mut buf), target)
                    .map_err(|e| encode_error(target, e))?;
            }
            other => {
                image
                    .write_to(&mut Cursor::new(&mut buf), other)
                    .map_err(|e| encode_error(other, e))?;
            }
        }

        Ok(buf)
    }
}
