//! Shared test utilities: synthetic image payloads.
//!
//! Images are generated in memory so tests need no fixture files.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Gradient test image: red follows x, green follows y.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// PNG bytes of a `width` x `height` gradient.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Png)
}

/// JPEG bytes of a `width` x `height` gradient.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Jpeg)
}
