// Test fixtures

use printpdf::image_crate::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Encodes a solid-color PNG.
pub fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}
