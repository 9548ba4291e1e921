//! Drawing surface abstraction for the certificate renderer.
//!
//! Coordinates are millimetres with the origin at the top-left corner of
//! the page and `y` growing downwards; text `y` is the baseline. The PDF
//! backend flips the axis.

use anyhow::{Context, Result};
use printpdf::image_crate::{self, DynamicImage, GenericImageView, Rgb as PixelRgb, RgbImage};

use crate::color::Rgb;

/// Font weight for the Helvetica family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Axis-aligned rectangle in page millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Text appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size_pt: f32,
    pub color: Rgb,
}

/// A decoded raster image ready to be placed on a page.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    /// Decodes PNG/JPEG/GIF/WebP bytes. Transparent pixels are flattened
    /// onto white.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image_crate::load_from_memory(bytes).context("Failed to decode image")?;
        Ok(Self::from_dynamic(&image))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        let rgba = image.to_rgba8();
        let mut pixels = RgbImage::new(width, height);

        for (x, y, px) in rgba.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let alpha = u16::from(a);
            let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
            pixels.put_pixel(x, y, PixelRgb([blend(r), blend(g), blend(b)]));
        }

        Self { pixels }
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }

    /// Width divided by height; 1.0 for degenerate images.
    pub fn aspect_ratio(&self) -> f32 {
        if self.pixels.height() == 0 {
            1.0
        } else {
            self.pixels.width() as f32 / self.pixels.height() as f32
        }
    }

    pub(crate) fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.pixels.clone())
    }
}

/// Something the certificate layout can be drawn onto.
pub trait Surface {
    /// Fills a rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    /// Strokes the outline of a rectangle; `line_width` is in millimetres.
    fn stroke_rect(&mut self, rect: Rect, color: Rgb, line_width: f32);

    /// Draws a straight line; `line_width` is in millimetres.
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, line_width: f32);

    /// Draws text with its left edge at `x` and baseline at `y`.
    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle);

    /// Places an image scaled to fill `rect`.
    fn image(&mut self, image: &RasterImage, rect: Rect);
}

/// A drawing operation captured by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect { rect: Rect, color: Rgb },
    StrokeRect { rect: Rect, color: Rgb, line_width: f32 },
    Line { from: (f32, f32), to: (f32, f32), color: Rgb, line_width: f32 },
    Text { text: String, x: f32, y: f32, style: TextStyle },
    Image { rect: Rect, width_px: u32, height_px: u32 },
}

/// Surface that records operations instead of drawing them.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All text runs, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rectangles of all placed images, in drawing order.
    pub fn images(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, line_width: f32) {
        self.ops.push(DrawOp::StrokeRect { rect, color, line_width });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, line_width: f32) {
        self.ops.push(DrawOp::Line { from, to, color, line_width });
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            style,
        });
    }

    fn image(&mut self, image: &RasterImage, rect: Rect) {
        self.ops.push(DrawOp::Image {
            rect,
            width_px: image.width_px(),
            height_px: image.height_px(),
        });
    }
}
