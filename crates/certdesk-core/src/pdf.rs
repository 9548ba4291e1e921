// PDF backend for the certificate renderer (printpdf)

use anyhow::{anyhow, Context, Result};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon,
};
use std::path::{Path, PathBuf};

use crate::color::Rgb;
use crate::surface::{FontWeight, RasterImage, Rect, Surface, TextStyle};
use crate::types::safe_file_name;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// Resolution used to size embedded images.
const IMAGE_DPI: f32 = 300.0;

/// A rendered certificate held in memory.
#[derive(Debug, Clone)]
pub struct CertificateDocument {
    bytes: Vec<u8>,
    file_name: String,
}

impl CertificateDocument {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
        }
    }

    /// Raw PDF bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested download name (`Certificado_<names>_<surnames>.pdf`).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Writes the PDF into `dir` under its suggested name and returns the path.
    ///
    /// The name is reduced to a single path component first, so the file
    /// always lands directly inside `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let name = safe_file_name(&self.file_name)
            .ok_or_else(|| anyhow!("Unusable file name '{}'", self.file_name))?;
        let path = dir.join(name);
        self.save_as(&path)?;
        Ok(path)
    }

    /// Writes the PDF to an explicit path.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))
    }
}

/// [`Surface`] drawing onto a single-page printpdf document.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    page_height: f32,
}

impl PdfSurface {
    pub fn new(title: &str, page_width: f32, page_height: f32) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(page_width), Mm(page_height), "Certificate");
        let layer = doc.get_page(page).get_layer(layer);

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load Helvetica: {:?}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load Helvetica-Bold: {:?}", e))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            page_height,
        })
    }

    /// Serializes the document.
    pub fn finish(self, file_name: String) -> Result<CertificateDocument> {
        let bytes = self
            .doc
            .save_to_bytes()
            .map_err(|e| anyhow!("Failed to serialize PDF: {:?}", e))?;
        Ok(CertificateDocument::new(bytes, file_name))
    }

    /// Converts a top-left based point to printpdf coordinates.
    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(Mm(x), Mm(self.page_height - y))
    }

    fn corners(&self, rect: Rect) -> Vec<(Point, bool)> {
        vec![
            (self.point(rect.x, rect.y), false),
            (self.point(rect.x + rect.width, rect.y), false),
            (self.point(rect.x + rect.width, rect.y + rect.height), false),
            (self.point(rect.x, rect.y + rect.height), false),
        ]
    }
}

fn pdf_color(color: Rgb) -> Color {
    let (r, g, b) = color.to_unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

impl Surface for PdfSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_polygon(Polygon {
            rings: vec![self.corners(rect)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, line_width: f32) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(line_width * PT_PER_MM);
        self.layer.add_line(Line {
            points: self.corners(rect),
            is_closed: true,
        });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, line_width: f32) {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(line_width * PT_PER_MM);
        self.layer.add_line(Line {
            points: vec![
                (self.point(from.0, from.1), false),
                (self.point(to.0, to.1), false),
            ],
            is_closed: false,
        });
    }

    fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        let font = match style.weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        };
        self.layer.set_fill_color(pdf_color(style.color));
        self.layer
            .use_text(text, style.size_pt, Mm(x), Mm(self.page_height - y), font);
    }

    fn image(&mut self, image: &RasterImage, rect: Rect) {
        let natural_width = image.width_px() as f32 / IMAGE_DPI * 25.4;
        let natural_height = image.height_px() as f32 / IMAGE_DPI * 25.4;
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return;
        }

        Image::from_dynamic_image(&image.to_dynamic()).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x)),
                translate_y: Some(Mm(self.page_height - rect.y - rect.height)),
                scale_x: Some(rect.width / natural_width),
                scale_y: Some(rect.height / natural_height),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;

    #[test]
    fn test_empty_page_serializes() {
        let surface = PdfSurface::new("t", 297.0, 210.0).unwrap();
        let doc = surface.finish("t.pdf".to_string()).unwrap();
        assert!(doc.to_bytes().starts_with(b"%PDF"));
        assert_eq!(doc.file_name(), "t.pdf");
    }

    #[test]
    fn test_all_operations_serialize() {
        let mut surface = PdfSurface::new("t", 297.0, 210.0).unwrap();
        let black = Rgb::new(0, 0, 0);
        surface.fill_rect(Rect::new(0.0, 0.0, 297.0, 210.0), Rgb::new(248, 250, 252));
        surface.stroke_rect(Rect::new(20.0, 20.0, 257.0, 170.0), black, 2.0);
        surface.line((10.0, 10.0), (50.0, 10.0), black, 0.5);
        surface.text(
            "Hola",
            10.0,
            20.0,
            TextStyle {
                weight: FontWeight::Bold,
                size_pt: 12.0,
                color: black,
            },
        );
        let image = RasterImage::decode(&png_bytes(8, 4, [200, 0, 0, 255])).unwrap();
        surface.image(&image, Rect::new(100.0, 30.0, 40.0, 20.0));
        let doc = surface.finish("t.pdf".to_string()).unwrap();
        assert!(doc.to_bytes().len() > 100);
    }

    #[test]
    fn test_save_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("certdesk-pdf-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let doc = CertificateDocument::new(b"%PDF-1.3 test".to_vec(), "Certificado_A_B.pdf");
        let path = doc.save(&dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "Certificado_A_B.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3 test");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_save_stays_inside_dir() {
        let root = std::env::temp_dir().join(format!("certdesk-pdf-esc-{}", std::process::id()));
        let dir = root.join("out");
        std::fs::create_dir_all(&dir).unwrap();

        let doc = CertificateDocument::new(b"%PDF-1.3 test".to_vec(), "../escaped.pdf");
        let path = doc.save(&dir).unwrap();
        assert_eq!(path.parent().unwrap(), dir.as_path());
        assert!(!root.join("escaped.pdf").exists());

        let doc = CertificateDocument::new(b"%PDF-1.3 test".to_vec(), "..");
        assert!(doc.save(&dir).is_err());
        std::fs::remove_dir_all(&root).unwrap();
    }
}
