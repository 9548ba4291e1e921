//! Certificate layout routine.
//!
//! [`draw_certificate`] issues a fixed sequence of drawing calls against a
//! [`Surface`]; [`render_certificate`] runs it on the PDF backend. Missing
//! images are skipped and never fail rendering.

use anyhow::Result;
use chrono::{Datelike, NaiveDate};

use crate::color::{primary_or_default, Rgb};
use crate::layout::{Border, TemplateLayout, TextSlot};
use crate::metrics::text_width_mm;
use crate::pdf::{CertificateDocument, PdfSurface};
use crate::surface::{FontWeight, RasterImage, Rect, Surface, TextStyle};
use crate::types::{Branding, CertificatePayload};

const GREY: Rgb = Rgb::new(100, 100, 100);
const DARK_GREY: Rgb = Rgb::new(60, 60, 60);

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Images fetched ahead of rendering. Either may be absent.
#[derive(Debug, Clone, Default)]
pub struct CertificateAssets {
    pub logo: Option<RasterImage>,
    pub signature: Option<RasterImage>,
}

/// Formats a date the way Spanish long dates read: "15 de marzo de 2025".
pub fn format_date_es(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS_ES[date.month0() as usize],
        date.year()
    )
}

/// Public validation link printed in the footer.
pub fn validation_url(origin: &str, code: &str) -> String {
    format!("{}/?validate={}", origin.trim_end_matches('/'), code)
}

/// Renders a certificate to an in-memory PDF document.
pub fn render_certificate(
    payload: &CertificatePayload,
    branding: &Branding,
    assets: &CertificateAssets,
    layout: &TemplateLayout,
    validation_origin: &str,
) -> Result<CertificateDocument> {
    let mut surface = PdfSurface::new(&payload.file_name(), layout.page_width, layout.page_height)?;
    draw_certificate(&mut surface, layout, payload, branding, assets, validation_origin);
    surface.finish(payload.file_name())
}

/// Draws the full certificate onto `surface`.
pub fn draw_certificate<S: Surface>(
    surface: &mut S,
    layout: &TemplateLayout,
    payload: &CertificatePayload,
    branding: &Branding,
    assets: &CertificateAssets,
    validation_origin: &str,
) {
    let primary = primary_or_default(&branding.primary_color);
    let center = layout.center_x();

    surface.fill_rect(
        Rect::new(0.0, 0.0, layout.page_width, layout.page_height),
        layout.background,
    );
    stroke_border(surface, layout, layout.outer_border, primary);
    stroke_border(surface, layout, layout.inner_border, primary);

    if let Some(logo) = &assets.logo {
        let width = layout.logo_height * logo.aspect_ratio();
        let x = (layout.page_width - width) / 2.0;
        surface.image(logo, Rect::new(x, layout.logo_top, width, layout.logo_height));
    }

    centered(surface, center, &layout.title_text, layout.title, FontWeight::Bold, primary);
    centered(surface, center, &layout.subtitle_text, layout.subtitle, FontWeight::Regular, GREY);

    let student = payload.full_name().to_uppercase();
    let name_width = centered(surface, center, &student, layout.name, FontWeight::Bold, primary);
    let underline_y = layout.name.y + layout.name_underline_gap;
    surface.line(
        ((layout.page_width - name_width) / 2.0, underline_y),
        ((layout.page_width + name_width) / 2.0, underline_y),
        primary,
        layout.name_underline_width,
    );

    centered(surface, center, &layout.lead_in_text, layout.lead_in, FontWeight::Regular, DARK_GREY);
    centered(surface, center, &payload.course, layout.course, FontWeight::Bold, primary);

    let date_line = format!(
        "Otorgado el {} con una intensidad de {} horas",
        format_date_es(payload.issue_date),
        layout.course_hours
    );
    centered(surface, center, &date_line, layout.date, FontWeight::Regular, DARK_GREY);
    centered(
        surface,
        center,
        &branding.institution_name,
        layout.institution,
        FontWeight::Bold,
        primary,
    );

    if let Some(signature) = &assets.signature {
        let x = (layout.page_width - layout.signature_width) / 2.0;
        surface.image(
            signature,
            Rect::new(x, layout.signature_top, layout.signature_width, layout.signature_height),
        );
    }

    let rule_y = layout.signature_rule_y();
    surface.line(
        (center - layout.signature_rule_half_length, rule_y),
        (center + layout.signature_rule_half_length, rule_y),
        GREY,
        layout.signature_rule_width,
    );
    centered(
        surface,
        center,
        &layout.signer_title_text,
        TextSlot {
            y: rule_y + layout.signer_title_gap,
            size_pt: layout.signer_title_size_pt,
        },
        FontWeight::Regular,
        GREY,
    );

    let footer = TextStyle {
        weight: FontWeight::Regular,
        size_pt: layout.footer_size_pt,
        color: GREY,
    };
    let footer_y = layout.footer_y();
    surface.text(
        &format!("Código: {}", payload.code),
        layout.footer_side,
        footer_y,
        footer,
    );

    let validate = format!("Validar en: {}", validation_url(validation_origin, &payload.code));
    let validate_width = text_width_mm(&validate, footer.weight, footer.size_pt);
    surface.text(
        &validate,
        layout.page_width - layout.footer_side - validate_width,
        footer_y,
        footer,
    );
}

fn stroke_border<S: Surface>(surface: &mut S, layout: &TemplateLayout, border: Border, color: Rgb) {
    let rect = Rect::new(
        border.inset,
        border.inset,
        layout.page_width - 2.0 * border.inset,
        layout.page_height - 2.0 * border.inset,
    );
    surface.stroke_rect(rect, color, border.line_width);
}

/// Draws horizontally centred text and returns its width.
fn centered<S: Surface>(
    surface: &mut S,
    center_x: f32,
    text: &str,
    slot: TextSlot,
    weight: FontWeight,
    color: Rgb,
) -> f32 {
    let width = text_width_mm(text, weight, slot.size_pt);
    surface.text(
        text,
        center_x - width / 2.0,
        slot.y,
        TextStyle {
            weight,
            size_pt: slot.size_pt,
            color,
        },
    );
    width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOp, RecordingSurface};
    use crate::testing::png_bytes;

    fn payload() -> CertificatePayload {
        CertificatePayload {
            names: "Ana María".to_string(),
            surnames: "Pérez".to_string(),
            course: "Diplomado en Docencia Virtual".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            code: "CERT-123456-ABC123".to_string(),
        }
    }

    fn branding() -> Branding {
        Branding {
            institution_name: "CEI VIRTUAL".to_string(),
            logo_url: String::new(),
            signature_url: String::new(),
            primary_color: "#8a1538".to_string(),
        }
    }

    fn assets() -> CertificateAssets {
        CertificateAssets {
            logo: Some(RasterImage::decode(&png_bytes(60, 20, [0, 0, 0, 255])).unwrap()),
            signature: Some(RasterImage::decode(&png_bytes(50, 20, [0, 0, 0, 255])).unwrap()),
        }
    }

    fn draw(assets: &CertificateAssets, layout: &TemplateLayout) -> RecordingSurface {
        let mut surface = RecordingSurface::new();
        draw_certificate(
            &mut surface,
            layout,
            &payload(),
            &branding(),
            assets,
            "https://certs.example.org/",
        );
        surface
    }

    #[test]
    fn test_format_date_es() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(format_date_es(date), "15 de marzo de 2025");
        let date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(format_date_es(date), "1 de diciembre de 2024");
    }

    #[test]
    fn test_validation_url_trims_trailing_slash() {
        assert_eq!(
            validation_url("https://certs.example.org/", "CERT-1"),
            "https://certs.example.org/?validate=CERT-1"
        );
        assert_eq!(
            validation_url("http://localhost:8080", "CERT-1"),
            "http://localhost:8080/?validate=CERT-1"
        );
    }

    #[test]
    fn test_text_sequence() {
        let surface = draw(&CertificateAssets::default(), &TemplateLayout::wide_margin());
        assert_eq!(
            surface.texts(),
            vec![
                "CONSTANCIA DE FINALIZACIÓN",
                "Se otorga a",
                "ANA MARÍA PÉREZ",
                "por haber completado satisfactoriamente el",
                "Diplomado en Docencia Virtual",
                "Otorgado el 15 de marzo de 2025 con una intensidad de 120 horas",
                "CEI VIRTUAL",
                "Director Académico",
                "Código: CERT-123456-ABC123",
                "Validar en: https://certs.example.org/?validate=CERT-123456-ABC123",
            ]
        );
    }

    #[test]
    fn test_missing_images_only_drop_images() {
        let layout = TemplateLayout::wide_margin();
        let without = draw(&CertificateAssets::default(), &layout);
        let with = draw(&assets(), &layout);

        assert!(without.images().is_empty());
        assert_eq!(with.images().len(), 2);

        let non_image = |s: &RecordingSurface| -> Vec<DrawOp> {
            s.ops
                .iter()
                .filter(|op| !matches!(op, DrawOp::Image { .. }))
                .cloned()
                .collect()
        };
        assert_eq!(non_image(&without), non_image(&with));
    }

    #[test]
    fn test_logo_is_centered_with_aspect_ratio() {
        let layout = TemplateLayout::wide_margin();
        let surface = draw(&assets(), &layout);
        let logo = surface.images()[0];
        assert_eq!(logo.height, 15.0);
        assert!((logo.width - 45.0).abs() < 1e-4);
        assert!((logo.x + logo.width / 2.0 - layout.center_x()).abs() < 1e-4);
        assert_eq!(logo.y, layout.logo_top);
    }

    #[test]
    fn test_signature_box() {
        let layout = TemplateLayout::narrow_margin();
        let surface = draw(&assets(), &layout);
        let signature = surface.images()[1];
        assert_eq!(signature, Rect::new(123.5, 165.0, 50.0, 20.0));
    }

    #[test]
    fn test_name_underline_matches_text_width() {
        let layout = TemplateLayout::wide_margin();
        let surface = draw(&CertificateAssets::default(), &layout);

        let name_width = text_width_mm("ANA MARÍA PÉREZ", FontWeight::Bold, layout.name.size_pt);
        let underline = surface
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Line { from, to, .. }
                    if from.1 == layout.name.y + layout.name_underline_gap =>
                {
                    Some((*from, *to))
                }
                _ => None,
            })
            .expect("underline drawn");

        assert!(((underline.1 .0 - underline.0 .0) - name_width).abs() < 1e-3);
        assert!(((underline.0 .0 + underline.1 .0) / 2.0 - layout.center_x()).abs() < 1e-3);
    }

    #[test]
    fn test_primary_color_applied_and_fallback() {
        let surface = draw(&CertificateAssets::default(), &TemplateLayout::wide_margin());
        let border_color = surface.ops.iter().find_map(|op| match op {
            DrawOp::StrokeRect { color, .. } => Some(*color),
            _ => None,
        });
        assert_eq!(border_color, Some(Rgb::new(0x8a, 0x15, 0x38)));

        let mut bad = branding();
        bad.primary_color = "not-a-color".to_string();
        let mut surface = RecordingSurface::new();
        draw_certificate(
            &mut surface,
            &TemplateLayout::wide_margin(),
            &payload(),
            &bad,
            &CertificateAssets::default(),
            "http://localhost",
        );
        let border_color = surface.ops.iter().find_map(|op| match op {
            DrawOp::StrokeRect { color, .. } => Some(*color),
            _ => None,
        });
        assert_eq!(border_color, Some(Rgb::DEFAULT_PRIMARY));
    }

    #[test]
    fn test_footer_validation_is_right_aligned() {
        let layout = TemplateLayout::wide_margin();
        let surface = draw(&CertificateAssets::default(), &layout);
        let (text, x) = surface
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, x, .. } if text.starts_with("Validar en:") => {
                    Some((text.clone(), *x))
                }
                _ => None,
            })
            .unwrap();
        let width = text_width_mm(&text, FontWeight::Regular, layout.footer_size_pt);
        assert!((x + width - (layout.page_width - layout.footer_side)).abs() < 1e-3);
    }

    #[test]
    fn test_render_certificate_produces_pdf_without_assets() {
        let doc = render_certificate(
            &payload(),
            &branding(),
            &CertificateAssets::default(),
            &TemplateLayout::default(),
            "http://localhost:8080",
        )
        .unwrap();
        assert!(doc.to_bytes().starts_with(b"%PDF"));
        assert_eq!(doc.file_name(), "Certificado_Ana María_Pérez.pdf");
    }

    #[test]
    fn test_render_certificate_with_assets() {
        let doc = render_certificate(
            &payload(),
            &branding(),
            &assets(),
            &TemplateLayout::narrow_margin(),
            "http://localhost:8080",
        )
        .unwrap();
        assert!(doc.to_bytes().starts_with(b"%PDF"));
    }
}
