//! Layout constants for the certificate template.
//!
//! One renderer draws every certificate; the two presets differ only in
//! margins, font sizes and vertical positions. All distances are in
//! millimetres from the top-left corner, font sizes in points.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::color::Rgb;

/// A line of text: baseline position and font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextSlot {
    pub y: f32,
    pub size_pt: f32,
}

const fn slot(y: f32, size_pt: f32) -> TextSlot {
    TextSlot { y, size_pt }
}

/// A border rectangle inset from the page edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub inset: f32,
    pub line_width: f32,
}

/// Every constant the certificate layout needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub background: Rgb,
    pub outer_border: Border,
    pub inner_border: Border,

    /// Top edge of the logo; its width follows the image aspect ratio.
    pub logo_top: f32,
    pub logo_height: f32,

    pub title_text: String,
    pub title: TextSlot,
    pub subtitle_text: String,
    pub subtitle: TextSlot,
    pub name: TextSlot,
    /// Distance from the name baseline down to its underline.
    pub name_underline_gap: f32,
    pub name_underline_width: f32,
    pub lead_in_text: String,
    pub lead_in: TextSlot,
    pub course: TextSlot,
    pub date: TextSlot,
    pub course_hours: u32,
    pub institution: TextSlot,

    pub signature_top: f32,
    pub signature_width: f32,
    pub signature_height: f32,
    /// Gap between the bottom of the signature box and the signature rule.
    pub signature_rule_gap: f32,
    pub signature_rule_half_length: f32,
    pub signature_rule_width: f32,
    pub signer_title_text: String,
    /// Distance from the signature rule down to the signer title baseline.
    pub signer_title_gap: f32,
    pub signer_title_size_pt: f32,

    pub footer_size_pt: f32,
    /// Footer baseline measured up from the bottom edge.
    pub footer_bottom: f32,
    /// Horizontal inset of the footer texts.
    pub footer_side: f32,
}

impl TemplateLayout {
    /// Wide-margin template. This is the default.
    pub fn wide_margin() -> Self {
        Self {
            page_width: A4_LANDSCAPE_WIDTH,
            page_height: A4_LANDSCAPE_HEIGHT,
            background: Rgb::new(248, 250, 252),
            outer_border: Border { inset: 20.0, line_width: 2.0 },
            inner_border: Border { inset: 25.0, line_width: 0.8 },
            logo_top: 28.0,
            logo_height: 15.0,
            title_text: TITLE.to_string(),
            title: slot(55.0, 32.0),
            subtitle_text: "Se otorga a".to_string(),
            subtitle: slot(68.0, 18.0),
            name: slot(85.0, 26.0),
            name_underline_gap: 3.0,
            name_underline_width: 0.5,
            lead_in_text: "por haber completado satisfactoriamente el".to_string(),
            lead_in: slot(100.0, 14.0),
            course: slot(115.0, 20.0),
            date: slot(125.0, 12.0),
            course_hours: COURSE_HOURS,
            institution: slot(140.0, 16.0),
            signature_top: 150.0,
            signature_width: 50.0,
            signature_height: 20.0,
            signature_rule_gap: 5.0,
            signature_rule_half_length: 30.0,
            signature_rule_width: 0.3,
            signer_title_text: SIGNER_TITLE.to_string(),
            signer_title_gap: 6.0,
            signer_title_size_pt: 10.0,
            footer_size_pt: 8.0,
            footer_bottom: 15.0,
            footer_side: 20.0,
        }
    }

    /// Narrow-margin template with larger vertical spacing.
    pub fn narrow_margin() -> Self {
        Self {
            outer_border: Border { inset: 10.0, line_width: 3.0 },
            inner_border: Border { inset: 15.0, line_width: 1.0 },
            logo_top: 25.0,
            logo_height: 30.0,
            title: slot(45.0, 28.0),
            subtitle_text: "Se da constancia que".to_string(),
            subtitle: slot(60.0, 16.0),
            name: slot(80.0, 24.0),
            name_underline_gap: 5.0,
            lead_in_text: "ha completado satisfactoriamente el".to_string(),
            lead_in: slot(100.0, 14.0),
            course: slot(115.0, 18.0),
            date: slot(135.0, 12.0),
            institution: slot(155.0, 14.0),
            signature_top: 165.0,
            ..Self::wide_margin()
        }
    }

    pub fn center_x(&self) -> f32 {
        self.page_width / 2.0
    }

    /// Y of the rule under the signature.
    pub fn signature_rule_y(&self) -> f32 {
        self.signature_top + self.signature_height + self.signature_rule_gap
    }

    /// Baseline of the footer texts.
    pub fn footer_y(&self) -> f32 {
        self.page_height - self.footer_bottom
    }
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::wide_margin()
    }
}

/// A4 landscape, millimetres.
pub const A4_LANDSCAPE_WIDTH: f32 = 297.0;
pub const A4_LANDSCAPE_HEIGHT: f32 = 210.0;

/// Hours stated on every certificate.
pub const COURSE_HOURS: u32 = 120;

const TITLE: &str = "CONSTANCIA DE FINALIZACIÓN";
const SIGNER_TITLE: &str = "Director Académico";

/// Named template presets selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplatePreset {
    #[default]
    Wide,
    Narrow,
}

impl TemplatePreset {
    pub fn layout(self) -> TemplateLayout {
        match self {
            TemplatePreset::Wide => TemplateLayout::wide_margin(),
            TemplatePreset::Narrow => TemplateLayout::narrow_margin(),
        }
    }
}

impl FromStr for TemplatePreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wide" | "wide_margin" => Ok(TemplatePreset::Wide),
            "narrow" | "narrow_margin" => Ok(TemplatePreset::Narrow),
            other => Err(anyhow::anyhow!(
                "Unknown certificate template '{}' (expected 'wide' or 'narrow')",
                other
            )),
        }
    }
}
