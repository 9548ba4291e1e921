// Hex color parsing for certificate branding

use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Fallback for missing or malformed primary colors (#003366).
    pub const DEFAULT_PRIMARY: Rgb = Rgb::new(0, 51, 102);

    /// Components scaled to 0.0..=1.0.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

/// Parses `#rrggbb` (the `#` is optional, hex digits are case-insensitive).
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);

    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Parses a primary color, falling back to [`Rgb::DEFAULT_PRIMARY`].
pub fn primary_or_default(hex: &str) -> Rgb {
    parse_hex(hex).unwrap_or(Rgb::DEFAULT_PRIMARY)
}
