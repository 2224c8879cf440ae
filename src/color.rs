//! Compact color encodings.
//!
//! Persisted records store colors as packed 24-bit integers, shareable links
//! store them as six hex digits. Both forms are externally observable and
//! must stay stable.

use serde::{Deserialize, Serialize};

/// Packed value meaning "no color".
pub const COLOR_SENTINEL: u32 = 0xFFFF_FFFF;

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Packs the RGB channels as `(R << 16) | (G << 8) | B`. Alpha is dropped.
pub fn pack_color(color: Color) -> u32 {
    (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
}

/// Packs a color, or returns [`COLOR_SENTINEL`] when absent.
pub fn pack_or_sentinel(color: Option<Color>) -> u32 {
    color.map_or(COLOR_SENTINEL, pack_color)
}

/// Unpacks a 24-bit color. The high byte is ignored; the result is opaque.
pub fn unpack_color(packed: u32) -> Color {
    Color::rgb(
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    )
}

/// Unpacks a color, treating [`COLOR_SENTINEL`] as absent.
pub fn unpack_or_sentinel(packed: u32) -> Option<Color> {
    (packed != COLOR_SENTINEL).then(|| unpack_color(packed))
}

/// Formats the RGB channels as six lower-case hex digits, no `#`.
pub fn to_hex6(color: Color) -> String {
    format!("{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Parses exactly six hex digits into an opaque color.
pub fn from_hex6(text: &str) -> Option<Color> {
    let bytes = text.as_bytes();
    if bytes.len() != 6 || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let component = |index: usize| u8::from_str_radix(&text[index * 2..index * 2 + 2], 16).ok();
    Some(Color::rgb(component(0)?, component(1)?, component(2)?))
}

/// Averages the RGB channels of a color list. Empty input yields black.
pub fn average_color(colors: &[Color]) -> Color {
    if colors.is_empty() {
        return Color::rgb(0, 0, 0);
    }
    let count = colors.len() as u32;
    let (r, g, b) = colors.iter().fold((0u32, 0u32, 0u32), |acc, c| {
        (acc.0 + u32::from(c.r), acc.1 + u32::from(c.g), acc.2 + u32::from(c.b))
    });
    Color::rgb((r / count) as u8, (g / count) as u8, (b / count) as u8)
}
