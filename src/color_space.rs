use palette::Srgb;

use crate::error::{PipelineError, Result};

/// One 8-bit RGB sample. Alpha is dropped before pixels reach the pipeline.
pub type Pixel = Srgb<u8>;

/// An HSL color as produced by [`rgb_to_hsl`].
///
/// `hue` is in degrees, `saturation` and `luminance` are percentages rounded
/// to two decimals. The stored hue is already rotated by 180°, so converting it
/// back with [`hsl_to_hex`] yields the complementary color. `hue` is `None` for
/// achromatic colors (gray, black, white).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HslColor {
    pub hue: Option<f64>,
    pub saturation: f64,
    pub luminance: f64,
}

impl HslColor {
    /// `true` when the color has no hue (r = g = b).
    pub fn is_achromatic(&self) -> bool {
        self.hue.is_none()
    }

    /// Hue of the source color, i.e. the stored hue with the 180° shift undone.
    pub fn base_hue(&self) -> Option<f64> {
        self.hue.map(|h| (h - 180.0).rem_euclid(360.0))
    }
}

// ------------------------------------------------------------
// Hex encoding
// ------------------------------------------------------------

/// `#RRGGBB`, uppercase, two zero-padded digits per channel.
pub fn rgb_to_hex(pixel: Pixel) -> String {
    format!("#{:02X}{:02X}{:02X}", pixel.red, pixel.green, pixel.blue)
}

/// Parse `#RRGGBB` (the leading `#` is optional, digits are case-insensitive).
pub fn hex_to_rgb(s: &str) -> Result<Pixel> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PipelineError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| PipelineError::InvalidHex(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// ------------------------------------------------------------
// RGB <-> HSL
// ------------------------------------------------------------

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Convert to HSL, rotating the hue by 180° on the way.
///
/// When max = min the color is achromatic: no hue is computed and saturation
/// is 0, so neither saturation formula divides by zero.
pub fn rgb_to_hsl(pixel: Pixel) -> HslColor {
    let r = pixel.red as f64 / 255.0;
    let g = pixel.green as f64 / 255.0;
    let b = pixel.blue as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let difference = max - min;
    let luminance = (max + min) / 2.0;

    if difference == 0.0 {
        return HslColor {
            hue: None,
            saturation: 0.0,
            luminance: round2(luminance * 100.0),
        };
    }

    let saturation = if luminance <= 0.5 {
        difference / (max + min)
    } else {
        difference / (2.0 - max - min)
    };

    // Six-sector hue, picked by the maximal channel (red wins ties, then green).
    let sector = if pixel.red >= pixel.green && pixel.red >= pixel.blue {
        (g - b) / difference
    } else if pixel.green >= pixel.blue {
        2.0 + (b - r) / difference
    } else {
        4.0 + (r - g) / difference
    };
    let mut hue = sector * 60.0;
    if hue < 0.0 {
        hue += 360.0;
    }

    HslColor {
        hue: Some((hue.round() + 180.0) % 360.0),
        saturation: round2(saturation * 100.0),
        luminance: round2(luminance * 100.0),
    }
}

/// Standard HSL -> RGB. A missing hue is read as 0°, which only matters when
/// saturation is non-zero.
pub fn hsl_to_rgb(hsl: HslColor) -> Pixel {
    let h = hsl.hue.unwrap_or(0.0);
    let l = hsl.luminance / 100.0;
    let a = hsl.saturation / 100.0 * l.min(1.0 - l);

    let f = |n: f64| -> u8 {
        let k = (n + h / 30.0).rem_euclid(12.0);
        let c = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * c).round().clamp(0.0, 255.0) as u8
    };

    Srgb::new(f(0.0), f(8.0), f(4.0))
}

pub fn hsl_to_hex(hsl: HslColor) -> String {
    rgb_to_hex(hsl_to_rgb(hsl))
}
