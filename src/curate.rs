use log::debug;

use crate::color_space::{Pixel, hsl_to_rgb, rgb_to_hex, rgb_to_hsl};

/// Squared RGB distance below which a color counts as a near-duplicate of the
/// previously kept one.
pub const MIN_COLOR_DISTANCE: u32 = 120;

/// Relative luminance with BT.709 luma weights, in 0-255 space.
#[inline(always)]
pub fn luminance(p: Pixel) -> f64 {
    0.2126 * p.red as f64 + 0.7152 * p.green as f64 + 0.0722 * p.blue as f64
}

/// Squared Euclidean distance between two colors (no square root).
#[inline(always)]
pub fn color_distance(a: Pixel, b: Pixel) -> u32 {
    let dr = a.red as i32 - b.red as i32;
    let dg = a.green as i32 - b.green as i32;
    let db = a.blue as i32 - b.blue as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Brightest first. The sort is stable, so equally bright colors keep their
/// input order.
pub fn order_by_luminance(colors: &[Pixel]) -> Vec<Pixel> {
    let mut ordered = colors.to_vec();
    ordered.sort_by(|a, b| luminance(*b).total_cmp(&luminance(*a)));
    ordered
}

/// Drop near-duplicates in one left-to-right pass.
///
/// The first color is always kept. Each later color is compared with the last
/// color that was kept and dropped when closer than [`MIN_COLOR_DISTANCE`].
/// Traversal order decides which of two near-duplicates survives.
pub fn curate(ordered: &[Pixel]) -> Vec<Pixel> {
    let mut kept: Vec<Pixel> = Vec::with_capacity(ordered.len());
    for &color in ordered {
        match kept.last() {
            Some(&last) if color_distance(color, last) < MIN_COLOR_DISTANCE => {}
            _ => kept.push(color),
        }
    }
    kept
}

/// Luminance ordering followed by [`curate`].
pub fn curate_palette(colors: &[Pixel]) -> Vec<Pixel> {
    let curated = curate(&order_by_luminance(colors));
    debug!("curated {} colors down to {}", colors.len(), curated.len());
    curated
}

/// Color with the hue rotated by 180°, or `None` for gray, black and white.
pub fn complementary_of(color: Pixel) -> Option<Pixel> {
    let hsl = rgb_to_hsl(color);
    if hsl.is_achromatic() {
        return None;
    }
    Some(hsl_to_rgb(hsl))
}

pub fn complementary_hex(color: Pixel) -> Option<String> {
    complementary_of(color).map(rgb_to_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn px(r: u8, g: u8, b: u8) -> Pixel {
        Srgb::new(r, g, b)
    }

    #[test]
    fn luminance_uses_bt709_weights() {
        assert_eq!(luminance(px(0, 0, 0)), 0.0);
        assert!((luminance(px(255, 255, 255)) - 255.0).abs() < 1e-9);
        assert!(luminance(px(0, 255, 0)) > luminance(px(255, 0, 0)));
        assert!(luminance(px(255, 0, 0)) > luminance(px(0, 0, 255)));
    }

    #[test]
    fn ordering_is_brightest_first() {
        let ordered = order_by_luminance(&[px(0, 0, 255), px(255, 255, 255), px(0, 255, 0), px(0, 0, 0)]);
        assert_eq!(
            ordered,
            vec![px(255, 255, 255), px(0, 255, 0), px(0, 0, 255), px(0, 0, 0)]
        );
    }

    #[test]
    fn distance_is_squared() {
        assert_eq!(color_distance(px(0, 0, 0), px(3, 4, 0)), 25);
        assert_eq!(color_distance(px(255, 255, 255), px(0, 0, 0)), 3 * 255 * 255);
    }

    #[test]
    fn threshold_boundary() {
        // 2² + 4² + 10² = 120: kept.
        assert_eq!(curate(&[px(100, 100, 100), px(98, 96, 90)]).len(), 2);
        // 1² + 3² + 10² = 110: dropped.
        assert_eq!(curate(&[px(100, 100, 100), px(99, 97, 90)]), vec![px(100, 100, 100)]);
    }

    #[test]
    fn comparison_is_against_the_last_kept_color() {
        // b is close to a and dropped; c is close to b but far from a, so kept.
        let a = px(100, 100, 100);
        let b = px(100, 100, 92);
        let c = px(100, 100, 84);
        assert_eq!(curate(&[a, b, c]), vec![a, c]);
    }

    #[test]
    fn empty_palette_curates_to_empty() {
        assert!(curate_palette(&[]).is_empty());
    }

    #[test]
    fn curate_palette_orders_then_dedups() {
        let palette = [px(0, 0, 0), px(250, 250, 250), px(2, 2, 2), px(255, 255, 255)];
        assert_eq!(curate_palette(&palette), vec![px(255, 255, 255), px(2, 2, 2)]);
    }

    #[test]
    fn complementary_colors() {
        assert_eq!(complementary_of(px(255, 0, 0)), Some(px(0, 255, 255)));
        assert_eq!(complementary_hex(px(255, 0, 0)).as_deref(), Some("#00FFFF"));
        assert_eq!(complementary_of(px(128, 128, 128)), None);
        assert_eq!(complementary_of(px(0, 0, 0)), None);
    }
}
