use log::debug;

use crate::color_space::Pixel;
use crate::error::{PipelineError, Result};

/// Per-pixel palette index, row-major. Every label indexes the palette that
/// produced the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelGrid {
    width: u32,
    height: u32,
    labels: Vec<u16>,
}

impl LabelGrid {
    /// Wrap an existing row-major label buffer.
    pub fn new(width: u32, height: u32, labels: Vec<u16>) -> Result<Self> {
        let expected = pixel_count(width, height)?;
        if labels.len() != expected {
            return Err(PipelineError::DimensionMismatch {
                width,
                height,
                expected,
                actual: labels.len(),
            });
        }
        Ok(Self { width, height, labels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn labels(&self) -> &[u16] {
        &self.labels
    }

    /// Label at `(x, y)`; `None` outside the grid.
    pub fn label_at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.labels[y as usize * self.width as usize + x as usize])
    }
}

/// `width * height`, rejecting zero-sized images.
pub(crate) fn pixel_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(PipelineError::EmptyImage { width, height });
    }
    Ok(width as usize * height as usize)
}

/// Assign every pixel the index of its nearest palette color.
///
/// Distance is squared Euclidean RGB; on ties the lowest index wins. The
/// palette is flattened once up front so the per-pixel loop does no
/// allocation.
pub fn classify(pixels: &[Pixel], width: u32, height: u32, palette: &[Pixel]) -> Result<LabelGrid> {
    let expected = pixel_count(width, height)?;
    if pixels.len() != expected {
        return Err(PipelineError::DimensionMismatch {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    if palette.is_empty() {
        return Err(PipelineError::EmptyPalette);
    }
    if palette.len() > u16::MAX as usize {
        return Err(PipelineError::PaletteTooLarge {
            size: palette.len(),
            max: u16::MAX as usize,
        });
    }

    let flat: Vec<[i32; 3]> = palette
        .iter()
        .map(|c| [c.red as i32, c.green as i32, c.blue as i32])
        .collect();

    let labels: Vec<u16> = pixels
        .iter()
        .map(|p| {
            let r = p.red as i32;
            let g = p.green as i32;
            let b = p.blue as i32;
            let mut best_idx = 0usize;
            let mut best_dist = i32::MAX;
            for (idx, c) in flat.iter().enumerate() {
                let dr = r - c[0];
                let dg = g - c[1];
                let db = b - c[2];
                let dist = dr * dr + dg * dg + db * db;
                if dist < best_dist {
                    best_dist = dist;
                    best_idx = idx;
                }
            }
            best_idx as u16
        })
        .collect();

    debug!(
        "classified {}x{} pixels against {} palette colors",
        width,
        height,
        palette.len()
    );
    Ok(LabelGrid { width, height, labels })
}

/// Paint each label with its palette color (the flat-color preview).
pub fn recolor(grid: &LabelGrid, palette: &[Pixel]) -> Result<Vec<Pixel>> {
    grid.labels
        .iter()
        .map(|&label| {
            palette
                .get(label as usize)
                .copied()
                .ok_or_else(|| PipelineError::invalid("label", label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn px(r: u8, g: u8, b: u8) -> Pixel {
        Srgb::new(r, g, b)
    }

    #[test]
    fn dark_gray_goes_to_black() {
        let palette = [px(0, 0, 0), px(255, 255, 255)];
        let grid = classify(&[px(10, 10, 10)], 1, 1, &palette).unwrap();
        assert_eq!(grid.labels(), &[0]);
    }

    #[test]
    fn ties_resolve_to_the_lowest_index() {
        let palette = [px(0, 0, 0), px(20, 0, 0), px(0, 0, 0)];
        let grid = classify(&[px(10, 0, 0)], 1, 1, &palette).unwrap();
        assert_eq!(grid.labels(), &[0]);
        let grid = classify(&[px(0, 0, 0)], 1, 1, &palette).unwrap();
        assert_eq!(grid.labels(), &[0]);
    }

    #[test]
    fn labels_follow_row_major_order() {
        let palette = [px(255, 0, 0), px(0, 0, 255)];
        let pixels = [px(250, 5, 5), px(5, 5, 250), px(5, 5, 250), px(200, 0, 0)];
        let grid = classify(&pixels, 2, 2, &palette).unwrap();
        assert_eq!(grid.labels(), &[0, 1, 1, 0]);
        assert_eq!(grid.label_at(1, 0), Some(1));
        assert_eq!(grid.label_at(0, 1), Some(1));
        assert_eq!(grid.label_at(2, 0), None);
    }

    #[test]
    fn shape_errors() {
        let palette = [px(0, 0, 0)];
        assert!(matches!(
            classify(&[], 0, 3, &palette),
            Err(PipelineError::EmptyImage { width: 0, height: 3 })
        ));
        assert!(matches!(
            classify(&[px(0, 0, 0)], 2, 1, &palette),
            Err(PipelineError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            classify(&[px(0, 0, 0)], 1, 1, &[]),
            Err(PipelineError::EmptyPalette)
        ));
        assert!(LabelGrid::new(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn recolor_maps_labels_back_to_colors() {
        let palette = [px(1, 1, 1), px(9, 9, 9)];
        let grid = LabelGrid::new(3, 1, vec![1, 0, 1]).unwrap();
        assert_eq!(recolor(&grid, &palette).unwrap(), vec![px(9, 9, 9), px(1, 1, 1), px(9, 9, 9)]);
        let grid = LabelGrid::new(1, 1, vec![5]).unwrap();
        assert!(recolor(&grid, &palette).is_err());
    }
}
