use std::collections::VecDeque;

use log::debug;
use serde::Serialize;

use crate::classify::LabelGrid;

/// A pixel coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// A connected run of same-label pixels found by one flood fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Palette index shared by every pixel of the region.
    pub label: u16,
    /// Pixel count, always at least 1.
    pub area: usize,
    /// Rounded mean pixel position, where the number annotation goes.
    pub centroid: Point,
}

impl Region {
    /// 1-based number a painter sees for this region's color.
    pub fn display_number(&self) -> u32 {
        self.label as u32 + 1
    }
}

/// Interior pixels that touch a differently-labeled 4-neighbor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryMask {
    width: u32,
    height: u32,
    mask: Vec<bool>,
}

impl BoundaryMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major flags, one per pixel.
    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_boundary(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.mask[y as usize * self.width as usize + x as usize]
    }

    /// Number of boundary pixels.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&b| b).count()
    }
}

/// Output of one segmentation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segmentation {
    /// Regions with `area >= min_area`, in row-major order of their first pixel.
    pub regions: Vec<Region>,
    pub boundary: BoundaryMask,
}

// ------------------------------------------------------------
// Connected components
// ------------------------------------------------------------

const NEIGHBORS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Label connected regions and compute the outline mask.
///
/// Pixels are scanned row-major; every unvisited pixel seeds a breadth-first
/// flood fill over 4-connected neighbors with the same label. Regions smaller
/// than `min_area` are left out of the list, but their pixels stay visited and
/// still show up in the boundary mask.
pub fn segment(grid: &LabelGrid, min_area: usize) -> Segmentation {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let labels = grid.labels();

    let mut visited = vec![false; width * height];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut regions = Vec::new();
    let mut dropped = 0usize;

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] {
                continue;
            }
            let target = labels[y * width + x];

            visited[y * width + x] = true;
            queue.push_back((x, y));
            let mut area = 0usize;
            let mut sum_x = 0u64;
            let mut sum_y = 0u64;

            while let Some((cx, cy)) = queue.pop_front() {
                area += 1;
                sum_x += cx as u64;
                sum_y += cy as u64;

                for (dx, dy) in NEIGHBORS {
                    let nx = cx as i64 + dx;
                    let ny = cy as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                        continue;
                    }
                    let nidx = ny as usize * width + nx as usize;
                    if !visited[nidx] && labels[nidx] == target {
                        visited[nidx] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }

            if area >= min_area {
                let n = area as f64;
                regions.push(Region {
                    label: target,
                    area,
                    centroid: Point {
                        x: (sum_x as f64 / n).round() as u32,
                        y: (sum_y as f64 / n).round() as u32,
                    },
                });
            } else {
                dropped += 1;
            }
        }
    }

    debug!(
        "segmented {}x{} grid: {} regions kept, {} below min area {}",
        width,
        height,
        regions.len(),
        dropped,
        min_area
    );

    Segmentation {
        regions,
        boundary: boundary_mask(grid),
    }
}

/// Mark interior pixels whose up, down, left or right neighbor carries a
/// different label. Pixels on the image edge are never marked.
pub fn boundary_mask(grid: &LabelGrid) -> BoundaryMask {
    let width = grid.width() as usize;
    let height = grid.height() as usize;
    let labels = grid.labels();
    let mut mask = vec![false; width * height];

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let current = labels[idx];
            mask[idx] = labels[idx - width] != current
                || labels[idx + width] != current
                || labels[idx - 1] != current
                || labels[idx + 1] != current;
        }
    }

    BoundaryMask {
        width: grid.width(),
        height: grid.height(),
        mask,
    }
}
