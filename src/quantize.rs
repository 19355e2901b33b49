use std::ops::Range;

use log::debug;
use palette::Srgb;

use crate::color_space::Pixel;
use crate::error::{PipelineError, Result};

/// Depth used by the recursive variant of median cut (up to 16 leaves).
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Stop condition for median-cut subdivision.
///
/// Both strategies share the same split primitive (sort the box along its
/// widest channel, cut at the median); they differ in when splitting stops and
/// in what happens to the median pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Split every box until it sits `max_depth` levels below the root.
    /// The median pixel of each split is dropped, so the halves are
    /// `[0, mid)` and `(mid, len)`.
    FixedDepth { max_depth: u32 },
    /// Split boxes pass by pass until there are `target` of them or nothing
    /// is left to split. Halves are `[0, mid)` and `[mid, len)`.
    TargetCount { target: usize },
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::FixedDepth {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// ------------------------------------------------------------
// Pixel ingestion
// ------------------------------------------------------------

/// Read a flat RGBA buffer, discarding alpha.
pub fn pixels_from_rgba(raw: &[u8]) -> Result<Vec<Pixel>> {
    pixels_from_chunks(raw, 4)
}

/// Read a flat RGB buffer.
pub fn pixels_from_rgb(raw: &[u8]) -> Result<Vec<Pixel>> {
    pixels_from_chunks(raw, 3)
}

fn pixels_from_chunks(raw: &[u8], channels: usize) -> Result<Vec<Pixel>> {
    if raw.len() % channels != 0 {
        return Err(PipelineError::RaggedBuffer {
            len: raw.len(),
            channels,
        });
    }
    Ok(raw
        .chunks_exact(channels)
        .map(|chunk| Srgb::new(chunk[0], chunk[1], chunk[2]))
        .collect())
}

/// Keep every n-th pixel so that roughly `limit` remain, with
/// `n = max(1, len / limit)`. Quantization only needs a representative
/// population, not every pixel of the image.
pub fn sample_pixels(pixels: &[Pixel], limit: usize) -> Vec<Pixel> {
    let step = (pixels.len() / limit.max(1)).max(1);
    pixels.iter().step_by(step).copied().collect()
}

// ------------------------------------------------------------
// Median cut
// ------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    #[inline(always)]
    fn of(self, p: &Pixel) -> u8 {
        match self {
            Channel::Red => p.red,
            Channel::Green => p.green,
            Channel::Blue => p.blue,
        }
    }
}

/// A box is a range into the shared, progressively reordered pixel buffer.
#[derive(Clone, Debug)]
struct ColorBox {
    range: Range<usize>,
    depth: u32,
}

/// Channel with the widest value range and that range. Ties prefer red, then
/// green, then blue. `pixels` must be non-empty.
fn widest_channel(pixels: &[Pixel]) -> (Channel, u8) {
    let (mut r_min, mut g_min, mut b_min) = (u8::MAX, u8::MAX, u8::MAX);
    let (mut r_max, mut g_max, mut b_max) = (u8::MIN, u8::MIN, u8::MIN);
    for p in pixels {
        r_min = r_min.min(p.red);
        r_max = r_max.max(p.red);
        g_min = g_min.min(p.green);
        g_max = g_max.max(p.green);
        b_min = b_min.min(p.blue);
        b_max = b_max.max(p.blue);
    }
    let r_range = r_max.saturating_sub(r_min);
    let g_range = g_max.saturating_sub(g_min);
    let b_range = b_max.saturating_sub(b_min);

    if r_range >= g_range && r_range >= b_range {
        (Channel::Red, r_range)
    } else if g_range >= b_range {
        (Channel::Green, g_range)
    } else {
        (Channel::Blue, b_range)
    }
}

/// Median split of one box.
///
/// Returns `None` for boxes that cannot be split: fewer than two pixels, or
/// every pixel identical. Otherwise the box's slice is sorted along its
/// widest channel (stable, so equal keys keep their input order) and the two
/// child ranges are returned.
fn split_box(pixels: &mut [Pixel], range: Range<usize>, drop_median: bool) -> Option<(Range<usize>, Range<usize>)> {
    if range.len() < 2 {
        return None;
    }
    let slice = &mut pixels[range.clone()];
    let (channel, width) = widest_channel(slice);
    if width == 0 {
        return None;
    }
    slice.sort_by_key(|p| channel.of(p));

    let mid = range.start + range.len() / 2;
    let right_start = if drop_median { mid + 1 } else { mid };
    Some((range.start..mid, right_start..range.end))
}

/// Mean color of a non-empty slice, each channel rounded half away from zero.
fn average(pixels: &[Pixel]) -> Option<Pixel> {
    if pixels.is_empty() {
        return None;
    }
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for p in pixels {
        r += p.red as u64;
        g += p.green as u64;
        b += p.blue as u64;
    }
    let n = pixels.len() as f64;
    let mean = |sum: u64| (sum as f64 / n).round().clamp(0.0, 255.0) as u8;
    Some(Srgb::new(mean(r), mean(g), mean(b)))
}

/// Reduce `pixels` to at most `target_count` representative colors by
/// iterative median cut.
pub fn quantize(pixels: &[Pixel], target_count: usize) -> Result<Vec<Pixel>> {
    quantize_with(pixels, SplitStrategy::TargetCount { target: target_count })
}

/// Median cut with an explicit stop condition.
///
/// Steps performed:
/// 1. Copy the input once; all boxes are ranges into that copy.
/// 2. Split boxes along their widest channel until the strategy says stop.
/// 3. Average every non-empty leaf into one palette entry, in box order.
///
/// A single-color input always yields exactly one entry. Asking for more
/// colors than the input can provide is not an error; fewer entries come back.
pub fn quantize_with(pixels: &[Pixel], strategy: SplitStrategy) -> Result<Vec<Pixel>> {
    if pixels.is_empty() {
        return Err(PipelineError::invalid("pixels", "empty pixel set"));
    }
    if let SplitStrategy::TargetCount { target: 0 } = strategy {
        return Err(PipelineError::invalid("target_count", 0));
    }

    let mut buffer = pixels.to_vec();
    let root = ColorBox {
        range: 0..buffer.len(),
        depth: 0,
    };

    let leaves = match strategy {
        SplitStrategy::FixedDepth { max_depth } => split_to_depth(&mut buffer, root, max_depth),
        SplitStrategy::TargetCount { target } => split_to_count(&mut buffer, root, target),
    };

    let palette: Vec<Pixel> = leaves
        .iter()
        .filter_map(|leaf| average(&buffer[leaf.range.clone()]))
        .collect();

    debug!(
        "median cut ({:?}) reduced {} pixels to {} colors",
        strategy,
        pixels.len(),
        palette.len()
    );
    Ok(palette)
}

/// Depth-first subdivision; leaves come out left to right, as recursion would
/// produce them.
fn split_to_depth(buffer: &mut [Pixel], root: ColorBox, max_depth: u32) -> Vec<ColorBox> {
    let mut leaves = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.range.is_empty() {
            continue;
        }
        if node.depth >= max_depth {
            leaves.push(node);
            continue;
        }
        match split_box(buffer, node.range.clone(), true) {
            Some((left, right)) => {
                let depth = node.depth + 1;
                stack.push(ColorBox { range: right, depth });
                stack.push(ColorBox { range: left, depth });
            }
            None => leaves.push(node),
        }
    }

    leaves
}

/// Breadth-wise subdivision. Each pass walks the current boxes in order and
/// replaces every splittable box by its two halves, stopping as soon as the
/// target is reached so the result never exceeds it.
fn split_to_count(buffer: &mut [Pixel], root: ColorBox, target: usize) -> Vec<ColorBox> {
    let mut boxes = vec![root];

    while boxes.len() < target {
        let mut next = Vec::with_capacity(boxes.len() * 2);
        let mut count = boxes.len();
        let mut split_any = false;

        for node in boxes {
            if count < target {
                if let Some((left, right)) = split_box(buffer, node.range.clone(), false) {
                    let depth = node.depth + 1;
                    next.push(ColorBox { range: left, depth });
                    next.push(ColorBox { range: right, depth });
                    count += 1;
                    split_any = true;
                    continue;
                }
            }
            next.push(node);
        }

        boxes = next;
        if !split_any {
            break;
        }
    }

    boxes
}
