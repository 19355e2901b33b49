//! Palette extraction and paint-by-numbers segmentation.
//!
//! The pipeline runs in five pure stages over a flat pixel buffer:
//!
//! 1. [`quantize`]: median cut reduces the pixels to a small palette.
//! 2. [`curate`]: the palette is ordered by luminance, near-duplicates are
//!    dropped and complementary colors are derived.
//! 3. [`classify`]: every pixel is mapped to its nearest palette color.
//! 4. [`segment`]: connected same-color regions are labeled, filtered by area
//!    and given a centroid for their number; the region outlines form a
//!    boundary mask.
//! 5. [`render`]: outputs are encoded as PNGs for callers that want images.
//!
//! Each run owns its buffers, so separate images can be processed on separate
//! threads (or web workers) without coordination.

use log::{info, warn};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect, Uint8Array};

pub mod classify;
pub mod color_space;
pub mod curate;
pub mod error;
pub mod params;
pub mod quantize;
pub mod render;
pub mod segment;

pub use classify::{LabelGrid, classify, recolor};
pub use color_space::{HslColor, Pixel, hex_to_rgb, hsl_to_hex, hsl_to_rgb, rgb_to_hex, rgb_to_hsl};
pub use curate::{complementary_hex, complementary_of, curate_palette, order_by_luminance};
pub use error::{PipelineError, Result};
pub use params::{PaletteSource, PipelineParams};
pub use quantize::{SplitStrategy, pixels_from_rgb, pixels_from_rgba, quantize, quantize_with, sample_pixels};
pub use segment::{BoundaryMask, Point, Region, Segmentation, segment};

// ------------------------------------------------------------
// Pipeline
// ------------------------------------------------------------

/// Everything one paint-by-numbers run produces.
#[derive(Clone, Debug)]
pub struct PaintByNumbers {
    /// Median-cut output, in box order.
    pub raw_palette: Vec<Pixel>,
    /// Luminance-ordered, deduplicated palette.
    pub curated_palette: Vec<Pixel>,
    /// Complement of each curated color; `None` for achromatic ones.
    pub complementary: Vec<Option<Pixel>>,
    /// The palette the labels index into (raw or curated, per the params).
    pub palette: Vec<Pixel>,
    pub labels: LabelGrid,
    pub segmentation: Segmentation,
}

/// Run the full pipeline on a `width` x `height` RGB buffer.
///
/// Steps performed:
/// 1. Sample at most `params.sample_limit` pixels and median-cut them down to
///    `params.color_count` colors.
/// 2. Curate the palette and derive complementary colors.
/// 3. Classify every pixel against the raw or curated palette.
/// 4. Segment the label grid with `params.min_region_area`.
pub fn run_pipeline(pixels: &[Pixel], width: u32, height: u32, params: &PipelineParams) -> Result<PaintByNumbers> {
    params.validate()?;
    let expected = classify::pixel_count(width, height)?;
    if pixels.len() != expected {
        return Err(PipelineError::DimensionMismatch {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let sampled = sample_pixels(pixels, params.sample_limit);
    let raw_palette = quantize(&sampled, params.color_count)?;
    let curated_palette = curate_palette(&raw_palette);
    let complementary = curated_palette.iter().map(|&c| complementary_of(c)).collect();

    let palette = match params.palette_source {
        PaletteSource::Raw => raw_palette.clone(),
        PaletteSource::Curated => curated_palette.clone(),
    };
    let labels = classify(pixels, width, height, &palette)?;
    let segmentation = segment(&labels, params.min_region_area);

    info!(
        "paint by numbers on {}x{}: {} colors ({} curated), {} numbered regions",
        width,
        height,
        raw_palette.len(),
        curated_palette.len(),
        segmentation.regions.len()
    );

    Ok(PaintByNumbers {
        raw_palette,
        curated_palette,
        complementary,
        palette,
        labels,
        segmentation,
    })
}

// ------------------------------------------------------------
// Serializable summaries
// ------------------------------------------------------------

/// One palette color as shown on a palette card.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Swatch {
    /// 1-based number painted into regions of this color.
    pub number: u32,
    pub hex: String,
    pub rgb: [u8; 3],
}

/// A curated color together with its complement.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaletteSwatch {
    pub hex: String,
    pub complementary: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionReport {
    pub number: u32,
    pub hex: String,
    pub area: usize,
    pub centroid: Point,
}

/// JSON-friendly view of a [`PaintByNumbers`] result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineReport {
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub palette: Vec<Swatch>,
    pub curated: Vec<PaletteSwatch>,
    pub regions: Vec<RegionReport>,
    pub boundary_pixels: usize,
}

fn palette_swatches(curated: &[Pixel], complementary: &[Option<Pixel>]) -> Vec<PaletteSwatch> {
    curated
        .iter()
        .zip(complementary)
        .map(|(&c, comp)| PaletteSwatch {
            hex: rgb_to_hex(c),
            complementary: comp.map(rgb_to_hex),
        })
        .collect()
}

impl PaintByNumbers {
    pub fn report(&self, font_size: u32) -> PipelineReport {
        let palette = self
            .palette
            .iter()
            .enumerate()
            .map(|(i, &c)| Swatch {
                number: i as u32 + 1,
                hex: rgb_to_hex(c),
                rgb: [c.red, c.green, c.blue],
            })
            .collect();

        // Fields are public, so `palette` may no longer cover every label.
        let regions = self
            .segmentation
            .regions
            .iter()
            .filter_map(|r| match self.palette.get(r.label as usize) {
                Some(&color) => Some(RegionReport {
                    number: r.display_number(),
                    hex: rgb_to_hex(color),
                    area: r.area,
                    centroid: r.centroid,
                }),
                None => {
                    warn!("region label {} has no palette color, left out of the report", r.label);
                    None
                }
            })
            .collect();

        PipelineReport {
            width: self.labels.width(),
            height: self.labels.height(),
            font_size,
            palette,
            curated: palette_swatches(&self.curated_palette, &self.complementary),
            regions,
            boundary_pixels: self.segmentation.boundary.count(),
        }
    }

    /// The image recolored with the palette, one flat color per region.
    pub fn preview(&self) -> Result<Vec<Pixel>> {
        recolor(&self.labels, &self.palette)
    }
}

/// Palette-card extraction: depth-4 median cut over every pixel, then
/// curation and complements.
pub fn extract_palette(pixels: &[Pixel]) -> Result<Vec<PaletteSwatch>> {
    let raw = quantize_with(pixels, SplitStrategy::default())?;
    let curated = curate_palette(&raw);
    let complementary: Vec<Option<Pixel>> = curated.iter().map(|&c| complementary_of(c)).collect();
    Ok(palette_swatches(&curated, &complementary))
}

// ------------------------------------------------------------
// Byte-level entry points
// ------------------------------------------------------------

/// Encoded outputs of [`paint_by_numbers_bytes`].
#[cfg(not(target_arch = "wasm32"))]
pub struct PaintByNumbersOutput {
    /// PNG: white canvas, black region outlines.
    pub outline_png: Vec<u8>,
    /// PNG: every pixel replaced by its palette color.
    pub preview_png: Vec<u8>,
    pub report: PipelineReport,
}

/// Decode an image, fit it within the configured bounds and run the pipeline.
#[cfg(not(target_arch = "wasm32"))]
pub fn paint_by_numbers_bytes(input: &[u8], params: &PipelineParams) -> Result<PaintByNumbersOutput> {
    params.validate()?;
    let (pixels, width, height) = render::decode_pixels(input, params.max_width, params.max_height)?;
    let result = run_pipeline(&pixels, width, height, params)?;

    Ok(PaintByNumbersOutput {
        outline_png: render::outline_png(&result.segmentation.boundary)?,
        preview_png: render::pixels_png(&result.preview()?, width, height)?,
        report: result.report(params.font_size),
    })
}

/// Decode an image and extract its curated palette.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(input: &[u8]) -> Result<Vec<PaletteSwatch>> {
    let img = image::load_from_memory(input)?;
    let pixels = pixels_from_rgba(&img.to_rgba8().into_raw())?;
    extract_palette(&pixels)
}

// ------------------------------------------------------------
// WASM bindings
// ------------------------------------------------------------

fn js_err(e: PipelineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn hex_array<'a>(hexes: impl IntoIterator<Item = Option<&'a str>>) -> Array {
    let arr = Array::new();
    for hex in hexes {
        match hex {
            Some(h) => arr.push(&JsValue::from_str(h)),
            None => arr.push(&JsValue::NULL),
        };
    }
    arr
}

/// Turn an encoded image into a paint-by-numbers template.
///
/// Returns an object with:
/// - `outline`: PNG bytes of the region outlines,
/// - `preview`: PNG bytes of the recolored image,
/// - `palette`: hex strings, index `i` is number `i + 1`,
/// - `complementary`: hex strings (or `null`) for the curated palette,
/// - `regions`: `{ number, x, y, area }` for every numbered region,
/// - `fontSize`: label size for the caller's number overlay.
///
/// Numbers are not drawn into `outline`; the caller places them at each
/// region's `(x, y)`.
///
/// `params_json` is an optional [`PipelineParams`] object in JSON; missing
/// fields take their defaults.
#[wasm_bindgen]
pub fn paint_by_numbers(input: Vec<u8>, params_json: Option<String>) -> std::result::Result<Object, JsValue> {
    let params = match params_json.as_deref() {
        Some(json) => PipelineParams::from_json_str(json),
        None => Ok(PipelineParams::default()),
    }
    .map_err(js_err)?;

    let (pixels, width, height) =
        render::decode_pixels(&input, params.max_width, params.max_height).map_err(js_err)?;
    let result = run_pipeline(&pixels, width, height, &params).map_err(js_err)?;
    let outline = render::outline_png(&result.segmentation.boundary).map_err(js_err)?;
    let preview = result
        .preview()
        .and_then(|p| render::pixels_png(&p, width, height))
        .map_err(js_err)?;
    let report = result.report(params.font_size);

    let regions_js = Array::new();
    for region in &report.regions {
        let obj = Object::new();
        Reflect::set(&obj, &JsValue::from_str("number"), &JsValue::from(region.number))?;
        Reflect::set(&obj, &JsValue::from_str("x"), &JsValue::from(region.centroid.x))?;
        Reflect::set(&obj, &JsValue::from_str("y"), &JsValue::from(region.centroid.y))?;
        Reflect::set(&obj, &JsValue::from_str("area"), &JsValue::from(region.area as f64))?;
        regions_js.push(&obj);
    }

    let result_js = Object::new();
    Reflect::set(&result_js, &JsValue::from_str("outline"), &Uint8Array::from(outline.as_slice()))?;
    Reflect::set(&result_js, &JsValue::from_str("preview"), &Uint8Array::from(preview.as_slice()))?;
    Reflect::set(
        &result_js,
        &JsValue::from_str("palette"),
        &hex_array(report.palette.iter().map(|s| Some(s.hex.as_str()))),
    )?;
    Reflect::set(
        &result_js,
        &JsValue::from_str("complementary"),
        &hex_array(report.curated.iter().map(|s| s.complementary.as_deref())),
    )?;
    Reflect::set(&result_js, &JsValue::from_str("regions"), &regions_js)?;
    Reflect::set(&result_js, &JsValue::from_str("fontSize"), &JsValue::from(report.font_size))?;

    Ok(result_js)
}

/// Extract a curated palette from an encoded image.
///
/// Returns `{ palette: string[], complementary: (string | null)[] }`, both in
/// the same order.
#[wasm_bindgen]
pub fn palette_from_image(input: Vec<u8>) -> std::result::Result<Object, JsValue> {
    let img = image::load_from_memory(&input)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?;
    let pixels = pixels_from_rgba(&img.to_rgba8().into_raw()).map_err(js_err)?;
    let swatches = extract_palette(&pixels).map_err(js_err)?;

    let result = Object::new();
    Reflect::set(
        &result,
        &JsValue::from_str("palette"),
        &hex_array(swatches.iter().map(|s| Some(s.hex.as_str()))),
    )?;
    Reflect::set(
        &result,
        &JsValue::from_str("complementary"),
        &hex_array(swatches.iter().map(|s| s.complementary.as_deref())),
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn two_tone(width: u32, height: u32) -> Vec<Pixel> {
        (0..height)
            .flat_map(|_| (0..width).map(move |x| if x < width / 2 { Srgb::new(230, 20, 20) } else { Srgb::new(20, 20, 230) }))
            .collect()
    }

    #[test]
    fn two_tone_image_gives_two_regions() {
        let pixels = two_tone(8, 6);
        let params = PipelineParams {
            color_count: 4,
            min_region_area: 1,
            ..Default::default()
        };
        let result = run_pipeline(&pixels, 8, 6, &params).unwrap();
        assert_eq!(result.raw_palette.len(), 2);
        assert_eq!(result.segmentation.regions.len(), 2);
        assert!(result.segmentation.regions.iter().all(|r| r.area == 24));

        let report = result.report(params.font_size);
        let hexes: Vec<&str> = report.regions.iter().map(|r| r.hex.as_str()).collect();
        assert!(hexes.contains(&"#E61414"));
        assert!(hexes.contains(&"#1414E6"));
        assert_eq!(report.font_size, 7);
        assert_eq!(report.boundary_pixels, 8);
    }

    #[test]
    fn curated_source_labels_index_the_curated_palette() {
        let pixels = two_tone(4, 4);
        let params = PipelineParams {
            color_count: 2,
            min_region_area: 1,
            palette_source: PaletteSource::Curated,
            ..Default::default()
        };
        let result = run_pipeline(&pixels, 4, 4, &params).unwrap();
        assert_eq!(result.palette, result.curated_palette);
        assert!(result.labels.labels().iter().all(|&l| (l as usize) < result.palette.len()));
    }

    #[test]
    fn report_skips_regions_whose_label_lost_its_color() {
        let pixels = two_tone(4, 2);
        let params = PipelineParams {
            min_region_area: 1,
            ..Default::default()
        };
        let mut result = run_pipeline(&pixels, 4, 2, &params).unwrap();
        assert_eq!(result.report(7).regions.len(), 2);

        // Label 1 (red) no longer has a palette entry.
        result.palette.truncate(1);
        let report = result.report(7);
        assert_eq!(report.palette.len(), 1);
        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.regions[0].number, 1);
        assert_eq!(report.regions[0].hex, "#1414E6");
    }

    #[test]
    fn invalid_params_fail_before_any_work() {
        let pixels = two_tone(2, 2);
        let params = PipelineParams {
            color_count: 0,
            ..Default::default()
        };
        assert!(run_pipeline(&pixels, 2, 2, &params).is_err());
        assert!(matches!(
            run_pipeline(&pixels, 3, 2, &PipelineParams::default()),
            Err(PipelineError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            run_pipeline(&[], 0, 0, &PipelineParams::default()),
            Err(PipelineError::EmptyImage { .. })
        ));
    }

    #[test]
    fn extract_palette_pairs_colors_with_complements() {
        let mut pixels = vec![Srgb::new(255u8, 0, 0); 20];
        pixels.extend(vec![Srgb::new(128u8, 128, 128); 20]);
        let swatches = extract_palette(&pixels).unwrap();
        assert_eq!(
            swatches,
            vec![
                PaletteSwatch { hex: "#808080".into(), complementary: None },
                PaletteSwatch { hex: "#FF0000".into(), complementary: Some("#00FFFF".into()) },
            ]
        );
    }

    #[test]
    fn report_serializes_to_json() {
        let pixels = two_tone(4, 2);
        let params = PipelineParams {
            min_region_area: 1,
            ..Default::default()
        };
        let report = run_pipeline(&pixels, 4, 2, &params).unwrap().report(9);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["font_size"], 9);
        assert_eq!(json["regions"][0]["centroid"]["x"], 1);
        // Median cut puts blue (lower red channel) first, so red is number 2.
        assert_eq!(json["regions"][0]["number"], 2);
        assert_eq!(json["regions"][0]["hex"], "#E61414");
    }
}
