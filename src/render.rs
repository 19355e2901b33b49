//! Decoding and PNG encoding around the core pipeline.
//!
//! The core works on flat pixel buffers only; these helpers are the thin layer
//! that turns encoded image bytes into such buffers and the pipeline's outputs
//! back into PNGs.
//!
//! Region numbers are not drawn. The outline PNG holds only the boundary
//! mask; callers place `Region::display_number()` at each centroid
//! themselves, sized by `PipelineParams::font_size`.

use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma, RgbImage, imageops::FilterType};

use crate::color_space::Pixel;
use crate::error::{PipelineError, Result};
use crate::quantize::pixels_from_rgba;
use crate::segment::BoundaryMask;

/// Shrink `(width, height)` to fit within `max_width` x `max_height`, keeping
/// the aspect ratio. Images that already fit are left alone; results are
/// truncated to whole pixels but never drop below 1.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut w = width as f64;
    let mut h = height as f64;
    if w > max_width as f64 {
        h = max_width as f64 / w * h;
        w = max_width as f64;
    }
    if h > max_height as f64 {
        w = max_height as f64 / h * w;
        h = max_height as f64;
    }
    ((w as u32).max(1), (h as u32).max(1))
}

/// Decode any format `image` understands, scale it down to fit, and return the
/// RGB pixels (alpha dropped) with the working dimensions.
pub fn decode_pixels(input: &[u8], max_width: u32, max_height: u32) -> Result<(Vec<Pixel>, u32, u32)> {
    let img = image::load_from_memory(input)?;
    let (orig_w, orig_h) = img.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err(PipelineError::EmptyImage {
            width: orig_w,
            height: orig_h,
        });
    }

    let (w, h) = fit_within(orig_w, orig_h, max_width, max_height);
    let working = if (w, h) == (orig_w, orig_h) {
        img
    } else {
        DynamicImage::ImageRgba8(image::imageops::resize(&img, w, h, FilterType::Triangle))
    };

    let pixels = pixels_from_rgba(&working.to_rgba8().into_raw())?;
    Ok((pixels, w, h))
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// White canvas with the region outlines in black. No numbers are drawn.
pub fn outline_png(boundary: &BoundaryMask) -> Result<Vec<u8>> {
    let outline = GrayImage::from_fn(boundary.width(), boundary.height(), |x, y| {
        if boundary.is_boundary(x, y) { Luma([0u8]) } else { Luma([255u8]) }
    });
    encode_png(DynamicImage::ImageLuma8(outline))
}

/// PNG of a flat RGB pixel buffer, e.g. the recolored preview.
pub fn pixels_png(pixels: &[Pixel], width: u32, height: u32) -> Result<Vec<u8>> {
    let raw: Vec<u8> = pixels.iter().flat_map(|p| [p.red, p.green, p.blue]).collect();
    let expected = width as usize * height as usize;
    let img = RgbImage::from_raw(width, height, raw).ok_or(PipelineError::DimensionMismatch {
        width,
        height,
        expected,
        actual: pixels.len(),
    })?;
    encode_png(DynamicImage::ImageRgb8(img))
}
