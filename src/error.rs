//! Error type shared by every pipeline stage.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the palette / segmentation pipeline.
///
/// Every stage is deterministic, so none of these are transient: retrying with
/// the same inputs yields the same error.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A caller-supplied parameter is out of range.
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: &'static str, value: String },

    /// The image has no pixels.
    #[error("Image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The pixel buffer does not describe a `width`×`height` image.
    #[error("Pixel buffer holds {actual} pixels, expected {expected} for a {width}x{height} image")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// A raw byte buffer is not a whole number of pixels.
    #[error("Buffer length {len} is not a multiple of {channels} channels")]
    RaggedBuffer { len: usize, channels: usize },

    #[error("Palette is empty")]
    EmptyPalette,

    #[error("Palette has {size} colors (at most {max} supported)")]
    PaletteTooLarge { size: usize, max: usize },

    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),

    #[error("Unable to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn invalid(parameter: &'static str, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter,
            value: value.to_string(),
        }
    }
}
