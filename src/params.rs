//! Tunable pipeline parameters.
//!
//! Every pipeline call receives its parameters explicitly; nothing in the crate
//! reads shared mutable state. Parameters can be built in code or loaded from
//! JSON:
//!
//! ```no_run
//! use paint_by_numbers_wasm::PipelineParams;
//! use std::path::Path;
//!
//! let params = PipelineParams::from_json_file(Path::new("params.json"))?;
//! # Ok::<(), paint_by_numbers_wasm::PipelineError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Which palette the classifier maps pixels onto.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteSource {
    /// The median-cut output as is.
    #[default]
    Raw,
    /// The luminance-ordered, deduplicated palette.
    Curated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Number of colors median cut aims for.
    pub color_count: usize,
    /// Regions smaller than this many pixels get no number.
    pub min_region_area: usize,
    /// Size of the number labels, in pixels. Not used by the core; passed
    /// through to whoever draws the numbers.
    pub font_size: u32,
    /// Upper bound on the pixels fed to median cut.
    pub sample_limit: usize,
    /// Decoded images are scaled down to fit within `max_width` x `max_height`.
    pub max_width: u32,
    pub max_height: u32,
    pub palette_source: PaletteSource,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            color_count: 10,
            min_region_area: 10,
            font_size: 7,
            sample_limit: 10_000,
            max_width: 600,
            max_height: 800,
            palette_source: PaletteSource::Raw,
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        if self.color_count == 0 {
            return Err(PipelineError::invalid("color_count", self.color_count));
        }
        if self.color_count > u16::MAX as usize {
            return Err(PipelineError::PaletteTooLarge {
                size: self.color_count,
                max: u16::MAX as usize,
            });
        }
        if self.sample_limit == 0 {
            return Err(PipelineError::invalid("sample_limit", self.sample_limit));
        }
        if self.font_size == 0 {
            return Err(PipelineError::invalid("font_size", self.font_size));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(PipelineError::invalid(
                "max_width x max_height",
                format!("{}x{}", self.max_width, self.max_height),
            ));
        }
        Ok(())
    }

    /// Parse and validate parameters from JSON. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = PipelineParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.color_count, 10);
        assert_eq!(params.min_region_area, 10);
        assert_eq!(params.font_size, 7);
    }

    #[test]
    fn zero_colors_fail_fast() {
        let params = PipelineParams {
            color_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(PipelineError::InvalidParameter { parameter: "color_count", .. })
        ));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let params: PipelineParams =
            serde_json::from_str(r#"{"color_count": 4, "palette_source": "curated"}"#).unwrap();
        assert_eq!(params.color_count, 4);
        assert_eq!(params.palette_source, PaletteSource::Curated);
        assert_eq!(params.min_region_area, 10);
    }

    #[test]
    fn json_string_sets_every_field() {
        let params = PipelineParams::from_json_str(
            r#"{"color_count": 5, "min_region_area": 3, "font_size": 12, "sample_limit": 500,
                "max_width": 320, "max_height": 240, "palette_source": "curated"}"#,
        )
        .unwrap();
        assert_eq!(
            params,
            PipelineParams {
                color_count: 5,
                min_region_area: 3,
                font_size: 12,
                sample_limit: 500,
                max_width: 320,
                max_height: 240,
                palette_source: PaletteSource::Curated,
            }
        );
        assert_eq!(PipelineParams::from_json_str("{}").unwrap(), PipelineParams::default());
    }

    #[test]
    fn json_string_is_validated() {
        assert!(matches!(
            PipelineParams::from_json_str(r#"{"color_count": 0}"#),
            Err(PipelineError::InvalidParameter { parameter: "color_count", .. })
        ));
        assert!(matches!(
            PipelineParams::from_json_str(r#"{"palette_source": "rainbow"}"#),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("pbn_params_{}.json", std::process::id()));
        let params = PipelineParams {
            color_count: 6,
            min_region_area: 25,
            ..Default::default()
        };
        params.to_json_file(&path).unwrap();
        let loaded = PipelineParams::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, params);
    }
}
