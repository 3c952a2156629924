//! Parameter types for a quote render.
//!
//! These describe *what* to draw. [`compose`](super::compose) does the pixel
//! work, so tests can build params directly without a config file.

use crate::config::RenderConfig;
use std::path::PathBuf;

/// JPEG encoding quality (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Everything needed to turn a caption into a finished image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Requested background size.
    pub width: u32,
    pub height: u32,
    /// Wrap width in characters.
    pub wrap_width: usize,
    /// Em size in pixels.
    pub font_size: u32,
    pub band_alpha: u8,
    pub shadow_alpha: u8,
    pub shadow_offset: (i32, i32),
    pub quality: Quality,
    pub output: PathBuf,
    pub fonts: Vec<PathBuf>,
}

impl RenderParams {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            wrap_width: config.wrap_width,
            font_size: config.font_size,
            band_alpha: config.band_alpha,
            shadow_alpha: config.shadow_alpha,
            shadow_offset: (config.shadow_offset[0], config.shadow_offset[1]),
            quality: Quality::new(config.quality),
            output: config.output.clone(),
            fonts: config.fonts.clone(),
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn from_config_copies_layout_values() {
        let params = RenderParams::default();
        assert_eq!((params.width, params.height), (1080, 1080));
        assert_eq!(params.shadow_offset, (3, 3));
        assert_eq!(params.quality.value(), 95);
        assert_eq!(params.output, PathBuf::from("temp_post_image.jpg"));
    }
}
