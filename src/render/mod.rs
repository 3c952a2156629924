//! Quote image rendering: a stock photo with a contrast band and a centered caption.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Fetch background** | [`PhotoSource`] (`reqwest` blocking GET for [`PicsumSource`]) |
//! | **Decode** | `image::load_from_memory` |
//! | **Contrast band** | `image::imageops::overlay` of a translucent black strip |
//! | **Wrap + center** | pure functions in [`layout`] |
//! | **Glyphs** | `ab_glyph` outlines, or `font8x8` bitmaps as fallback |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Layout**: pure wrap/centering math (unit testable)
//! - **Parameters**: [`RenderParams`] describing one render
//! - **Font**: [`FontResolver`] trait + [`Typeface`]
//! - **Source**: [`PhotoSource`] trait + [`PicsumSource`]
//! - **Compose**: the pixel work, plus [`create_quote_image`] tying it together

pub mod compose;
pub mod font;
pub mod layout;
mod params;
pub mod source;

use thiserror::Error;

pub use compose::{RenderedImage, compose_quote, create_quote_image, save_jpeg};
pub use font::{FontError, FontPathResolver, FontResolver, Typeface, resolve_or_builtin};
pub use params::{Quality, RenderParams};
pub use source::{PhotoSource, PicsumSource};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to download background: {0}")]
    Download(String),
    #[error("failed to decode background: {0}")]
    Decode(image::ImageError),
    #[error("JPEG encode failed: {0}")]
    Encode(image::ImageError),
}
