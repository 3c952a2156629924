//! Pixel work: band, caption, JPEG.

use super::font::{FontResolver, Typeface, resolve_or_builtin};
use super::layout::{InkBox, LINE_SPACING, TextBlock, band_rows, center_ink, wrap_caption};
use super::params::{Quality, RenderParams};
use super::source::PhotoSource;
use super::RenderError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbImage, RgbaImage, imageops};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

const SHADOW: [u8; 3] = [0, 0, 0];
const FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A quote image written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub path: PathBuf,
    pub bytes: u64,
    /// Name of the face the caption was set in.
    pub font: String,
}

/// Composite the band and caption onto `background` and flatten to RGB.
pub fn compose_quote(
    background: &DynamicImage,
    caption: &str,
    face: &Typeface,
    params: &RenderParams,
) -> RgbImage {
    let mut canvas = background.to_rgba8();
    let (width, height) = canvas.dimensions();

    let (top, bottom) = band_rows(height);
    if bottom > top && width > 0 {
        let band = RgbaImage::from_pixel(width, bottom - top, Rgba([0, 0, 0, params.band_alpha]));
        imageops::overlay(&mut canvas, &band, 0, top as i64);
    }

    let block = TextBlock::measure(
        wrap_caption(caption, params.wrap_width),
        |line| face.line_width(line),
        face.line_height(),
        LINE_SPACING,
    );
    let Some(ink) = block_ink(face, &block) else {
        return DynamicImage::ImageRgba8(canvas).to_rgb8();
    };
    let origin = center_ink((width, height), ink);
    debug!(
        lines = block.lines.len(),
        ink_w = ink.width(),
        ink_h = ink.height(),
        x = origin.0,
        y = origin.1,
        "caption layout"
    );

    let (dx, dy) = params.shadow_offset;
    let [r, g, b] = SHADOW;
    let shadow = Rgba([r, g, b, params.shadow_alpha]);
    draw_block(&mut canvas, face, &block, (origin.0 + dx, origin.1 + dy), shadow);
    draw_block(&mut canvas, face, &block, origin, FOREGROUND);

    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Union of every line's drawn pixels with the block at the origin.
fn block_ink(face: &Typeface, block: &TextBlock) -> Option<InkBox> {
    block
        .lines
        .iter()
        .zip(block.line_origins((0, 0)))
        .filter_map(|(line, (x, y))| face.ink_bounds(line).map(|ink| ink.offset(x, y)))
        .reduce(InkBox::union)
}

fn draw_block(
    canvas: &mut RgbaImage,
    face: &Typeface,
    block: &TextBlock,
    origin: (i32, i32),
    color: Rgba<u8>,
) {
    for (line, (x, y)) in block.lines.iter().zip(block.line_origins(origin)) {
        face.draw_line(canvas, x, y, line, color);
    }
}

/// Encode as baseline JPEG.
pub fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), RenderError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(writer, quality.value())
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(RenderError::Encode)
}

/// Fetch a background, set the caption on it, and write `params.output`.
pub fn create_quote_image(
    source: &impl PhotoSource,
    resolver: &impl FontResolver,
    caption: &str,
    params: &RenderParams,
) -> Result<RenderedImage, RenderError> {
    let background = source.fetch(params.width, params.height)?;
    let face = resolve_or_builtin(resolver, params.font_size);
    let img = compose_quote(&background, caption, &face, params);
    save_jpeg(&img, &params.output, params.quality)?;
    let bytes = std::fs::metadata(&params.output)?.len();
    Ok(RenderedImage {
        path: params.output.clone(),
        bytes,
        font: face.describe(),
    })
}
