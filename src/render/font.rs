//! Caption typefaces and how they are found.
//!
//! A [`FontResolver`] turns a pixel size into a [`Typeface`], or reports
//! [`FontError::NoFontAvailable`]. [`resolve_or_builtin`] is the policy the
//! pipeline uses: try the resolver, fall back to the bitmap face that is
//! compiled into the binary.

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use super::layout::InkBox;
use image::{Pixel, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Bold faces probed by default, in order.
pub const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
    "arial.ttf",
];

/// The bitmap face draws each 8x8 cell at `size / BUILTIN_DIVISOR` pixels
/// per dot, which puts its advance near a bold face's average width.
const BUILTIN_DIVISOR: u32 = 13;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("no usable font among {} candidate(s): {tried:?}", .tried.len())]
    NoFontAvailable { tried: Vec<PathBuf> },
}

/// A face ready to measure and draw one line of text at a fixed size.
pub enum Typeface {
    TrueType {
        font: FontVec,
        scale: PxScale,
        source: PathBuf,
    },
    /// `font8x8` glyphs, each dot drawn as a `dot` x `dot` square.
    Builtin { dot: u32 },
}

impl Typeface {
    /// Load a TrueType/OpenType face whose em is `size` pixels tall.
    pub fn truetype(font: FontVec, size: u32, source: impl Into<PathBuf>) -> Self {
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        let scale = PxScale::from(size as f32 * font.height_unscaled() / units_per_em);
        Typeface::TrueType {
            font,
            scale,
            source: source.into(),
        }
    }

    pub fn builtin(size: u32) -> Self {
        Typeface::Builtin {
            dot: (size / BUILTIN_DIVISOR).max(1),
        }
    }

    /// Short human-readable name for progress output.
    pub fn describe(&self) -> String {
        match self {
            Typeface::TrueType { source, .. } => source.display().to_string(),
            Typeface::Builtin { .. } => "builtin bitmap".to_string(),
        }
    }

    /// Advance width of a line in pixels.
    pub fn line_width(&self, text: &str) -> u32 {
        match self {
            Typeface::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                let mut width = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width.ceil().max(0.0) as u32
            }
            Typeface::Builtin { dot } => text.chars().count() as u32 * 8 * dot,
        }
    }

    /// Height of one line (ascent to descent) in pixels.
    pub fn line_height(&self) -> u32 {
        match self {
            Typeface::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                (scaled.ascent() - scaled.descent()).ceil() as u32
            }
            Typeface::Builtin { dot } => 8 * dot,
        }
    }

    /// Draw one line with its top-left corner at `(x, y)`, blending `color`
    /// by glyph coverage. Pixels outside the canvas are clipped.
    pub fn draw_line(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
        self.rasterize(x, y, text, |px, py, coverage| {
            blend(canvas, px, py, color, coverage);
        });
    }

    /// Extent of the pixels an opaque [`draw_line`](Self::draw_line) at
    /// `(0, 0)` would change. `None` for text with no visible glyphs.
    pub fn ink_bounds(&self, text: &str) -> Option<InkBox> {
        let mut ink: Option<InkBox> = None;
        self.rasterize(0, 0, text, |px, py, coverage| {
            if painted_alpha(u8::MAX, coverage) == 0 {
                return;
            }
            let dot = InkBox::pixel(px, py);
            ink = Some(ink.map_or(dot, |b| b.union(dot)));
        });
        ink
    }

    /// Visit every pixel covered by `text` set at `(x, y)` with its coverage.
    fn rasterize(&self, x: i32, y: i32, text: &str, mut plot: impl FnMut(i32, i32, f32)) {
        match self {
            Typeface::TrueType { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                let baseline = y as f32 + scaled.ascent();
                let mut caret = x as f32;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(p) = prev {
                        caret += scaled.kern(p, id);
                    }
                    let glyph = id.with_scale_and_position(*scale, point(caret, baseline));
                    caret += scaled.h_advance(id);
                    prev = Some(id);

                    if let Some(outlined) = font.outline_glyph(glyph) {
                        let bounds = outlined.px_bounds();
                        let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
                        outlined.draw(|gx, gy, coverage| {
                            plot(ox + gx as i32, oy + gy as i32, coverage);
                        });
                    }
                }
            }
            Typeface::Builtin { dot } => {
                let dot = *dot as i32;
                for (i, ch) in text.chars().enumerate() {
                    let rows = BASIC_FONTS
                        .get(ch)
                        .or_else(|| BASIC_FONTS.get('?'))
                        .unwrap_or([0; 8]);
                    let cell_x = x + i as i32 * 8 * dot;
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..8 {
                            if (bits >> col) & 1 == 0 {
                                continue;
                            }
                            let px = cell_x + col * dot;
                            let py = y + row as i32 * dot;
                            for dy in 0..dot {
                                for dx in 0..dot {
                                    plot(px + dx, py + dy, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn painted_alpha(alpha: u8, coverage: f32) -> u8 {
    (alpha as f32 * coverage.clamp(0.0, 1.0)).round() as u8
}

fn blend(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let mut paint = color;
    paint.0[3] = painted_alpha(color.0[3], coverage);
    if paint.0[3] == 0 {
        return;
    }
    canvas.get_pixel_mut(x as u32, y as u32).blend(&paint);
}

/// Finds a face for captions.
pub trait FontResolver {
    fn resolve(&self, size: u32) -> Result<Typeface, FontError>;
}

/// Probes an ordered list of font files; the first one that parses wins.
#[derive(Debug, Clone)]
pub struct FontPathResolver {
    candidates: Vec<PathBuf>,
}

impl FontPathResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    fn load(path: &Path) -> Option<FontVec> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "font not readable");
                return None;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "font not parseable");
                None
            }
        }
    }
}

impl Default for FontPathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect())
    }
}

impl FontResolver for FontPathResolver {
    fn resolve(&self, size: u32) -> Result<Typeface, FontError> {
        for path in &self.candidates {
            if let Some(font) = Self::load(path) {
                debug!(path = %path.display(), size, "resolved caption font");
                return Ok(Typeface::truetype(font, size, path));
            }
        }
        Err(FontError::NoFontAvailable {
            tried: self.candidates.clone(),
        })
    }
}

/// Resolve a face, falling back to the builtin bitmap face.
pub fn resolve_or_builtin(resolver: &impl FontResolver, size: u32) -> Typeface {
    resolver.resolve(size).unwrap_or_else(|e| {
        warn!(error = %e, "falling back to builtin bitmap font");
        Typeface::builtin(size)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFonts;

    impl FontResolver for NoFonts {
        fn resolve(&self, _size: u32) -> Result<Typeface, FontError> {
            Err(FontError::NoFontAvailable { tried: Vec::new() })
        }
    }

    #[test]
    fn path_resolver_reports_every_candidate_tried() {
        let tmp = tempfile::TempDir::new().unwrap();
        let garbage = tmp.path().join("broken.ttf");
        std::fs::write(&garbage, b"not a font").unwrap();
        let missing = tmp.path().join("missing.ttf");

        let resolver = FontPathResolver::new(vec![garbage.clone(), missing.clone()]);
        match resolver.resolve(52) {
            Err(FontError::NoFontAvailable { tried }) => assert_eq!(tried, [garbage, missing]),
            Ok(_) => panic!("expected no font"),
        }
    }

    #[test]
    fn empty_candidate_list_has_no_font() {
        let resolver = FontPathResolver::new(Vec::new());
        assert!(resolver.resolve(52).is_err());
    }

    #[test]
    fn fallback_is_builtin() {
        let face = resolve_or_builtin(&NoFonts, 52);
        assert!(matches!(face, Typeface::Builtin { dot: 4 }));
        assert_eq!(face.describe(), "builtin bitmap");
    }

    #[test]
    fn builtin_metrics_scale_with_size() {
        let face = Typeface::builtin(52);
        assert_eq!(face.line_width("abc"), 96);
        assert_eq!(face.line_height(), 32);
        // Tiny sizes never collapse to zero
        assert_eq!(Typeface::builtin(1).line_height(), 8);
    }

    #[test]
    fn builtin_draws_inside_its_cell() {
        let face = Typeface::builtin(13);
        let mut canvas = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255]));
        face.draw_line(&mut canvas, 2, 3, "H", Rgba([255, 255, 255, 255]));

        let lit: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&(x, y)| (2..10).contains(&x) && (3..11).contains(&y)));
    }

    /// Box around the pixels `draw_line` lit on a black canvas.
    fn lit_box(face: &Typeface, text: &str, at: (i32, i32)) -> Option<InkBox> {
        let mut canvas = RgbaImage::from_pixel(200, 120, Rgba([0, 0, 0, 255]));
        face.draw_line(&mut canvas, at.0, at.1, text, Rgba([255, 255, 255, 255]));
        canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(x, y, _)| InkBox::pixel(x as i32, y as i32))
            .reduce(InkBox::union)
    }

    #[test]
    fn builtin_ink_matches_drawn_pixels() {
        let face = Typeface::builtin(26);
        for text in ["H", "gyp", "a.b", "--"] {
            let ink = face.ink_bounds(text).unwrap();
            assert_eq!(lit_box(&face, text, (10, 20)), Some(ink.offset(10, 20)), "{text:?}");
        }
        // Ink is tighter than the advance box
        let ink = face.ink_bounds(".").unwrap();
        assert!(ink.width() < face.line_width("."));
        assert!(face.ink_bounds("   ").is_none());
    }

    #[test]
    fn truetype_ink_matches_drawn_pixels() {
        let Ok(face) = FontPathResolver::default().resolve(40) else {
            return;
        };
        for text in ["A", "gypsy", "Yes or No?"] {
            let ink = face.ink_bounds(text).unwrap();
            let lit = lit_box(&face, text, (10, 20)).unwrap();
            let expected = ink.offset(10, 20);
            // The faintest edge pixels may round to black after blending
            assert!((lit.min_x - expected.min_x).abs() <= 1, "{text:?}");
            assert!((lit.min_y - expected.min_y).abs() <= 1, "{text:?}");
            assert!((lit.max_x - expected.max_x).abs() <= 1, "{text:?}");
            assert!((lit.max_y - expected.max_y).abs() <= 1, "{text:?}");
        }
    }

    #[test]
    fn draw_clips_at_canvas_edges() {
        let face = Typeface::builtin(52);
        let mut canvas = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        face.draw_line(&mut canvas, -20, -20, "WWW", Rgba([255, 255, 255, 255]));
        face.draw_line(&mut canvas, 8, 8, "WWW", Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn system_font_resolves_when_present() {
        let resolver = FontPathResolver::default();
        // Only meaningful on hosts that ship one of the default faces
        if let Ok(face) = resolver.resolve(52) {
            assert!(face.line_height() > 40);
            assert!(face.line_width("Hello") > face.line_width("Hi"));
        }
    }
}
