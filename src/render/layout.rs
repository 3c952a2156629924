//! Pure layout functions for caption placement.
//!
//! Nothing here touches pixels or fonts directly: widths come in through a
//! measuring closure, so the math is testable with fixed-width metrics.

/// Vertical gap between wrapped lines, in pixels.
pub const LINE_SPACING: u32 = 4;

/// Greedy word wrap to at most `width` characters per line.
///
/// Runs of whitespace collapse to a single space. Words longer than `width`
/// are broken, filling the current line first.
///
/// ```
/// # use caption_press::render::layout::wrap_caption;
/// assert_eq!(wrap_caption("one two three", 7), ["one two", "three"]);
/// ```
pub fn wrap_caption(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let cur_len = current.chars().count();
            let word_len = word.chars().count();
            let needed = if current.is_empty() {
                word_len
            } else {
                cur_len + 1 + word_len
            };

            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }

            if word_len > width {
                let room = if current.is_empty() {
                    width
                } else {
                    width.saturating_sub(cur_len + 1)
                };
                if room == 0 {
                    lines.push(std::mem::take(&mut current));
                    continue;
                }
                let split = word
                    .char_indices()
                    .nth(room)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word[..split]);
                lines.push(std::mem::take(&mut current));
                word = &word[split..];
                continue;
            }

            lines.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rows covered by the contrast band: from 20% to 80% of the height.
pub fn band_rows(height: u32) -> (u32, u32) {
    let top = (height as f64 * 0.2) as u32;
    let bottom = (height as f64 * 0.8) as u32;
    (top, bottom)
}

/// Top-left corner that centers a `block` inside a `canvas`.
///
/// Signed so an oversized block hangs off both edges evenly.
pub fn center_origin(canvas: (u32, u32), block: (u32, u32)) -> (i32, i32) {
    let x = (canvas.0 as i64 - block.0 as i64) / 2;
    let y = (canvas.1 as i64 - block.1 as i64) / 2;
    (x as i32, y as i32)
}

/// Pixel extent of drawn ink. `max_x` and `max_y` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl InkBox {
    /// The box covering the single pixel at `(x, y)`.
    pub fn pixel(x: i32, y: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + 1,
            max_y: y + 1,
        }
    }

    pub fn union(self, other: InkBox) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }
}

/// Where to put a block's layout origin so its ink, not its advance box,
/// sits centered in `canvas`. `ink` is relative to the layout origin.
pub fn center_ink(canvas: (u32, u32), ink: InkBox) -> (i32, i32) {
    let (x, y) = center_origin(canvas, (ink.width(), ink.height()));
    (x - ink.min_x, y - ink.min_y)
}

/// Measured multi-line text. Each line is centered inside the block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub line_widths: Vec<u32>,
    pub line_height: u32,
    pub spacing: u32,
    pub width: u32,
    pub height: u32,
}

impl TextBlock {
    pub fn measure(
        lines: Vec<String>,
        measure: impl Fn(&str) -> u32,
        line_height: u32,
        spacing: u32,
    ) -> Self {
        let line_widths: Vec<u32> = lines.iter().map(|l| measure(l)).collect();
        let width = line_widths.iter().copied().max().unwrap_or(0);
        let height = match lines.len() {
            0 => 0,
            n => n as u32 * line_height + (n as u32 - 1) * spacing,
        };
        Self {
            lines,
            line_widths,
            line_height,
            spacing,
            width,
            height,
        }
    }

    /// Top-left corner of each line when the block sits at `origin`.
    pub fn line_origins(&self, origin: (i32, i32)) -> Vec<(i32, i32)> {
        self.line_widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let x = origin.0 + (self.width - w) as i32 / 2;
                let y = origin.1 + (i as u32 * (self.line_height + self.spacing)) as i32;
                (x, y)
            })
            .collect()
    }
}
