//! CLI output formatting.
//!
//! Each step has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions do no I/O.
//!
//! ## Post
//!
//! ```text
//! Loaded post from bank. 29 posts remaining.
//! Caption: Pineapple on pizza: Yes or No?
//! Creating quote image...
//!     Image created: temp_post_image.jpg (182 KB)
//!     Font: /usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf
//! Publishing...
//! Posted! Post ID: 1234_5678
//! ```
//!
//! ## Generate
//!
//! ```text
//! Generating 30 posts with image ideas...
//! Saved 28 of 30 posts to facebook_image_content_bank.jsonl (2 skipped: missing caption or image_prompt)
//! ```

use crate::generator::{GenerateError, GenerateReport};
use crate::pipeline::RunEvent;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_start(count: u32) -> String {
    format!("Generating {count} posts with image ideas...")
}

pub fn format_generate_report(report: &GenerateReport, bank: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Saved {} of {} to {}",
        report.written,
        plural(report.returned, "post"),
        bank.display()
    )];
    if report.skipped > 0 {
        lines[0].push_str(&format!(
            " ({} skipped: missing caption or image_prompt)",
            report.skipped
        ));
    }
    lines
}

pub fn format_generate_error(err: &GenerateError) -> Vec<String> {
    match err {
        GenerateError::Api { status, body } => vec![
            format!("Error generating posts: completion API returned {status}"),
            format!("{}API Response: {}", indent(1), body),
        ],
        other => vec![format!("Error generating posts: {other}")],
    }
}

pub fn print_generate_report(report: &GenerateReport, bank: &Path) {
    for line in format_generate_report(report, bank) {
        println!("{}", line);
    }
}

pub fn print_generate_error(err: &GenerateError) {
    for line in format_generate_error(err) {
        println!("{}", line);
    }
}

// ============================================================================
// Post
// ============================================================================

pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::BankMissing { path } => vec![
            format!("{} not found.", path.display()),
            "Run `caption-press generate` first, or point --bank at an existing file.".to_string(),
        ],
        RunEvent::BankEmpty { path } => vec![format!(
            "Content bank {} is empty! Run `caption-press generate` to refill it.",
            path.display()
        )],
        RunEvent::BankUnreadable { message } => {
            vec![format!("Error reading content bank: {message}")]
        }
        RunEvent::Loaded { caption, remaining } => vec![
            format!(
                "Loaded post from bank. {} remaining.",
                plural(*remaining, "post")
            ),
            format!("Caption: {caption}"),
        ],
        RunEvent::RenderStarted => vec!["Creating quote image...".to_string()],
        RunEvent::Rendered(img) => vec![
            format!(
                "{}Image created: {} ({} KB)",
                indent(1),
                img.path.display(),
                img.bytes / 1024
            ),
            format!("{}Font: {}", indent(1), img.font),
        ],
        RunEvent::RenderFailed { message } => vec![
            format!("Failed to create image: {message}"),
        ],
        RunEvent::PublishStarted => vec!["Publishing...".to_string()],
        RunEvent::Published { post_id } => vec![format!("Posted! Post ID: {post_id}")],
        RunEvent::PublishFailed { message, image } => vec![
            format!("Publish failed: {message}"),
            format!("{}Image kept at {}", indent(1), image.display()),
        ],
    }
}

pub fn print_run_event(event: &RunEvent) {
    for line in format_run_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

pub fn format_status(bank: &Path, entries: usize, exists: bool) -> String {
    if exists {
        format!("{}: {} queued", bank.display(), plural(entries, "post"))
    } else {
        format!("{}: not found", bank.display())
    }
}
