//! # caption-press
//!
//! Keeps a social page fed with captioned photos. A language model writes
//! captions in bulk; a scheduled job publishes them one at a time as quote
//! images.
//!
//! # Architecture: Two Independent Steps
//!
//! The steps share nothing but a line-delimited JSON file, the *content bank*:
//!
//! ```text
//! 1. Generate   completion API  →  bank (append N lines)
//! 2. Post       bank (pop 1 line)  →  quote image  →  page photo upload
//! ```
//!
//! Each step is a separate invocation of the binary, typically from cron or a
//! CI schedule. Generation runs rarely and in bulk to keep API costs down;
//! posting runs often and does one entry per run.
//!
//! The bank is not locked. Running `generate` and `post` at the same moment
//! can lose entries; schedule them apart.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generator`] | Step 1: one completion request, lenient reply parsing, append to bank |
//! | [`bank`] | The JSONL queue: append, pop-front with rename commit |
//! | [`render`] | Stock photo + contrast band + centered caption → JPEG |
//! | [`publish`] | Multipart photo upload to the page API |
//! | [`pipeline`] | Step 2: the pop → render → publish pass and its outcomes |
//! | [`config`] | `caption-press.toml` loading/merging/validation, environment credentials |
//! | [`types`] | [`ContentEntry`](types::ContentEntry) and [`PostId`](types::PostId) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Consume Before Publish
//!
//! An entry leaves the bank before its image is rendered. A failed render or
//! upload drops that caption rather than retrying it forever on every run.
//! The rendered JPEG is kept on disk after a failed upload so it can be
//! inspected or posted by hand.
//!
//! ## Explicit Configuration
//!
//! Nothing reads the environment except [`config::Credentials::from_env`] in
//! the binary. Every operation takes its config and credentials as arguments,
//! so tests build them directly.
//!
//! ## Fonts Without System Dependencies
//!
//! System fonts are preferred, but a bitmap face is compiled in so a bare
//! container still produces a legible image.

pub mod bank;
pub mod config;
pub mod generator;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod types;
