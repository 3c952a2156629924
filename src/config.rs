//! Configuration module.
//!
//! Handles loading, validating, and merging `caption-press.toml`. Stock
//! defaults are serialized to a TOML table, the user file is merged on top,
//! and the result is deserialized with unknown keys rejected.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [bank]
//! path = "facebook_image_content_bank.jsonl"
//!
//! [generator]
//! endpoint = "https://openrouter.ai/api/v1/chat/completions"
//! model = "google/gemini-2.5-flash"
//! count = 30
//! fail_on_error = false
//! # timeout_secs = 60
//!
//! [stock]
//! url = "https://picsum.photos"
//! user_agent = "Mozilla/5.0"
//! timeout_secs = 15
//!
//! [render]
//! width = 1080
//! height = 1080
//! wrap_width = 26
//! font_size = 52
//! band_alpha = 170
//! shadow_alpha = 200
//! shadow_offset = [3, 3]
//! quality = 95
//! output = "temp_post_image.jpg"
//! fonts = ["/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf", ...]
//!
//! [graph]
//! base_url = "https://graph.facebook.com"
//! version = "v21.0"
//!
//! [publish]
//! fail_on_error = false
//! # timeout_secs = 120
//! ```
//!
//! Secrets are never read from this file. See [`Credentials`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "caption-press.toml";

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const PAGE_TOKEN_VAR: &str = "FACEBOOK_PAGE_ACCESS_TOKEN";
pub const PAGE_ID_VAR: &str = "FACEBOOK_PAGE_ID";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration loaded from `caption-press.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PressConfig {
    /// Location of the line-delimited content bank.
    pub bank: BankConfig,
    /// Completion API settings for bulk caption generation.
    pub generator: GeneratorConfig,
    /// Stock photo source for image backgrounds.
    pub stock: StockConfig,
    /// Quote image layout and encoding.
    pub render: RenderConfig,
    /// Page API endpoint.
    pub graph: GraphConfig,
    /// Publishing behavior.
    pub publish: PublishConfig,
}

impl PressConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.count == 0 {
            return Err(ConfigError::Validation(
                "generator.count must be at least 1".into(),
            ));
        }
        if self.render.quality == 0 || self.render.quality > 100 {
            return Err(ConfigError::Validation(
                "render.quality must be 1-100".into(),
            ));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::Validation(
                "render.width and render.height must be non-zero".into(),
            ));
        }
        if self.render.wrap_width == 0 {
            return Err(ConfigError::Validation(
                "render.wrap_width must be non-zero".into(),
            ));
        }
        if self.render.font_size == 0 {
            return Err(ConfigError::Validation(
                "render.font_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BankConfig {
    pub path: PathBuf,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::bank::DEFAULT_BANK_FILENAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Chat-completion endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Number of posts requested per run.
    pub count: u32,
    /// Request timeout. Absent means wait indefinitely.
    pub timeout_secs: Option<u64>,
    /// Exit non-zero when generation fails.
    pub fail_on_error: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            count: 30,
            timeout_secs: None,
            fail_on_error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StockConfig {
    /// Base URL; the image is fetched from `{url}/{width}/{height}`.
    pub url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            url: "https://picsum.photos".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Caption wrap width in characters.
    pub wrap_width: usize,
    /// Em size of the caption face in pixels.
    pub font_size: u32,
    /// Opacity of the contrast band (0-255).
    pub band_alpha: u8,
    /// Opacity of the drop shadow (0-255).
    pub shadow_alpha: u8,
    pub shadow_offset: [i32; 2],
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Where the rendered image is written before upload.
    pub output: PathBuf,
    /// Font files tried in order; the builtin bitmap face is used when none load.
    pub fonts: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1080,
            wrap_width: 26,
            font_size: 52,
            band_alpha: 170,
            shadow_alpha: 200,
            shadow_offset: [3, 3],
            quality: 95,
            output: PathBuf::from("temp_post_image.jpg"),
            fonts: crate::render::font::DEFAULT_FONT_PATHS
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub base_url: String,
    pub version: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com".to_string(),
            version: "v21.0".to_string(),
        }
    }
}

impl GraphConfig {
    /// Photo upload URL for a page.
    pub fn photos_url(&self, page_id: &str) -> String {
        format!(
            "{}/{}/{}/photos",
            self.base_url.trim_end_matches('/'),
            self.version,
            page_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Upload timeout. Absent means wait indefinitely.
    pub timeout_secs: Option<u64>,
    /// Exit non-zero when the upload fails. The entry is consumed either way.
    pub fail_on_error: bool,
}

/// Convert an optional seconds value to the shape reqwest expects.
pub fn timeout(secs: Option<u64>) -> Option<Duration> {
    secs.map(Duration::from_secs)
}

// =============================================================================
// Credentials
// =============================================================================

/// Secrets read from the environment.
///
/// Built from an arbitrary lookup function so tests never touch the process
/// environment. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub page_access_token: Option<String>,
    pub page_id: Option<String>,
}

impl Credentials {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            api_key: get(API_KEY_VAR),
            page_access_token: get(PAGE_TOKEN_VAR),
            page_id: get(PAGE_ID_VAR),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PressConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PressConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PressConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<PressConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `caption-press.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# caption-press configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.
#
# Secrets are read from the environment (or a .env file), never from here:
#   OPENROUTER_API_KEY          completion API key (generate)
#   FACEBOOK_PAGE_ACCESS_TOKEN  page access token (post)
#   FACEBOOK_PAGE_ID            page identifier (post)

# ---------------------------------------------------------------------------
# Content bank: one JSON object per line, consumed from the top
# ---------------------------------------------------------------------------
[bank]
path = "facebook_image_content_bank.jsonl"

# ---------------------------------------------------------------------------
# Caption generation
# ---------------------------------------------------------------------------
[generator]
endpoint = "https://openrouter.ai/api/v1/chat/completions"
model = "google/gemini-2.5-flash"

# Posts requested per run.
count = 30

# Exit with status 1 when generation fails.
fail_on_error = false

# Request timeout in seconds. Omit to wait indefinitely.
# timeout_secs = 60

# ---------------------------------------------------------------------------
# Stock photo backgrounds, fetched from {url}/{width}/{height}
# ---------------------------------------------------------------------------
[stock]
url = "https://picsum.photos"
user_agent = "Mozilla/5.0"
timeout_secs = 15

# ---------------------------------------------------------------------------
# Quote image
# ---------------------------------------------------------------------------
[render]
width = 1080
height = 1080

# Caption wrap width in characters.
wrap_width = 26

# Em size of the caption face in pixels.
font_size = 52

# Opacity (0-255) of the dark band behind the text and of the text shadow.
band_alpha = 170
shadow_alpha = 200
shadow_offset = [3, 3]

# JPEG quality (1-100).
quality = 95

# Temporary file the image is written to before upload.
output = "temp_post_image.jpg"

# Bold fonts tried in order. A builtin bitmap face is used if none load.
fonts = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
    "arial.ttf",
]

# ---------------------------------------------------------------------------
# Page API
# ---------------------------------------------------------------------------
[graph]
base_url = "https://graph.facebook.com"
version = "v21.0"

[publish]
# Exit with status 1 when the upload fails. The entry is consumed either way.
fail_on_error = false

# Upload timeout in seconds. Omit to wait indefinitely.
# timeout_secs = 120
"##
}
