//! Background photo sources.

use super::RenderError;
use crate::config::StockConfig;
use image::DynamicImage;
use std::time::Duration;
use tracing::debug;

/// Supplies a background image of roughly the requested size.
pub trait PhotoSource {
    fn fetch(&self, width: u32, height: u32) -> Result<DynamicImage, RenderError>;
}

/// Random photos from a Lorem Picsum style service: `GET {url}/{w}/{h}`.
pub struct PicsumSource {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl PicsumSource {
    pub fn new(config: &StockConfig) -> Result<Self, RenderError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RenderError::Download(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

impl PhotoSource for PicsumSource {
    fn fetch(&self, width: u32, height: u32) -> Result<DynamicImage, RenderError> {
        let url = format!("{}/{}/{}", self.base_url, width, height);
        debug!(%url, "downloading background");
        let bytes = self
            .http
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| RenderError::Download(e.to_string()))?;
        image::load_from_memory(&bytes).map_err(RenderError::Decode)
    }
}
