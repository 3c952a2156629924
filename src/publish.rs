//! Photo upload to a social page.
//!
//! One multipart POST per image. On success the local image is deleted (a
//! failed delete is only logged); on any upload failure it is left on disk
//! for inspection.

use crate::config::{Credentials, GraphConfig, PublishConfig, timeout};
use crate::types::PostId;
use reqwest::blocking::multipart::{Form, Part};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error(
        "missing {} or {} environment variable",
        crate::config::PAGE_TOKEN_VAR,
        crate::config::PAGE_ID_VAR
    )]
    MissingCredentials,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Read the post identifier from a publish response.
///
/// Prefers `post_id`, then `id`. Numeric ids are accepted too.
pub fn extract_post_id(body: &serde_json::Value) -> Option<PostId> {
    ["post_id", "id"].iter().find_map(|key| match body.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(PostId(s.clone())),
        serde_json::Value::Number(n) => Some(PostId(n.to_string())),
        _ => None,
    })
}

pub struct PagePublisher {
    http: reqwest::blocking::Client,
    url: String,
    access_token: String,
}

impl PagePublisher {
    /// Fails with [`PublishError::MissingCredentials`] before any network
    /// setup when the token or page id is absent.
    pub fn new(
        graph: &GraphConfig,
        publish: &PublishConfig,
        credentials: &Credentials,
    ) -> Result<Self, PublishError> {
        let (Some(token), Some(page_id)) = (
            credentials.page_access_token.as_deref(),
            credentials.page_id.as_deref(),
        ) else {
            return Err(PublishError::MissingCredentials);
        };
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout(publish.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: graph.photos_url(page_id),
            access_token: token.to_string(),
        })
    }

    /// Upload `image` with `caption` as the post message.
    pub fn publish_photo(&self, caption: &str, image: &Path) -> Result<PostId, PublishError> {
        let bytes = std::fs::read(image)?;
        let source = Part::bytes(bytes)
            .file_name("post.jpg")
            .mime_str("image/jpeg")?;
        let form = Form::new()
            .text("message", caption.to_string())
            .text("access_token", self.access_token.clone())
            .part("source", source);

        debug!(url = %self.url, image = %image.display(), "uploading photo");
        let response = self.http.post(&self.url).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(PublishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let post_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| extract_post_id(&v))
            .unwrap_or_else(|| {
                warn!(%body, "publish response carried no post id");
                PostId("unknown".to_string())
            });

        discard_uploaded(image);
        Ok(post_id)
    }
}

/// Delete an image that is already live. Failures are logged, not returned.
fn discard_uploaded(image: &Path) -> bool {
    match std::fs::remove_file(image) {
        Ok(()) => true,
        Err(e) => {
            warn!(image = %image.display(), error = %e, "published, but could not remove image");
            false
        }
    }
}
