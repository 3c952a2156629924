//! One publishing pass: pop an entry, render it, upload it.
//!
//! ```text
//! Start → PopEntry ─┬─ no entry ───────────────→ NoEntry
//!                   └→ RenderImage ─┬─ failed ──→ RenderFailed
//!                                   └→ Publish ─┬─ failed → PublishFailed (image kept)
//!                                               └────────→ Published (image removed)
//! ```
//!
//! The entry is removed from the bank before rendering, so any later failure
//! drops it. There is no re-queue. Progress is reported through
//! [`RunEvent`]s; formatting lives in [`output`](crate::output).

use crate::bank::{ContentBank, PopOutcome};
use crate::config::{Credentials, PressConfig};
use crate::publish::PagePublisher;
use crate::render::{FontResolver, PhotoSource, RenderParams, RenderedImage, create_quote_image};
use crate::types::PostId;
use std::path::PathBuf;
use tracing::{info, warn};

/// Progress reported while a pass runs.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    BankMissing { path: PathBuf },
    BankEmpty { path: PathBuf },
    BankUnreadable { message: String },
    Loaded { caption: String, remaining: usize },
    RenderStarted,
    Rendered(RenderedImage),
    RenderFailed { message: String },
    PublishStarted,
    Published { post_id: PostId },
    PublishFailed { message: String, image: PathBuf },
}

/// Final state of a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    NoEntry,
    RenderFailed,
    PublishFailed { image: PathBuf },
    Published { post_id: PostId },
}

impl RunOutcome {
    /// Process exit status for this outcome.
    ///
    /// A failed upload is only an error when `publish_failure_is_error` is set.
    pub fn exit_code(&self, publish_failure_is_error: bool) -> u8 {
        match self {
            RunOutcome::NoEntry | RunOutcome::RenderFailed => 1,
            RunOutcome::PublishFailed { .. } if publish_failure_is_error => 1,
            RunOutcome::PublishFailed { .. } | RunOutcome::Published { .. } => 0,
        }
    }
}

/// Run one pass. Never panics on remote or filesystem failures; every path
/// ends in a [`RunOutcome`].
pub fn post_once(
    config: &PressConfig,
    credentials: &Credentials,
    bank: &ContentBank,
    source: &impl PhotoSource,
    resolver: &impl FontResolver,
    on_event: &mut impl FnMut(&RunEvent),
) -> RunOutcome {
    let entry = match bank.pop_front() {
        Ok(PopOutcome::Entry { entry, remaining }) => {
            on_event(&RunEvent::Loaded {
                caption: entry.caption.clone(),
                remaining,
            });
            entry
        }
        Ok(PopOutcome::Missing) => {
            on_event(&RunEvent::BankMissing {
                path: bank.path().to_path_buf(),
            });
            return RunOutcome::NoEntry;
        }
        Ok(PopOutcome::Empty) => {
            on_event(&RunEvent::BankEmpty {
                path: bank.path().to_path_buf(),
            });
            return RunOutcome::NoEntry;
        }
        Err(e) => {
            warn!(error = %e, "could not pop bank entry");
            on_event(&RunEvent::BankUnreadable {
                message: e.to_string(),
            });
            return RunOutcome::NoEntry;
        }
    };

    on_event(&RunEvent::RenderStarted);
    let params = RenderParams::from_config(&config.render);
    let rendered = match create_quote_image(source, resolver, &entry.caption, &params) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "render failed");
            on_event(&RunEvent::RenderFailed {
                message: e.to_string(),
            });
            return RunOutcome::RenderFailed;
        }
    };
    let image = rendered.path.clone();
    on_event(&RunEvent::Rendered(rendered));

    on_event(&RunEvent::PublishStarted);
    let result = PagePublisher::new(&config.graph, &config.publish, credentials)
        .and_then(|publisher| publisher.publish_photo(&entry.caption, &image));
    match result {
        Ok(post_id) => {
            info!(%post_id, "published");
            on_event(&RunEvent::Published {
                post_id: post_id.clone(),
            });
            RunOutcome::Published { post_id }
        }
        Err(e) => {
            warn!(error = %e, image = %image.display(), "publish failed");
            on_event(&RunEvent::PublishFailed {
                message: e.to_string(),
                image: image.clone(),
            });
            RunOutcome::PublishFailed { image }
        }
    }
}
