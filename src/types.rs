//! Shared types passed between the generator, the bank, and the publisher.
//!
//! The bank file is the only contract between the `generate` and `post`
//! steps, so [`ContentEntry`] is the one type both sides agree on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One queued post: the text to publish and a description of the picture
/// that should accompany it.
///
/// `image_prompt` is carried through the bank but not consumed by the
/// publisher yet; stock photos are used as backgrounds instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub caption: String,
    #[serde(default)]
    pub image_prompt: String,
}

impl ContentEntry {
    /// Convert a raw JSON value read from the bank.
    ///
    /// Only `caption` is required here. Returns `None` when the value is not
    /// an object or has no string `caption`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// True when a raw generated value carries both required fields.
    ///
    /// The generator applies this stricter check before anything reaches the
    /// bank.
    pub fn is_complete(value: &serde_json::Value) -> bool {
        value
            .as_object()
            .is_some_and(|obj| obj.contains_key("caption") && obj.contains_key("image_prompt"))
    }
}

/// Identifier the page API returns for a published photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_reads_both_fields() {
        let entry = ContentEntry::from_value(json!({"caption": "A", "image_prompt": "x"})).unwrap();
        assert_eq!(entry.caption, "A");
        assert_eq!(entry.image_prompt, "x");
    }

    #[test]
    fn from_value_tolerates_missing_prompt() {
        let entry = ContentEntry::from_value(json!({"caption": "A"})).unwrap();
        assert_eq!(entry.image_prompt, "");
    }

    #[test]
    fn from_value_rejects_missing_caption() {
        assert!(ContentEntry::from_value(json!({"image_prompt": "x"})).is_none());
        assert!(ContentEntry::from_value(json!({"caption": 3})).is_none());
        assert!(ContentEntry::from_value(json!(["caption"])).is_none());
    }

    #[test]
    fn is_complete_requires_both_keys() {
        assert!(ContentEntry::is_complete(&json!({"caption": "A", "image_prompt": "x"})));
        assert!(!ContentEntry::is_complete(&json!({"caption": "A"})));
        assert!(!ContentEntry::is_complete(&json!("caption image_prompt")));
    }
}
