//! Bulk caption generation through a chat-completion API.
//!
//! One request asks the model for `count` posts at once. The reply is parsed
//! leniently (code fences, wrapper objects), validated as a whole, and only
//! then appended to the bank, so a bad reply never leaves a partial batch.
//!
//! Parsing is split into pure functions ([`strip_code_fence`],
//! [`extract_posts`], [`select_entries`]) so it can be tested without a server.

use crate::bank::{BankError, ContentBank};
use crate::config::{Credentials, GeneratorConfig, timeout};
use crate::types::ContentEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a social media expert whose only goal is to maximize comment count on Facebook posts.";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("missing {} environment variable", crate::config::API_KEY_VAR)]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected completion response: {0}")]
    Payload(String),
    #[error("model reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model did not return a non-empty list of posts")]
    NotAList,
    #[error("failed to write bank: {0}")]
    Bank(#[from] BankError),
}

/// Counts reported after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateReport {
    /// Elements in the model's list.
    pub returned: usize,
    /// Elements appended to the bank.
    pub written: usize,
    /// Elements dropped for missing a required field.
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// JSON body of a chat-completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

fn user_prompt(count: u32) -> String {
    format!(
        "Generate {count} highly engaging, viral Facebook posts that include an image. \
The content should be fascinating facts, 'would you rather' scenarios, or controversial \
technology opinions designed to force people to comment. \
For each post, provide: \n\
1. 'caption': The text to post (under 25 words).\n\
2. 'image_prompt': A highly detailed, descriptive prompt for an AI image generator to create the accompanying picture.\n\n\
Format the output strictly as a JSON array of objects, like this:\n\
[\n  {{\"caption\": \"Pineapple on pizza: Yes or No?\", \"image_prompt\": \"A cinematic, slightly dramatic close-up photo of a pepperoni pizza with large chunks of glowing yellow pineapple on it\"}}\n]"
    )
}

/// Build the request body asking for `count` caption/prompt pairs.
pub fn build_request(count: u32, model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: SYSTEM_PROMPT.into(),
            },
            ChatMessage {
                role: "user".into(),
                content: user_prompt(count),
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object".into(),
        },
    }
}

/// Remove a Markdown code fence wrapped around a reply, if present.
///
/// ```
/// # use caption_press::generator::strip_code_fence;
/// assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
/// assert_eq!(strip_code_fence("[1]"), "[1]");
/// ```
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(body) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the model's reply into the list of generated posts.
///
/// Accepts a bare array, or an object whose first array-valued key holds the
/// posts. Anything else, or an empty list, is [`GenerateError::NotAList`].
pub fn extract_posts(content: &str) -> Result<Vec<Value>, GenerateError> {
    let parsed: Value = serde_json::from_str(strip_code_fence(content))?;
    let posts = match parsed {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or(GenerateError::NotAList)?,
        _ => return Err(GenerateError::NotAList),
    };
    if posts.is_empty() {
        return Err(GenerateError::NotAList);
    }
    Ok(posts)
}

/// Keep, in order, the posts that have both `caption` and `image_prompt`.
///
/// Returns the kept posts and how many were skipped.
pub fn select_entries(posts: &[Value]) -> (Vec<Value>, usize) {
    let kept: Vec<Value> = posts
        .iter()
        .filter(|p| ContentEntry::is_complete(p))
        .cloned()
        .collect();
    let skipped = posts.len() - kept.len();
    (kept, skipped)
}

/// Blocking client for the completion endpoint.
pub struct CompletionClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(config: &GeneratorConfig, api_key: &str) -> Result<Self, GenerateError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Send the request and return the first choice's message content.
    pub fn complete(&self, request: &CompletionRequest) -> Result<String, GenerateError> {
        debug!(endpoint = %self.endpoint, model = %request.model, "requesting completion");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(GenerateError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Payload(format!("{e}: {body}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerateError::Payload(format!("no choices in response: {body}")))
    }
}

/// Request `config.count` posts and append the usable ones to the bank.
///
/// Nothing is written unless the whole reply validates.
pub fn generate_bulk(
    config: &GeneratorConfig,
    credentials: &Credentials,
    bank: &ContentBank,
) -> Result<GenerateReport, GenerateError> {
    let api_key = credentials
        .api_key
        .as_deref()
        .ok_or(GenerateError::MissingApiKey)?;

    let client = CompletionClient::new(config, api_key)?;
    let content = client.complete(&build_request(config.count, &config.model))?;
    let posts = extract_posts(&content)?;
    let (kept, skipped) = select_entries(&posts);
    let written = bank.append(&kept)?;

    info!(returned = posts.len(), written, skipped, "generation complete");
    Ok(GenerateReport {
        returned: posts.len(),
        written,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(build_request(5, "m/x")).unwrap();
        assert_eq!(body["model"], "m/x");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_object");
        let prompt = body["messages"][1]["content"].as_str().unwrap();
        assert!(prompt.starts_with("Generate 5 "));
        assert!(prompt.contains("'image_prompt'"));
    }

    #[test]
    fn strip_fence_variants() {
        assert_eq!(strip_code_fence("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  [1, 2]  \n"), "[1, 2]");
        // Opening fence without a closing one
        assert_eq!(strip_code_fence("```json\n[3]"), "[3]");
    }

    #[test]
    fn fenced_and_bare_parse_identically() {
        let bare = r#"[{"caption":"A","image_prompt":"x"},{"caption":"B","image_prompt":"y"}]"#;
        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(extract_posts(bare).unwrap(), extract_posts(&fenced).unwrap());
    }

    #[test]
    fn extract_unwraps_object_holding_array() {
        let posts = extract_posts(r#"{"count": 2, "posts": [{"caption":"A","image_prompt":"x"}]}"#)
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["caption"], "A");
    }

    #[test]
    fn extract_rejects_non_lists() {
        assert!(matches!(extract_posts("[]"), Err(GenerateError::NotAList)));
        assert!(matches!(
            extract_posts(r#"{"posts": []}"#),
            Err(GenerateError::NotAList)
        ));
        assert!(matches!(
            extract_posts(r#"{"caption": "A"}"#),
            Err(GenerateError::NotAList)
        ));
        assert!(matches!(extract_posts("42"), Err(GenerateError::NotAList)));
        assert!(matches!(
            extract_posts("Sure! Here are your posts"),
            Err(GenerateError::Json(_))
        ));
    }

    #[test]
    fn select_keeps_complete_entries_in_order() {
        let posts = vec![
            json!({"caption": "A", "image_prompt": "x"}),
            json!({"caption": "no prompt"}),
            json!({"image_prompt": "no caption"}),
            json!("just a string"),
            json!({"caption": "B", "image_prompt": "y", "extra": true}),
        ];
        let (kept, skipped) = select_entries(&posts);
        assert_eq!(skipped, 3);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0]["caption"], "A");
        assert_eq!(kept[1]["caption"], "B");
        assert_eq!(kept[1]["extra"], true);
    }

    #[test]
    fn missing_key_fails_before_network() {
        let tmp = tempfile::TempDir::new().unwrap();
        let bank = ContentBank::new(tmp.path().join("bank.jsonl"));
        let config = GeneratorConfig {
            // Unroutable: reaching the network would hang or error differently
            endpoint: "http://192.0.2.1/never".into(),
            ..GeneratorConfig::default()
        };
        let result = generate_bulk(&config, &Credentials::default(), &bank);
        assert!(matches!(result, Err(GenerateError::MissingApiKey)));
        assert!(!bank.path().exists());
    }
}
