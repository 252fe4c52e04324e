//! Gemini vision client used by the imaging tools.
//!
//! Talks to the Generative Language REST API:
//! `POST {base_url}/models/{model}:generateContent?key={api_key}` with text
//! and inline base64 image parts.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use crate::config::{ConfigError, VisionConfig};

const VISION_TIMEOUT: Duration = Duration::from_secs(120);

/// One part of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum VisionPart {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

impl VisionPart {
    pub fn jpeg(data: Vec<u8>) -> Self {
        VisionPart::Image {
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            VisionPart::Text(text) => json!({ "text": text }),
            VisionPart::Image { mime_type, data } => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": BASE64.encode(data),
                }
            }),
        }
    }
}

/// A configured vision model handle.
pub struct GeminiVision<'a> {
    config: &'a VisionConfig,
    api_key: &'a str,
    http: &'a reqwest::Client,
}

impl<'a> GeminiVision<'a> {
    /// Build a handle, failing when no API key is configured.
    pub fn configure(config: &'a VisionConfig, http: &'a reqwest::Client) -> Result<Self, ConfigError> {
        let api_key = config.require()?;
        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a multimodal prompt and return the concatenated text answer.
    pub async fn generate_content(&self, parts: &[VisionPart]) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            urlencoding::encode(self.api_key)
        );

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": parts.iter().map(VisionPart::to_json).collect::<Vec<_>>(),
            }]
        });

        let response = self
            .http
            .post(&url)
            .timeout(VISION_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("Vision API returned {}: {}", status, text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Failed to parse vision response: {}", e))?;

        extract_text(&json).ok_or_else(|| anyhow::anyhow!("Vision response contained no text"))
    }
}

/// Join the text parts of the first candidate.
fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_requires_api_key() {
        let config = VisionConfig::default();
        let http = reqwest::Client::new();
        assert!(GeminiVision::configure(&config, &http).is_err());
    }

    #[test]
    fn image_part_is_base64_inline_data() {
        let part = VisionPart::jpeg(vec![0xff, 0xd8, 0xff]).to_json();
        assert_eq!(part["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(part["inline_data"]["data"], "/9j/");
    }

    #[test]
    fn extracts_joined_candidate_text() {
        let response = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "line one" }, { "text": "line two" }] }
            }]
        });
        assert_eq!(extract_text(&response).as_deref(), Some("line one\nline two"));
        assert_eq!(extract_text(&json!({"candidates": []})), None);
    }
}
