use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::client::{NarrativeClient, NarrativeError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, NarrativeError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(OpenAiClient {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
        })
    }
}

/// First choice's message content, trimmed.
fn extract_content(body: &Value) -> Result<String, NarrativeError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| NarrativeError::InvalidResponse("no content in response".to_string()))
}

#[async_trait]
impl NarrativeClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, NarrativeError> {
        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| NarrativeError::InvalidResponse(e.to_string()))?;
        extract_content(&body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
