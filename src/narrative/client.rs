use async_trait::async_trait;
use thiserror::Error;

/// Failures talking to the narrative collaborator.
#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("narrative client is not configured")]
    NotConfigured,

    #[error("narrative request failed: {0}")]
    Request(String),

    #[error("narrative API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid narrative response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NarrativeError {
    fn from(e: reqwest::Error) -> Self {
        NarrativeError::Request(e.to_string())
    }
}

/// A text-completion backend.
#[async_trait]
pub trait NarrativeClient: Send + Sync {
    /// Complete a prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, NarrativeError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}
