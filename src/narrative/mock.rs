use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::client::{NarrativeClient, NarrativeError};

/// Replays a fixed script of responses and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, NarrativeError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, NarrativeError>>,
    {
        ScriptedClient {
            script: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Script of successful responses.
    pub fn replying<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(responses.into_iter().map(|s| Ok(s.into())))
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl NarrativeClient for ScriptedClient {
    async fn complete(&self, prompt: &str) -> Result<String, NarrativeError> {
        self.prompts.lock().push(prompt.to_string());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(NarrativeError::InvalidResponse("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let client = ScriptedClient::replying(["one", "two"]);

        assert_eq!(client.complete("a").await.unwrap(), "one");
        assert_eq!(client.complete("b").await.unwrap(), "two");
        assert!(client.complete("c").await.is_err());
        assert_eq!(client.prompts(), vec!["a", "b", "c"]);
        assert_eq!(client.remaining(), 0);
    }
}
