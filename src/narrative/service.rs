use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::client::{NarrativeClient, NarrativeError};
use super::prompt::{check_prompt, generation_prompt, is_consistent};
use crate::domain::EvaluationDecision;
use crate::observability::MetricsRegistry;
use crate::rules::RuleSet;
use crate::underwriter::UnderwriterSchema;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of a consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Checker reply, verbatim
    pub result: String,
    pub consistent: bool,
}

/// Result of generate-and-verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeOutcome {
    pub narrative: String,
    /// False when attempts ran out before a check passed
    pub verified: bool,
    pub attempts: u32,
}

/// Narrative generation and verification over a [`NarrativeClient`].
#[derive(Clone)]
pub struct NarrativeService {
    client: Arc<dyn NarrativeClient>,
    ruleset: Arc<RuleSet>,
    metrics: Arc<MetricsRegistry>,
    max_attempts: u32,
}

impl std::fmt::Debug for NarrativeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeService")
            .field("client", &self.client.name())
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl NarrativeService {
    pub fn new(
        client: Arc<dyn NarrativeClient>,
        ruleset: Arc<RuleSet>,
        metrics: Arc<MetricsRegistry>,
        max_attempts: u32,
    ) -> Self {
        NarrativeService {
            client,
            ruleset,
            metrics,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn schema(&self) -> UnderwriterSchema {
        UnderwriterSchema::build(&self.ruleset, Utc::now())
    }

    async fn call(&self, prompt: &str) -> Result<String, NarrativeError> {
        let start = Instant::now();
        let result = self.client.complete(prompt).await;
        self.metrics.record_narrative_call(result.is_ok());

        match &result {
            Ok(_) => debug!(
                client = self.client.name(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Narrative call completed"
            ),
            Err(e) => warn!(client = self.client.name(), error = %e, "Narrative call failed"),
        }
        result
    }

    /// Generate a narrative explanation for a decision.
    pub async fn generate(&self, decision: &EvaluationDecision) -> Result<String, NarrativeError> {
        let prompt = generation_prompt(&self.schema(), decision);
        self.call(&prompt).await
    }

    /// Ask the collaborator whether a narrative contradicts its decision.
    pub async fn check(
        &self,
        narrative: &str,
        decision: &EvaluationDecision,
    ) -> Result<CheckOutcome, NarrativeError> {
        let prompt = check_prompt(&self.schema(), narrative, decision);
        let result = self.call(&prompt).await?;
        let consistent = is_consistent(&result);
        Ok(CheckOutcome { result, consistent })
    }

    /// Generate and check until a narrative passes or attempts run out.
    ///
    /// On exhaustion the last narrative is returned unverified. An error is
    /// returned only when no narrative was ever produced.
    pub async fn generate_and_verify(
        &self,
        decision: &EvaluationDecision,
    ) -> Result<NarrativeOutcome, NarrativeError> {
        let mut last_narrative: Option<String> = None;
        let mut last_error: Option<NarrativeError> = None;

        for attempt in 1..=self.max_attempts {
            let narrative = match self.generate(decision).await {
                Ok(n) => n,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };

            match self.check(&narrative, decision).await {
                Ok(check) if check.consistent => {
                    info!(attempt, "Narrative verified");
                    return Ok(NarrativeOutcome {
                        narrative,
                        verified: true,
                        attempts: attempt,
                    });
                }
                Ok(check) => {
                    debug!(attempt, result = %check.result, "Narrative inconsistent, retrying");
                }
                Err(e) => last_error = Some(e),
            }
            last_narrative = Some(narrative);
        }

        match last_narrative {
            Some(narrative) => {
                warn!(attempts = self.max_attempts, "Narrative could not be verified");
                Ok(NarrativeOutcome {
                    narrative,
                    verified: false,
                    attempts: self.max_attempts,
                })
            }
            None => Err(last_error.unwrap_or(NarrativeError::NotConfigured)),
        }
    }
}
