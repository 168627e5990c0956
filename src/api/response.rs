use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::domain::{Decision, EvaluationDecision, FiredRule, RiskAssessment, RuleId};

/// Decision endpoints and the outcomes each may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    BorrowerType,
    BorrowerId,
    OpenBanking,
    SmeRisk,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::BorrowerType => "/evaluate/borrower-type",
            Endpoint::BorrowerId => "/evaluate/borrower-id",
            Endpoint::OpenBanking => "/evaluate/open-banking",
            Endpoint::SmeRisk => "/evaluate/sme-risk",
        }
    }

    pub fn allowed(&self) -> &'static [Decision] {
        match self {
            Endpoint::BorrowerType => &[Decision::Pass, Decision::Fail],
            Endpoint::BorrowerId | Endpoint::OpenBanking => {
                &[Decision::Pass, Decision::ConditionalPass, Decision::Fail]
            }
            Endpoint::SmeRisk => &Decision::ALL,
        }
    }

    pub fn permits(&self, decision: Decision) -> bool {
        self.allowed().contains(&decision)
    }

    /// Reject decisions outside this endpoint's outcome set.
    pub fn check(&self, decision: Decision) -> Result<(), OutcomeViolation> {
        if self.permits(decision) {
            Ok(())
        } else {
            Err(OutcomeViolation {
                endpoint: *self,
                decision,
            })
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A decision the endpoint's contract does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("decision {decision} is not allowed by {endpoint}")]
pub struct OutcomeViolation {
    pub endpoint: Endpoint,
    pub decision: Decision,
}

fn clamp_confidence(confidence: f64) -> f64 {
    confidence.clamp(0.0, 1.0)
}

/// Response from a simple check.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub decision: Decision,
    pub explanation: String,
    pub confidence: f64,
}

impl DecisionResponse {
    pub fn assemble(
        endpoint: Endpoint,
        decision: EvaluationDecision,
    ) -> Result<Self, OutcomeViolation> {
        endpoint.check(decision.decision)?;

        Ok(DecisionResponse {
            decision: decision.decision,
            explanation: decision.explanation,
            confidence: clamp_confidence(decision.confidence),
        })
    }
}

/// Response from the SME risk endpoint, with the audit trail.
#[derive(Debug, Serialize)]
pub struct SmeRiskResponse {
    pub decision: Decision,
    pub explanation: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_rule: Option<RuleId>,
    pub fired_rules: Vec<FiredRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,
}

impl SmeRiskResponse {
    pub fn assemble(decision: EvaluationDecision) -> Result<Self, OutcomeViolation> {
        Endpoint::SmeRisk.check(decision.decision)?;

        Ok(SmeRiskResponse {
            decision: decision.decision,
            explanation: decision.explanation,
            confidence: clamp_confidence(decision.confidence),
            rule_version: decision.rule_version,
            primary_rule: decision.primary_rule,
            fired_rules: decision.fired_rules,
            assessment: decision.assessment,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NarrativeResponse {
    pub narrative: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub result: String,
    pub consistent: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifiedNarrativeResponse {
    pub narrative: String,
    pub verified: bool,
    pub attempts: u32,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub rule_version: String,
    pub environment: &'static str,
    pub uptime_secs: u64,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub rule_version: String,
    pub rules: usize,
    pub narrative_enabled: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "BAD_REQUEST")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        ErrorResponse::new(message, "INTERNAL_ERROR")
    }
}
