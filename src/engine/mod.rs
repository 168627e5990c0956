pub mod assessment;
pub mod checks;
pub mod evaluator;

pub use evaluator::{CONFIDENCE_FLOOR, NO_MATCH_CONFIDENCE, NO_MATCH_EXPLANATION};

use serde_json::Value;
use std::sync::Arc;

use crate::domain::{EvaluationDecision, SmeRiskRequest};
use crate::rules::RuleSet;
use crate::validation::{normalize_sme_request, ValidationError};

/// Entry point for SME risk decisions.
///
/// Cheap to clone; the rule table is shared.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    ruleset: Arc<RuleSet>,
}

impl DecisionEngine {
    pub fn new(ruleset: Arc<RuleSet>) -> Self {
        DecisionEngine { ruleset }
    }

    pub fn ruleset(&self) -> &Arc<RuleSet> {
        &self.ruleset
    }

    /// Validate a raw body and evaluate it. Validation failures are
    /// reported before any rule runs.
    pub fn evaluate_raw(&self, raw: &Value) -> Result<EvaluationDecision, ValidationError> {
        let request = normalize_sme_request(raw)?;
        Ok(self.evaluate(&request))
    }

    /// Evaluate a canonical request and attach its risk assessment.
    pub fn evaluate(&self, request: &SmeRiskRequest) -> EvaluationDecision {
        let mut decision = evaluator::evaluate(&self.ruleset, request);
        decision.assessment = Some(assessment::assess(request, self.ruleset.params()));
        decision
    }
}
