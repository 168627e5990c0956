use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::application::DscrLevel;
use super::evidence::{FiredRule, RuleId};
use super::Decision;

/// Outcome of one evaluation. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDecision {
    pub decision: Decision,

    /// Confidence in [0, 1]
    pub confidence: f64,

    pub explanation: String,

    /// Version of the rule table that produced this decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_version: Option<String>,

    /// Rule whose weight set the confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_rule: Option<RuleId>,

    /// Every rule that fired, in ascending id order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fired_rules: Vec<FiredRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,

    /// Caller-supplied correlation id, carried into narrative prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl EvaluationDecision {
    /// A decision with no rule-table audit trail (simple checks).
    pub fn simple(decision: Decision, confidence: f64, explanation: impl Into<String>) -> Self {
        EvaluationDecision {
            decision,
            confidence,
            explanation: explanation.into(),
            rule_version: None,
            primary_rule: None,
            fired_rules: Vec::new(),
            assessment: None,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn fired_rule_ids(&self) -> Vec<RuleId> {
        self.fired_rules.iter().map(|f| f.rule_id).collect()
    }
}

/// Risk-curve figures attached to SME decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Weighted risk score; 1.0 is the lowest achievable
    pub overall_risk: Decimal,

    /// Personal guarantee percentage implied by the risk score, as a fraction
    pub required_pg: Decimal,

    pub dscr_level: DscrLevel,

    /// Required documents not in the submitted list, with their descriptions
    #[serde(default)]
    pub missing_documents: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_payload_deserializes() {
        let json = r#"{
            "decision": "FLAG/UW",
            "confidence": 0.72,
            "explanation": "Underwriter review required."
        }"#;

        let decision: EvaluationDecision = serde_json::from_str(json).unwrap();

        assert_eq!(decision.decision, Decision::FlagUw);
        assert!(decision.fired_rules.is_empty());
        assert!(decision.assessment.is_none());
        assert!(decision.request_id.is_none());
    }

    #[test]
    fn test_simple_decision_omits_audit_fields() {
        let decision = EvaluationDecision::simple(Decision::Pass, 0.95, "accepted");
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["decision"], "PASS");
        assert!(json.get("ruleVersion").is_none());
        assert!(json.get("firedRules").is_none());
    }
}
