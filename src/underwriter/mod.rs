//! Underwriter schema: the instructions, data sources and audit metadata
//! that accompany decisions handed to a narrative writer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Concern, Decision, RuleId};
use crate::rules::RuleSet;

/// Version of the schema document itself.
pub const SCHEMA_VERSION: &str = "3.0";

/// Operation name reported by the production fallback.
pub const SCHEMA_FUNCTION_NAME: &str = "getUnderwriterSchema";

const ROLE: &str = "Underwriter GPT";

const OBJECTIVE: &str = "Generate a comprehensive explanation for an auto-approved loan application by analyzing the complete input scenario data \
against a set of business rules, risk metrics, and regulatory requirements. Your explanation must detail the decision-making process, \
include an audit trail with rule versioning and timestamps, and reference specific rule IDs, thresholds, and risk adjustments for full transparency and compliance.";

const PROMPT_GUIDELINES: [&str; 7] = [
    "Begin with a 'Decisioning Summary' that states the final decision (PASS, FLAG/AI, FLAG/UW, FAIL, or CONDITIONAL_PASS) and the overall confidence rating.",
    "Include a 'Business Logic Explanation' section detailing all key rules, risk adjustments, and calculations applied. Reference specific rule IDs and thresholds where applicable.",
    "Provide an 'Input Scenario Analysis' section summarizing the complete input data, including SME profile, risk profile, DSCR, loan amount, loan type, borrower type, credit checks, and verification statuses.",
    "Enumerate any triggered deterministic rules along with detailed explanations of their impact on the decision.",
    "Include 'Risk Mitigation Recommendations' outlining any additional security measures or manual review requirements for borderline cases.",
    "Add an 'Audit Information' section that records the rule version, evaluation timestamp, and a log of the decision-making process.",
    "Include 'Compliance Notes' that describe adherence to regulatory guidelines and internal lending policies, along with any documented exceptions.",
];

const FALLBACK: &str = "If any required data from the input scenario is missing, ambiguous, or fails verification, default to flagging the application for manual review. \
Clearly note which data points were insufficient and recommend obtaining additional information.";

const COMPLIANCE_NOTES: &str = "Ensure that the decision explanation adheres to internal lending policies and external regulatory guidelines. \
Any deviations must be clearly documented with appropriate justifications.";

#[derive(Debug, Clone, Serialize)]
pub struct UnderwriterSchema {
    pub version: &'static str,
    pub instructions: Instructions,
    pub data_sources: DataSources,
    pub fallback: &'static str,
    pub audit_and_versioning: AuditAndVersioning,
    pub compliance_notes: &'static str,
    /// Every rule of the active table
    pub rules: Vec<RuleSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Instructions {
    pub role: &'static str,
    pub objective: &'static str,
    pub prompt_guidelines: Vec<&'static str>,
    pub output_structure: OutputStructure,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputStructure {
    pub decisioning_summary: &'static str,
    pub business_logic_explanation: &'static str,
    pub input_scenario_analysis: &'static str,
    pub applied_rules: &'static str,
    pub risk_recommendations: &'static str,
    pub audit_information: &'static str,
    pub compliance_notes: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSources {
    pub decisioning_gpt: &'static str,
    pub external_data: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditAndVersioning {
    pub rule_version: String,
    /// Stamped when the schema is requested
    pub timestamp: String,
    pub audit_trail: &'static str,
}

/// One row of the rule table as exposed to underwriters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub id: RuleId,
    pub concern: Concern,
    pub outcome: Decision,
    pub confidence: f64,
    pub explanation_template: String,
}

impl UnderwriterSchema {
    /// Build the schema for the given rule table, stamped at `now`.
    pub fn build(ruleset: &RuleSet, now: DateTime<Utc>) -> Self {
        UnderwriterSchema {
            version: SCHEMA_VERSION,
            instructions: Instructions {
                role: ROLE,
                objective: OBJECTIVE,
                prompt_guidelines: PROMPT_GUIDELINES.to_vec(),
                output_structure: OutputStructure {
                    decisioning_summary: "A concise overview of the final decision and the associated confidence rating.",
                    business_logic_explanation: "A detailed breakdown of the applied business rules, risk adjustments, and calculations, including references to specific rule IDs.",
                    input_scenario_analysis: "A summary of all provided input data used in the evaluation.",
                    applied_rules: "A list of triggered deterministic rules with their IDs and detailed explanations of how they impacted the decision.",
                    risk_recommendations: "Recommendations for mitigating risks, including additional security requirements or notes for manual review if the case is borderline.",
                    audit_information: "Metadata including the rule version, evaluation timestamp, and an audit trail of all decisions made.",
                    compliance_notes: "Notes confirming adherence to regulatory requirements and internal lending policies, along with any documented exceptions.",
                },
            },
            data_sources: DataSources {
                decisioning_gpt: "The decision is produced by a deterministic rule table; a language model only explains the applied business logic using the input scenario data.",
                external_data: "Includes verifications from external sources such as credit bureaus, open banking data, financial statements, and borrower identity checks.",
            },
            fallback: FALLBACK,
            audit_and_versioning: AuditAndVersioning {
                rule_version: ruleset.policy_version().to_string(),
                timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
                audit_trail: "A detailed log of all input data, applied rules, risk adjustments, and the final decision for compliance and regulatory review.",
            },
            compliance_notes: COMPLIANCE_NOTES,
            rules: rule_summary(ruleset),
        }
    }

    /// Role given to the narrative writer.
    pub fn role(&self) -> &str {
        self.instructions.role
    }

    pub fn objective(&self) -> &str {
        self.instructions.objective
    }

    pub fn timestamp(&self) -> &str {
        &self.audit_and_versioning.timestamp
    }
}

pub fn rule_summary(ruleset: &RuleSet) -> Vec<RuleSummary> {
    ruleset
        .rules()
        .iter()
        .map(|r| RuleSummary {
            id: r.id(),
            concern: r.concern(),
            outcome: r.outcome(),
            confidence: r.confidence(),
            explanation_template: r.template().to_string(),
        })
        .collect()
}

/// Returned in place of the schema in production.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionFallback {
    pub function_name: &'static str,
    pub domain: String,
    pub message: String,
    /// Correlates the refused request with server logs
    pub action_id: Uuid,
}

impl ProductionFallback {
    pub fn new(domain: impl Into<String>) -> Self {
        ProductionFallback {
            function_name: SCHEMA_FUNCTION_NAME,
            domain: domain.into(),
            message: "The underwriter schema is not available in production. Contact the decisioning team for rule-table details."
                .to_string(),
            action_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LendingPolicy;
    use chrono::TimeZone;

    #[test]
    fn test_schema_carries_rule_version_and_timestamp() {
        let ruleset = RuleSet::from_policy(&LendingPolicy::default()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let schema = UnderwriterSchema::build(&ruleset, now);
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["version"], "3.0");
        assert_eq!(json["audit_and_versioning"]["rule_version"], "3.0");
        assert_eq!(
            json["audit_and_versioning"]["timestamp"],
            "2025-03-01T12:00:00.000000Z"
        );
        assert_eq!(json["instructions"]["role"], "Underwriter GPT");
        assert_eq!(json["instructions"]["prompt_guidelines"].as_array().unwrap().len(), 7);
        assert_eq!(json["rules"].as_array().unwrap().len(), 68);
        assert_eq!(json["rules"][0]["id"], 1);
        assert_eq!(json["rules"][0]["outcome"], "FAIL");
    }

    #[test]
    fn test_production_fallback_ids_are_unique() {
        let a = ProductionFallback::new("loans.example.com");
        let b = ProductionFallback::new("loans.example.com");

        assert_eq!(a.function_name, "getUnderwriterSchema");
        assert_eq!(a.domain, "loans.example.com");
        assert_ne!(a.action_id, b.action_id);
    }
}
