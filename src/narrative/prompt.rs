//! Prompt builders for narrative generation and consistency checks.

use std::fmt::Write;

use crate::domain::EvaluationDecision;
use crate::underwriter::UnderwriterSchema;

/// Phrase a checker must reply with when the narrative is consistent.
pub const CONSISTENT_REPLY: &str = "No contradictions found.";

fn role_section(schema: &UnderwriterSchema) -> String {
    format!(
        "You are {}. Your task is to generate an engaging and natural explanation for a loan application decision.\n\n\
Please include the following in your narrative:\n\
- A friendly and professional summary of the final decision.\n\
- An explanation of the key business rules, risk adjustments, and thresholds in plain language.\n\
- A descriptive account of the input scenario (e.g., SME profile, risk profile, DSCR, loan amount, loan type, and industry sector).\n\
- A clear list of any triggered rules explained in accessible terms, referencing their rule IDs.\n\
- A checklist of required documents or verifications needed.\n\
- Overall evaluation details such as overall risk score, required PG percentage, and any missing documents.\n\
- Additional recommendations for mitigating risk.\n\
- Audit information (rule version and timestamp) and a short compliance note.\n",
        schema.role()
    )
}

fn objective_section(schema: &UnderwriterSchema) -> String {
    format!("Objective:\n{}\n", schema.objective())
}

fn evaluation_section(decision: &EvaluationDecision) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Evaluation Decision:");
    let _ = writeln!(out, "  - Decision: {}", decision.decision);
    let _ = writeln!(out, "  - Confidence: {}", decision.confidence);
    let _ = writeln!(out, "  - Explanation: {}", decision.explanation);
    if let Some(version) = &decision.rule_version {
        let _ = writeln!(out, "  - Rule Version: {}", version);
    }
    if !decision.fired_rules.is_empty() {
        let ids: Vec<String> = decision
            .fired_rules
            .iter()
            .map(|f| format!("{} ({})", f.rule_id, f.decision))
            .collect();
        let _ = writeln!(out, "  - Triggered Rules: {}", ids.join(", "));
    }

    let _ = writeln!(out, "\nAdditional Evaluation Details:");
    match &decision.assessment {
        Some(a) => {
            let _ = writeln!(out, "  - Overall Risk Score: {}", a.overall_risk);
            let _ = writeln!(out, "  - Required PG Percentage: {}", a.required_pg);
            if a.missing_documents.is_empty() {
                let _ = writeln!(out, "  - Missing Documents: None");
            } else {
                let docs: Vec<&str> = a.missing_documents.keys().map(String::as_str).collect();
                let _ = writeln!(out, "  - Missing Documents: {}", docs.join(", "));
            }
        }
        None => {
            let _ = writeln!(out, "  - Overall Risk Score: N/A");
            let _ = writeln!(out, "  - Required PG Percentage: N/A");
            let _ = writeln!(out, "  - Missing Documents: None");
        }
    }
    out
}

fn context_section(timestamp: &str, decision: &EvaluationDecision) -> String {
    format!(
        "Additional Context: Timestamp: {}, Request ID: {}\n",
        timestamp,
        decision.request_id.as_deref().unwrap_or("N/A")
    )
}

/// Prompt asking for a narrative explanation of a decision.
pub fn generation_prompt(schema: &UnderwriterSchema, decision: &EvaluationDecision) -> String {
    format!(
        "{}\n{}\n{}\n{}\nPlease generate the narrative explanation.",
        role_section(schema),
        objective_section(schema),
        evaluation_section(decision),
        context_section(schema.timestamp(), decision),
    )
}

/// Prompt asking whether a narrative contradicts its decision.
pub fn check_prompt(
    schema: &UnderwriterSchema,
    narrative: &str,
    decision: &EvaluationDecision,
) -> String {
    format!(
        "Review the following evaluation decision and narrative explanation for consistency with the business rules and risk configurations.\n\n\
{}\n{}\nNarrative Explanation:\n{}\n\n\
If the narrative accurately and naturally reflects the evaluation decision and business logic, reply with '{}' \
Otherwise, list any inconsistencies.",
        evaluation_section(decision),
        context_section(schema.timestamp(), decision),
        narrative,
        CONSISTENT_REPLY,
    )
}

/// Whether a checker reply reports no contradictions.
pub fn is_consistent(reply: &str) -> bool {
    reply.contains(CONSISTENT_REPLY.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, DscrLevel, LendingPolicy, RiskAssessment};
    use crate::rules::RuleSet;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn schema() -> UnderwriterSchema {
        let ruleset = RuleSet::from_policy(&LendingPolicy::default()).unwrap();
        UnderwriterSchema::build(&ruleset, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
    }

    fn decision() -> EvaluationDecision {
        let mut d = EvaluationDecision::simple(Decision::FlagUw, 0.72, "Underwriter review required.")
            .with_request_id("req-17");
        d.assessment = Some(RiskAssessment {
            overall_risk: dec!(1.84),
            required_pg: dec!(0.872),
            dscr_level: DscrLevel::Low,
            missing_documents: BTreeMap::from([(
                "Bank Statements".to_string(),
                "6 months".to_string(),
            )]),
        });
        d
    }

    #[test]
    fn test_generation_prompt_sections() {
        let prompt = generation_prompt(&schema(), &decision());

        assert!(prompt.starts_with("You are Underwriter GPT."));
        assert!(prompt.contains("Objective:\n"));
        assert!(prompt.contains("  - Decision: FLAG/UW"));
        assert!(prompt.contains("  - Confidence: 0.72"));
        assert!(prompt.contains("  - Overall Risk Score: 1.84"));
        assert!(prompt.contains("  - Required PG Percentage: 0.872"));
        assert!(prompt.contains("  - Missing Documents: Bank Statements"));
        assert!(prompt.contains("Request ID: req-17"));
        assert!(prompt.contains("2025-01-02T03:04:05"));
        assert!(prompt.ends_with("Please generate the narrative explanation."));
    }

    #[test]
    fn test_check_prompt_embeds_narrative() {
        let prompt = check_prompt(&schema(), "The loan was flagged.", &decision());

        assert!(prompt.contains("Narrative Explanation:\nThe loan was flagged."));
        assert!(prompt.contains("'No contradictions found.'"));
    }

    #[test]
    fn test_missing_request_id() {
        let d = EvaluationDecision::simple(Decision::Pass, 0.95, "ok");
        let prompt = generation_prompt(&schema(), &d);

        assert!(prompt.contains("Request ID: N/A"));
        assert!(prompt.contains("  - Overall Risk Score: N/A"));
    }

    #[test]
    fn test_is_consistent() {
        assert!(is_consistent("No contradictions found."));
        assert!(is_consistent("Reviewed. No contradictions found"));
        assert!(!is_consistent("The confidence is misstated."));
    }
}
