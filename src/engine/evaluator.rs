use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::domain::{Decision, EvaluationDecision, Explanation, FiredRule, RuleId, SmeRiskRequest};
use crate::rules::RuleSet;

/// Confidence reported when no rule fires.
pub const NO_MATCH_CONFIDENCE: f64 = 0.10;

/// Lowest confidence any fired rule carries. No-match decisions sit below it.
pub const CONFIDENCE_FLOOR: f64 = 0.50;

pub const NO_MATCH_EXPLANATION: &str =
    "No rule in the decision table covers this application. Declined pending manual review.";

/// Run every rule against the request and resolve the fired subset.
///
/// The most severe fired outcome wins. Its confidence is the highest
/// weight among the rules that produced it, ties going to the lowest id.
/// The explanation joins those rules' fragments in id order, once per
/// template.
///
/// Total over validated input: a request no rule covers yields `FAIL`
/// at [`NO_MATCH_CONFIDENCE`].
pub fn evaluate(ruleset: &RuleSet, request: &SmeRiskRequest) -> EvaluationDecision {
    let mut fired: SmallVec<[(FiredRule, Option<Explanation>); 8]> = SmallVec::new();

    // Rules are ordered by id, so `fired` is too
    for rule in ruleset.rules() {
        let result = rule.evaluate(request);
        if !result.hit {
            continue;
        }
        debug!(rule_id = %rule.id(), decision = %result.decision, "Rule fired");
        fired.push((
            FiredRule {
                rule_id: rule.id(),
                concern: rule.concern(),
                decision: result.decision,
                confidence: result.confidence,
            },
            result.explanation,
        ));
    }

    if fired.is_empty() {
        warn!(
            fault = "NoRuleMatched",
            sme_profile = %request.sme_profile,
            risk_profile = %request.risk_profile,
            loan_type = %request.loan_type,
            "No rule matched; declining"
        );
        return EvaluationDecision {
            decision: Decision::Fail,
            confidence: NO_MATCH_CONFIDENCE,
            explanation: NO_MATCH_EXPLANATION.to_string(),
            rule_version: Some(ruleset.policy_version().to_string()),
            primary_rule: None,
            fired_rules: Vec::new(),
            assessment: None,
            request_id: None,
        };
    }

    let winning = fired
        .iter()
        .fold(Decision::Pass, |acc, (f, _)| acc.max(f.decision));

    let fired_rules: Vec<FiredRule> = fired.iter().map(|(f, _)| f.clone()).collect();

    let mut primary: Option<(RuleId, f64)> = None;
    let mut templates: SmallVec<[&str; 8]> = SmallVec::new();
    let mut fragments: SmallVec<[&str; 8]> = SmallVec::new();

    for (rule, explanation) in fired.iter().filter(|(f, _)| f.decision == winning) {
        // Strictly greater keeps the earliest rule on ties
        if primary.map_or(true, |(_, best)| rule.confidence > best) {
            primary = Some((rule.rule_id, rule.confidence));
        }
        if let Some(explanation) = explanation {
            if !templates.contains(&&*explanation.template) {
                templates.push(&explanation.template);
                fragments.push(&explanation.text);
            }
        }
    }

    let (primary_rule, confidence) = match primary {
        Some((id, confidence)) => (Some(id), confidence.clamp(0.0, 1.0)),
        None => (None, NO_MATCH_CONFIDENCE),
    };

    let explanation = if fragments.is_empty() {
        format!("Decision {} reached by the decision table.", winning)
    } else {
        fragments.join(" ")
    };

    EvaluationDecision {
        decision: winning,
        confidence,
        explanation,
        rule_version: Some(ruleset.policy_version().to_string()),
        primary_rule,
        fired_rules,
        assessment: None,
        request_id: None,
    }
}
