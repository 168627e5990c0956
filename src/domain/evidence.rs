use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::Decision;

/// Stable numeric rule identifier (1-70), used for audit and versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u8);

impl RuleId {
    /// Highest id the rule table may use.
    pub const MAX: u8 = 70;

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        (1..=Self::MAX).contains(&self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{:02}", self.0)
    }
}

/// What a rule is concerned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concern {
    /// Global eligibility thresholds (DSCR floor, minimum loan, sector)
    Eligibility,
    /// Per-profile borrowing limits
    BorrowingLimits,
    /// Guarantees, collateral, compliance and documentation prerequisites
    Conditions,
    /// Profile, tier and DSCR band outcomes
    RiskBand,
    /// Catch-all for in-limit applications no band covers
    Fallback,
}

/// Audit record of a rule that fired during an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub rule_id: RuleId,
    pub concern: Concern,
    pub decision: Decision,
    pub confidence: f64,
}

/// Rendered explanation fragment, keyed by the template it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    /// The unrendered template; fragments sharing a template are deduplicated
    pub template: Arc<str>,
    /// Template rendered against the request
    pub text: String,
}

/// Result of evaluating a rule.
#[derive(Debug, Clone)]
pub struct RuleResult {
    /// Whether the rule fired
    pub hit: bool,

    /// The rule's outcome if it fired
    pub decision: Decision,

    /// The rule's confidence weight if it fired
    pub confidence: f64,

    /// Explanation fragment if it fired
    pub explanation: Option<Explanation>,
}

impl RuleResult {
    /// Create a result for a rule whose predicate did not hold.
    #[inline]
    pub fn miss() -> Self {
        RuleResult {
            hit: false,
            decision: Decision::Pass,
            confidence: 0.0,
            explanation: None,
        }
    }

    /// Create a fired result.
    pub fn fire(decision: Decision, confidence: f64, explanation: Explanation) -> Self {
        RuleResult {
            hit: true,
            decision,
            confidence,
            explanation: Some(explanation),
        }
    }
}
