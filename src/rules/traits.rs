use crate::domain::evidence::RuleResult;
use crate::domain::{Concern, Decision, RuleId, SmeRiskRequest};
use std::fmt::Debug;

/// A single entry of the SME rule table.
///
/// Rules are pure: evaluation has no side effects and no access to
/// anything but the canonical request and the parameters the rule was
/// built with, so any rule can be tested in isolation by id.
pub trait Rule: Send + Sync + Debug {
    /// Stable identifier, also the tie-break priority (lower wins).
    fn id(&self) -> RuleId;

    fn concern(&self) -> Concern;

    /// Decision produced when the rule fires.
    fn outcome(&self) -> Decision;

    /// Confidence weight in [0, 1].
    fn confidence(&self) -> f64;

    /// Unrendered explanation template.
    fn template(&self) -> &str;

    /// Evaluate the rule against a request.
    fn evaluate(&self, request: &SmeRiskRequest) -> RuleResult;
}
