pub mod catalog;
pub mod table_rule;
pub mod template;
pub mod traits;

pub use table_rule::{DscrRange, Predicate, TableRule};
pub use traits::Rule;

use crate::domain::{LendingParams, LendingPolicy, RuleId};
use ahash::AHashSet;
use std::sync::Arc;
use thiserror::Error;

/// Errors detected while assembling a rule set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleSetError {
    #[error("rule id {0} is outside 1-{max}", max = RuleId::MAX)]
    IdOutOfRange(RuleId),

    #[error("duplicate rule id: {0}")]
    DuplicateId(RuleId),

    #[error("rule {id} has confidence {confidence} outside [0, 1]")]
    InvalidConfidence { id: RuleId, confidence: f64 },

    #[error("rule {id} references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder { id: RuleId, placeholder: String },

    #[error("rule {0} has an empty explanation template")]
    EmptyTemplate(RuleId),
}

/// Ordered, immutable rule table ready for evaluation.
///
/// Built once at startup and shared as `Arc<RuleSet>`.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
    params: Arc<LendingParams>,
    policy_version: String,
}

impl RuleSet {
    /// Build the full rule table from a lending policy.
    pub fn from_policy(policy: &LendingPolicy) -> Result<Self, RuleSetError> {
        let params = Arc::new(policy.params.clone());
        let rules = catalog::build(&params);
        Self::new(rules, params, policy.version.clone())
    }

    /// Assemble a rule set from arbitrary rules, validating ids,
    /// confidences and templates. Rules are ordered by id.
    pub fn new(
        mut rules: Vec<Arc<dyn Rule>>,
        params: Arc<LendingParams>,
        policy_version: impl Into<String>,
    ) -> Result<Self, RuleSetError> {
        let mut seen = AHashSet::with_capacity(rules.len());

        for rule in &rules {
            let id = rule.id();
            if !id.is_valid() {
                return Err(RuleSetError::IdOutOfRange(id));
            }
            if !seen.insert(id) {
                return Err(RuleSetError::DuplicateId(id));
            }

            let confidence = rule.confidence();
            if !(0.0..=1.0).contains(&confidence) {
                return Err(RuleSetError::InvalidConfidence { id, confidence });
            }

            if rule.template().trim().is_empty() {
                return Err(RuleSetError::EmptyTemplate(id));
            }
            if let Some(unknown) =
                template::placeholders(rule.template()).find(|p| !template::is_known(p))
            {
                return Err(RuleSetError::UnknownPlaceholder {
                    id,
                    placeholder: unknown.to_string(),
                });
            }
        }

        rules.sort_by_key(|r| r.id());

        Ok(RuleSet {
            rules,
            params,
            policy_version: policy_version.into(),
        })
    }

    /// Create an empty rule set.
    pub fn empty() -> Self {
        RuleSet {
            rules: Vec::new(),
            params: Arc::new(LendingParams::default()),
            policy_version: "0.0.0".to_string(),
        }
    }

    /// Rules in ascending id order.
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn get(&self, id: RuleId) -> Option<&Arc<dyn Rule>> {
        self.rules
            .binary_search_by_key(&id, |r| r.id())
            .ok()
            .map(|i| &self.rules[i])
    }

    pub fn params(&self) -> &LendingParams {
        &self.params
    }

    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Concern, Decision};

    fn rule(id: u8, confidence: f64, template: &str) -> Arc<dyn Rule> {
        Arc::new(TableRule::new(
            id,
            Concern::Eligibility,
            Decision::Fail,
            confidence,
            template,
            Arc::new(LendingParams::default()),
            |_, _| true,
        ))
    }

    #[test]
    fn test_ruleset_from_policy() {
        let ruleset = RuleSet::from_policy(&LendingPolicy::default()).unwrap();

        assert_eq!(ruleset.len(), 68);
        assert_eq!(ruleset.policy_version(), "3.0");
        assert_eq!(ruleset.get(RuleId(13)).unwrap().concern(), Concern::Conditions);
        assert!(ruleset.get(RuleId(69)).is_none());
    }

    #[test]
    fn test_rules_sorted_by_id() {
        let rules = vec![rule(9, 0.5, "b"), rule(2, 0.5, "a")];
        let ruleset = RuleSet::new(rules, Arc::new(LendingParams::default()), "t").unwrap();

        let ids: Vec<RuleId> = ruleset.rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![RuleId(2), RuleId(9)]);
    }

    #[test]
    fn test_rejects_invalid_tables() {
        let params = Arc::new(LendingParams::default());

        let err = RuleSet::new(vec![rule(71, 0.5, "x")], params.clone(), "t").unwrap_err();
        assert_eq!(err, RuleSetError::IdOutOfRange(RuleId(71)));

        let err = RuleSet::new(vec![rule(0, 0.5, "x")], params.clone(), "t").unwrap_err();
        assert_eq!(err, RuleSetError::IdOutOfRange(RuleId(0)));

        let err =
            RuleSet::new(vec![rule(3, 0.5, "x"), rule(3, 0.6, "y")], params.clone(), "t")
                .unwrap_err();
        assert_eq!(err, RuleSetError::DuplicateId(RuleId(3)));

        let err = RuleSet::new(vec![rule(3, 1.2, "x")], params.clone(), "t").unwrap_err();
        assert!(matches!(err, RuleSetError::InvalidConfidence { .. }));

        let err = RuleSet::new(vec![rule(3, 0.5, "bad {nope}")], params.clone(), "t").unwrap_err();
        assert_eq!(
            err,
            RuleSetError::UnknownPlaceholder {
                id: RuleId(3),
                placeholder: "nope".to_string()
            }
        );

        let err = RuleSet::new(vec![rule(3, 0.5, "  ")], params, "t").unwrap_err();
        assert_eq!(err, RuleSetError::EmptyTemplate(RuleId(3)));
    }

    #[test]
    fn test_empty_ruleset() {
        let ruleset = RuleSet::empty();
        assert!(ruleset.is_empty());
    }
}
