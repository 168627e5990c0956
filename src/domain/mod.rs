pub mod application;
pub mod decision;
pub mod evaluation;
pub mod evidence;
pub mod policy;

pub use application::{DscrLevel, LoanType, RiskTier, SmeProfile, SmeRiskRequest};
pub use decision::Decision;
pub use evaluation::{EvaluationDecision, RiskAssessment};
pub use evidence::{Concern, Explanation, FiredRule, RuleId, RuleResult};
pub use policy::{LendingParams, LendingPolicy, LoanLimits, ProfileLimits, RequiredDocuments};
