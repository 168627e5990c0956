pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod narrative;
pub mod observability;
pub mod policy;
pub mod rules;
pub mod underwriter;
pub mod validation;

pub use config::Config;
pub use domain::{Decision, EvaluationDecision, SmeRiskRequest};
pub use engine::DecisionEngine;
pub use rules::{Rule, RuleSet};
