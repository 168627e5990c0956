use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::{Decision, EvaluationDecision};

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total decisions returned
    pub decisions_total: AtomicU64,

    /// Decisions by outcome
    pub decisions_pass: AtomicU64,
    pub decisions_conditional_pass: AtomicU64,
    pub decisions_flag_ai: AtomicU64,
    pub decisions_flag_uw: AtomicU64,
    pub decisions_fail: AtomicU64,

    /// Decisions by endpoint family
    pub sme_risk_evaluations: AtomicU64,
    pub simple_check_evaluations: AtomicU64,

    /// Decision latency buckets (microseconds)
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,

    /// Rule evaluation counts
    pub rules_evaluated_total: AtomicU64,
    pub rules_fired_total: AtomicU64,

    /// Requests with no fired rule
    pub no_rule_matched_total: AtomicU64,

    pub validation_errors_total: AtomicU64,
    pub outcome_violations_total: AtomicU64,

    /// Narrative collaborator calls
    pub narrative_calls_total: AtomicU64,
    pub narrative_failures_total: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a decision outcome.
    pub fn record_decision(&self, decision: Decision) {
        self.decisions_total.fetch_add(1, Ordering::Relaxed);

        let counter = match decision {
            Decision::Pass => &self.decisions_pass,
            Decision::ConditionalPass => &self.decisions_conditional_pass,
            Decision::FlagAi => &self.decisions_flag_ai,
            Decision::FlagUw => &self.decisions_flag_uw,
            Decision::Fail => &self.decisions_fail,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rule-table evaluation over `rule_count` rules.
    pub fn record_sme_evaluation(&self, decision: &EvaluationDecision, rule_count: usize) {
        self.sme_risk_evaluations.fetch_add(1, Ordering::Relaxed);
        self.rules_evaluated_total
            .fetch_add(rule_count as u64, Ordering::Relaxed);
        self.rules_fired_total
            .fetch_add(decision.fired_rules.len() as u64, Ordering::Relaxed);
        if decision.fired_rules.is_empty() {
            self.no_rule_matched_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_simple_check(&self) {
        self.simple_check_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record decision latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_validation_error(&self) {
        self.validation_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome_violation(&self) {
        self.outcome_violations_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a narrative collaborator call.
    pub fn record_narrative_call(&self, success: bool) {
        self.narrative_calls_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.narrative_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP loaneval_decisions_total Total number of decisions returned
# TYPE loaneval_decisions_total counter
loaneval_decisions_total {}

# HELP loaneval_decisions Decisions by outcome
# TYPE loaneval_decisions counter
loaneval_decisions{{outcome="pass"}} {}
loaneval_decisions{{outcome="conditional_pass"}} {}
loaneval_decisions{{outcome="flag_ai"}} {}
loaneval_decisions{{outcome="flag_uw"}} {}
loaneval_decisions{{outcome="fail"}} {}

# HELP loaneval_evaluations Decisions by endpoint family
# TYPE loaneval_evaluations counter
loaneval_evaluations{{family="sme_risk"}} {}
loaneval_evaluations{{family="simple_check"}} {}

# HELP loaneval_decision_latency_bucket Decision latency histogram
# TYPE loaneval_decision_latency_bucket counter
loaneval_decision_latency_bucket{{le="0.001"}} {}
loaneval_decision_latency_bucket{{le="0.005"}} {}
loaneval_decision_latency_bucket{{le="0.01"}} {}
loaneval_decision_latency_bucket{{le="0.05"}} {}
loaneval_decision_latency_bucket{{le="0.1"}} {}
loaneval_decision_latency_bucket{{le="+Inf"}} {}

# HELP loaneval_rules_evaluated_total Total rule evaluations
# TYPE loaneval_rules_evaluated_total counter
loaneval_rules_evaluated_total {}

# HELP loaneval_rules_fired_total Total rules that fired
# TYPE loaneval_rules_fired_total counter
loaneval_rules_fired_total {}

# HELP loaneval_no_rule_matched_total Evaluations where no rule fired
# TYPE loaneval_no_rule_matched_total counter
loaneval_no_rule_matched_total {}

# HELP loaneval_validation_errors_total Requests rejected by input validation
# TYPE loaneval_validation_errors_total counter
loaneval_validation_errors_total {}

# HELP loaneval_outcome_violations_total Decisions outside the endpoint's allowed outcomes
# TYPE loaneval_outcome_violations_total counter
loaneval_outcome_violations_total {}

# HELP loaneval_narrative_calls_total Narrative collaborator calls
# TYPE loaneval_narrative_calls_total counter
loaneval_narrative_calls_total {}

# HELP loaneval_narrative_failures_total Failed narrative collaborator calls
# TYPE loaneval_narrative_failures_total counter
loaneval_narrative_failures_total {}
"#,
            self.decisions_total.load(Ordering::Relaxed),
            self.decisions_pass.load(Ordering::Relaxed),
            self.decisions_conditional_pass.load(Ordering::Relaxed),
            self.decisions_flag_ai.load(Ordering::Relaxed),
            self.decisions_flag_uw.load(Ordering::Relaxed),
            self.decisions_fail.load(Ordering::Relaxed),
            self.sme_risk_evaluations.load(Ordering::Relaxed),
            self.simple_check_evaluations.load(Ordering::Relaxed),
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
            self.rules_evaluated_total.load(Ordering::Relaxed),
            self.rules_fired_total.load(Ordering::Relaxed),
            self.no_rule_matched_total.load(Ordering::Relaxed),
            self.validation_errors_total.load(Ordering::Relaxed),
            self.outcome_violations_total.load(Ordering::Relaxed),
            self.narrative_calls_total.load(Ordering::Relaxed),
            self.narrative_failures_total.load(Ordering::Relaxed),
        )
    }
}
