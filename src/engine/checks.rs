//! Single-gate borrower checks.

use crate::domain::{Decision, EvaluationDecision};

/// Legal forms the lender accepts.
pub const ALLOWED_BORROWER_TYPES: [&str; 3] = ["LTD", "Sole Trader", "LLP"];

pub fn evaluate_borrower_type(borrower_type: &str) -> EvaluationDecision {
    if ALLOWED_BORROWER_TYPES.contains(&borrower_type) {
        EvaluationDecision::simple(
            Decision::Pass,
            0.95,
            format!("Borrower type {} is accepted.", borrower_type),
        )
    } else {
        EvaluationDecision::simple(
            Decision::Fail,
            0.99,
            format!("Borrower type {} is not allowed.", borrower_type),
        )
    }
}

/// An unverified borrower may proceed once ID is verified before funding.
pub fn evaluate_borrower_id(is_verified: bool) -> EvaluationDecision {
    if is_verified {
        EvaluationDecision::simple(Decision::Pass, 0.98, "Borrower ID has been verified.")
    } else {
        EvaluationDecision::simple(
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that borrower provides valid ID verification before funding.",
        )
    }
}

pub fn evaluate_open_banking(is_connected: bool) -> EvaluationDecision {
    if is_connected {
        EvaluationDecision::simple(Decision::Pass, 0.95, "Open banking is connected.")
    } else {
        EvaluationDecision::simple(
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that the borrower successfully connects Open Banking before funding.",
        )
    }
}
