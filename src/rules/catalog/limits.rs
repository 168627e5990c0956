use std::sync::Arc;

use crate::domain::{Concern, Decision, LendingParams, SmeProfile};
use crate::rules::table_rule::TableRule;

/// Per-profile borrowing limits (rules 5-12): one below-minimum and one
/// above-maximum rule per profile, limits resolved by loan type.
pub fn rules(params: &Arc<LendingParams>) -> Vec<TableRule> {
    let mut rules = Vec::with_capacity(SmeProfile::ALL.len() * 2);

    for (i, profile) in SmeProfile::ALL.into_iter().enumerate() {
        let base = 5 + 2 * i as u8;

        rules.push(TableRule::new(
            base,
            Concern::BorrowingLimits,
            Decision::Fail,
            0.99,
            "Loan amount £{loan_amount} is below the minimum allowed limit of £{min_limit} for {sme_profile} {loan_type} loans.",
            Arc::clone(params),
            move |req, p| {
                req.sme_profile == profile
                    && p.limits(profile, req.loan_type)
                        .is_some_and(|l| req.loan_amount < l.min)
            },
        ));

        rules.push(TableRule::new(
            base + 1,
            Concern::BorrowingLimits,
            Decision::Fail,
            0.99,
            "Loan amount £{loan_amount} exceeds the maximum allowed limit of £{max_limit} for {sme_profile} {loan_type} loans.",
            Arc::clone(params),
            move |req, p| {
                req.sme_profile == profile
                    && p.limits(profile, req.loan_type)
                        .is_some_and(|l| req.loan_amount > l.max)
            },
        ));
    }

    rules
}
