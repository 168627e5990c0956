use std::sync::Arc;

use crate::domain::{Concern, Decision, LendingParams};
use crate::rules::table_rule::TableRule;

/// Global thresholds every application must clear (rules 1-4).
pub fn rules(params: &Arc<LendingParams>) -> Vec<TableRule> {
    vec![
        TableRule::new(
            1,
            Concern::Eligibility,
            Decision::Fail,
            0.99,
            "Stressed DSCR {dscr} is below the minimum of {min_dscr}. Loan declined.",
            Arc::clone(params),
            |req, p| req.stressed_dscr < p.min_dscr,
        ),
        TableRule::new(
            2,
            Concern::Eligibility,
            Decision::Fail,
            0.99,
            "Loan amount £{loan_amount} is below £{min_loan_amount}. Does not meet minimum threshold.",
            Arc::clone(params),
            |req, p| req.loan_amount < p.min_loan_amount,
        ),
        TableRule::new(
            3,
            Concern::Eligibility,
            Decision::Fail,
            0.99,
            "Industry sector '{industry_sector}' is outside lending policy. Loan declined.",
            Arc::clone(params),
            |req, p| p.declined_sectors.iter().any(|s| *s == req.industry_sector),
        ),
        TableRule::new(
            4,
            Concern::Eligibility,
            Decision::FlagUw,
            0.99,
            "Industry sector '{industry_sector}' is not a recognised sector: underwriter review required.",
            Arc::clone(params),
            |req, p| {
                !p.accepted_sectors.iter().any(|s| *s == req.industry_sector)
                    && !p.declined_sectors.iter().any(|s| *s == req.industry_sector)
            },
        ),
    ]
}
