use std::sync::Arc;

use crate::domain::{Concern, Decision, LendingParams, SmeProfile};
use crate::rules::table_rule::TableRule;

/// Funding prerequisites (rules 13-18). Each yields a conditional pass.
pub fn rules(params: &Arc<LendingParams>) -> Vec<TableRule> {
    vec![
        TableRule::new(
            13,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that a minimum {min_pg_pct}% Personal Guarantee (PG) is signed before funding.",
            Arc::clone(params),
            |req, _| {
                matches!(
                    req.sme_profile,
                    SmeProfile::Startup | SmeProfile::NewlyTrading | SmeProfile::EarlyStage
                ) && req.provided_pg < req.min_pg_required
            },
        ),
        TableRule::new(
            14,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that a Debenture is signed before funding.",
            Arc::clone(params),
            |req, _| {
                matches!(
                    req.sme_profile,
                    SmeProfile::NewlyTrading | SmeProfile::EarlyStage | SmeProfile::Established
                ) && req.requires_debenture
                    && !req.has_debenture
            },
        ),
        TableRule::new(
            15,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that the lender obtains a Legal Charge (First or Second) over the security before funding.",
            Arc::clone(params),
            |req, _| req.is_secured() && !req.has_legal_charge,
        ),
        TableRule::new(
            16,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that all AML/KYC and Due Diligence checks are successfully completed before funding.",
            Arc::clone(params),
            |req, _| !req.is_due_diligence_complete,
        ),
        TableRule::new(
            17,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.99,
            "Loan approved on condition that borrower provides proof of business registration before funding.",
            Arc::clone(params),
            |req, _| !req.is_business_registered,
        ),
        // Only a submitted checklist is held against the borrower
        TableRule::new(
            18,
            Concern::Conditions,
            Decision::ConditionalPass,
            0.95,
            "Loan approved on condition that the following documents are provided before funding: {missing_documents}.",
            Arc::clone(params),
            |req, p| {
                !req.provided_docs.is_empty()
                    && p.required_documents
                        .for_profile(req.sme_profile)
                        .keys()
                        .any(|doc| !req.provided_docs.contains(*doc))
            },
        ),
    ]
}
