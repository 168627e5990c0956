use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::domain::{
    Concern, Decision, LendingParams, LoanType, RiskTier, SmeProfile, SmeRiskRequest,
};
use crate::rules::table_rule::{DscrRange, TableRule};

use Decision::{Fail, FlagAi, FlagUw, Pass};
use LoanType::{Secured, Unsecured};
use RiskTier::{T1, T2, T3};
use SmeProfile::{EarlyStage as ESB, Established as EB, NewlyTrading as NTB, Startup as SU};

/// One cell of a profile's risk matrix.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub id: u8,
    pub profile: SmeProfile,
    pub tier: RiskTier,
    /// `None` applies to both loan types
    pub loan_type: Option<LoanType>,
    pub dscr: DscrRange,
    /// Largest amount the band covers
    pub cap: Option<Decimal>,
    pub outcome: Decision,
    pub confidence: f64,
    pub template: &'static str,
}

impl Band {
    pub fn matches(&self, req: &SmeRiskRequest) -> bool {
        req.sme_profile == self.profile
            && req.risk_profile == self.tier
            && self.loan_type.map_or(true, |t| t == req.loan_type)
            && self.dscr.contains(req.stressed_dscr)
            && self.cap.map_or(true, |cap| req.loan_amount <= cap)
    }
}

// DSCR ranges. Adjacent bands meet at 1.35, which belongs to the upper band.
// EB treats 1.50 as strong; other profiles do not.
const HIGH: DscrRange = DscrRange::above(dec!(1.50));
const UPPER: DscrRange = DscrRange::closed(dec!(1.35), dec!(1.50));
const LOWER: DscrRange = DscrRange::strictly_between(dec!(1.25), dec!(1.35));
const EB_HIGH: DscrRange = DscrRange::at_least(dec!(1.50));
const EB_UPPER: DscrRange = DscrRange::from_until(dec!(1.35), dec!(1.50));

#[allow(clippy::too_many_arguments)]
fn band(
    id: u8,
    profile: SmeProfile,
    tier: RiskTier,
    loan_type: Option<LoanType>,
    dscr: DscrRange,
    cap: Option<Decimal>,
    outcome: Decision,
    confidence: f64,
    template: &'static str,
) -> Band {
    Band {
        id,
        profile,
        tier,
        loan_type,
        dscr,
        cap,
        outcome,
        confidence,
        template,
    }
}

/// Profile x tier x DSCR x loan type matrix (rules 19-67).
#[rustfmt::skip]
pub fn table() -> Vec<Band> {
    let u = Some(Unsecured);
    let s = Some(Secured);
    let k = |amount: u32| Some(Decimal::from(amount) * Decimal::ONE_THOUSAND);

    vec![
        // Established Business
        band(19, EB, T1, u, EB_HIGH, k(150), Pass, 0.90, "EB/T1 with DSCR of at least 150% qualifies for an unsecured loan."),
        band(20, EB, T1, s, EB_HIGH, k(250), Pass, 0.92, "EB/T1 with DSCR of at least 150% qualifies for a secured loan."),
        band(21, EB, T2, u, EB_HIGH, k(150), Pass, 0.87, "EB/T2 with DSCR of at least 150% qualifies for an unsecured loan."),
        band(22, EB, T2, s, EB_HIGH, k(250), Pass, 0.89, "EB/T2 with DSCR of at least 150% qualifies for a secured loan."),
        band(23, EB, T3, u, EB_HIGH, k(100), FlagAi, 0.75, "EB/T3 with DSCR of at least 150% (unsecured): AI review required."),
        band(24, EB, T3, s, EB_HIGH, k(250), FlagAi, 0.78, "EB/T3 with DSCR of at least 150% (secured): AI review required."),
        band(25, EB, T1, u, EB_UPPER, k(150), Pass, 0.85, "EB/T1 with DSCR between 135%-150% qualifies for an unsecured loan."),
        band(26, EB, T1, s, EB_UPPER, k(250), Pass, 0.88, "EB/T1 with DSCR between 135%-150% qualifies for a secured loan."),
        band(27, EB, T2, u, EB_UPPER, k(100), Pass, 0.80, "EB/T2 with DSCR between 135%-150% qualifies for an unsecured loan."),
        band(28, EB, T2, s, EB_UPPER, k(250), Pass, 0.83, "EB/T2 with DSCR between 135%-150% qualifies for a secured loan."),
        band(29, EB, T3, u, EB_UPPER, k(75), FlagUw, 0.70, "EB/T3 with DSCR between 135%-150%: underwriter review required (unsecured)."),
        band(30, EB, T3, s, EB_UPPER, k(250), FlagUw, 0.72, "EB/T3 with DSCR between 135%-150%: underwriter review required (secured)."),
        band(31, EB, T1, u, LOWER, k(100), Pass, 0.78, "EB/T1 with DSCR between 125%-135% qualifies for an unsecured loan."),
        band(32, EB, T1, s, LOWER, k(250), Pass, 0.82, "EB/T1 with DSCR between 125%-135% qualifies for a secured loan."),
        band(33, EB, T2, u, LOWER, k(75), Pass, 0.75, "EB/T2 with DSCR between 125%-135% qualifies for an unsecured loan."),
        band(34, EB, T2, s, LOWER, k(250), Pass, 0.79, "EB/T2 with DSCR between 125%-135% qualifies for a secured loan."),
        band(35, EB, T3, u, LOWER, k(50), FlagAi, 0.65, "EB/T3 with DSCR between 125%-135%: AI review required (unsecured)."),
        band(36, EB, T3, s, LOWER, k(250), FlagUw, 0.70, "EB/T3 with DSCR between 125%-135%: underwriter review required (secured)."),
        // Early-Stage Business
        band(37, ESB, T1, u, HIGH, k(80), Pass, 0.88, "ESB/T1 with DSCR >150% qualifies for an unsecured loan."),
        band(38, ESB, T1, s, HIGH, k(150), Pass, 0.90, "ESB/T1 with DSCR >150% qualifies for a secured loan."),
        band(39, ESB, T2, u, HIGH, k(75), Pass, 0.85, "ESB/T2 with DSCR >150% qualifies for an unsecured loan."),
        band(40, ESB, T2, s, HIGH, k(150), Pass, 0.87, "ESB/T2 with DSCR >150% qualifies for a secured loan."),
        band(41, ESB, T3, u, HIGH, k(60), FlagAi, 0.70, "ESB/T3 with DSCR >150% (unsecured): AI review required."),
        band(42, ESB, T3, s, HIGH, k(150), FlagUw, 0.72, "ESB/T3 with DSCR >150% (secured): underwriter review required."),
        band(43, ESB, T1, u, DscrRange::between(dec!(1.35), dec!(1.50)), k(80), Pass, 0.85, "ESB/T1 with DSCR between 135%-150% qualifies for an unsecured loan."),
        band(44, ESB, T1, s, DscrRange::between(dec!(1.35), dec!(1.50)), k(150), Pass, 0.87, "ESB/T1 with DSCR between 135%-150% qualifies for a secured loan."),
        band(45, ESB, T2, u, DscrRange::between(dec!(1.35), dec!(1.50)), k(75), Pass, 0.82, "ESB/T2 with DSCR between 135%-150% qualifies for an unsecured loan."),
        band(46, ESB, T2, s, DscrRange::between(dec!(1.35), dec!(1.50)), k(150), Pass, 0.85, "ESB/T2 with DSCR between 135%-150% qualifies for a secured loan."),
        band(47, ESB, T3, u, UPPER, k(50), FlagAi, 0.70, "ESB/T3 with DSCR between 135%-150%: AI review required (unsecured)."),
        band(48, ESB, T3, s, UPPER, k(150), FlagUw, 0.72, "ESB/T3 with DSCR between 135%-150%: underwriter review required (secured)."),
        band(49, ESB, T1, u, DscrRange::between(dec!(1.25), dec!(1.35)), k(60), Pass, 0.80, "ESB/T1 with DSCR between 125%-135% qualifies for an unsecured loan."),
        band(50, ESB, T1, s, DscrRange::between(dec!(1.25), dec!(1.35)), k(150), Pass, 0.83, "ESB/T1 with DSCR between 125%-135% qualifies for a secured loan."),
        band(51, ESB, T2, u, DscrRange::strictly_between(dec!(1.25), dec!(1.35)), k(50), Pass, 0.75, "ESB/T2 with DSCR >125% and <135% qualifies for an unsecured loan."),
        band(52, ESB, T2, s, DscrRange::strictly_between(dec!(1.25), dec!(1.35)), k(150), Pass, 0.78, "ESB/T2 with DSCR >125% and <135% qualifies for a secured loan."),
        band(53, ESB, T3, u, LOWER, k(40), FlagAi, 0.70, "ESB/T3 with DSCR >125% and <135%: AI review required (unsecured)."),
        band(54, ESB, T3, s, LOWER, k(150), FlagUw, 0.72, "ESB/T3 with DSCR >125% and <135%: underwriter review required (secured)."),
        // Newly Trading Business
        band(55, NTB, T1, u, DscrRange::above(dec!(1.25)), k(60), Pass, 0.80, "NTB/T1 with DSCR >125% qualifies for an unsecured loan."),
        band(56, NTB, T1, s, HIGH, k(100), Pass, 0.85, "NTB/T1 with DSCR >150% qualifies for a secured loan."),
        band(57, NTB, T2, u, DscrRange::above(dec!(1.35)), k(60), Pass, 0.78, "NTB/T2 with DSCR >135% qualifies for an unsecured loan."),
        band(58, NTB, T2, s, HIGH, k(100), Pass, 0.80, "NTB/T2 with DSCR >150% qualifies for a secured loan."),
        band(59, NTB, T3, u, DscrRange::above(dec!(1.35)), k(60), FlagAi, 0.70, "NTB/T3 with DSCR >135%: AI review required (unsecured)."),
        band(60, NTB, T3, s, DscrRange::above(dec!(1.35)), k(150), FlagUw, 0.72, "NTB/T3 with DSCR >135%: underwriter review required (secured)."),
        band(61, NTB, T3, u, DscrRange::between(dec!(1.25), dec!(1.35)), k(40), FlagAi, 0.70, "NTB/T3 with DSCR between 125%-135%: AI review required (unsecured)."),
        band(62, NTB, T3, s, DscrRange::between(dec!(1.25), dec!(1.35)), k(150), FlagUw, 0.72, "NTB/T3 with DSCR between 125%-135%: underwriter review required (secured)."),
        // Startup: loan type only matters through the borrowing limits
        band(63, SU, T2, None, DscrRange::above(dec!(1.35)), None, FlagAi, 0.72, "SU/T2 with DSCR >135%: AI review required."),
        band(64, SU, T3, None, DscrRange::above(dec!(1.35)), None, FlagUw, 0.70, "SU/T3 with DSCR >135%: underwriter review required."),
        band(65, SU, T1, None, DscrRange::between(dec!(1.25), dec!(1.35)), None, FlagAi, 0.70, "SU/T1 with DSCR between 125%-135%: AI review required."),
        band(66, SU, T2, None, DscrRange::below(dec!(1.35)), None, Fail, 0.99, "SU/T2 with DSCR <135%: Loan declined."),
        band(67, SU, T3, None, DscrRange::below(dec!(1.35)), None, Fail, 0.99, "SU/T3 with DSCR <135%: Loan declined."),
    ]
}

/// Id of the catch-all rule.
pub const FALLBACK_ID: u8 = 68;

const FALLBACK_TEMPLATE: &str = "Although the loan amount complies with the defined borrowing limits, \
the applicant's DSCR and risk indicators do not justify an automatic PASS. \
As the remaining issues relate to personal guarantees, debentures, ID verification or AML/KYC checks, \
the application is granted a CONDITIONAL_PASS subject to these additional conditions.";

/// Build the band rules plus the catch-all that fires when an in-limit,
/// above-minimum application matches no band.
pub fn rules(params: &Arc<LendingParams>) -> Vec<TableRule> {
    let bands: Arc<[Band]> = table().into();

    let mut rules: Vec<TableRule> = bands
        .iter()
        .map(|b| {
            let band = *b;
            TableRule::new(
                band.id,
                Concern::RiskBand,
                band.outcome,
                band.confidence,
                band.template,
                Arc::clone(params),
                move |req, _| band.matches(req),
            )
        })
        .collect();

    rules.push(TableRule::new(
        FALLBACK_ID,
        Concern::Fallback,
        Decision::ConditionalPass,
        0.99,
        FALLBACK_TEMPLATE,
        Arc::clone(params),
        move |req, p| {
            let within_limits = p
                .limits(req.sme_profile, req.loan_type)
                .is_some_and(|l| l.contains(req.loan_amount));
            within_limits
                && req.stressed_dscr >= p.min_dscr
                && req.loan_amount >= p.min_loan_amount
                && !bands.iter().any(|b| b.matches(req))
        },
    ));

    rules
}
