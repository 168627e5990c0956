//! Weighted risk curve and personal guarantee sizing.
//!
//! The assessment accompanies SME decisions for audit and narrative
//! context. It never changes the resolved decision.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{
    DscrLevel, LendingParams, RiskAssessment, RiskTier, SmeProfile, SmeRiskRequest,
};

const SME_WEIGHT: Decimal = dec!(0.32);
const DSCR_WEIGHT: Decimal = dec!(0.32);
const CREDIT_WEIGHT: Decimal = dec!(0.32);
const INDUSTRY_WEIGHT: Decimal = dec!(0.04);

/// Guarantee required at the lowest risk score.
pub const BASE_PG: Decimal = dec!(0.20);
/// Additional guarantee per point of risk above 1.0.
pub const PG_SLOPE: Decimal = dec!(0.80);
pub const MAX_PG: Decimal = dec!(1.00);

fn sme_score(profile: SmeProfile) -> Decimal {
    match profile {
        SmeProfile::Established => dec!(1.0),
        SmeProfile::EarlyStage => dec!(1.5),
        SmeProfile::NewlyTrading => dec!(2.0),
        SmeProfile::Startup => dec!(2.5),
    }
}

fn dscr_score(level: DscrLevel) -> Decimal {
    match level {
        DscrLevel::High => dec!(1.0),
        DscrLevel::Medium => dec!(1.5),
        DscrLevel::Low => dec!(2.0),
    }
}

fn credit_score(tier: RiskTier) -> Decimal {
    match tier {
        RiskTier::T1 => dec!(1.0),
        RiskTier::T2 => dec!(1.5),
        RiskTier::T3 => dec!(2.0),
    }
}

/// Weighted risk score; 1.0 for the best possible application.
pub fn overall_risk(
    profile: SmeProfile,
    dscr_level: DscrLevel,
    tier: RiskTier,
    sector_accepted: bool,
) -> Decimal {
    let industry = if sector_accepted { dec!(1.0) } else { dec!(2.0) };

    SME_WEIGHT * sme_score(profile)
        + DSCR_WEIGHT * dscr_score(dscr_level)
        + CREDIT_WEIGHT * credit_score(tier)
        + INDUSTRY_WEIGHT * industry
}

/// Personal guarantee fraction implied by a risk score, within [0.20, 1.00].
pub fn required_pg(overall_risk: Decimal) -> Decimal {
    (BASE_PG + (overall_risk - Decimal::ONE) * PG_SLOPE).clamp(BASE_PG, MAX_PG)
}

pub fn assess(request: &SmeRiskRequest, params: &LendingParams) -> RiskAssessment {
    let dscr_level = request.dscr_level();
    let sector_accepted = params
        .accepted_sectors
        .iter()
        .any(|s| *s == request.industry_sector);
    let risk = overall_risk(
        request.sme_profile,
        dscr_level,
        request.risk_profile,
        sector_accepted,
    );

    let missing_documents = params
        .required_documents
        .for_profile(request.sme_profile)
        .into_iter()
        .filter(|(doc, _)| !request.provided_docs.contains(*doc))
        .map(|(doc, desc)| (doc.to_string(), desc.to_string()))
        .collect();

    RiskAssessment {
        overall_risk: risk.normalize(),
        required_pg: required_pg(risk).normalize(),
        dscr_level,
        missing_documents,
    }
}
