use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default industry sector when none is supplied.
pub const DEFAULT_INDUSTRY_SECTOR: &str = "Wholesale and Retail Trade";

/// Default personal guarantee offered (fraction of the loan).
pub const DEFAULT_PROVIDED_PG: Decimal = dec!(1.0);

/// Default minimum personal guarantee required (fraction of the loan).
pub const DEFAULT_MIN_PG_REQUIRED: Decimal = dec!(0.20);

/// Borrower segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SmeProfile {
    /// Established Business
    #[serde(rename = "EB")]
    Established,
    /// Early-Stage Business
    #[serde(rename = "ESB")]
    EarlyStage,
    /// Newly Trading Business
    #[serde(rename = "NTB")]
    NewlyTrading,
    /// Startup
    #[serde(rename = "SU")]
    Startup,
}

impl SmeProfile {
    pub const ALL: [SmeProfile; 4] = [
        SmeProfile::Established,
        SmeProfile::EarlyStage,
        SmeProfile::NewlyTrading,
        SmeProfile::Startup,
    ];

    /// Short code used on the wire and in explanations.
    pub fn code(&self) -> &'static str {
        match self {
            SmeProfile::Established => "EB",
            SmeProfile::EarlyStage => "ESB",
            SmeProfile::NewlyTrading => "NTB",
            SmeProfile::Startup => "SU",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SmeProfile::Established => "Established Business",
            SmeProfile::EarlyStage => "Early-Stage Business",
            SmeProfile::NewlyTrading => "Newly Trading Business",
            SmeProfile::Startup => "Startup",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        SmeProfile::ALL.into_iter().find(|p| p.code() == s)
    }
}

impl fmt::Display for SmeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Credit risk tier, T1 being the lowest risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    T1,
    T2,
    T3,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::T1, RiskTier::T2, RiskTier::T3];

    pub fn code(&self) -> &'static str {
        match self {
            RiskTier::T1 => "T1",
            RiskTier::T2 => "T2",
            RiskTier::T3 => "T3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::T1 => "Low Risk",
            RiskTier::T2 => "Medium Risk",
            RiskTier::T3 => "High Risk",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        RiskTier::ALL.into_iter().find(|t| t.code() == s)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether the loan is backed by security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Secured,
    Unsecured,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Secured => "secured",
            LoanType::Unsecured => "unsecured",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "secured" => Some(LoanType::Secured),
            "unsecured" => Some(LoanType::Unsecured),
            _ => None,
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse DSCR bucket used by the risk curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DscrLevel {
    High,
    Medium,
    Low,
}

impl DscrLevel {
    pub fn from_dscr(dscr: Decimal) -> Self {
        if dscr >= dec!(1.50) {
            DscrLevel::High
        } else if dscr >= dec!(1.35) {
            DscrLevel::Medium
        } else {
            DscrLevel::Low
        }
    }
}

/// Canonical SME risk request, produced by the input normalizer.
///
/// Every field has been validated and every optional field defaulted, so
/// rule predicates never need to handle missing or out-of-range data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmeRiskRequest {
    pub sme_profile: SmeProfile,
    pub risk_profile: RiskTier,
    #[serde(rename = "stressedDSCR")]
    pub stressed_dscr: Decimal,
    pub loan_amount: Decimal,
    pub loan_type: LoanType,
    pub industry_sector: String,
    pub provided_docs: BTreeSet<String>,
    pub provided_pg: Decimal,
    pub min_pg_required: Decimal,
    pub requires_debenture: bool,
    pub has_debenture: bool,
    pub has_legal_charge: bool,
    pub is_due_diligence_complete: bool,
    pub is_business_registered: bool,
}

impl SmeRiskRequest {
    /// Build a request from the five required fields, defaulting the rest.
    pub fn new(
        sme_profile: SmeProfile,
        risk_profile: RiskTier,
        stressed_dscr: Decimal,
        loan_amount: Decimal,
        loan_type: LoanType,
    ) -> Self {
        SmeRiskRequest {
            sme_profile,
            risk_profile,
            stressed_dscr,
            loan_amount,
            loan_type,
            industry_sector: DEFAULT_INDUSTRY_SECTOR.to_string(),
            provided_docs: BTreeSet::new(),
            provided_pg: DEFAULT_PROVIDED_PG,
            min_pg_required: DEFAULT_MIN_PG_REQUIRED,
            requires_debenture: false,
            has_debenture: false,
            has_legal_charge: true,
            is_due_diligence_complete: true,
            is_business_registered: true,
        }
    }

    pub fn dscr_level(&self) -> DscrLevel {
        DscrLevel::from_dscr(self.stressed_dscr)
    }

    pub fn is_secured(&self) -> bool {
        self.loan_type == LoanType::Secured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let req = SmeRiskRequest::new(
            SmeProfile::Established,
            RiskTier::T1,
            dec!(1.6),
            dec!(100000),
            LoanType::Unsecured,
        );

        assert_eq!(req.industry_sector, DEFAULT_INDUSTRY_SECTOR);
        assert!(req.provided_docs.is_empty());
        assert_eq!(req.provided_pg, dec!(1.0));
        assert_eq!(req.min_pg_required, dec!(0.20));
        assert!(!req.requires_debenture);
        assert!(!req.has_debenture);
        assert!(req.has_legal_charge);
        assert!(req.is_due_diligence_complete);
        assert!(req.is_business_registered);
    }

    #[test]
    fn test_dscr_levels() {
        assert_eq!(DscrLevel::from_dscr(dec!(1.50)), DscrLevel::High);
        assert_eq!(DscrLevel::from_dscr(dec!(1.49)), DscrLevel::Medium);
        assert_eq!(DscrLevel::from_dscr(dec!(1.35)), DscrLevel::Medium);
        assert_eq!(DscrLevel::from_dscr(dec!(1.34)), DscrLevel::Low);
    }

    #[test]
    fn test_profile_codes() {
        assert_eq!(SmeProfile::from_code("NTB"), Some(SmeProfile::NewlyTrading));
        assert_eq!(SmeProfile::from_code("ntb"), None);
        assert_eq!(RiskTier::from_code("T3"), Some(RiskTier::T3));
        assert_eq!(LoanType::from_str("Secured"), None);
    }

    #[test]
    fn test_wire_field_names() {
        let req = SmeRiskRequest::new(
            SmeProfile::Startup,
            RiskTier::T3,
            dec!(0.8),
            dec!(50000),
            LoanType::Unsecured,
        );
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["smeProfile"], "SU");
        assert_eq!(json["riskProfile"], "T3");
        assert_eq!(json["loanType"], "unsecured");
        assert!(json.get("stressedDSCR").is_some());
        assert!(json.get("isDueDiligenceComplete").is_some());
    }
}
