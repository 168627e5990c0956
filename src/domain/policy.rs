use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::application::{LoanType, SmeProfile};

/// Rule table version used when no policy file is supplied.
pub const DEFAULT_POLICY_VERSION: &str = "3.0";

/// Lending policy: the parameters the rule table is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingPolicy {
    /// Policy version, exposed as `rule_version`
    #[serde(rename = "policy_version")]
    pub version: String,

    #[serde(default)]
    pub params: LendingParams,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        LendingPolicy {
            version: DEFAULT_POLICY_VERSION.to_string(),
            params: LendingParams::default(),
        }
    }
}

/// Minimum and maximum loan amount for one profile and loan type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl LoanLimits {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        LoanLimits { min, max }
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// Borrowing limits for one SME profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLimits {
    pub unsecured: LoanLimits,
    pub secured: LoanLimits,
}

impl ProfileLimits {
    pub fn for_loan_type(&self, loan_type: LoanType) -> LoanLimits {
        match loan_type {
            LoanType::Secured => self.secured,
            LoanType::Unsecured => self.unsecured,
        }
    }
}

/// Required documents: a common checklist plus per-profile additions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequiredDocuments {
    #[serde(default)]
    pub common: BTreeMap<String, String>,

    #[serde(default)]
    pub by_profile: BTreeMap<SmeProfile, BTreeMap<String, String>>,
}

impl RequiredDocuments {
    /// The full checklist for a profile, document name to description.
    pub fn for_profile(&self, profile: SmeProfile) -> BTreeMap<&str, &str> {
        let mut docs: BTreeMap<&str, &str> = self
            .common
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(extra) = self.by_profile.get(&profile) {
            docs.extend(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        docs
    }
}

/// Parameters used by rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingParams {
    /// Stressed DSCR below which every application is declined
    pub min_dscr: Decimal,

    /// Loan amount below which every application is declined
    pub min_loan_amount: Decimal,

    pub borrowing_limits: BTreeMap<SmeProfile, ProfileLimits>,

    /// Sectors the lender recognises and accepts
    pub accepted_sectors: Vec<String>,

    /// Sectors the lender never lends to
    pub declined_sectors: Vec<String>,

    pub required_documents: RequiredDocuments,
}

impl LendingParams {
    /// Borrowing limits for a profile and loan type, if the policy defines them.
    pub fn limits(&self, profile: SmeProfile, loan_type: LoanType) -> Option<LoanLimits> {
        self.borrowing_limits
            .get(&profile)
            .map(|l| l.for_loan_type(loan_type))
    }
}

impl Default for LendingParams {
    fn default() -> Self {
        let borrowing_limits = BTreeMap::from([
            (
                SmeProfile::Established,
                ProfileLimits {
                    unsecured: LoanLimits::new(dec!(25000), dec!(150000)),
                    secured: LoanLimits::new(dec!(25000), dec!(250000)),
                },
            ),
            (
                SmeProfile::EarlyStage,
                ProfileLimits {
                    unsecured: LoanLimits::new(dec!(25000), dec!(75000)),
                    secured: LoanLimits::new(dec!(25000), dec!(150000)),
                },
            ),
            (
                SmeProfile::NewlyTrading,
                ProfileLimits {
                    unsecured: LoanLimits::new(dec!(25000), dec!(60000)),
                    secured: LoanLimits::new(dec!(25000), dec!(100000)),
                },
            ),
            (
                SmeProfile::Startup,
                ProfileLimits {
                    unsecured: LoanLimits::new(dec!(26000), dec!(40000)),
                    secured: LoanLimits::new(dec!(26000), dec!(80000)),
                },
            ),
        ]);

        LendingParams {
            min_dscr: dec!(1.25),
            min_loan_amount: dec!(25001),
            borrowing_limits,
            accepted_sectors: default_accepted_sectors(),
            declined_sectors: default_declined_sectors(),
            required_documents: default_required_documents(),
        }
    }
}

fn default_accepted_sectors() -> Vec<String> {
    [
        "Construction",
        "Professional, Scientific, and Technical Activities",
        "Wholesale and Retail Trade",
        "Other Service Activities",
        "Human Health and Social Work Activities",
        "Information and Communication",
        "Transportation and Storage",
        "Education",
        "Arts, Entertainment, and Recreation",
        "Manufacturing",
        "Accommodation and Food Service Activities",
        "Agriculture, Forestry, and Fishing",
        "Real Estate Activities",
        "Administrative and Support Service Activities",
        "Financial and Insurance Activities",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_declined_sectors() -> Vec<String> {
    [
        "Illicit or Illegal industries",
        "Places of Worship",
        "Places of Gambling",
        "Environmentally harmful industries",
        "Predatory financial services (e.g. payday lenders)",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_required_documents() -> RequiredDocuments {
    let common = [
        ("Completed Application Form", "Loan request, purpose, trading history, and full borrower and director details including assets, liabilities and a credit history declaration."),
        ("Proof of Identity", "Government-issued photo ID for every owner, director and person with significant control."),
        ("Proof of Address", "Certified proof of address no older than 3 months, such as a utility bill or bank statement."),
        ("Bank Statements", "At least 6 months of business and 3 months of personal bank statements."),
        ("Declaration of Income and Expenditure", "Formal declaration of the borrower's income, expenditure and financial position."),
        ("Credit History Documentation", "Credit report or equivalent evidence from a credit reference agency."),
        ("Valuation and Professional Reports", "Independent valuation of the collateral for secured loans."),
        ("Agreement in Principle", "Agreement in principle where required by the documentation package."),
        ("Legal Representation/Independent Legal Advice", "Confirmation of independent legal advice or representation where required."),
    ];
    let financials = [
        (SmeProfile::Established, "Either 3 years of historical accounts or 2 years of historical accounts and 1 year of projections."),
        (SmeProfile::EarlyStage, "1 year of historical accounts and 2 years of projections."),
        (SmeProfile::NewlyTrading, "Up to 12 months of historical accounts, projections for the rest of the current year and 2 further years of projections."),
        (SmeProfile::Startup, "3 years of projections."),
    ];

    RequiredDocuments {
        common: common
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        by_profile: financials
            .into_iter()
            .map(|(profile, desc)| {
                (
                    profile,
                    BTreeMap::from([("Financial Statements".to_string(), desc.to_string())]),
                )
            })
            .collect(),
    }
}
