use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::application::{
    DEFAULT_INDUSTRY_SECTOR, DEFAULT_MIN_PG_REQUIRED, DEFAULT_PROVIDED_PG,
};
use crate::domain::{LoanType, RiskTier, SmeProfile, SmeRiskRequest};

/// A request field that failed validation. Always names the field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' has unknown value '{value}' (expected one of: {allowed})")]
    UnknownVariant {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("field '{field}' is out of range: {value} ({constraint})")]
    OutOfRange {
        field: &'static str,
        value: String,
        constraint: &'static str,
    },
}

impl ValidationError {
    /// The offending field, if the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::NotAnObject => None,
            ValidationError::MissingField(field)
            | ValidationError::InvalidType { field, .. }
            | ValidationError::UnknownVariant { field, .. }
            | ValidationError::OutOfRange { field, .. } => Some(field),
        }
    }
}

/// Validate and coerce a raw JSON body into a canonical [`SmeRiskRequest`].
///
/// Optional fields take their documented defaults. Unknown keys are ignored.
pub fn normalize_sme_request(raw: &Value) -> Result<SmeRiskRequest, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    let sme_profile = required_str(obj, "smeProfile")?;
    let sme_profile =
        SmeProfile::from_code(sme_profile).ok_or_else(|| ValidationError::UnknownVariant {
            field: "smeProfile",
            value: sme_profile.to_string(),
            allowed: "EB, ESB, NTB, SU",
        })?;

    let risk_profile = required_str(obj, "riskProfile")?;
    let risk_profile =
        RiskTier::from_code(risk_profile).ok_or_else(|| ValidationError::UnknownVariant {
            field: "riskProfile",
            value: risk_profile.to_string(),
            allowed: "T1, T2, T3",
        })?;

    let stressed_dscr = required_decimal(obj, "stressedDSCR")?;
    if stressed_dscr.is_sign_negative() && !stressed_dscr.is_zero() {
        return Err(ValidationError::OutOfRange {
            field: "stressedDSCR",
            value: stressed_dscr.to_string(),
            constraint: "must be >= 0",
        });
    }

    let loan_amount = required_decimal(obj, "loanAmount")?;
    if loan_amount <= Decimal::ZERO {
        return Err(ValidationError::OutOfRange {
            field: "loanAmount",
            value: loan_amount.to_string(),
            constraint: "must be > 0",
        });
    }

    let loan_type = required_str(obj, "loanType")?;
    let loan_type = LoanType::from_str(loan_type).ok_or_else(|| ValidationError::UnknownVariant {
        field: "loanType",
        value: loan_type.to_string(),
        allowed: "secured, unsecured",
    })?;

    let industry_sector = optional_str(obj, "industrySector")?
        .unwrap_or(DEFAULT_INDUSTRY_SECTOR)
        .to_string();

    let provided_docs = optional_string_set(obj, "providedDocs")?.unwrap_or_default();

    let provided_pg = fraction(obj, "providedPg", DEFAULT_PROVIDED_PG)?;
    let min_pg_required = fraction(obj, "minPgRequired", DEFAULT_MIN_PG_REQUIRED)?;

    Ok(SmeRiskRequest {
        sme_profile,
        risk_profile,
        stressed_dscr,
        loan_amount,
        loan_type,
        industry_sector,
        provided_docs,
        provided_pg,
        min_pg_required,
        requires_debenture: optional_bool(obj, "requiresDebenture")?.unwrap_or(false),
        has_debenture: optional_bool(obj, "hasDebenture")?.unwrap_or(false),
        has_legal_charge: optional_bool(obj, "hasLegalCharge")?.unwrap_or(true),
        is_due_diligence_complete: optional_bool(obj, "isDueDiligenceComplete")?.unwrap_or(true),
        is_business_registered: optional_bool(obj, "isBusinessRegistered")?.unwrap_or(true),
    })
}

/// Present and non-null.
fn present<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    optional_str(obj, field)?.ok_or(ValidationError::MissingField(field))
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "a string",
        }),
    }
}

fn optional_bool(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, ValidationError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationError::InvalidType {
            field,
            expected: "a boolean",
        }),
    }
}

fn required_decimal(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Decimal, ValidationError> {
    let value = present(obj, field).ok_or(ValidationError::MissingField(field))?;
    to_decimal(value, field)
}

fn fraction(
    obj: &Map<String, Value>,
    field: &'static str,
    default: Decimal,
) -> Result<Decimal, ValidationError> {
    let value = match present(obj, field) {
        None => return Ok(default),
        Some(v) => to_decimal(v, field)?,
    };
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            constraint: "must be within [0, 1]",
        });
    }
    Ok(value)
}

fn optional_string_set(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<BTreeSet<String>>, ValidationError> {
    let invalid = ValidationError::InvalidType {
        field,
        expected: "an array of strings",
    };
    match present(obj, field) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or(invalid.clone()))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid),
    }
}

/// Convert a JSON number to a decimal without passing through binary floating point.
fn to_decimal(value: &Value, field: &'static str) -> Result<Decimal, ValidationError> {
    let Value::Number(n) = value else {
        return Err(ValidationError::InvalidType {
            field,
            expected: "a number",
        });
    };
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| ValidationError::OutOfRange {
            field,
            value: text,
            constraint: "must be representable as a decimal",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "smeProfile": "SU",
            "riskProfile": "T3",
            "stressedDSCR": 0.8,
            "loanAmount": 50000,
            "loanType": "unsecured"
        })
    }

    #[test]
    fn test_minimal_request_gets_defaults() {
        let req = normalize_sme_request(&minimal()).unwrap();

        assert_eq!(req.sme_profile, SmeProfile::Startup);
        assert_eq!(req.risk_profile, RiskTier::T3);
        assert_eq!(req.stressed_dscr, dec!(0.8));
        assert_eq!(req.loan_amount, dec!(50000));
        assert_eq!(req.loan_type, LoanType::Unsecured);
        assert_eq!(req.industry_sector, "Wholesale and Retail Trade");
        assert_eq!(req.provided_pg, dec!(1.0));
        assert_eq!(req.min_pg_required, dec!(0.20));
        assert!(req.has_legal_charge);
        assert!(!req.requires_debenture);
    }

    #[test]
    fn test_full_request() {
        let raw = json!({
            "smeProfile": "ESB",
            "riskProfile": "T2",
            "stressedDSCR": 1.42,
            "loanAmount": 60000.5,
            "loanType": "secured",
            "industrySector": "Manufacturing",
            "providedDocs": ["Proof of Identity", "Bank Statements", "Proof of Identity"],
            "providedPg": 0.5,
            "minPgRequired": 0.3,
            "requiresDebenture": true,
            "hasDebenture": true,
            "hasLegalCharge": false,
            "isDueDiligenceComplete": false,
            "isBusinessRegistered": true,
            "somethingElse": "ignored"
        });

        let req = normalize_sme_request(&raw).unwrap();

        assert_eq!(req.stressed_dscr, dec!(1.42));
        assert_eq!(req.loan_amount, dec!(60000.5));
        assert_eq!(req.provided_docs.len(), 2);
        assert_eq!(req.provided_pg, dec!(0.5));
        assert!(!req.has_legal_charge);
        assert!(!req.is_due_diligence_complete);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut raw = minimal();
        raw.as_object_mut().unwrap().remove("loanType");

        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("loanType"));
        assert_eq!(err.field(), Some("loanType"));
    }

    #[test]
    fn test_null_required_field_is_missing() {
        let mut raw = minimal();
        raw["riskProfile"] = Value::Null;

        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err.field(), Some("riskProfile"));
    }

    #[test]
    fn test_unknown_enum_rejected() {
        let mut raw = minimal();
        raw["smeProfile"] = json!("PLC");

        let err = normalize_sme_request(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariant { field: "smeProfile", .. }));

        let mut raw = minimal();
        raw["loanType"] = json!("Secured");
        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err.field(), Some("loanType"));
    }

    #[test]
    fn test_negative_dscr_rejected() {
        let mut raw = minimal();
        raw["stressedDSCR"] = json!(-0.1);

        let err = normalize_sme_request(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "stressedDSCR", .. }));
    }

    #[test]
    fn test_zero_dscr_accepted() {
        let mut raw = minimal();
        raw["stressedDSCR"] = json!(0);

        assert!(normalize_sme_request(&raw).is_ok());
    }

    #[test]
    fn test_non_positive_loan_rejected() {
        for amount in [json!(0), json!(-100)] {
            let mut raw = minimal();
            raw["loanAmount"] = amount;

            let err = normalize_sme_request(&raw).unwrap_err();
            assert_eq!(err.field(), Some("loanAmount"));
        }
    }

    #[test]
    fn test_fraction_out_of_range() {
        let mut raw = minimal();
        raw["providedPg"] = json!(1.2);

        let err = normalize_sme_request(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "providedPg", .. }));

        let mut raw = minimal();
        raw["minPgRequired"] = json!(-0.01);
        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err.field(), Some("minPgRequired"));
    }

    #[test]
    fn test_wrong_types() {
        let mut raw = minimal();
        raw["loanAmount"] = json!("50000");
        let err = normalize_sme_request(&raw).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { field: "loanAmount", .. }));

        let mut raw = minimal();
        raw["hasLegalCharge"] = json!("yes");
        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err.field(), Some("hasLegalCharge"));

        let mut raw = minimal();
        raw["providedDocs"] = json!(["ok", 3]);
        let err = normalize_sme_request(&raw).unwrap_err();
        assert_eq!(err.field(), Some("providedDocs"));
    }

    #[test]
    fn test_not_an_object() {
        let err = normalize_sme_request(&json!([1, 2])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_scientific_notation() {
        let mut raw = minimal();
        raw["loanAmount"] = json!(5e4);

        let req = normalize_sme_request(&raw).unwrap();
        assert_eq!(req.loan_amount, dec!(50000));
    }
}
