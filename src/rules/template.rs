//! Explanation templates with `{placeholder}` substitution.

use rust_decimal::Decimal;

use crate::domain::{LendingParams, SmeRiskRequest};

/// Placeholders a template may reference.
pub const PLACEHOLDERS: &[&str] = &[
    "sme_profile",
    "sme_label",
    "risk_profile",
    "dscr",
    "loan_amount",
    "loan_type",
    "industry_sector",
    "min_pg_pct",
    "min_dscr",
    "min_loan_amount",
    "min_limit",
    "max_limit",
    "missing_documents",
];

/// Iterate over the placeholder names used in a template.
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    template.split('{').skip(1).filter_map(|s| s.split_once('}').map(|(k, _)| k))
}

pub fn is_known(placeholder: &str) -> bool {
    PLACEHOLDERS.contains(&placeholder)
}

/// Render a template against a request. Unknown placeholders are kept verbatim.
pub fn render(template: &str, request: &SmeRiskRequest, params: &LendingParams) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match resolve(key, request, params) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn resolve(key: &str, request: &SmeRiskRequest, params: &LendingParams) -> Option<String> {
    let limits = || params.limits(request.sme_profile, request.loan_type);
    let value = match key {
        "sme_profile" => request.sme_profile.code().to_string(),
        "sme_label" => request.sme_profile.label().to_string(),
        "risk_profile" => request.risk_profile.code().to_string(),
        "dscr" => plain(request.stressed_dscr),
        "loan_amount" => plain(request.loan_amount),
        "loan_type" => request.loan_type.as_str().to_string(),
        "industry_sector" => request.industry_sector.clone(),
        "min_pg_pct" => plain((request.min_pg_required * Decimal::ONE_HUNDRED).trunc()),
        "min_dscr" => plain(params.min_dscr),
        "min_loan_amount" => plain(params.min_loan_amount),
        "min_limit" => plain(limits()?.min),
        "max_limit" => plain(limits()?.max),
        "missing_documents" => params
            .required_documents
            .for_profile(request.sme_profile)
            .into_keys()
            .filter(|doc| !request.provided_docs.contains(*doc))
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    Some(value)
}

/// Decimal without trailing zeros.
fn plain(value: Decimal) -> String {
    value.normalize().to_string()
}
