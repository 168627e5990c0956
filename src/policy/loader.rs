use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::domain::{LendingPolicy, SmeProfile};
use crate::rules::{RuleSet, RuleSetError};

/// Errors that can occur during policy loading.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rule set error: {0}")]
    RuleSet(#[from] RuleSetError),
}

/// Load a lending policy from a YAML file.
pub fn load_policy(path: impl AsRef<Path>) -> Result<LendingPolicy, PolicyError> {
    let content = fs::read_to_string(path)?;
    let policy: LendingPolicy = serde_yaml::from_str(&content)?;

    validate_policy(&policy)?;

    Ok(policy)
}

/// Load the policy at `path`, or the built-in policy when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<LendingPolicy, PolicyError> {
    match path {
        Some(path) => {
            let policy = load_policy(path)?;
            info!(path = %path.display(), version = %policy.version, "Loaded lending policy");
            Ok(policy)
        }
        None => {
            let policy = LendingPolicy::default();
            info!(version = %policy.version, "Using built-in lending policy");
            Ok(policy)
        }
    }
}

/// Load a policy and build its rule set.
pub fn load_ruleset(path: Option<&Path>) -> Result<(LendingPolicy, RuleSet), PolicyError> {
    let policy = load_or_default(path)?;
    let ruleset = RuleSet::from_policy(&policy)?;
    Ok((policy, ruleset))
}

/// Validate policy configuration.
fn validate_policy(policy: &LendingPolicy) -> Result<(), PolicyError> {
    if policy.version.trim().is_empty() {
        return Err(PolicyError::Validation(
            "Policy version cannot be empty".to_string(),
        ));
    }

    let params = &policy.params;
    if params.min_dscr.is_sign_negative() {
        return Err(PolicyError::Validation(format!(
            "min_dscr must not be negative, got {}",
            params.min_dscr
        )));
    }
    if params.min_loan_amount <= rust_decimal::Decimal::ZERO {
        return Err(PolicyError::Validation(format!(
            "min_loan_amount must be positive, got {}",
            params.min_loan_amount
        )));
    }

    for profile in SmeProfile::ALL {
        let limits = params.borrowing_limits.get(&profile).ok_or_else(|| {
            PolicyError::Validation(format!("Missing borrowing limits for {}", profile.code()))
        })?;
        for (kind, l) in [("unsecured", limits.unsecured), ("secured", limits.secured)] {
            if l.min > l.max {
                return Err(PolicyError::Validation(format!(
                    "Borrowing limits for {} {} have min {} above max {}",
                    profile.code(),
                    kind,
                    l.min,
                    l.max
                )));
            }
        }
    }

    let accepted: HashSet<&str> = params.accepted_sectors.iter().map(String::as_str).collect();
    if let Some(sector) = params
        .declined_sectors
        .iter()
        .find(|s| accepted.contains(s.as_str()))
    {
        return Err(PolicyError::Validation(format!(
            "Sector is both accepted and declined: {}",
            sector
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn policy_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_policy() {
        let file = policy_file(
            r#"
policy_version: "2024-11"
params:
  min_dscr: 1.30
  min_loan_amount: 30000
  declined_sectors: ["Gambling"]
"#,
        );

        let policy = load_policy(file.path()).unwrap();

        assert_eq!(policy.version, "2024-11");
        assert_eq!(policy.params.min_dscr, dec!(1.30));
        assert_eq!(policy.params.min_loan_amount, dec!(30000));
        assert_eq!(policy.params.declined_sectors, vec!["Gambling".to_string()]);
        // Unspecified params keep their defaults
        assert_eq!(policy.params.borrowing_limits.len(), 4);
    }

    #[test]
    fn test_load_borrowing_limits() {
        let file = policy_file(
            r#"
policy_version: "limits"
params:
  borrowing_limits:
    EB: { unsecured: { min: 20000, max: 100000 }, secured: { min: 20000, max: 200000 } }
    ESB: { unsecured: { min: 20000, max: 50000 }, secured: { min: 20000, max: 90000 } }
    NTB: { unsecured: { min: 20000, max: 40000 }, secured: { min: 20000, max: 80000 } }
    SU: { unsecured: { min: 20000, max: 30000 }, secured: { min: 20000, max: 60000 } }
"#,
        );

        let policy = load_policy(file.path()).unwrap();
        let su = policy.params.borrowing_limits[&SmeProfile::Startup];

        assert_eq!(su.unsecured.max, dec!(30000));
        assert_eq!(su.secured.max, dec!(60000));
    }

    #[test]
    fn test_policy_validation_empty_version() {
        let file = policy_file(r#"policy_version: "  ""#);

        let result = load_policy(file.path());
        assert!(result.unwrap_err().to_string().contains("version"));
    }

    #[test]
    fn test_policy_validation_missing_profile_limits() {
        let file = policy_file(
            r#"
policy_version: "partial"
params:
  borrowing_limits:
    EB: { unsecured: { min: 20000, max: 100000 }, secured: { min: 20000, max: 200000 } }
"#,
        );

        let err = load_policy(file.path()).unwrap_err();
        assert!(err.to_string().contains("Missing borrowing limits for ESB"));
    }

    #[test]
    fn test_policy_validation_overlapping_sectors() {
        let file = policy_file(
            r#"
policy_version: "sectors"
params:
  accepted_sectors: ["Construction"]
  declined_sectors: ["Construction"]
"#,
        );

        let err = load_policy(file.path()).unwrap_err();
        assert!(matches!(err, PolicyError::Validation(_)));
        assert!(err.to_string().contains("Construction"));
    }

    #[test]
    fn test_unknown_profile_key_is_rejected() {
        let file = policy_file(
            r#"
policy_version: "bad"
params:
  borrowing_limits:
    XX: { unsecured: { min: 1, max: 2 }, secured: { min: 1, max: 2 } }
"#,
        );

        assert!(matches!(
            load_policy(file.path()).unwrap_err(),
            PolicyError::Yaml(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_policy("/nonexistent/policy.yaml").unwrap_err();
        assert!(matches!(err, PolicyError::Io(_)));
    }

    #[test]
    fn test_load_ruleset_defaults() {
        let (policy, ruleset) = load_ruleset(None).unwrap();

        assert_eq!(policy.version, "3.0");
        assert_eq!(ruleset.len(), 68);
        assert_eq!(ruleset.policy_version(), "3.0");
    }
}
