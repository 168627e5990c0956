use serde::{Deserialize, Serialize};
use std::fmt;

/// Loan evaluation outcome with severity ordering.
///
/// Decisions are ordered from least to most restrictive.
/// When multiple rules fire, the most restrictive decision wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Decision {
    /// Approved without conditions
    #[serde(rename = "PASS")]
    Pass = 0,
    /// Approved subject to conditions being met before funding
    #[serde(rename = "CONDITIONAL_PASS")]
    ConditionalPass = 1,
    /// Requires an AI-assisted review
    #[serde(rename = "FLAG/AI")]
    FlagAi = 2,
    /// Requires an underwriter review
    #[serde(rename = "FLAG/UW")]
    FlagUw = 3,
    /// Declined
    #[serde(rename = "FAIL")]
    Fail = 4,
}

impl Decision {
    /// All decisions, least restrictive first.
    pub const ALL: [Decision; 5] = [
        Decision::Pass,
        Decision::ConditionalPass,
        Decision::FlagAi,
        Decision::FlagUw,
        Decision::Fail,
    ];

    /// Returns the more restrictive of two decisions.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "PASS",
            Decision::ConditionalPass => "CONDITIONAL_PASS",
            Decision::FlagAi => "FLAG/AI",
            Decision::FlagUw => "FLAG/UW",
            Decision::Fail => "FAIL",
        }
    }

    /// Parse from the wire representation.
    ///
    /// Only the canonical spellings are accepted; `REQUIREMENT` from older
    /// schema revisions is not a decision.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PASS" => Some(Decision::Pass),
            "CONDITIONAL_PASS" => Some(Decision::ConditionalPass),
            "FLAG/AI" => Some(Decision::FlagAi),
            "FLAG/UW" => Some(Decision::FlagUw),
            "FAIL" => Some(Decision::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
