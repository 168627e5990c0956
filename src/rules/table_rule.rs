use rust_decimal::Decimal;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use super::template;
use super::traits::Rule;
use crate::domain::evidence::RuleResult;
use crate::domain::{Concern, Decision, Explanation, LendingParams, RuleId, SmeRiskRequest};

/// Pure predicate over a request and the lending parameters.
pub type Predicate = Arc<dyn Fn(&SmeRiskRequest, &LendingParams) -> bool + Send + Sync>;

/// Half-open or closed interval over stressed DSCR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DscrRange {
    lower: Bound<Decimal>,
    upper: Bound<Decimal>,
}

impl DscrRange {
    /// `dscr > low`
    pub const fn above(low: Decimal) -> Self {
        DscrRange {
            lower: Bound::Excluded(low),
            upper: Bound::Unbounded,
        }
    }

    /// `dscr >= low`
    pub const fn at_least(low: Decimal) -> Self {
        DscrRange {
            lower: Bound::Included(low),
            upper: Bound::Unbounded,
        }
    }

    /// `low < dscr <= high`
    pub const fn between(low: Decimal, high: Decimal) -> Self {
        DscrRange {
            lower: Bound::Excluded(low),
            upper: Bound::Included(high),
        }
    }

    /// `low <= dscr < high`
    pub const fn from_until(low: Decimal, high: Decimal) -> Self {
        DscrRange {
            lower: Bound::Included(low),
            upper: Bound::Excluded(high),
        }
    }

    /// `low <= dscr <= high`
    pub const fn closed(low: Decimal, high: Decimal) -> Self {
        DscrRange {
            lower: Bound::Included(low),
            upper: Bound::Included(high),
        }
    }

    /// `low < dscr < high`
    pub const fn strictly_between(low: Decimal, high: Decimal) -> Self {
        DscrRange {
            lower: Bound::Excluded(low),
            upper: Bound::Excluded(high),
        }
    }

    /// `dscr < high`
    pub const fn below(high: Decimal) -> Self {
        DscrRange {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(high),
        }
    }

    pub fn contains(&self, dscr: Decimal) -> bool {
        (self.lower, self.upper).contains(&dscr)
    }
}

impl fmt::Display for DscrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Bound::Excluded(v) => write!(f, "{} < ", v)?,
            Bound::Included(v) => write!(f, "{} <= ", v)?,
            Bound::Unbounded => {}
        }
        f.write_str("DSCR")?;
        match self.upper {
            Bound::Excluded(v) => write!(f, " < {}", v),
            Bound::Included(v) => write!(f, " <= {}", v),
            Bound::Unbounded => Ok(()),
        }
    }
}

/// A rule defined by a predicate and a fixed outcome.
///
/// Every entry of the SME rule table is a `TableRule`; the catalog
/// modules differ only in how they build predicates.
pub struct TableRule {
    id: RuleId,
    concern: Concern,
    outcome: Decision,
    confidence: f64,
    template: Arc<str>,
    predicate: Predicate,
    params: Arc<LendingParams>,
}

impl TableRule {
    pub fn new<F>(
        id: u8,
        concern: Concern,
        outcome: Decision,
        confidence: f64,
        template: &str,
        params: Arc<LendingParams>,
        predicate: F,
    ) -> Self
    where
        F: Fn(&SmeRiskRequest, &LendingParams) -> bool + Send + Sync + 'static,
    {
        TableRule {
            id: RuleId(id),
            concern,
            outcome,
            confidence,
            template: Arc::from(template),
            predicate: Arc::new(predicate),
            params,
        }
    }

    /// Whether the predicate holds, without rendering an explanation.
    #[inline]
    pub fn matches(&self, request: &SmeRiskRequest) -> bool {
        (self.predicate)(request, &self.params)
    }
}

impl fmt::Debug for TableRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRule")
            .field("id", &self.id)
            .field("concern", &self.concern)
            .field("outcome", &self.outcome)
            .field("confidence", &self.confidence)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl Rule for TableRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn concern(&self) -> Concern {
        self.concern
    }

    fn outcome(&self) -> Decision {
        self.outcome
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn template(&self) -> &str {
        &self.template
    }

    fn evaluate(&self, request: &SmeRiskRequest) -> RuleResult {
        if !self.matches(request) {
            return RuleResult::miss();
        }

        RuleResult::fire(
            self.outcome,
            self.confidence,
            Explanation {
                template: Arc::clone(&self.template),
                text: template::render(&self.template, request, &self.params),
            },
        )
    }
}
