//! The SME rule table, grouped by concern.
//!
//! | ids   | concern          |
//! |-------|------------------|
//! | 1-4   | eligibility      |
//! | 5-12  | borrowing limits |
//! | 13-18 | conditions       |
//! | 19-67 | risk bands       |
//! | 68    | fallback         |

pub mod bands;
mod conditions;
mod eligibility;
mod limits;

use std::sync::Arc;

use super::traits::Rule;
use crate::domain::LendingParams;

/// Build every rule of the table against one set of lending parameters.
pub fn build(params: &Arc<LendingParams>) -> Vec<Arc<dyn Rule>> {
    eligibility::rules(params)
        .into_iter()
        .chain(limits::rules(params))
        .chain(conditions::rules(params))
        .chain(bands::rules(params))
        .map(|rule| Arc::new(rule) as Arc<dyn Rule>)
        .collect()
}
