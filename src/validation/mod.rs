//! Boundary validation: raw JSON in, canonical requests out.

mod normalizer;

pub use normalizer::{normalize_sme_request, ValidationError};
