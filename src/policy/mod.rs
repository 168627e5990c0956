pub mod loader;

pub use loader::{load_or_default, load_policy, load_ruleset, PolicyError};
