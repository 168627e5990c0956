//! Narrative explanations of decisions, produced by an external language
//! model and checked against the decision they describe.

pub mod client;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod service;

pub use client::{NarrativeClient, NarrativeError};
pub use mock::ScriptedClient;
pub use openai::{OpenAiClient, DEFAULT_BASE_URL};
pub use service::{CheckOutcome, NarrativeOutcome, NarrativeService, DEFAULT_MAX_ATTEMPTS};
