//! LLM modules.
//!
//! The completions client and the query-intent extraction built on it.

pub mod client;
pub mod intent;

pub use client::{LlmClient, LlmSettings};
pub use intent::parse_intent;
