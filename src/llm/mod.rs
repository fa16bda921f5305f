//! Completion-service abstraction.
//!
//! The orchestration core never talks to a provider directly: everything
//! goes through [`CompletionClient`], so tests can substitute a scripted
//! implementation and providers can be swapped without touching the core.

pub mod client;
pub mod openai;

pub use client::CompletionClient;
pub use openai::OpenAIClient;

use crate::types::{AppError, Result};
use serde::de::DeserializeOwned;

/// Ask for a structured value: instructs JSON output and parses the reply
/// leniently (models like to wrap JSON in fences or prose).
pub async fn generate_structured<T: DeserializeOwned>(
    client: &dyn CompletionClient,
    system: &str,
    prompt: &str,
) -> Result<T> {
    let raw = client.generate_with_system(system, prompt).await?;
    parse_json_response(&raw)
}

/// Parse a JSON value out of a model reply, tolerating markdown fences and
/// surrounding prose.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let candidate = extract_json_object(raw)
        .ok_or_else(|| AppError::Completion("response contains no JSON object".to_string()))?;

    serde_json::from_str(candidate)
        .map_err(|e| AppError::Completion(format!("malformed JSON response: {e}")))
}

/// Slice out the outermost `{ ... }` of a reply, if any.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
