//! Generic completion client trait for provider abstraction.

use crate::types::Result;
use async_trait::async_trait;

/// A chat-completion service.
///
/// All providers implement this trait, allowing the research pipeline to
/// swap providers (or test doubles) without changing orchestration code.
/// Callers must not assume a response arrives: every method can fail and
/// the pipeline degrades per-task rather than aborting the run.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion from a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with a system prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// The model name/identifier.
    fn model_name(&self) -> &str;
}
