//! Completion service abstraction.
//!
//! The generative-text model is an opaque collaborator: it receives a
//! system prompt and a user prompt and returns text, or fails. Concrete
//! providers (OpenAI, disabled) live in the `civic-assist` app crate.

use anyhow::Result;
use async_trait::async_trait;

/// Default output token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One request to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A text-completion backend.
///
/// Implementations return the generated text on success. Any error is
/// treated as fatal for the turn by the caller.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider identifier (e.g. `"openai"`).
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
