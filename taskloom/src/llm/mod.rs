//! LLM client abstraction used by the task execution engine.
//!
//! The engine builds one immutable [`CompletionRequest`] per task (system prompt,
//! user prompt, temperature) and hands it to [`LlmClient::run`]. Clients hold no
//! per-request state, so one client instance can serve many tasks.
//!
//! Implementations: [`MockLlm`] (scripted responses for tests and examples),
//! [`ChatOpenAI`] (OpenAI Chat Completions via `async-openai`).

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::ClientError;

/// Token usage for one LLM call (prompt + completion).
///
/// **Interaction**: Part of `LlmResponse`; added to the endpoint's running totals
/// and kept on the task as its last usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    /// Tokens in the prompt (input).
    pub prompt_tokens: u64,
    /// Tokens in the completion (output).
    pub completion_tokens: u64,
    /// Total tokens (prompt + completion).
    pub total_tokens: u64,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// One single-shot completion request.
///
/// Built by the execution engine from a task's composed prompts and creativity.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Sampling temperature (0–2).
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature,
        }
    }
}

/// Response from an LLM completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LlmResponse {
    /// Text of every response segment, concatenated in order.
    pub content: String,
    pub usage: LlmUsage,
}

/// LLM client: given a completion request, returns the model's text and token usage.
///
/// Cancellation is cooperative: the engine drops the `run` future when the caller's
/// token fires, so implementations must not rely on running to completion.
///
/// **Interaction**: Obtained from `LlmEndpoint::client()`; called by `Task::process`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion. No retries; errors are returned unchanged to the task.
    async fn run(&self, request: &CompletionRequest) -> Result<LlmResponse, ClientError>;
}
