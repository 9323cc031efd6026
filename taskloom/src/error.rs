//! Task execution error types.
//!
//! Returned by `Task::process` and the output accessors. A failing dependency's
//! error is returned as-is to the caller of the root task, so one enum covers
//! the whole chain.

use thiserror::Error;

use crate::task::TaskId;

/// Error from a language-model client call.
///
/// Produced by `LlmClient::run` implementations; the engine never retries.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be built (e.g. invalid temperature for the backend).
    #[error("request build failed: {0}")]
    Request(String),

    /// Backend returned an error (network, auth, rate limit, ...).
    #[error("api error: {0}")]
    Api(String),

    /// Backend answered but the response had nothing usable.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Misconfiguration detected while building an endpoint.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Credential is empty or missing.
    #[error("missing api key for provider {0}")]
    MissingApiKey(String),

    /// Model identifier is empty.
    #[error("missing model for provider {0}")]
    MissingModel(String),

    /// Loading `.env` / XDG config failed.
    #[error("load config: {0}")]
    Load(#[from] env_config::LoadError),
}

/// Task execution error.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The language-model client call failed.
    #[error("client call failed: {0}")]
    Client(#[from] ClientError),

    /// The endpoint's provider has no matching client implementation.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Required configuration was missing at construction time.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output is not valid JSON for the requested shape.
    #[error("decode output: {0}")]
    Decode(#[from] serde_json::Error),

    /// A task was reached again while its own dependencies were still being resolved.
    #[error("cyclic dependency detected at task {task_id}")]
    CyclicDependency { task_id: TaskId },

    /// The caller's cancellation token fired before the chain finished.
    #[error("task processing cancelled")]
    Cancelled,
}

impl TaskError {
    /// True for errors coming from the client boundary (not configuration or decoding).
    pub fn is_client_error(&self) -> bool {
        matches!(self, TaskError::Client(_))
    }
}
