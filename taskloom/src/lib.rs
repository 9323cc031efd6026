//! # Taskloom
//!
//! Chain language-model calls as tasks. A [`Task`] has a description, an
//! expected-output contract, a [`Persona`] (role, goal, backstory) and an
//! ordered list of prerequisite tasks whose outputs are fed into its prompt.
//!
//! ## Design principles
//!
//! - **Dependencies first**: [`Task::process`] runs every unfinished dependency,
//!   depth-first and in list order, before the task itself.
//! - **Done means output**: a task is done when its output is non-empty; done
//!   dependencies are never run again, so shared dependencies run once.
//! - **One request, one call**: the engine builds an immutable
//!   [`CompletionRequest`] and calls [`LlmClient::run`] once; no retries.
//! - **Shared accounting**: every task adds its token usage to its
//!   [`LlmEndpoint`]'s [`TokenUsage`] (atomic counters).
//!
//! ## Main modules
//!
//! - [`task`]: [`Task`], [`RunContext`], [`Creativity`]; prompt composition in [`task::prompt`].
//! - [`persona`]: [`Persona`].
//! - [`endpoint`]: [`LlmEndpoint`], [`Provider`], [`TokenUsage`], model presets.
//! - [`llm`]: [`LlmClient`] trait, [`ChatOpenAI`], [`MockLlm`].
//! - [`error`]: [`TaskError`], [`ClientError`], [`ConfigError`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskloom::{Creativity, LlmEndpoint, Persona, Provider, RunContext, Task, GPT_4O};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gpt = Arc::new(
//!     LlmEndpoint::builder()
//!         .provider(Provider::OpenAi)
//!         .model(GPT_4O)
//!         .api_key("YOUR-API-KEY")
//!         .build()?,
//! );
//! let writer = Arc::new(Persona::new().with_role("Professional Jokes Writer"));
//! let critic = Arc::new(Persona::new().with_role("Casual Developer"));
//!
//! let jokes = Arc::new(
//!     Task::new(Arc::clone(&gpt), writer)
//!         .with_description("Write 10 jokes")
//!         .with_expected_output(r#"A single JSON array like ["joke1", "joke2"]"#)
//!         .with_creativity(Creativity::EXTREMELY_CREATIVE),
//! );
//! let rating = Task::new(Arc::clone(&gpt), critic)
//!     .with_description("Rate each joke from 1 to 5")
//!     .with_expected_output(r#"A JSON array like [{"joke": "...", "rating": 1}]"#)
//!     .with_dependencies([Arc::clone(&jokes)]);
//!
//! rating.process(&RunContext::new()).await?;
//! println!("{}", rating.output());
//! println!("tokens used: {}", gpt.usage().total_tokens());
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod error;
pub mod llm;
pub mod persona;
pub mod task;

pub use endpoint::{
    LlmEndpoint, LlmEndpointBuilder, Provider, TokenUsage, APP_NAME, DEFAULT_MODEL,
    GPT_35_TURBO_0613, GPT_4O,
};
pub use error::{ClientError, ConfigError, TaskError};
pub use llm::{ChatOpenAI, CompletionRequest, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use persona::Persona;
pub use task::{Creativity, RunContext, Task, TaskId};

/// Re-exported so callers can cancel a run without depending on `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
