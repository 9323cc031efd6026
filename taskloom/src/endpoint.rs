//! Model endpoint: provider, model, credentials and shared token-usage totals.
//!
//! One `LlmEndpoint` is typically shared (`Arc`) by every task of a chain; each
//! successful task execution adds its usage to the endpoint's [`TokenUsage`].
//! The endpoint is also the client factory ([`LlmEndpoint::client`]).

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{ConfigError, TaskError};
use crate::llm::{ChatOpenAI, LlmClient, LlmUsage};

/// `gpt-3.5-turbo-0613`.
pub const GPT_35_TURBO_0613: &str = "gpt-3.5-turbo-0613";
/// `gpt-4o`.
pub const GPT_4O: &str = "gpt-4o";

/// Model used by [`LlmEndpoint::from_env`] when `OPENAI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = GPT_4O;

/// App name used for the XDG config directory (`~/.config/taskloom/config.toml`).
pub const APP_NAME: &str = "taskloom";

/// LLM provider behind an endpoint.
///
/// `Custom` covers any provider without a built-in client; such endpoints need a
/// client registered with [`LlmEndpoint::with_client`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Custom(String),
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => f.write_str("openai"),
            Provider::Custom(name) => f.write_str(name),
        }
    }
}

impl FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            other => Ok(Self::Custom(other.to_string())),
        }
    }
}

/// Running token totals shared by every task using one endpoint.
///
/// Updates are atomic adds, so tasks on different threads may record into the
/// same totals.
#[derive(Debug, Default)]
pub struct TokenUsage {
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

impl TokenUsage {
    /// Adds one call's usage to the totals.
    pub fn record(&self, usage: &LlmUsage) {
        self.prompt_tokens
            .fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(usage.completion_tokens, Ordering::Relaxed);
        self.total_tokens
            .fetch_add(usage.total_tokens, Ordering::Relaxed);
    }

    pub fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens.load(Ordering::Relaxed)
    }

    pub fn completion_tokens(&self) -> u64 {
        self.completion_tokens.load(Ordering::Relaxed)
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens.load(Ordering::Relaxed)
    }

    /// Current totals as a plain value.
    pub fn snapshot(&self) -> LlmUsage {
        LlmUsage {
            prompt_tokens: self.prompt_tokens(),
            completion_tokens: self.completion_tokens(),
            total_tokens: self.total_tokens(),
        }
    }
}

/// Provider/model/credential bundle plus accumulated usage.
///
/// Build with [`LlmEndpoint::builder`] or [`LlmEndpoint::from_env`].
pub struct LlmEndpoint {
    provider: Provider,
    model: String,
    api_key: String,
    base_url: Option<String>,
    client: Option<Arc<dyn LlmClient>>,
    usage: TokenUsage,
}

impl fmt::Debug for LlmEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmEndpoint")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("custom_client", &self.client.is_some())
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

impl LlmEndpoint {
    pub fn builder() -> LlmEndpointBuilder {
        LlmEndpointBuilder::default()
    }

    /// Builds an endpoint from the process environment.
    ///
    /// - `TASKLOOM_PROVIDER`: provider name (default `openai`).
    /// - `OPENAI_MODEL`: model id (default [`DEFAULT_MODEL`]).
    /// - `OPENAI_API_KEY`: required.
    /// - `OPENAI_BASE_URL` or `OPENAI_API_BASE`: optional base URL.
    ///
    /// The `OPENAI_*` names are read for every provider, including
    /// `Provider::Custom` (e.g. an OpenAI-compatible server behind a registered client).
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = std::env::var("TASKLOOM_PROVIDER")
            .ok()
            .and_then(|p| p.parse::<Provider>().ok())
            .unwrap_or(Provider::OpenAi);
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let base_url = std::env::var("OPENAI_BASE_URL")
            .or_else(|_| std::env::var("OPENAI_API_BASE"))
            .ok();

        let mut builder = Self::builder()
            .provider(provider)
            .model(model)
            .api_key(api_key);
        if let Some(url) = base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    /// Applies `.env` and `$XDG_CONFIG_HOME/taskloom/config.toml` to the environment
    /// (existing env wins), then calls [`LlmEndpoint::from_env`].
    ///
    /// * `override_dir`: directory holding `.env`; defaults to the current directory.
    pub fn load(override_dir: Option<&Path>) -> Result<Self, ConfigError> {
        env_config::load_and_apply(APP_NAME, override_dir)?;
        Self::from_env()
    }

    /// Registers the client to use for this endpoint (builder).
    ///
    /// Required for `Provider::Custom`; for `Provider::OpenAi` it replaces the
    /// built-in client (e.g. to use a mock in tests).
    pub fn with_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Token totals accumulated by every task using this endpoint.
    pub fn usage(&self) -> &TokenUsage {
        &self.usage
    }

    /// Returns a client for this endpoint's provider.
    ///
    /// A registered client always wins; otherwise `OpenAi` gets a [`ChatOpenAI`]
    /// and any other provider fails with `TaskError::UnsupportedProvider`.
    pub fn client(&self) -> Result<Arc<dyn LlmClient>, TaskError> {
        if let Some(ref client) = self.client {
            return Ok(Arc::clone(client));
        }
        match self.provider {
            Provider::OpenAi => Ok(Arc::new(ChatOpenAI::with_api_key(
                self.api_key.clone(),
                self.base_url.as_deref(),
                self.model.clone(),
            ))),
            Provider::Custom(ref name) => Err(TaskError::UnsupportedProvider(name.clone())),
        }
    }

    pub(crate) fn record_usage(&self, usage: &LlmUsage) {
        self.usage.record(usage);
    }
}

/// Builder for [`LlmEndpoint`]; `build` validates instead of panicking.
#[derive(Debug, Default)]
pub struct LlmEndpointBuilder {
    provider: Option<Provider>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
}

impl LlmEndpointBuilder {
    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Validates and builds. Provider defaults to `OpenAi`.
    ///
    /// Fails with `ConfigError::MissingApiKey` when the key is empty and with
    /// `ConfigError::MissingModel` when the model is empty.
    pub fn build(self) -> Result<LlmEndpoint, ConfigError> {
        let provider = self.provider.unwrap_or(Provider::OpenAi);
        let api_key = self.api_key.unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(provider.to_string()));
        }
        let model = self.model.unwrap_or_default();
        if model.trim().is_empty() {
            return Err(ConfigError::MissingModel(provider.to_string()));
        }
        Ok(LlmEndpoint {
            provider,
            model,
            api_key,
            base_url: self.base_url.filter(|u| !u.trim().is_empty()),
            client: None,
            usage: TokenUsage::default(),
        })
    }
}
