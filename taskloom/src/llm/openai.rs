//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Sends the task's system prompt and user prompt as two messages with the
//! task's temperature. The content of every returned choice is concatenated.
//!
//! **Interaction**: Built by `LlmEndpoint::client()` for `Provider::OpenAi`.

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::ClientError;
use crate::llm::{CompletionRequest, LlmClient, LlmResponse, LlmUsage};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

/// OpenAI Chat Completions client.
///
/// Stateless apart from the HTTP client and model name, so one instance can be
/// shared across tasks.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
}

impl ChatOpenAI {
    /// Build client with custom config (e.g. explicit API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    /// Build client from an API key and optional base URL.
    pub fn with_api_key(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        model: impl Into<String>,
    ) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = base_url {
            config = config.with_api_base(base);
        }
        Self::with_config(config, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(request: &CompletionRequest) -> Vec<ChatCompletionRequestMessage> {
        vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                request.system_prompt.as_str(),
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                request.user_prompt.as_str(),
            )),
        ]
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn run(&self, request: &CompletionRequest) -> Result<LlmResponse, ClientError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(Self::messages_to_request(request));
        args.temperature(request.temperature);

        let body = args
            .build()
            .map_err(|e| ClientError::Request(format!("OpenAI request build failed: {}", e)))?;

        debug!(
            model = %self.model,
            temperature = request.temperature,
            system_len = request.system_prompt.len(),
            user_len = request.user_prompt.len(),
            "OpenAI chat create"
        );
        if let Ok(js) = serde_json::to_string_pretty(&body) {
            trace!(request = %js, "OpenAI request body");
        }

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .map_err(|e| ClientError::Api(format!("OpenAI API error: {}", e)))?;

        if let Ok(js) = serde_json::to_string_pretty(&response) {
            trace!(response = %js, "OpenAI response body");
        }

        if response.choices.is_empty() {
            return Err(ClientError::MalformedResponse(
                "OpenAI returned no choices".to_string(),
            ));
        }

        let content: String = response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .collect();

        let usage = response
            .usage
            .map(|u| LlmUsage {
                prompt_tokens: u64::from(u.prompt_tokens),
                completion_tokens: u64::from(u.completion_tokens),
                total_tokens: u64::from(u.total_tokens),
            })
            .unwrap_or_default();

        Ok(LlmResponse { content, usage })
    }
}
