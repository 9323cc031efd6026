//! Shared setup for the taskloom examples.
//!
//! Set `TASKLOOM_PROVIDER=mock` to run the examples offline with `MockLlm`
//! (scripted with the given canned replies); otherwise `OPENAI_API_KEY` must be
//! set in the environment, `.env`, or `~/.config/taskloom/config.toml`.

use std::sync::Arc;

use taskloom::{ConfigError, LlmEndpoint, MockLlm, Provider};

/// Loads the endpoint from env/config, wiring a `MockLlm` when the provider is `mock`.
///
/// `canned` replies are returned in order; the last one repeats afterwards.
pub fn load_endpoint(canned: &[&str]) -> Result<Arc<LlmEndpoint>, ConfigError> {
    env_config::load_and_apply(taskloom::APP_NAME, None)?;
    let provider = std::env::var("TASKLOOM_PROVIDER")
        .ok()
        .and_then(|p| p.parse::<Provider>().ok());

    if provider == Some(Provider::Custom("mock".to_string())) {
        let fallback = canned.last().copied().unwrap_or_default();
        let mock = canned
            .iter()
            .fold(MockLlm::new(fallback), |m, reply| m.then_reply(*reply));
        let endpoint = LlmEndpoint::builder()
            .provider(Provider::Custom("mock".to_string()))
            .model("mock")
            .api_key("mock")
            .build()?
            .with_client(Arc::new(mock));
        return Ok(Arc::new(endpoint));
    }

    Ok(Arc::new(LlmEndpoint::from_env()?))
}
