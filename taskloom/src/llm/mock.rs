//! Mock LLM for tests and examples.
//!
//! Returns a fixed (or scripted, per call) content with fixed usage; can be told
//! to fail or to sleep before answering. Every request it receives is recorded so
//! tests can assert on the composed prompts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::llm::{CompletionRequest, LlmClient, LlmResponse, LlmUsage};

/// One scripted answer.
#[derive(Clone, Debug)]
enum Scripted {
    Reply(String),
    Fail(String),
}

/// Mock LLM: fixed or scripted replies, fixed usage per call.
///
/// Scripted replies (`then_reply`, `then_fail`) are consumed in order; once the
/// script is empty every call returns the default content.
///
/// **Interaction**: Implements `LlmClient`; register it on an endpoint with
/// `LlmEndpoint::with_client`.
pub struct MockLlm {
    content: String,
    usage: LlmUsage,
    script: Mutex<VecDeque<Scripted>>,
    delay: Option<Duration>,
    /// When set, every call fails regardless of the script.
    fail_with: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    /// Creates a mock that always answers `content` with 10 prompt / 5 completion tokens.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: LlmUsage::new(10, 5),
            script: Mutex::new(VecDeque::new()),
            delay: None,
            fail_with: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock whose every call fails with `ClientError::Api(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::new("")
        }
    }

    fn push(&self, s: Scripted) {
        if let Ok(mut q) = self.script.lock() {
            q.push_back(s);
        }
    }

    /// Set usage reported per call (builder).
    pub fn with_usage(mut self, usage: LlmUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Sleep before answering (builder); used to exercise cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply for the next call (builder).
    pub fn then_reply(self, content: impl Into<String>) -> Self {
        self.push(Scripted::Reply(content.into()));
        self
    }

    /// Queue a failure for the next call (builder).
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    /// Number of completed `run` calls (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn run(&self, request: &CompletionRequest) -> Result<LlmResponse, ClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut r) = self.requests.lock() {
            r.push(request.clone());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.fail_with {
            return Err(ClientError::Api(message.clone()));
        }

        let next = self.script.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Scripted::Fail(message)) => Err(ClientError::Api(message)),
            Some(Scripted::Reply(content)) => Ok(LlmResponse {
                content,
                usage: self.usage,
            }),
            None => Ok(LlmResponse {
                content: self.content.clone(),
                usage: self.usage,
            }),
        }
    }
}
