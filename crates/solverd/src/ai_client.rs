//! Generative service client.
//!
//! One thin HTTP wrapper over an OpenAI-compatible chat completions
//! endpoint, behind a trait so the router can be exercised with a fake
//! client in tests. Two call shapes: free-text chat (finalize) and a
//! forced function invocation (classify). No retries anywhere - a failed
//! call degrades immediately to keep per-request latency bounded.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::AiConfig;

/// Generative service errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    #[error("AI service token not configured")]
    MissingToken,

    #[error("Error connecting to AI service: {0}")]
    Connect(String),

    #[error("Error from AI service: Status {0}")]
    Status(u16),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Malformed AI response: {0}")]
    Payload(String),
}

/// Declaration of the single structured-output function the classifier
/// forces the service to invoke.
#[derive(Debug, Clone)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Client trait - real HTTP implementation plus a counting fake for tests.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Free-text completion with deterministic sampling and a bounded
    /// output length.
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError>;

    /// Completion with a forced function call; returns the function's
    /// parsed argument payload.
    async fn call_function(
        &self,
        system: &str,
        user: &str,
        schema: &FunctionSchema,
    ) -> Result<Value, AiError>;
}

/// Real client backed by reqwest.
pub struct HttpChatClient {
    config: AiConfig,
    client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn token(&self) -> Result<&str, AiError> {
        self.config
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AiError::MissingToken)
    }

    async fn post(&self, body: Value) -> Result<Value, AiError> {
        let token = self.token()?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(self.config.timeout_secs)
                } else {
                    AiError::Connect(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AiError::Payload(e.to_string()))
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String, AiError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": self.config.max_answer_tokens,
            "temperature": 0,
        });

        let result = self.post(body).await?;
        debug!("chat completion received");

        result
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AiError::Payload("no message content in response".into()))
    }

    async fn call_function(
        &self,
        system: &str,
        user: &str,
        schema: &FunctionSchema,
    ) -> Result<Value, AiError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": schema.name,
                    "description": schema.description,
                    "parameters": schema.parameters,
                },
            }],
            // Always this function - the classifier never wants free text
            "tool_choice": {"type": "function", "function": {"name": schema.name}},
        });

        let result = self.post(body).await?;

        let arguments = result
            .pointer("/choices/0/message/tool_calls/0/function/arguments")
            .and_then(Value::as_str)
            .ok_or_else(|| AiError::Payload("no tool call in response".into()))?;

        serde_json::from_str(arguments)
            .map_err(|e| AiError::Payload(format!("invalid function arguments: {}", e)))
    }
}

/// Fake client for tests - scripted responses plus call counters, so
/// router ordering properties ("the classifier is never called on a
/// short-circuit") are directly assertable.
pub struct FakeChatClient {
    chat_responses: Mutex<Vec<Result<String, AiError>>>,
    function_responses: Mutex<Vec<Result<Value, AiError>>>,
    chat_calls: AtomicUsize,
    function_calls: AtomicUsize,
    last_chat_prompt: Mutex<Option<String>>,
}

impl FakeChatClient {
    pub fn new(
        chat_responses: Vec<Result<String, AiError>>,
        function_responses: Vec<Result<Value, AiError>>,
    ) -> Self {
        Self {
            chat_responses: Mutex::new(chat_responses),
            function_responses: Mutex::new(function_responses),
            chat_calls: AtomicUsize::new(0),
            function_calls: AtomicUsize::new(0),
            last_chat_prompt: Mutex::new(None),
        }
    }

    /// A client where every call fails as if the token were missing.
    pub fn unconfigured() -> Self {
        Self::new(vec![], vec![])
    }

    /// A client whose classify call always yields this payload.
    pub fn classifying(payload: Value) -> Self {
        Self::new(vec![], vec![Ok(payload)])
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn function_calls(&self) -> usize {
        self.function_calls.load(Ordering::SeqCst)
    }

    /// The user prompt of the most recent chat call, for asserting what
    /// context reached the finalizer.
    pub fn last_chat_prompt(&self) -> Option<String> {
        self.last_chat_prompt.lock().unwrap().clone()
    }

    fn next<T: Clone>(queue: &Mutex<Vec<Result<T, AiError>>>) -> Result<T, AiError> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            return Err(AiError::MissingToken);
        }
        if queue.len() == 1 {
            queue[0].clone()
        } else {
            queue.remove(0)
        }
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, _system: &str, user: &str) -> Result<String, AiError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_chat_prompt.lock().unwrap() = Some(user.to_string());
        Self::next(&self.chat_responses)
    }

    async fn call_function(
        &self,
        _system: &str,
        _user: &str,
        _schema: &FunctionSchema,
    ) -> Result<Value, AiError> {
        self.function_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.function_responses)
    }
}
