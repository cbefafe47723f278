//! Chat-completion API client.
//!
//! This module talks to an OpenAI-compatible chat-completion endpoint
//! (OpenRouter by default). Every call is a single attempt bounded by a
//! fixed timeout; the caller decides what a failure means for the run.
//!
//! # Architecture
//!
//! - [`Complete`]: the trait the generator and topic sources depend on
//! - [`OpenRouterClient`]: the `reqwest` implementation
//! - [`GenerationError`]: every way a completion can fail
//!
//! # Error Mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | non-2xx status | [`GenerationError::Status`], detail taken from the JSON body when possible |
//! | timeout | [`GenerationError::Timeout`] |
//! | connection/TLS/body read failure | [`GenerationError::Transport`] |
//! | body is not `{choices: [{message: {content}}]}` | [`GenerationError::MalformedResponse`] |
//! | blank content | [`GenerationError::EmptyCompletion`] |

use crate::config::CompletionSettings;
use crate::text::truncate_for_log;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors raised while requesting a completion.
///
/// None of these abort a run: the pipeline logs them and moves on to the
/// next topic.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The API answered with a non-success status.
    #[error("completion API returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// No complete response arrived within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Connection, TLS, or body transfer failure.
    #[error("network or request error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The body did not have the expected chat-completion shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),

    /// The model answered with nothing but whitespace.
    #[error("completion contained no text")]
    EmptyCompletion,
}

/// A chat message in the OpenAI wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// What a caller asks for; the client adds the model name.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Trait for a single chat-completion call.
///
/// Implementors return the raw text of the first choice. The pipeline is
/// generic over this trait so tests can script responses without a server.
pub trait Complete {
    /// Request one completion.
    ///
    /// # Arguments
    ///
    /// * `request` - Messages and sampling parameters
    ///
    /// # Returns
    ///
    /// The content of the first choice, or the reason there is none.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

/// [`Complete`] implementation backed by `reqwest`.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Failure to build the HTTP client from configuration.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("API key or attribution header is not a valid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl OpenRouterClient {
    /// Build a client with the bearer token and optional attribution headers
    /// baked into its default headers.
    pub fn new(settings: &CompletionSettings) -> Result<Self, ClientBuildError> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = &settings.referer {
            headers.insert("http-referer", HeaderValue::from_str(referer)?);
        }
        if let Some(title) = &settings.app_title {
            headers.insert("x-title", HeaderValue::from_str(title)?);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            timeout: settings.timeout,
        })
    }

    fn classify(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(e)
        }
    }
}

impl Complete for OpenRouterClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let t0 = Instant::now();
        let body = ChatBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        let dt = t0.elapsed();

        if !status.is_success() {
            let detail = error_detail(&text);
            warn!(
                status = status.as_u16(),
                elapsed_ms = dt.as_millis() as u64,
                %detail,
                "Completion API returned an error status"
            );
            return Err(GenerationError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        debug!(
            elapsed_ms = dt.as_millis() as u64,
            bytes = text.len(),
            "Completion API responded"
        );
        parse_completion(&text)
    }
}

/// Extract the first choice's text from a successful response body.
fn parse_completion(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::MalformedResponse(format!(
            "{e}; body: {}",
            truncate_for_log(body, 200)
        ))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("response had no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(GenerationError::EmptyCompletion);
    }
    Ok(content)
}

/// Best-effort description of an error body.
///
/// Structured bodies contribute their `message` (or `error.message`);
/// anything else is reported as raw text, truncated.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.pointer("/error/message").and_then(|m| m.as_str()))
            .unwrap_or("No specific error message.")
            .to_string(),
        Err(_) => format!(
            "API response was not JSON (invalid API key, rate limit, or network issue). Raw response text: {}",
            truncate_for_log(body, 200)
        ),
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted [`Complete`] implementation for unit tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued results in order and records every request.
    #[derive(Default)]
    pub struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Complete for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::EmptyCompletion))
        }
    }
}
