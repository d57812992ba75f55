//! Blocking client for an OpenAI-compatible chat completion backend.

use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::flashcards::GenerationParameters;

use super::models::{ChatRequest, CompletionBody, CompletionResponse};

#[derive(Error, Debug)]
pub enum ModelBackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model backend error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response from model backend: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Anything that can answer a chat completion request with raw text
pub trait ModelClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ModelBackendError>;

    /// Send a system + user pair with the sampling settings of `params`
    fn query(&self, system: &str, user: &str, params: &GenerationParameters) -> Result<String, ModelBackendError> {
        self.complete(&ChatRequest::new(system, user, params))
    }
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn complete(&self, request: &ChatRequest) -> Result<String, ModelBackendError> {
        (**self).complete(request)
    }
}

/// HTTP model client (LM Studio, Ollama, OpenAI-compatible servers)
pub struct HttpModelClient {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpModelClient {
    /// Create a client for `base_url`.
    ///
    /// `timeout` of `None` disables the request timeout entirely, so a call
    /// lasts as long as the backend takes to answer.
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ModelBackendError> {
        // Normalize URL - ensure no trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ModelBackendError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl ModelClient for HttpModelClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ModelBackendError> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self.client.post(self.completions_url()).json(&body).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelBackendError::Server {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let text = response.text()?;
        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ModelBackendError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelBackendError::InvalidResponse("response has no choices".to_string()))?;

        log::debug!("Model response: {}", content);
        Ok(content)
    }
}
