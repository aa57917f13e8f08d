//! OpenAI-compatible completion backend over blocking HTTP.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CompletionConfig;
use crate::error::GenerateError;
use crate::{Generator, Result};

/// Backend calling a remote `/completions` endpoint.
pub struct CompletionGenerator {
    client: Client,
    api_key: String,
    config: CompletionConfig,
}

/// Request body for the completion endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CompletionGenerator {
    /// Create a backend, reading the API key from `config.api_key_env`.
    pub fn from_config(config: CompletionConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| GenerateError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    /// Create a backend with an explicit API key.
    pub fn with_api_key(config: CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        if config.model.is_empty() {
            return Err(GenerateError::Config("model must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerateError::Config(e.to_string()))?;

        debug!("Completion backend for model {} at {}", config.model, config.api_base);

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, input: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.config.model,
            prompt: input,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_tokens: self.config.max_tokens,
            stop: self.config.stop.as_deref(),
        }
    }

    fn send_once(&self, input: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(input))
            .send()
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

/// Extract the first completion text from a response body.
fn parse_response(body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or(GenerateError::EmptyCompletion)
}

impl Generator for CompletionGenerator {
    fn generate(&self, input: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.send_once(input) {
                Ok(text) => {
                    debug!("Completion returned {} bytes", text.len());
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff_ms * u64::from(attempt);
                    warn!("Completion attempt {} failed ({}), retrying in {}ms", attempt, e, delay);
                    thread::sleep(Duration::from_millis(delay));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn max_input_tokens(&self) -> usize {
        self.config.max_input_tokens
    }

    fn stop_sequence(&self) -> Option<&str> {
        self.config.stop.as_deref()
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
