//! Settings for remote completion backends.

use serde::{Deserialize, Serialize};

/// Connection and sampling settings for an OpenAI-compatible completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the API, without the `/completions` suffix.
    pub api_base: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Environment variable holding the bearer token.
    pub api_key_env: String,

    /// Maximum number of input tokens the model accepts.
    pub max_input_tokens: usize,

    /// Maximum number of tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling value.
    pub top_p: f32,

    /// Sequence at which generation stops.
    pub stop: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for transient failures (transport errors, 429, 5xx).
    pub max_retries: u32,

    /// Delay before the first retry, grown linearly per attempt.
    pub retry_backoff_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "text-davinci-003".to_string(),
            api_key_env: "OPENAI_TOKEN".to_string(),
            max_input_tokens: 4097 - 256,
            max_tokens: 256,
            temperature: 0.0,
            top_p: 1.0,
            stop: Some("\n<|stop key|>".to_string()),
            timeout_secs: 60,
            max_retries: 3,
            retry_backoff_ms: 1000,
        }
    }
}
