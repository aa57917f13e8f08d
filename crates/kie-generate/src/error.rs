//! Error types for the generation layer.

use thiserror::Error;

/// Errors that can occur while producing a raw model output.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The backend is missing required configuration.
    #[error("backend misconfigured: {0}")]
    Config(String),

    /// The API key environment variable is not set.
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The backend returned no completion choices.
    #[error("backend returned no completions")]
    EmptyCompletion,

    /// The input is longer than the backend accepts.
    #[error("input has {tokens} tokens, backend accepts at most {max}")]
    InputTooLong { tokens: usize, max: usize },
}

impl GenerateError {
    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerateError::Request(_) => true,
            GenerateError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
