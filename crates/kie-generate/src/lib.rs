//! Text-generation abstraction layer for kie.
//!
//! This crate provides a single interface for producing raw model output
//! from a fully rendered model input:
//! - `EchoGenerator` returns its input unchanged (useful as a dry run)
//! - `FnGenerator` wraps any closure, so callers can inject their own backend
//! - `CompletionGenerator` calls an OpenAI-compatible `/completions` endpoint
//!   (behind the `http` feature)

mod backend;
mod config;
mod error;

pub use backend::{EchoGenerator, FnGenerator, Generator};
pub use config::CompletionConfig;
pub use error::GenerateError;

#[cfg(feature = "http")]
pub use backend::completion::CompletionGenerator;

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
