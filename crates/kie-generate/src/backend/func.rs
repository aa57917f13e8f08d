//! Closure-backed generator.

use crate::{Generator, Result};

/// Generator backed by a closure.
///
/// This is the injection point for backends that live outside this crate,
/// and for tests that want deterministic raw outputs.
pub struct FnGenerator<F> {
    name: String,
    max_input_tokens: usize,
    stop_sequence: Option<String>,
    func: F,
}

impl<F> FnGenerator<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    /// Wrap `func` as a generator accepting up to `max_input_tokens` tokens.
    pub fn new(name: impl Into<String>, max_input_tokens: usize, func: F) -> Self {
        Self {
            name: name.into(),
            max_input_tokens,
            stop_sequence: None,
            func,
        }
    }

    /// Set the stop sequence reported to callers.
    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequence = Some(stop.into());
        self
    }
}

impl<F> Generator for FnGenerator<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn generate(&self, input: &str) -> Result<String> {
        (self.func)(input)
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    fn stop_sequence(&self) -> Option<&str> {
        self.stop_sequence.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnGenerator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnGenerator")
            .field("name", &self.name)
            .field("max_input_tokens", &self.max_input_tokens)
            .finish_non_exhaustive()
    }
}
