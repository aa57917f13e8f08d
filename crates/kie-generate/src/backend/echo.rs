//! Backend that returns its input unchanged.

use tracing::trace;

use crate::{Generator, Result};

/// Generator that echoes the model input back.
///
/// Handy for dry runs: the pipeline, prompt and parser can be exercised
/// end to end without calling out to a model.
#[derive(Debug, Clone)]
pub struct EchoGenerator {
    max_input_tokens: usize,
}

impl EchoGenerator {
    /// Create an echo generator with an unlimited input budget.
    pub fn new() -> Self {
        Self {
            max_input_tokens: usize::MAX,
        }
    }

    /// Limit the input budget, to exercise chunked inputs.
    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }
}

impl Default for EchoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for EchoGenerator {
    fn generate(&self, input: &str) -> Result<String> {
        trace!("Echoing {} bytes of model input", input.len());
        Ok(input.to_string())
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_returns_input() {
        let generator = EchoGenerator::new();
        assert_eq!(generator.generate("Charity Name:").unwrap(), "Charity Name:");
        assert_eq!(generator.max_input_tokens(), usize::MAX);
    }

    #[test]
    fn test_echo_budget() {
        let generator = EchoGenerator::new().with_max_input_tokens(64);
        assert_eq!(generator.max_input_tokens(), 64);
        assert!(generator.stop_sequence().is_none());
    }
}
