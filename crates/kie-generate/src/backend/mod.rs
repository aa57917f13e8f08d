//! Generation backend implementations.

#[cfg(feature = "http")]
pub mod completion;
mod echo;
mod func;

pub use echo::EchoGenerator;
pub use func::FnGenerator;

use crate::Result;

/// Trait for text-generation backends.
///
/// A backend receives a fully rendered model input (document, prompt and
/// shots) and returns the raw continuation. Backends are opaque beyond the
/// input budget they accept and the stop sequence they honour; callers are
/// expected to split inputs that exceed `max_input_tokens`.
pub trait Generator: Send + Sync {
    /// Produce the raw continuation for `input`.
    fn generate(&self, input: &str) -> Result<String>;

    /// Maximum number of input tokens the backend accepts.
    fn max_input_tokens(&self) -> usize;

    /// Sequence at which the backend stops generating, if any.
    fn stop_sequence(&self) -> Option<&str> {
        None
    }

    /// Short human-readable backend name for logs.
    fn name(&self) -> &str;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self, input: &str) -> Result<String> {
        (**self).generate(input)
    }

    fn max_input_tokens(&self) -> usize {
        (**self).max_input_tokens()
    }

    fn stop_sequence(&self) -> Option<&str> {
        (**self).stop_sequence()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
