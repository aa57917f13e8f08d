//! Model input construction: prompts, token budgets and long-document chunking.

mod chunk;
mod neutral;
mod tokenize;

pub use chunk::{ChunkStrategy, Chunker};
pub use neutral::{NeutralPrompt, Shot};
#[cfg(feature = "hf-tokenizer")]
pub use tokenize::HfTokenizer;
pub use tokenize::{Tokenizer, WhitespaceTokenizer};

use crate::error::PromptError;

/// Result type for prompt construction.
pub type Result<T> = std::result::Result<T, PromptError>;

/// Text handed to a generator, with its token length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInput {
    pub text: String,
    pub token_count: usize,
}

/// Fixed token cost of a prompt, paid by every model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromptOverhead {
    /// Tokens of the instruction appended after the document.
    pub prompt_tokens: usize,
    /// Tokens of the worked examples placed before the document.
    pub shot_tokens: usize,
}

/// Wraps document text into a model input.
pub trait PromptBuilder: Send + Sync {
    /// Build the model input for a document (or a window of one).
    fn build(&self, document: &str) -> Result<ModelInput>;

    /// Token cost of everything except the document.
    fn overhead(&self) -> Result<PromptOverhead>;

    /// Tokenizer used for counting.
    fn tokenizer(&self) -> &dyn Tokenizer;
}
