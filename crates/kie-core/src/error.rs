//! Error types for the kie-core library.
//!
//! Malformed model output is not an error: parsing recovers locally and
//! reports missing values by omission. These types cover the collaborators
//! around the parser (documents, prompts, backends, configuration).

use thiserror::Error;

/// Main error type for the kie library.
#[derive(Error, Debug)]
pub enum KieError {
    /// Document text could not be obtained.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Model input could not be built.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Generation backend error.
    #[error("generation error: {0}")]
    Generate(#[from] kie_generate::GenerateError),

    /// Key vocabulary error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to obtaining document text.
#[derive(Error, Debug)]
pub enum SourceError {
    /// No document with this identifier.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Failed to read the document.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    PdfParse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A dataset file is malformed.
    #[error("malformed dataset at line {line}: {reason}")]
    Dataset { line: u64, reason: String },
}

/// Errors related to building model inputs.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Shots take more than half of the backend's input budget.
    #[error("shots use {shot_tokens} tokens, at most half of {max_input_tokens} allowed")]
    ShotsTooLong {
        shot_tokens: usize,
        max_input_tokens: usize,
    },

    /// Fixed prompt overhead leaves no room for document text.
    #[error("input budget of {max_input_tokens} tokens leaves no room for document text")]
    BudgetTooSmall { max_input_tokens: usize },

    /// Tokenizer failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Shots file could not be loaded.
    #[error("invalid shots: {0}")]
    Shots(String),
}

/// Errors related to key vocabularies.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema needs at least one key.
    #[error("schema has no keys")]
    Empty,

    /// A key is blank.
    #[error("schema contains a blank key")]
    BlankKey,

    /// Prompt keys must be unique (case-insensitively).
    #[error("duplicate prompt key: {0}")]
    DuplicatePromptKey(String),

    /// Canonical keys must be unique.
    #[error("duplicate canonical key: {0}")]
    DuplicateCanonicalKey(String),

    /// Prompt and canonical key lists differ in length.
    #[error("{prompt} prompt keys but {canonical} canonical keys")]
    LengthMismatch { prompt: usize, canonical: usize },
}

/// Result type for the kie library.
pub type Result<T> = std::result::Result<T, KieError>;
