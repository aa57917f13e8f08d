//! Core library for key information extraction from documents.
//!
//! This crate provides:
//! - Parsing of loosely formatted model output into key/value records,
//!   including reconciliation of chunked documents
//! - Value normalization (dates, money, null markers)
//! - Document text sources (plain text, PDF, Kleister `in.tsv` datasets)
//! - Prompt construction with token budgets and long-document chunking
//! - A fuzzy-matching heuristic baseline
//! - An extraction pipeline tying the stages together

pub mod baseline;
pub mod error;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod source;

pub use baseline::{FuzzyBaseline, HeuristicExtractor};
pub use error::{KieError, PromptError, Result, SchemaError, SourceError};
pub use models::config::KieConfig;
pub use models::output::{ParsedOutput, ParsedRecord};
pub use models::schema::{FieldKind, KeyField, KeySchema};
pub use parse::{KeyedTextParser, KleisterLineParser, MappingParser, OutputMode, OutputParser};
pub use pipeline::{ChunkSet, ExtractionPipeline, ExtractionPipelineBuilder, Strategy};
pub use prompt::{ChunkStrategy, Chunker, NeutralPrompt, PromptBuilder, Tokenizer, WhitespaceTokenizer};
pub use source::{DatasetTextSource, FileTextSource, TextColumn, TextSource};

/// Re-export generation types.
pub use kie_generate::{CompletionConfig, EchoGenerator, FnGenerator, GenerateError, Generator};

#[cfg(feature = "http")]
pub use kie_generate::CompletionGenerator;
