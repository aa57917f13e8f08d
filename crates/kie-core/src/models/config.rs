//! Configuration structures for the extraction pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kie_generate::CompletionConfig;

use crate::error::{KieError, Result};
use crate::models::schema::KeySchema;
use crate::parse::OutputMode;
use crate::prompt::ChunkStrategy;

/// Main configuration for the kie pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KieConfig {
    /// Key vocabulary.
    pub schema: SchemaConfig,

    /// Prompt construction.
    pub prompt: PromptConfig,

    /// Generation backend.
    pub generation: GenerationConfig,

    /// Long document handling.
    pub chunking: ChunkingConfig,

    /// Result presentation.
    pub output: OutputConfig,

    /// Heuristic baseline settings.
    pub baseline: BaselineConfig,
}

/// Built-in key vocabularies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPreset {
    /// Kleister Charity filings.
    #[default]
    KleisterCharity,
    /// SROIE receipts.
    Sroie,
    /// The schema given in `schema.custom`.
    Custom,
}

/// Key vocabulary configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Which vocabulary to use.
    pub preset: SchemaPreset,

    /// Explicit vocabulary, required when `preset` is `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<KeySchema>,
}

impl SchemaConfig {
    /// Resolve the configured key schema.
    pub fn resolve(&self) -> Result<KeySchema> {
        match self.preset {
            SchemaPreset::KleisterCharity => Ok(KeySchema::kleister_charity()),
            SchemaPreset::Sroie => Ok(KeySchema::sroie()),
            SchemaPreset::Custom => self
                .custom
                .clone()
                .ok_or_else(|| KieError::Config("schema.preset is custom but schema.custom is missing".to_string())),
        }
    }
}

/// Prompt configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// JSON file of few-shot examples (`[{input, target_model_output}]`).
    pub shots_file: Option<PathBuf>,

    /// Pseudo-key listed last so the model emits it when done.
    pub stop_key: String,

    /// `tokenizer.json` used for token budgets (needs the `hf-tokenizer`
    /// feature). Words are counted when unset.
    pub tokenizer_file: Option<PathBuf>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            shots_file: None,
            stop_key: "<|stop key|>".to_string(),
            tokenizer_file: None,
        }
    }
}

/// Available generation backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Returns the model input unchanged.
    #[default]
    Echo,
    /// Remote OpenAI-compatible completion API.
    Completion,
    /// Fuzzy-matching heuristic extractor, no model involved.
    Baseline,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "echo" => Ok(BackendKind::Echo),
            "completion" | "openai" | "gpt" => Ok(BackendKind::Completion),
            "baseline" | "heuristic" => Ok(BackendKind::Baseline),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Backend to use.
    pub backend: BackendKind,

    /// Settings for the `completion` backend.
    pub completion: CompletionConfig,
}

/// Long document handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// What to do when a document does not fit the input budget.
    pub strategy: ChunkStrategy,

    /// Tokens shared by consecutive windows.
    pub overlap_tokens: usize,

    /// Tokens kept free below the backend limit.
    pub safety_margin_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Split,
            overlap_tokens: 20,
            safety_margin_tokens: 5,
        }
    }
}

/// Result presentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub mode: OutputMode,
}

/// Heuristic baseline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Minimum Jaro-Winkler similarity for a line to count as a key label (0.0 - 1.0).
    pub min_similarity: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { min_similarity: 0.85 }
    }
}

impl KieConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = KieConfig::default();
        assert_eq!(config.chunking.overlap_tokens, 20);
        assert_eq!(config.chunking.safety_margin_tokens, 5);
        assert_eq!(config.output.mode, OutputMode::Line);
        assert_eq!(config.generation.completion.api_key_env, "OPENAI_TOKEN");
        assert_eq!(config.schema.resolve().unwrap(), KeySchema::kleister_charity());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: KieConfig =
            serde_json::from_str(r#"{"schema":{"preset":"sroie"},"output":{"mode":"mapping"}}"#).unwrap();

        assert_eq!(config.schema.resolve().unwrap(), KeySchema::sroie());
        assert_eq!(config.output.mode, OutputMode::Mapping);
        assert_eq!(config.baseline.min_similarity, 0.85);
        assert_eq!(config.prompt.stop_key, "<|stop key|>");
    }

    #[test]
    fn test_custom_schema_required() {
        let config: KieConfig = serde_json::from_str(r#"{"schema":{"preset":"custom"}}"#).unwrap();
        assert!(matches!(config.schema.resolve(), Err(KieError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = KieConfig::default();
        config.generation.backend = BackendKind::Baseline;
        config.chunking.strategy = ChunkStrategy::TruncateMiddle;
        config.save(&path).unwrap();

        assert_eq!(KieConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("openai".parse::<BackendKind>(), Ok(BackendKind::Completion));
        assert_eq!("Baseline".parse::<BackendKind>(), Ok(BackendKind::Baseline));
        assert!("llama".parse::<BackendKind>().is_err());
    }
}
