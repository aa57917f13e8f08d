//! The neutral extraction prompt.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ModelInput, PromptBuilder, PromptOverhead, Result, Tokenizer, WhitespaceTokenizer};
use crate::error::PromptError;
use crate::models::schema::KeySchema;

/// A worked example prepended to every model input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shot {
    /// Document text.
    pub input: String,
    /// What the model should answer after the prompt.
    pub target_model_output: String,
}

impl Shot {
    /// Load shots from a JSON array file.
    pub fn load_all(path: &Path) -> Result<Vec<Shot>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PromptError::Shots(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| PromptError::Shots(format!("{}: {}", path.display(), e)))
    }
}

/// Document first, then a plain instruction listing the keys, ending with
/// the first key's label so the model continues with its value.
pub struct NeutralPrompt {
    prompt_text: String,
    shots_text: String,
    tokenizer: Box<dyn Tokenizer>,
}

impl NeutralPrompt {
    /// Create a prompt for `schema`, with `stop_key` listed after the real keys.
    pub fn new(schema: &KeySchema, stop_key: &str) -> Self {
        let quoted: Vec<String> = schema
            .fields()
            .iter()
            .map(|field| field.prompt_key.as_str())
            .chain(std::iter::once(stop_key))
            .map(|key| format!("\"{}\"", key))
            .collect();

        let prompt_text = format!(
            "\n\nExtract {} from the document above. If you can't find a key-value pair in the document set the \
             value to \"null\".\n\nKey: Value\n{}:",
            quoted.join(", "),
            schema.first_prompt_key()
        );

        Self {
            prompt_text,
            shots_text: String::new(),
            tokenizer: Box::new(WhitespaceTokenizer),
        }
    }

    /// Prefix every input with worked examples.
    pub fn with_shots(mut self, shots: &[Shot]) -> Self {
        self.shots_text = shots
            .iter()
            .map(|shot| format!("{}{}{}\n\n", shot.input, self.prompt_text, shot.target_model_output))
            .collect();
        debug!("Prompt carries {} shot(s)", shots.len());
        self
    }

    /// Count tokens with `tokenizer` instead of by whitespace.
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// The instruction appended after the document.
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }
}

impl PromptBuilder for NeutralPrompt {
    fn build(&self, document: &str) -> Result<ModelInput> {
        let text = format!("{}{}{}", self.shots_text, document, self.prompt_text);
        let token_count = self.tokenizer.count(&text)?;
        Ok(ModelInput { text, token_count })
    }

    fn overhead(&self) -> Result<PromptOverhead> {
        Ok(PromptOverhead {
            prompt_tokens: self.tokenizer.count(&self.prompt_text)?,
            shot_tokens: self.tokenizer.count(&self.shots_text)?,
        })
    }

    fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> KeySchema {
        KeySchema::from_pairs("test", &["Charity Name", "Annual Income"], &["charity_name", "income"]).unwrap()
    }

    #[test]
    fn test_prompt_text() {
        let prompt = NeutralPrompt::new(&schema(), "<|stop key|>");
        assert_eq!(
            prompt.prompt_text(),
            "\n\nExtract \"Charity Name\", \"Annual Income\", \"<|stop key|>\" from the document above. If you \
             can't find a key-value pair in the document set the value to \"null\".\n\nKey: Value\nCharity Name:"
        );
    }

    #[test]
    fn test_build_without_shots() {
        let prompt = NeutralPrompt::new(&schema(), "<|stop key|>");
        let input = prompt.build("Havens Christian Hospice").unwrap();

        assert!(input.text.starts_with("Havens Christian Hospice\n\nExtract"));
        assert!(input.text.ends_with("Charity Name:"));
        assert_eq!(input.token_count, WhitespaceTokenizer.count(&input.text).unwrap());
        assert_eq!(prompt.overhead().unwrap().shot_tokens, 0);
    }

    #[test]
    fn test_build_with_shots() {
        let shots = vec![Shot {
            input: "Example doc".to_string(),
            target_model_output: " Example Trust\nAnnual Income: 10".to_string(),
        }];
        let prompt = NeutralPrompt::new(&schema(), "<|stop key|>").with_shots(&shots);
        let input = prompt.build("Real doc").unwrap();

        let expected_shots = format!("Example doc{} Example Trust\nAnnual Income: 10\n\n", prompt.prompt_text());
        assert_eq!(input.text, format!("{}Real doc{}", expected_shots, prompt.prompt_text()));
        assert_eq!(
            prompt.overhead().unwrap().shot_tokens,
            WhitespaceTokenizer.count(&expected_shots).unwrap()
        );
    }

    #[test]
    fn test_load_shots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots.json");
        std::fs::write(&path, r#"[{"input":"doc","target_model_output":" Acme"}]"#).unwrap();

        let shots = Shot::load_all(&path).unwrap();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].target_model_output, " Acme");

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Shot::load_all(&path), Err(PromptError::Shots(_))));
    }
}
