//! Fitting long documents into a generator's input budget.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ModelInput, PromptBuilder, Result};
use crate::error::PromptError;

/// What to do with a document whose model input is over budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Overlapping windows, one model input each.
    #[default]
    Split,
    /// Keep the start and the end of the document, drop the middle.
    TruncateMiddle,
}

impl std::str::FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "split" => Ok(ChunkStrategy::Split),
            "truncate_middle" => Ok(ChunkStrategy::TruncateMiddle),
            other => Err(format!("unknown chunk strategy: {}", other)),
        }
    }
}

/// Turns a document into one or more model inputs that fit a token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    strategy: ChunkStrategy,
    overlap_tokens: usize,
    safety_margin_tokens: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Split,
            overlap_tokens: 20,
            safety_margin_tokens: 5,
        }
    }
}

impl Chunker {
    pub fn new(strategy: ChunkStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Tokens shared by consecutive windows.
    pub fn with_overlap(mut self, overlap_tokens: usize) -> Self {
        self.overlap_tokens = overlap_tokens;
        self
    }

    /// Tokens kept free below the budget.
    pub fn with_safety_margin(mut self, safety_margin_tokens: usize) -> Self {
        self.safety_margin_tokens = safety_margin_tokens;
        self
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    /// Build the model inputs for `document`.
    ///
    /// A document that fits yields exactly one input. Otherwise the document
    /// (never the prompt or shots) is windowed by tokens.
    pub fn model_inputs(
        &self,
        document: &str,
        prompt: &dyn PromptBuilder,
        max_input_tokens: usize,
    ) -> Result<Vec<ModelInput>> {
        let full = prompt.build(document)?;
        if full.token_count <= max_input_tokens {
            return Ok(vec![full]);
        }

        info!(
            "Document is too long for the model: {} tokens, limit {}",
            full.token_count, max_input_tokens
        );

        let overhead = prompt.overhead()?;
        if overhead.shot_tokens * 2 > max_input_tokens {
            return Err(PromptError::ShotsTooLong {
                shot_tokens: overhead.shot_tokens,
                max_input_tokens,
            });
        }

        let window = max_input_tokens
            .checked_sub(overhead.prompt_tokens + overhead.shot_tokens + self.safety_margin_tokens)
            .filter(|&window| window > 0)
            .ok_or(PromptError::BudgetTooSmall { max_input_tokens })?;

        let spans = prompt.tokenizer().token_spans(document)?;
        if spans.len() <= window {
            return Ok(vec![full]);
        }

        match self.strategy {
            ChunkStrategy::Split => {
                let step = window.saturating_sub(self.overlap_tokens).max(1);
                let mut inputs = Vec::new();
                let mut start = 0;

                while start < spans.len() {
                    let end = (start + window).min(spans.len());
                    let text = &document[spans[start].start..spans[end - 1].end];
                    if !text.trim().is_empty() {
                        inputs.push(prompt.build(text)?);
                    }
                    if end == spans.len() {
                        break;
                    }
                    start += step;
                }

                info!("Split document into {} chunks of up to {} tokens", inputs.len(), window);
                Ok(inputs)
            }
            ChunkStrategy::TruncateMiddle => {
                let head = window / 2;
                let tail = window - head;
                let head_end = if head == 0 { 0 } else { spans[head - 1].end };
                let tail_start = spans[spans.len() - tail].start;

                debug!("Keeping {} head and {} tail tokens", head, tail);
                let truncated = format!("{}{}", &document[..head_end], &document[tail_start..]);
                Ok(vec![prompt.build(&truncated)?])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::KeySchema;
    use crate::prompt::{NeutralPrompt, Shot};
    use pretty_assertions::assert_eq;

    fn prompt() -> NeutralPrompt {
        let schema = KeySchema::from_pairs("test", &["A", "B"], &["a", "b"]).unwrap();
        NeutralPrompt::new(&schema, "<|stop key|>")
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    fn document_part(input: &ModelInput, prompt: &NeutralPrompt) -> String {
        input.text.trim_end_matches(prompt.prompt_text()).to_string()
    }

    #[test]
    fn test_short_document_is_one_input() {
        let prompt = prompt();
        let inputs = Chunker::default().model_inputs("w0 w1", &prompt, 1000).unwrap();
        assert_eq!(inputs, vec![prompt.build("w0 w1").unwrap()]);
    }

    #[test]
    fn test_split_windows_overlap() {
        let prompt = prompt();
        let overhead = prompt.overhead().unwrap();
        let max_input = overhead.prompt_tokens + 5 + 30;

        let chunker = Chunker::new(ChunkStrategy::Split).with_overlap(10);
        let inputs = chunker.model_inputs(&words(100), &prompt, max_input).unwrap();

        assert_eq!(inputs.len(), 5);
        for input in &inputs {
            assert!(input.token_count <= max_input);
        }

        let first = document_part(&inputs[0], &prompt);
        let second = document_part(&inputs[1], &prompt);
        let last = document_part(&inputs[4], &prompt);
        assert!(first.starts_with("w0 ") && first.trim_end().ends_with("w29"));
        assert!(second.starts_with("w20 ") && second.trim_end().ends_with("w49"));
        assert!(last.starts_with("w80 ") && last.ends_with("w99"));
    }

    #[test]
    fn test_truncate_middle() {
        let prompt = prompt();
        let overhead = prompt.overhead().unwrap();
        let max_input = overhead.prompt_tokens + 5 + 30;

        let chunker = Chunker::new(ChunkStrategy::TruncateMiddle);
        let inputs = chunker.model_inputs(&words(100), &prompt, max_input).unwrap();

        assert_eq!(inputs.len(), 1);
        let kept = document_part(&inputs[0], &prompt);
        assert!(kept.starts_with("w0 w1 "));
        assert!(kept.contains("w14 w85"));
        assert!(kept.ends_with("w99"));
        assert!(!kept.contains("w50"));
        assert!(inputs[0].token_count <= max_input);
    }

    #[test]
    fn test_shots_over_half_the_budget() {
        let shots = vec![Shot {
            input: words(60),
            target_model_output: " x".to_string(),
        }];
        let prompt = prompt().with_shots(&shots);

        let result = Chunker::default().model_inputs(&words(500), &prompt, 100);
        assert!(matches!(result, Err(PromptError::ShotsTooLong { max_input_tokens: 100, .. })));
    }

    #[test]
    fn test_budget_too_small() {
        let prompt = prompt();
        let result = Chunker::default().model_inputs(&words(500), &prompt, 10);
        assert!(matches!(result, Err(PromptError::BudgetTooSmall { max_input_tokens: 10 })));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("truncate-middle".parse::<ChunkStrategy>(), Ok(ChunkStrategy::TruncateMiddle));
        assert_eq!("SPLIT".parse::<ChunkStrategy>(), Ok(ChunkStrategy::Split));
        assert!("summarize".parse::<ChunkStrategy>().is_err());
    }
}
