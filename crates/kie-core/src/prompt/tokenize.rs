//! Token counting and token-aligned text spans.

use std::ops::Range;

use super::Result;

/// Splits text into tokens, reported as byte spans.
///
/// Spans are contiguous and cover the whole text, so any run of consecutive
/// spans can be sliced back out of the original string.
pub trait Tokenizer: Send + Sync {
    /// Byte spans of the tokens of `text`.
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>>;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.token_spans(text)?.len())
    }
}

/// One token per whitespace-delimited word, trailing whitespace attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let mut starts = Vec::new();
        let mut previous_whitespace = true;

        for (index, c) in text.char_indices() {
            let whitespace = c.is_whitespace();
            if previous_whitespace && !whitespace {
                starts.push(index);
            }
            previous_whitespace = whitespace;
        }

        Ok(spans_from_starts(starts, text.len()))
    }
}

/// Turn token start offsets into contiguous spans covering `0..len`.
fn spans_from_starts<I>(starts: I, len: usize) -> Vec<Range<usize>>
where
    I: IntoIterator<Item = usize>,
{
    let mut bounds: Vec<usize> = Vec::new();
    for start in starts {
        if start < len && bounds.last().is_none_or(|&last| start > last) {
            bounds.push(start);
        }
    }
    if let Some(first) = bounds.first_mut() {
        *first = 0;
    }

    bounds
        .iter()
        .enumerate()
        .map(|(n, &start)| start..bounds.get(n + 1).copied().unwrap_or(len))
        .collect()
}

/// A Hugging Face `tokenizer.json` tokenizer (e.g. GPT-2).
#[cfg(feature = "hf-tokenizer")]
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
}

#[cfg(feature = "hf-tokenizer")]
impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| crate::error::PromptError::Tokenizer(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "hf-tokenizer")]
impl Tokenizer for HfTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| crate::error::PromptError::Tokenizer(e.to_string()))?;

        // Byte-level tokens may start inside a multi-byte character
        let starts = encoding
            .get_offsets()
            .iter()
            .map(|&(start, _)| start)
            .filter(|&start| text.is_char_boundary(start));

        Ok(spans_from_starts(starts, text.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_whitespace_spans() {
        let tokenizer = WhitespaceTokenizer;
        assert_eq!(tokenizer.token_spans("a  b\nc").unwrap(), vec![0..3, 3..5, 5..6]);
        assert_eq!(tokenizer.token_spans("  a b").unwrap(), vec![0..4, 4..5]);
        assert_eq!(tokenizer.count("Charity Name: Havens\n").unwrap(), 3);
    }

    #[test]
    fn test_spans_cover_text() {
        let text = "  Période  clôturée\n31 décembre 2015  ";
        let spans = WhitespaceTokenizer.token_spans(text).unwrap();
        let rebuilt: String = spans.iter().map(|span| &text[span.clone()]).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_blank_text_has_no_tokens() {
        assert_eq!(WhitespaceTokenizer.count("").unwrap(), 0);
        assert_eq!(WhitespaceTokenizer.count(" \n\t ").unwrap(), 0);
    }

    #[test]
    fn test_spans_from_starts_dedupes() {
        assert_eq!(spans_from_starts([0, 2, 2, 1, 5, 9], 7), vec![0..2, 2..5, 5..7]);
        assert_eq!(spans_from_starts([3], 5), vec![0..5]);
    }
}
