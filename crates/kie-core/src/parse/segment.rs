//! Key/value segmentation of raw model output.

use std::cmp::Reverse;

use regex::{Regex, RegexBuilder};
use tracing::{trace, warn};

use super::normalize::{clean_scalar, is_null_marker};
use crate::models::output::ParsedRecord;
use crate::models::schema::KeySchema;

/// Where a key's label was found in the prefixed text.
#[derive(Debug, Clone, Copy)]
struct LabelSpan {
    key_index: usize,
    start: usize,
    end: usize,
}

/// Recovers `prompt key -> value` from loosely formatted text.
///
/// The model is prompted with the first key's label already written, so its
/// output starts mid-value; the label is restored before scanning. Each label
/// (`key:`, matched literally and case-insensitively) is located once, at its
/// first occurrence not already taken by a longer label. A value runs from the
/// end of its label to the next located label in text order, so keys the model
/// skipped or reordered do not leak into their neighbours.
#[derive(Debug, Clone)]
pub struct KeyedTextParser {
    keys: Vec<String>,
    labels: Vec<Option<Regex>>,
    claim_order: Vec<usize>,
}

impl KeyedTextParser {
    /// Create a parser for an ordered prompt-key list.
    pub fn new<S: AsRef<str>>(prompt_keys: &[S]) -> Self {
        let keys: Vec<String> = prompt_keys.iter().map(|k| k.as_ref().to_string()).collect();

        let labels = keys
            .iter()
            .map(|key| {
                RegexBuilder::new(&format!("{}:", regex::escape(key)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| warn!("Key {:?} cannot be searched for: {}", key, e))
                    .ok()
            })
            .collect();

        let mut claim_order: Vec<usize> = (0..keys.len()).collect();
        claim_order.sort_by_key(|&i| Reverse(keys[i].len()));

        Self {
            keys,
            labels,
            claim_order,
        }
    }

    /// Create a parser for a schema's prompt keys.
    pub fn from_schema(schema: &KeySchema) -> Self {
        Self::new(&schema.prompt_keys())
    }

    /// Prompt keys in scan order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Segment raw model output into cleaned values.
    ///
    /// Keys whose label never occurs, or whose value is a null marker, are
    /// absent from the result.
    pub fn segment(&self, raw_output: &str) -> ParsedRecord {
        let mut record = ParsedRecord::new();
        if self.keys.is_empty() || raw_output.is_empty() {
            return record;
        }

        let text = format!("{}:{}", self.keys[0], raw_output);
        let spans = self.locate_labels(&text);

        for (position, span) in spans.iter().enumerate() {
            let value_end = spans.get(position + 1).map_or(text.len(), |next| next.start);
            let value = clean_scalar(&text[span.end..value_end]);
            let key = &self.keys[span.key_index];

            if is_null_marker(&value) {
                trace!("Key {:?} has no value", key);
                continue;
            }

            record.insert(key.clone(), value);
        }

        record
    }

    fn locate_labels(&self, text: &str) -> Vec<LabelSpan> {
        let mut spans: Vec<LabelSpan> = Vec::with_capacity(self.keys.len());

        for &key_index in &self.claim_order {
            let Some(pattern) = &self.labels[key_index] else {
                continue;
            };

            let free = pattern
                .find_iter(text)
                .find(|m| !spans.iter().any(|s| m.start() < s.end && s.start < m.end()));

            match free {
                Some(m) => spans.push(LabelSpan {
                    key_index,
                    start: m.start(),
                    end: m.end(),
                }),
                None => trace!("Label for key {:?} not found", self.keys[key_index]),
            }
        }

        spans.sort_by_key(|span| span.start);
        spans
    }
}

/// Segment `raw_output` against `prompt_keys` in one call.
pub fn segment<S: AsRef<str>>(raw_output: &str, prompt_keys: &[S]) -> ParsedRecord {
    KeyedTextParser::new(prompt_keys).segment(raw_output)
}
