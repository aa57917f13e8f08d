//! Model-free extraction.
//!
//! A [`HeuristicExtractor`] reads the document directly and answers in the
//! same "Key: Value" text a generator would produce, so its output goes
//! through the regular parsers.

mod fuzzy;

pub use fuzzy::FuzzyBaseline;

use crate::models::schema::KeySchema;

/// Extracts key/value text from a document without a model.
pub trait HeuristicExtractor: Send + Sync {
    /// Raw output for `text`: the first key's value without its label, then
    /// one `Key: Value` line per remaining key, `null` where nothing was found.
    fn extract(&self, text: &str, schema: &KeySchema) -> String;

    /// Extractor name for logs.
    fn name(&self) -> &str;
}

/// Render per-key values in the raw output format.
pub(crate) fn render_raw_output(schema: &KeySchema, values: &[Option<String>]) -> String {
    let mut raw = String::new();

    for (index, field) in schema.fields().iter().enumerate() {
        let value = values.get(index).and_then(|v| v.as_deref()).unwrap_or("null");
        if index == 0 {
            raw.push(' ');
        } else {
            raw.push('\n');
            raw.push_str(&field.prompt_key);
            raw.push_str(": ");
        }
        raw.push_str(value);
    }

    raw
}
