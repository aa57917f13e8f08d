//! Canonical-key presentation of parsed records.

use tracing::debug;

use super::normalize::{clean_scalar, is_null_marker, normalize_date, normalize_money};
use crate::models::output::ParsedRecord;
use crate::models::schema::{FieldKind, KeySchema};

/// Refine a cleaned value according to its field kind.
///
/// Returns `None` when the value is a null marker or does not normalize, which
/// callers treat as a missing key.
pub fn refine(value: &str, kind: FieldKind) -> Option<String> {
    let value = clean_scalar(value);
    if is_null_marker(&value) {
        return None;
    }

    match kind {
        FieldKind::Text => Some(value),
        FieldKind::Date => normalize_date(&value),
        FieldKind::Money => normalize_money(&value),
    }
}

/// Replace whitespace and `:` so a value survives as one `key=value` token.
pub fn escape_token_value(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_whitespace() || c == ':' { '_' } else { c })
        .collect()
}

/// Rekey a prompt-key record by canonical keys, refining each value.
///
/// Pairs come back in schema order; keys that are absent or fail refinement
/// are left out.
pub fn canonical_pairs(record: &ParsedRecord, schema: &KeySchema) -> Vec<(String, String)> {
    schema
        .fields()
        .iter()
        .filter_map(|field| {
            let value = record.get(&field.prompt_key)?;
            match refine(value, field.kind()) {
                Some(refined) => Some((field.canonical_key.clone(), refined)),
                None => {
                    debug!("Dropping {:?}: {:?} did not normalize", field.canonical_key, value);
                    None
                }
            }
        })
        .collect()
}

/// Like [`canonical_pairs`], collected into a record.
pub fn canonical_record(record: &ParsedRecord, schema: &KeySchema) -> ParsedRecord {
    canonical_pairs(record, schema).into_iter().collect()
}

/// Flatten a record to `canonical_key=value` tokens joined by single spaces.
pub fn to_line(record: &ParsedRecord, schema: &KeySchema) -> String {
    canonical_pairs(record, schema)
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, escape_token_value(&value)))
        .collect::<Vec<_>>()
        .join(" ")
}
