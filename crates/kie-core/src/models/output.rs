//! Parsed extraction results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key to cleaned value. Never holds null markers or empty values: a missing
/// key means "not found".
pub type ParsedRecord = BTreeMap<String, String>;

/// A published extraction, shaped by the parser's presentation mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedOutput {
    /// Mapping mode: prompt key to value.
    Record(ParsedRecord),
    /// Flattened line mode: `canonical_key=value` tokens.
    Line(String),
}

impl ParsedOutput {
    pub fn as_record(&self) -> Option<&ParsedRecord> {
        match self {
            ParsedOutput::Record(record) => Some(record),
            ParsedOutput::Line(_) => None,
        }
    }

    pub fn as_line(&self) -> Option<&str> {
        match self {
            ParsedOutput::Line(line) => Some(line),
            ParsedOutput::Record(_) => None,
        }
    }

    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        match self {
            ParsedOutput::Record(record) => record.is_empty(),
            ParsedOutput::Line(line) => line.is_empty(),
        }
    }
}

impl fmt::Display for ParsedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedOutput::Line(line) => f.write_str(line),
            ParsedOutput::Record(record) => {
                let json = serde_json::to_string(record).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}
