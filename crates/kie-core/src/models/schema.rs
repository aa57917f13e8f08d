//! Key vocabularies: prompt keys, canonical keys and their field kinds.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// How a field's value is refined before publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text, published as cleaned.
    Text,
    /// Calendar date, normalized to `YYYY-MM-DD`.
    Date,
    /// Monetary amount, normalized to a plain decimal.
    Money,
}

impl FieldKind {
    /// Fragments of a canonical key that mark a monetary field.
    pub const MONEY_FRAGMENTS: &'static [&'static str] = &["income", "spending", "total", "amount"];

    /// Infer the kind from a canonical key name.
    pub fn infer(canonical_key: &str) -> Self {
        let key = canonical_key.to_lowercase();
        if key.contains("date") {
            FieldKind::Date
        } else if Self::MONEY_FRAGMENTS.iter().any(|f| key.contains(f)) {
            FieldKind::Money
        } else {
            FieldKind::Text
        }
    }
}

/// One field of interest: the phrase shown to the model and the stable
/// identifier used in published results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyField {
    /// Label shown to the model and expected back in its output.
    pub prompt_key: String,

    /// Output identifier, independent of prompt wording.
    pub canonical_key: String,

    /// Value refinement applied in line mode. Inferred when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
}

impl KeyField {
    pub fn new(prompt_key: impl Into<String>, canonical_key: impl Into<String>) -> Self {
        Self {
            prompt_key: prompt_key.into(),
            canonical_key: canonical_key.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// The explicit kind, or the one inferred from the canonical key.
    pub fn kind(&self) -> FieldKind {
        self.kind.unwrap_or_else(|| FieldKind::infer(&self.canonical_key))
    }
}

/// An ordered, position-aligned correspondence of prompt keys to canonical
/// keys. Order defines scan order, tie-breaking and serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySchema {
    name: String,
    fields: Vec<KeyField>,
}

impl KeySchema {
    /// Build a schema, rejecting empty or ambiguous vocabularies.
    pub fn new(name: impl Into<String>, fields: Vec<KeyField>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut prompt_keys = HashSet::new();
        let mut canonical_keys = HashSet::new();
        for field in &fields {
            if field.prompt_key.trim().is_empty() || field.canonical_key.trim().is_empty() {
                return Err(SchemaError::BlankKey);
            }
            if !prompt_keys.insert(field.prompt_key.to_lowercase()) {
                return Err(SchemaError::DuplicatePromptKey(field.prompt_key.clone()));
            }
            if !canonical_keys.insert(field.canonical_key.as_str()) {
                return Err(SchemaError::DuplicateCanonicalKey(field.canonical_key.clone()));
            }
        }

        Ok(Self {
            name: name.into(),
            fields,
        })
    }

    /// Build a schema from two parallel key lists.
    pub fn from_pairs<P, C>(name: impl Into<String>, prompt_keys: &[P], canonical_keys: &[C]) -> Result<Self, SchemaError>
    where
        P: AsRef<str>,
        C: AsRef<str>,
    {
        if prompt_keys.len() != canonical_keys.len() {
            return Err(SchemaError::LengthMismatch {
                prompt: prompt_keys.len(),
                canonical: canonical_keys.len(),
            });
        }

        let fields = prompt_keys
            .iter()
            .zip(canonical_keys)
            .map(|(p, c)| KeyField::new(p.as_ref(), c.as_ref()))
            .collect();

        Self::new(name, fields)
    }

    /// Kleister Charity: UK charity annual reports.
    pub fn kleister_charity() -> Self {
        Self {
            name: "kleister_charity".to_string(),
            fields: vec![
                KeyField::new("Address (post town)", "address__post_town"),
                KeyField::new("Address (post code)", "address__postcode"),
                KeyField::new("Address (street)", "address__street_line"),
                KeyField::new("Charity Name", "charity_name"),
                KeyField::new("Charity Number", "charity_number"),
                KeyField::new("Annual Income", "income_annually_in_british_pounds"),
                KeyField::new("Period End Date", "report_date"),
                KeyField::new("Annual Spending", "spending_annually_in_british_pounds"),
            ],
        }
    }

    /// SROIE: scanned receipts.
    pub fn sroie() -> Self {
        Self {
            name: "sroie".to_string(),
            fields: vec![
                KeyField::new("Company Name", "company"),
                KeyField::new("Date of Purchase", "date"),
                KeyField::new("Address of Company", "address"),
                KeyField::new("Total", "total"),
            ],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Prompt keys in schema order.
    pub fn prompt_keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.prompt_key.clone()).collect()
    }

    /// Canonical keys in schema order.
    pub fn canonical_keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.canonical_key.clone()).collect()
    }

    /// The first prompt key, whose label the model is asked to complete.
    pub fn first_prompt_key(&self) -> &str {
        &self.fields[0].prompt_key
    }
}

impl<'de> Deserialize<'de> for KeySchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            fields: Vec<KeyField>,
        }

        let raw = Raw::deserialize(deserializer)?;
        KeySchema::new(raw.name, raw.fields).map_err(serde::de::Error::custom)
    }
}
