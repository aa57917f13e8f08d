//! Kleister-style `in.tsv` datasets.
//!
//! One document per line, tab separated, no header and no quoting:
//! `filename, keys, text_djvu, text_tesseract, text_textract, text_best`.
//! Newlines, tabs and backslashes inside the text columns are escaped.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Result, TextSource};
use crate::error::SourceError;

/// Which OCR layer of the dataset to serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColumn {
    Djvu,
    Tesseract,
    Textract,
    #[default]
    Best,
}

impl TextColumn {
    fn index(self) -> usize {
        match self {
            TextColumn::Djvu => 2,
            TextColumn::Tesseract => 3,
            TextColumn::Textract => 4,
            TextColumn::Best => 5,
        }
    }
}

impl std::str::FromStr for TextColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "djvu" => Ok(TextColumn::Djvu),
            "tesseract" => Ok(TextColumn::Tesseract),
            "textract" => Ok(TextColumn::Textract),
            "best" => Ok(TextColumn::Best),
            other => Err(format!("unknown text column: {}", other)),
        }
    }
}

/// Serves document text from a dataset file held in memory.
#[derive(Debug, Clone)]
pub struct DatasetTextSource {
    ids: Vec<String>,
    texts: HashMap<String, String>,
}

impl DatasetTextSource {
    /// Load a dataset file.
    pub fn from_path(path: &Path, column: TextColumn) -> Result<Self> {
        let file = File::open(path).map_err(|source| SourceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let source = Self::from_reader(file, column)?;
        info!("Loaded {} documents from {}", source.len(), path.display());
        Ok(source)
    }

    /// Load a dataset from any reader.
    pub fn from_reader<R: Read>(reader: R, column: TextColumn) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut ids = Vec::new();
        let mut texts = HashMap::new();

        for record in reader.records() {
            let record = record.map_err(|e| SourceError::Dataset {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                reason: e.to_string(),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let id = record.get(0).unwrap_or("").trim();
            if id.is_empty() {
                return Err(SourceError::Dataset {
                    line,
                    reason: "missing filename".to_string(),
                });
            }

            let text = record.get(column.index()).ok_or_else(|| SourceError::Dataset {
                line,
                reason: format!("{} columns, text column {:?} missing", record.len(), column),
            })?;

            if texts.insert(id.to_string(), unescape(text)).is_some() {
                return Err(SourceError::Dataset {
                    line,
                    reason: format!("duplicate document {}", id),
                });
            }
            debug!("Read {} from line {}", id, line);
            ids.push(id.to_string());
        }

        Ok(Self { ids, texts })
    }

    /// Document ids in file order.
    pub fn document_ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl TextSource for DatasetTextSource {
    fn get_text(&self, document_id: &str) -> Result<String> {
        self.texts
            .get(document_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(document_id.to_string()))
    }
}

/// Undo the `\n`, `\t` and `\\` escapes of dataset text columns.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
