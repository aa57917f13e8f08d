//! Fuzzy label matching with typed entity fallback.

use std::collections::HashSet;

use regex::Regex;
use strsim::jaro_winkler;
use tracing::{debug, trace};

use super::{render_raw_output, HeuristicExtractor};
use crate::models::schema::{FieldKind, KeySchema};
use crate::parse::normalize::{clean_scalar, parse_date};
use crate::parse::patterns::{
    DATE_DAY_MONTH_NAME, DATE_ISO, DATE_MONTH_NAME_DAY, DATE_NUMERIC_DMY, MONEY_WITH_CURRENCY,
};

/// A document line split into a label guess and the text after it.
struct LabelCandidate<'a> {
    line: usize,
    label: String,
    rest: &'a str,
}

/// Finds key labels on document lines by Jaro-Winkler similarity.
///
/// Each line is read as `label: value`, or, without a colon, as a label of the
/// key's word count followed by the value. Label/line pairs are assigned best
/// score first, each key and each line at most once. A matched label with
/// nothing after it takes the next non-empty line as its value. Date and money
/// fields left unmatched fall back to the first unused date or currency amount
/// in the document.
#[derive(Debug, Clone)]
pub struct FuzzyBaseline {
    min_similarity: f64,
}

impl Default for FuzzyBaseline {
    fn default() -> Self {
        Self { min_similarity: 0.85 }
    }
}

impl FuzzyBaseline {
    pub fn new(min_similarity: f64) -> Self {
        Self {
            min_similarity: min_similarity.clamp(0.0, 1.0),
        }
    }

    pub fn min_similarity(&self) -> f64 {
        self.min_similarity
    }

    fn candidates<'a>(lines: &[&'a str], key_words: usize) -> Vec<LabelCandidate<'a>> {
        lines
            .iter()
            .copied()
            .enumerate()
            .filter_map(|(line, text)| {
                if let Some((label, rest)) = text.split_once(':') {
                    return Some(LabelCandidate {
                        line,
                        label: normalize_label(label),
                        rest,
                    });
                }

                if text.split_whitespace().count() < key_words {
                    return None;
                }
                let mut rest = text;
                for _ in 0..key_words {
                    rest = rest.trim_start();
                    rest = rest.find(char::is_whitespace).map_or("", |end| &rest[end..]);
                }
                Some(LabelCandidate {
                    line,
                    label: normalize_label(&text[..text.len() - rest.len()]),
                    rest,
                })
            })
            .collect()
    }

    fn match_labels(&self, lines: &[&str], schema: &KeySchema) -> Vec<Option<String>> {
        let mut scored: Vec<(f64, usize, usize, String)> = Vec::new();

        for (key_index, field) in schema.fields().iter().enumerate() {
            let key = normalize_label(&field.prompt_key);
            let key_words = key.split_whitespace().count().max(1);

            for candidate in Self::candidates(lines, key_words) {
                let score = jaro_winkler(&candidate.label, &key);
                if score >= self.min_similarity {
                    let value = match clean_scalar(candidate.rest) {
                        value if !value.is_empty() => value,
                        _ => next_non_empty(lines, candidate.line),
                    };
                    scored.push((score, key_index, candidate.line, value));
                }
            }
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let mut values = vec![None; schema.len()];
        let mut used_lines = HashSet::new();
        for (score, key_index, line, value) in scored {
            if values[key_index].is_some() || used_lines.contains(&line) || value.is_empty() {
                continue;
            }
            trace!(
                "Key {:?} matched line {} (similarity {:.3})",
                schema.fields()[key_index].prompt_key,
                line + 1,
                score
            );
            used_lines.insert(line);
            values[key_index] = Some(value);
        }

        values
    }
}

impl HeuristicExtractor for FuzzyBaseline {
    fn extract(&self, text: &str, schema: &KeySchema) -> String {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut values = self.match_labels(&lines, schema);

        let mut used: HashSet<String> = values.iter().flatten().cloned().collect();
        for (index, field) in schema.fields().iter().enumerate() {
            if values[index].is_some() {
                continue;
            }
            let entity = match field.kind() {
                FieldKind::Date => first_unused(date_entities(text), &used),
                FieldKind::Money => first_unused(money_entities(text), &used),
                FieldKind::Text => None,
            };
            if let Some(entity) = entity {
                debug!("Key {:?} filled from entity {:?}", field.prompt_key, entity);
                used.insert(entity.clone());
                values[index] = Some(entity);
            }
        }

        let found = values.iter().filter(|v| v.is_some()).count();
        debug!("Baseline found {}/{} keys", found, schema.len());

        render_raw_output(schema, &values)
    }

    fn name(&self) -> &str {
        "fuzzy-baseline"
    }
}

fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn next_non_empty(lines: &[&str], line: usize) -> String {
    lines
        .iter()
        .skip(line + 1)
        .find(|l| !l.is_empty())
        .map(|l| clean_scalar(l))
        .unwrap_or_default()
}

fn first_unused(entities: Vec<String>, used: &HashSet<String>) -> Option<String> {
    entities.into_iter().find(|entity| !used.contains(entity))
}

/// Date expressions in document order, only those that actually parse.
fn date_entities(text: &str) -> Vec<String> {
    let patterns: [&Regex; 4] = [&DATE_ISO, &DATE_DAY_MONTH_NAME, &DATE_MONTH_NAME_DAY, &DATE_NUMERIC_DMY];
    let mut found: Vec<(usize, String)> = patterns
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .filter(|m| parse_date(m.as_str()).is_some())
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect();
    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, date)| date).collect()
}

/// Currency amounts in document order.
fn money_entities(text: &str) -> Vec<String> {
    MONEY_WITH_CURRENCY
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
