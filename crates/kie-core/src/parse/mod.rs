//! Parsing of raw model output into key/value records.
//!
//! [`segment`] recovers values from one raw output, [`reconcile`] merges the
//! records of a chunked document, and an [`OutputParser`] publishes the result
//! in its presentation mode. None of this can fail on malformed model output:
//! anything that cannot be recovered is reported by omission.

pub mod format;
pub mod normalize;
pub mod patterns;
pub mod reconcile;
pub mod segment;

use serde::{Deserialize, Serialize};

use crate::models::output::{ParsedOutput, ParsedRecord};
use crate::models::schema::KeySchema;

pub use format::{canonical_record, to_line};
pub use normalize::{clean_scalar, is_null_marker, normalize_date, normalize_money};
pub use reconcile::reconcile;
pub use segment::{segment, KeyedTextParser};

/// Output presentation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// `canonical_key=value` tokens on one line.
    #[default]
    Line,
    /// Prompt key to value mapping.
    Mapping,
}

impl OutputMode {
    /// Create the parser for this mode.
    pub fn create_parser(self, schema: &KeySchema) -> Box<dyn OutputParser> {
        match self {
            OutputMode::Line => Box::new(KleisterLineParser::new(schema.clone())),
            OutputMode::Mapping => Box::new(MappingParser::new(schema)),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(OutputMode::Line),
            "mapping" | "json" => Ok(OutputMode::Mapping),
            other => Err(format!("unknown output mode: {}", other)),
        }
    }
}

/// Turns raw model output into a published result.
///
/// Implementors choose the presentation; segmentation and multi-chunk
/// reconciliation are shared so single- and multi-chunk documents come out in
/// the same shape.
pub trait OutputParser: Send + Sync {
    /// The segmenter for this parser's keys.
    fn segmenter(&self) -> &KeyedTextParser;

    /// Present a prompt-key record.
    fn publish(&self, record: ParsedRecord) -> ParsedOutput;

    /// Parse the raw output of a single generation call.
    fn parse(&self, raw_output: &str) -> ParsedOutput {
        self.publish(self.segmenter().segment(raw_output))
    }

    /// Parse the raw outputs of every chunk of one document.
    fn parse_chunks(&self, raw_outputs: &[String]) -> ParsedOutput {
        match raw_outputs {
            [] => self.publish(ParsedRecord::new()),
            [single] => self.parse(single),
            chunks => {
                let segmenter = self.segmenter();
                let records: Vec<ParsedRecord> =
                    chunks.iter().map(|raw| segmenter.segment(raw)).collect();
                self.publish(reconcile(&records, segmenter.keys()))
            }
        }
    }
}

/// Mapping mode: publishes the prompt-key record unchanged.
#[derive(Debug, Clone)]
pub struct MappingParser {
    segmenter: KeyedTextParser,
}

impl MappingParser {
    pub fn new(schema: &KeySchema) -> Self {
        Self::from_keys(&schema.prompt_keys())
    }

    /// Create a parser from a bare prompt-key list.
    pub fn from_keys<S: AsRef<str>>(prompt_keys: &[S]) -> Self {
        Self {
            segmenter: KeyedTextParser::new(prompt_keys),
        }
    }
}

impl OutputParser for MappingParser {
    fn segmenter(&self) -> &KeyedTextParser {
        &self.segmenter
    }

    fn publish(&self, record: ParsedRecord) -> ParsedOutput {
        ParsedOutput::Record(record)
    }
}

/// Flattened line mode, as in Kleister `out.tsv` files.
#[derive(Debug, Clone)]
pub struct KleisterLineParser {
    segmenter: KeyedTextParser,
    schema: KeySchema,
}

impl KleisterLineParser {
    pub fn new(schema: KeySchema) -> Self {
        Self {
            segmenter: KeyedTextParser::from_schema(&schema),
            schema,
        }
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }
}

impl OutputParser for KleisterLineParser {
    fn segmenter(&self) -> &KeyedTextParser {
        &self.segmenter
    }

    fn publish(&self, record: ParsedRecord) -> ParsedOutput {
        ParsedOutput::Line(to_line(&record, &self.schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEV_EXAMPLE: &str = " null\nAddress (post code): SS0 8HX\n\nAddress (street):    47 SECOND AVENUE\n\
                               Charity Name: Havens Christian Hospice\nCharity Number:   \n\"null\"  \n\nAnnual \
                               Income: \n\n  10348000.00\nPeriod End Date: 2016-03-31\nAnnual Spending:   null ";

    #[test]
    fn test_line_parser_dev_example() {
        let parser = KleisterLineParser::new(KeySchema::kleister_charity());
        assert_eq!(
            parser.parse(DEV_EXAMPLE),
            ParsedOutput::Line(
                "address__postcode=SS0_8HX address__street_line=47_SECOND_AVENUE \
                 charity_name=Havens_Christian_Hospice income_annually_in_british_pounds=10348000.00 \
                 report_date=2016-03-31"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_line_parser_refines_values() {
        let parser = KleisterLineParser::new(KeySchema::kleister_charity());
        let raw = "  null\nAnnual Income: \n\n  null\n Period End Date: 31 December 2015\nAnnual Spending:  £19.4m";
        assert_eq!(
            parser.parse(raw).to_string(),
            "report_date=2015-12-31 spending_annually_in_british_pounds=19.4"
        );
    }

    #[test]
    fn test_mapping_parser() {
        let parser = MappingParser::new(&KeySchema::kleister_charity());
        let parsed = parser.parse(DEV_EXAMPLE);
        let record = parsed.as_record().expect("mapping mode yields a record");

        assert_eq!(record.len(), 5);
        assert_eq!(record.get("Charity Name").map(String::as_str), Some("Havens Christian Hospice"));
        assert!(!record.contains_key("Charity Number"));
    }

    #[test]
    fn test_empty_input() {
        let line = KleisterLineParser::new(KeySchema::kleister_charity());
        assert_eq!(line.parse(""), ParsedOutput::Line(String::new()));
        assert_eq!(line.parse_chunks(&[]), ParsedOutput::Line(String::new()));

        let mapping = MappingParser::new(&KeySchema::kleister_charity());
        assert_eq!(mapping.parse(""), ParsedOutput::Record(ParsedRecord::new()));
    }

    #[test]
    fn test_parse_chunks_reconciles() {
        let parser = MappingParser::from_keys(&["Charity Name", "Charity Number"]);
        let chunks = vec![
            " Ushaw Moor Pre-School\nCharity Number: null".to_string(),
            " ushaw moor pre-school\nCharity Number: 1022119".to_string(),
        ];

        let record = parser.parse_chunks(&chunks);
        let record = record.as_record().expect("mapping mode yields a record");
        assert_eq!(record.get("Charity Name").map(String::as_str), Some("Ushaw Moor Pre-School"));
        assert_eq!(record.get("Charity Number").map(String::as_str), Some("1022119"));
    }

    #[test]
    fn test_single_chunk_matches_parse() {
        let parser = KleisterLineParser::new(KeySchema::kleister_charity());
        assert_eq!(parser.parse_chunks(&[DEV_EXAMPLE.to_string()]), parser.parse(DEV_EXAMPLE));
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("line".parse::<OutputMode>(), Ok(OutputMode::Line));
        assert_eq!("JSON".parse::<OutputMode>(), Ok(OutputMode::Mapping));
        assert!("xml".parse::<OutputMode>().is_err());
    }
}
