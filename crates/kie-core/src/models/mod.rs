//! Data models: key vocabularies, parsed results and configuration.

pub mod config;
pub mod output;
pub mod schema;

pub use config::KieConfig;
pub use output::{ParsedOutput, ParsedRecord};
pub use schema::{FieldKind, KeyField, KeySchema};
