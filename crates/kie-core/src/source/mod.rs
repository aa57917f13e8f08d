//! Document text sources.
//!
//! A [`TextSource`] turns a document identifier into plain text. Sources are
//! chosen when the pipeline is assembled; closures work too, which keeps tests
//! and embedders free of files.

mod dataset;
mod file;
mod pdf;

pub use dataset::{DatasetTextSource, TextColumn};
pub use file::FileTextSource;
pub use pdf::PdfExtractor;

use crate::error::SourceError;

/// Result type for text sources.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Something that can produce the text of a document.
pub trait TextSource: Send + Sync {
    /// Get the full text of a document.
    fn get_text(&self, document_id: &str) -> Result<String>;
}

impl<F> TextSource for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn get_text(&self, document_id: &str) -> Result<String> {
        self(document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_source() {
        let source = |id: &str| -> Result<String> {
            match id {
                "a.pdf" => Ok("Charity Name: Havens".to_string()),
                other => Err(SourceError::NotFound(other.to_string())),
            }
        };

        assert_eq!(source.get_text("a.pdf").unwrap(), "Charity Name: Havens");
        assert!(matches!(source.get_text("b.pdf"), Err(SourceError::NotFound(_))));

        let boxed: Box<dyn TextSource> = Box::new(source);
        assert!(boxed.get_text("a.pdf").is_ok());
    }
}
