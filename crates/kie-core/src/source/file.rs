//! Documents stored as files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{PdfExtractor, Result, TextSource};
use crate::error::SourceError;

/// Reads documents from disk. PDFs go through [`PdfExtractor`], anything else
/// is read as UTF-8 text.
#[derive(Debug, Clone, Default)]
pub struct FileTextSource {
    root: Option<PathBuf>,
}

impl FileTextSource {
    /// Resolve document ids as paths, relative to the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve document ids relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, document_id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(document_id),
            None => PathBuf::from(document_id),
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl TextSource for FileTextSource {
    fn get_text(&self, document_id: &str) -> Result<String> {
        let path = self.resolve(document_id);
        if !path.is_file() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        let read_error = |source| SourceError::Read {
            path: path.display().to_string(),
            source,
        };

        if is_pdf(&path) {
            let data = fs::read(&path).map_err(read_error)?;
            debug!("Reading PDF {} ({} bytes)", path.display(), data.len());
            PdfExtractor::text_from_bytes(&data)
        } else {
            fs::read_to_string(&path).map_err(read_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_text_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc.txt"), "Charity Name: Havens\n").unwrap();

        let source = FileTextSource::with_root(dir.path());
        assert_eq!(source.get_text("doc.txt").unwrap(), "Charity Name: Havens\n");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileTextSource::with_root(dir.path());
        assert!(matches!(source.get_text("absent.txt"), Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_broken_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.PDF");
        fs::write(&path, b"not really a pdf").unwrap();

        let source = FileTextSource::new();
        assert!(matches!(
            source.get_text(path.to_str().unwrap()),
            Err(SourceError::PdfParse(_))
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let source = FileTextSource::with_root(dir.path());
        assert!(matches!(source.get_text("bin.txt"), Err(SourceError::Read { .. })));
    }
}
