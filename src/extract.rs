//! Plain-text extraction from stored document files.
//!
//! The ingestion pipeline only ever sees extracted text; the upload layer stores
//! the raw file and hands the path over. The default extractor understands UTF-8
//! text files and PDFs. Anything else is rejected up front so ingestion fails
//! before any record is written for an unreadable format.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors raised while turning a stored file into plain text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The referenced file does not exist on disk.
    #[error("document file not found: {0}")]
    FileMissing(String),
    /// The file extension maps to no supported format.
    #[error("unsupported document format: {0} (only .pdf and .txt are accepted)")]
    UnsupportedFormat(String),
    /// The file exists but its contents could not be decoded.
    #[error("failed to extract text from '{path}': {source}")]
    Extraction {
        /// Path of the file that failed to decode.
        path: String,
        /// Underlying error raised by the decoder.
        #[source]
        source: anyhow::Error,
    },
}

/// Interface implemented by text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full plain text of the file at `path`.
    async fn extract(&self, path: &str) -> Result<String, ExtractError>;
}

/// Default extractor reading `.txt` and `.pdf` files from the local filesystem.
pub struct FileExtractor;

impl FileExtractor {
    /// Construct a new filesystem-backed extractor.
    pub const fn new() -> Self {
        Self
    }
}

impl Default for FileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for FileExtractor {
    async fn extract(&self, path: &str) -> Result<String, ExtractError> {
        if !Path::new(path).exists() {
            return Err(ExtractError::FileMissing(path.to_string()));
        }

        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("txt") => {
                let text = tokio::fs::read_to_string(path).await.map_err(|err| {
                    ExtractError::Extraction {
                        path: path.to_string(),
                        source: err.into(),
                    }
                })?;
                tracing::debug!(path, chars = text.chars().count(), "Loaded text file");
                Ok(text)
            }
            Some("pdf") => {
                // pdf-extract walks the whole document synchronously; keep it off
                // the async worker threads.
                let owned = path.to_string();
                let text = tokio::task::spawn_blocking(move || {
                    pdf_extract::extract_text(&owned)
                })
                .await
                .map_err(|err| ExtractError::Extraction {
                    path: path.to_string(),
                    source: err.into(),
                })?
                .map_err(|err| ExtractError::Extraction {
                    path: path.to_string(),
                    source: err.into(),
                })?;
                tracing::debug!(path, chars = text.chars().count(), "Loaded PDF file");
                Ok(text)
            }
            _ => Err(ExtractError::UnsupportedFormat(path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn extracts_utf8_text_files() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        write!(file, "hello from disk").expect("write");

        let extractor = FileExtractor::new();
        let text = extractor
            .extract(file.path().to_str().expect("utf8 path"))
            .await
            .expect("extraction succeeded");
        assert_eq!(text, "hello from disk");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let extractor = FileExtractor::new();
        let error = extractor
            .extract("/nonexistent/report.txt")
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractError::FileMissing(_)));
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new()
            .suffix(".docx")
            .tempfile()
            .expect("temp file");

        let extractor = FileExtractor::new();
        let error = extractor
            .extract(file.path().to_str().expect("utf8 path"))
            .await
            .unwrap_err();
        assert!(matches!(error, ExtractError::UnsupportedFormat(_)));
    }
}
