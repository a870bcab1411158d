//! Error and outcome types for the ingestion pipeline.

use crate::chunking::ChunkingError;
use crate::config::Config;
use crate::embedding::EmbeddingServiceError;
use crate::extract::ExtractError;
use crate::store::{DocumentStatus, StoreError};
use crate::vector::VectorIndexError;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted by the document ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Text extraction from the stored file failed.
    #[error("Failed to extract document text: {0}")]
    Extract(#[from] ExtractError),
    /// The extracted text was blank.
    #[error("Document contains no extractable text")]
    EmptyDocument,
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce a vector for a chunk.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingServiceError),
    /// A produced embedding disagrees with the configured dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was provisioned with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// Vector index interaction failed during ingestion.
    #[error("Vector index request failed: {0}")]
    VectorIndex(#[from] VectorIndexError),
    /// Record store interaction failed during ingestion.
    #[error("Record store request failed: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether the failure is a client fault rather than a dependency fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocument
                | Self::Extract(ExtractError::FileMissing(_))
                | Self::Extract(ExtractError::UnsupportedFormat(_))
        )
    }
}

/// Receipt returned to the caller once an ingestion has been accepted.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    /// Identifier of the created document.
    pub document_id: String,
    /// Display name derived from the stored file.
    pub filename: String,
    /// Number of chunks indexed so far; zero while still processing.
    pub total_chunks: usize,
    /// Lifecycle status at the time the receipt was produced.
    pub status: DocumentStatus,
}

/// Settings the pipeline needs from configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
    /// Expected embedding dimension.
    pub embedding_dimension: usize,
    /// Embedding model identifier, recorded in usage logs.
    pub embedding_model: String,
}

impl IngestSettings {
    /// Extract pipeline settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            embedding_dimension: config.embedding_dimension,
            embedding_model: config.embedding_model.clone(),
        }
    }
}
