//! Error and settings types for the answer synthesizer.

use crate::config::Config;
use crate::embedding::{EmbeddingServiceError, GenerationServiceError};
use crate::store::StoreError;
use crate::vector::VectorIndexError;
use thiserror::Error;

/// Errors emitted while answering a question.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The question text was blank.
    #[error("Question must not be blank")]
    BlankQuestion,
    /// The referenced document does not exist for this user.
    ///
    /// Missing and foreign-owned documents are deliberately indistinguishable
    /// so the endpoint cannot be used to probe other tenants' document ids.
    #[error("Unknown document: {0}")]
    UnknownDocument(String),
    /// The referenced document is soft-disabled for retrieval.
    #[error("Document is disabled: {0}")]
    DocumentDisabled(String),
    /// Embedding the question failed.
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
    /// Vector index search failed.
    #[error("Vector index request failed: {0}")]
    VectorIndex(#[from] VectorIndexError),
    /// Answer generation failed.
    #[error("Failed to generate answer: {0}")]
    Generation(#[from] GenerationServiceError),
    /// Record store interaction failed.
    #[error("Record store request failed: {0}")]
    Store(#[from] StoreError),
}

impl AnswerError {
    /// Whether the failure is a client fault rather than a dependency fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::BlankQuestion | Self::UnknownDocument(_) | Self::DocumentDisabled(_)
        )
    }
}

/// Settings the synthesizer needs from configuration.
#[derive(Debug, Clone)]
pub struct AnswerSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Expected embedding dimension.
    pub embedding_dimension: usize,
    /// Embedding model identifier, recorded in usage logs.
    pub embedding_model: String,
    /// Generation model identifier, recorded in usage logs.
    pub generation_model: String,
    /// Maximum number of chat history entries returned per listing.
    pub history_limit: usize,
}

const DEFAULT_HISTORY_LIMIT: usize = 20;

impl AnswerSettings {
    /// Extract synthesizer settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.effective_top_k(),
            embedding_dimension: config.embedding_dimension,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}
