//! Shared types for vector index adapters.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with a vector index.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid vector index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The index responded with an unexpected status code.
    #[error("Unexpected vector index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A vector's length disagrees with the index's configured dimension.
    ///
    /// This is a provisioning bug, never retried.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was provisioned with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// A non-HTTP backend failed the operation.
    #[error("vector index operation failed: {0}")]
    Backend(String),
}

/// Metadata stored alongside every vector, required for scoped filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorMetadata {
    /// Identifier of the owning user.
    pub user_id: String,
    /// Identifier of the parent document.
    pub document_id: String,
    /// Zero-based chunk position within the document.
    pub chunk_index: usize,
    /// Source filename, kept for traceability.
    pub filename: String,
}

/// One vector ready for indexing.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// Identifier correlating this entry 1:1 with a chunk record.
    pub vector_id: String,
    /// Embedding values.
    pub embedding: Vec<f32>,
    /// Scoping metadata.
    pub metadata: VectorMetadata,
}

/// Mandatory tenant scope applied to every similarity search.
///
/// Both fields are required; there is no way to search across users or across
/// documents through this interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    /// Identifier of the user whose vectors may be returned.
    pub user_id: String,
    /// Identifier of the document whose vectors may be returned.
    pub document_id: String,
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    /// Vector identifier of the matching chunk.
    pub vector_id: String,
    /// Similarity score, higher is closer.
    pub score: f32,
    /// Scoping metadata stored with the vector.
    pub metadata: VectorMetadata,
}

/// Interface implemented by vector index backends.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Provision the index if needed; a no-op when it already exists with a
    /// matching dimension, fatal when the dimensions disagree.
    async fn ensure_ready(&self) -> Result<(), VectorIndexError>;

    /// Insert or overwrite one vector, idempotent on its `vector_id`.
    async fn upsert(&self, record: VectorRecord) -> Result<(), VectorIndexError>;

    /// Return at most `top_k` matches within `scope`, sorted by descending
    /// similarity.
    async fn query(
        &self,
        embedding: &[f32],
        scope: &SearchScope,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError>;
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResponseResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResponseResult {
    Points(Vec<QueryPoint>),
    Object {
        #[serde(default)]
        points: Vec<QueryPoint>,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryPoint {
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct CollectionInfoResponse {
    pub(crate) result: CollectionInfo,
}

#[derive(Deserialize)]
pub(crate) struct CollectionInfo {
    pub(crate) config: CollectionConfig,
}

#[derive(Deserialize)]
pub(crate) struct CollectionConfig {
    pub(crate) params: CollectionParams,
}

#[derive(Deserialize)]
pub(crate) struct CollectionParams {
    pub(crate) vectors: VectorParams,
}

#[derive(Deserialize)]
pub(crate) struct VectorParams {
    pub(crate) size: u64,
}
