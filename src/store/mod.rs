//! Record store abstraction for documents, chunks, chat messages, and usage logs.
//!
//! The persistent store itself is an external collaborator; this module defines
//! the capability surface the pipeline and synthesizer rely on, the record
//! types, and a bundled in-memory implementation used by tests and local runs.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors raised by record store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced document id does not exist.
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    /// The backing store rejected or failed the operation.
    #[error("record store operation failed: {0}")]
    Backend(String),
}

/// Lifecycle state of a document.
///
/// Every document moves from `processing` to exactly one terminal state; only
/// the ingestion pipeline writes these transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Ingestion has been accepted and is underway.
    Processing,
    /// Every chunk was embedded and indexed.
    Processed,
    /// Ingestion hit an unrecoverable failure.
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Operation class recorded for usage metering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageOperation {
    /// A text-to-vector embedding call.
    Embedding,
    /// A prompt-to-answer generation call.
    Generation,
}

/// An uploaded document owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier.
    pub id: String,
    /// Identifier of the owning user.
    pub user_id: String,
    /// Display name, normally the uploaded filename.
    pub filename: String,
    /// Path of the stored file the text was extracted from.
    pub file_path: String,
    /// Number of chunks the document was split into.
    pub total_chunks: usize,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Soft-disable flag honored by retrieval.
    pub enabled: bool,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
}

/// One chunk of a document's text, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Identifier of the owning user.
    pub user_id: String,
    /// Identifier of the parent document.
    pub document_id: String,
    /// Zero-based position within the document.
    pub chunk_index: usize,
    /// Raw text span covered by this chunk.
    pub text: String,
    /// Identifier correlating this chunk 1:1 with its vector index entry.
    pub vector_id: String,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
}

/// One question/answer exchange, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Identifier of the asking user.
    pub user_id: String,
    /// Document the question was scoped to.
    pub document_id: String,
    /// Question text as received.
    pub question: String,
    /// Answer text as returned, sentinel answers included.
    pub answer: String,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
}

/// One metered model call, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLog {
    /// Identifier of the user the call is attributed to.
    pub user_id: String,
    /// Whether the call embedded text or generated an answer.
    pub operation: UsageOperation,
    /// Approximate token count (whitespace-delimited word count).
    pub tokens: usize,
    /// Model identifier the call was made against.
    pub model: String,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
}

/// Collection-scoped persistence operations consumed by the core.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new document record.
    async fn insert_document(&self, document: Document) -> Result<(), StoreError>;

    /// Overwrite a document's lifecycle status.
    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError>;

    /// Record the number of chunks a document was split into.
    async fn update_document_chunk_count(
        &self,
        document_id: &str,
        total_chunks: usize,
    ) -> Result<(), StoreError>;

    /// Flip a document's soft-disable flag.
    async fn set_document_enabled(
        &self,
        document_id: &str,
        enabled: bool,
    ) -> Result<(), StoreError>;

    /// Fetch a document by id.
    async fn find_document(&self, document_id: &str) -> Result<Option<Document>, StoreError>;

    /// List all documents owned by a user, newest first.
    async fn list_documents(&self, user_id: &str) -> Result<Vec<Document>, StoreError>;

    /// Insert a new chunk record.
    async fn insert_chunk(&self, chunk: ChunkRecord) -> Result<(), StoreError>;

    /// Fetch a chunk by its vector identifier.
    async fn find_chunk_by_vector_id(
        &self,
        vector_id: &str,
    ) -> Result<Option<ChunkRecord>, StoreError>;

    /// Append a chat message.
    async fn insert_chat_message(&self, message: ChatMessage) -> Result<(), StoreError>;

    /// List chat messages for a user/document pair, newest first, at most `limit`.
    async fn list_chat_messages(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Append a usage log entry.
    async fn insert_usage_log(&self, entry: UsageLog) -> Result<(), StoreError>;

    /// List usage log entries attributed to a user, oldest first.
    async fn list_usage_logs(&self, user_id: &str) -> Result<Vec<UsageLog>, StoreError>;
}

/// Current timestamp formatted for record storage.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = now_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }

    #[test]
    fn status_labels_are_lowercase() {
        assert_eq!(DocumentStatus::Processing.to_string(), "processing");
        assert_eq!(DocumentStatus::Processed.to_string(), "processed");
        assert_eq!(DocumentStatus::Failed.to_string(), "failed");
    }
}
