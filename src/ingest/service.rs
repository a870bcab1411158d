//! Ingestion pipeline coordinating extraction, chunking, embedding, and indexing.

use crate::{
    chunking::chunk_text,
    embedding::EmbeddingClient,
    extract::TextExtractor,
    ingest::types::{IngestError, IngestReceipt, IngestSettings},
    metrics::{CoreMetrics, MetricsSnapshot},
    store::{ChunkRecord, Document, DocumentStatus, RecordStore, UsageOperation, now_rfc3339},
    usage::{record_usage, word_count},
    vector::{VectorIndex, VectorMetadata, VectorRecord},
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Coordinates the full ingestion pipeline and owns the document lifecycle.
///
/// The pipeline is the only writer of document status: a document is created in
/// `processing` the moment ingestion is accepted and moves exactly once to
/// `processed` or `failed`. Collaborators are injected at construction and the
/// pipeline is cheap to clone, which is how background ingestion hands a copy
/// to its worker task.
#[derive(Clone)]
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    store: Arc<dyn RecordStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    settings: IngestSettings,
    metrics: Arc<CoreMetrics>,
}

/// Abstraction over the ingestion pipeline used by the HTTP surface.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Ingest a stored file synchronously, returning once it reached a
    /// terminal state.
    async fn ingest(&self, file_path: &str, user_id: &str) -> Result<IngestReceipt, IngestError>;

    /// Accept a stored file and run the pipeline on a background task,
    /// returning a provisional `processing` receipt immediately.
    async fn ingest_background(
        &self,
        file_path: &str,
        user_id: &str,
    ) -> Result<IngestReceipt, IngestError>;

    /// List all documents owned by `user_id`.
    async fn list_documents(&self, user_id: &str) -> Result<Vec<Document>, IngestError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl IngestionPipeline {
    /// Build a new pipeline from injected collaborators.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        store: Arc<dyn RecordStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        settings: IngestSettings,
        metrics: Arc<CoreMetrics>,
    ) -> Self {
        Self {
            extractor,
            store,
            embeddings,
            index,
            settings,
            metrics,
        }
    }

    /// Create the document record that anchors an accepted ingestion.
    async fn register(&self, file_path: &str, user_id: &str) -> Result<Document, IngestError> {
        let filename = Path::new(file_path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(file_path)
            .to_string();

        let document = Document {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            filename,
            file_path: file_path.to_string(),
            total_chunks: 0,
            status: DocumentStatus::Processing,
            enabled: true,
            created_at: now_rfc3339(),
        };

        self.store.insert_document(document.clone()).await?;
        tracing::info!(
            document_id = %document.id,
            user_id,
            filename = %document.filename,
            "Document accepted for ingestion"
        );
        Ok(document)
    }

    /// Run extraction through indexing for a registered document and flip its
    /// status to the matching terminal state.
    async fn execute(&self, document: &Document) -> Result<usize, IngestError> {
        match self.process(document).await {
            Ok(chunk_count) => {
                self.store
                    .update_document_status(&document.id, DocumentStatus::Processed)
                    .await?;
                self.metrics.record_ingested(chunk_count as u64);
                tracing::info!(
                    document_id = %document.id,
                    chunks = chunk_count,
                    "Document ingestion completed"
                );
                Ok(chunk_count)
            }
            Err(error) => {
                tracing::error!(
                    document_id = %document.id,
                    error = %error,
                    "Document ingestion failed"
                );
                self.metrics.record_failed();
                if let Err(status_error) = self
                    .store
                    .update_document_status(&document.id, DocumentStatus::Failed)
                    .await
                {
                    tracing::error!(
                        document_id = %document.id,
                        error = %status_error,
                        "Failed to mark document as failed"
                    );
                }
                Err(error)
            }
        }
    }

    async fn process(&self, document: &Document) -> Result<usize, IngestError> {
        let text = self.extractor.extract(&document.file_path).await?;
        if text.trim().is_empty() {
            return Err(IngestError::EmptyDocument);
        }
        tracing::debug!(
            document_id = %document.id,
            chars = text.chars().count(),
            "Extracted document text"
        );

        let chunks = chunk_text(&text, self.settings.chunk_size, self.settings.chunk_overlap)?;
        let total = chunks.len();
        self.store
            .update_document_chunk_count(&document.id, total)
            .await?;
        tracing::debug!(document_id = %document.id, chunks = total, "Chunked document");

        for (index, chunk) in chunks.into_iter().enumerate() {
            let vector_id = format!("{}_{index}", document.id);

            // The chunk record lands before the embedding call so a crash
            // mid-ingestion leaves a recoverable trail instead of silent loss.
            self.store
                .insert_chunk(ChunkRecord {
                    user_id: document.user_id.clone(),
                    document_id: document.id.clone(),
                    chunk_index: index,
                    text: chunk.clone(),
                    vector_id: vector_id.clone(),
                    created_at: now_rfc3339(),
                })
                .await?;

            let embedding = self.embeddings.embed(&chunk).await?;
            if embedding.len() != self.settings.embedding_dimension {
                return Err(IngestError::DimensionMismatch {
                    expected: self.settings.embedding_dimension,
                    actual: embedding.len(),
                });
            }
            record_usage(
                &self.store,
                &document.user_id,
                UsageOperation::Embedding,
                word_count(&chunk),
                &self.settings.embedding_model,
            )
            .await;

            self.index
                .upsert(VectorRecord {
                    vector_id,
                    embedding,
                    metadata: VectorMetadata {
                        user_id: document.user_id.clone(),
                        document_id: document.id.clone(),
                        chunk_index: index,
                        filename: document.filename.clone(),
                    },
                })
                .await?;

            if (index + 1) % 5 == 0 || index + 1 == total {
                tracing::debug!(
                    document_id = %document.id,
                    processed = index + 1,
                    total,
                    "Chunk progress"
                );
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl IngestApi for IngestionPipeline {
    async fn ingest(&self, file_path: &str, user_id: &str) -> Result<IngestReceipt, IngestError> {
        let document = self.register(file_path, user_id).await?;
        let chunk_count = self.execute(&document).await?;
        Ok(IngestReceipt {
            document_id: document.id,
            filename: document.filename,
            total_chunks: chunk_count,
            status: DocumentStatus::Processed,
        })
    }

    async fn ingest_background(
        &self,
        file_path: &str,
        user_id: &str,
    ) -> Result<IngestReceipt, IngestError> {
        let document = self.register(file_path, user_id).await?;
        let receipt = IngestReceipt {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            total_chunks: 0,
            status: DocumentStatus::Processing,
        };

        let pipeline = self.clone();
        tokio::spawn(async move {
            // Terminal status is flipped inside execute; nothing is lost if the
            // caller has long since moved on.
            let _ = pipeline.execute(&document).await;
        });

        Ok(receipt)
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<Document>, IngestError> {
        self.store
            .list_documents(user_id)
            .await
            .map_err(IngestError::from)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
