//! In-memory [`VectorIndex`] implementation.
//!
//! Brute-force cosine ranking over a map keyed by vector id, behind a
//! `std::sync::RwLock`. Used by tests and single-process local runs; it honors
//! the same scope filtering and dimension checks as the Qdrant adapter.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::types::{SearchScope, VectorIndex, VectorIndexError, VectorMatch, VectorRecord};

/// In-memory vector index for tests and local development.
pub struct MemoryVectorIndex {
    dimension: usize,
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryVectorIndex {
    /// Create an empty index configured for `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of vectors currently stored.
    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
        Ok(())
    }

    async fn upsert(&self, record: VectorRecord) -> Result<(), VectorIndexError> {
        if record.embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: record.embedding.len(),
            });
        }
        let mut records = self
            .records
            .write()
            .map_err(|_| VectorIndexError::Backend("records lock poisoned".into()))?;
        records.insert(record.vector_id.clone(), record);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        scope: &SearchScope,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        let records = self
            .records
            .read()
            .map_err(|_| VectorIndexError::Backend("records lock poisoned".into()))?;

        let mut scored: Vec<VectorMatch> = records
            .values()
            .filter(|record| {
                record.metadata.user_id == scope.user_id
                    && record.metadata.document_id == scope.document_id
            })
            .map(|record| VectorMatch {
                vector_id: record.vector_id.clone(),
                score: cosine_similarity(embedding, &record.embedding),
                metadata: record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::types::VectorMetadata;

    fn record(vector_id: &str, user_id: &str, document_id: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            vector_id: vector_id.into(),
            embedding,
            metadata: VectorMetadata {
                user_id: user_id.into(),
                document_id: document_id.into(),
                chunk_index: 0,
                filename: "fixture.txt".into(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_vector_id() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(record("doc-1_0", "user-a", "doc-1", vec![1.0, 0.0]))
            .await
            .expect("upsert");
        index
            .upsert(record("doc-1_0", "user-a", "doc-1", vec![1.0, 0.0]))
            .await
            .expect("upsert");

        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity_within_scope() {
        let index = MemoryVectorIndex::new(2);
        index
            .upsert(record("doc-1_0", "user-a", "doc-1", vec![1.0, 0.0]))
            .await
            .expect("upsert");
        index
            .upsert(record("doc-1_1", "user-a", "doc-1", vec![0.0, 1.0]))
            .await
            .expect("upsert");

        let matches = index
            .query(
                &[1.0, 0.1],
                &SearchScope {
                    user_id: "user-a".into(),
                    document_id: "doc-1".into(),
                },
                5,
            )
            .await
            .expect("query");

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].vector_id, "doc-1_0");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn query_never_crosses_the_scope() {
        let index = MemoryVectorIndex::new(2);
        // Identical content owned by two different users.
        index
            .upsert(record("doc-1_0", "user-a", "doc-1", vec![1.0, 0.0]))
            .await
            .expect("upsert");
        index
            .upsert(record("doc-2_0", "user-b", "doc-2", vec![1.0, 0.0]))
            .await
            .expect("upsert");

        let matches = index
            .query(
                &[1.0, 0.0],
                &SearchScope {
                    user_id: "user-a".into(),
                    document_id: "doc-1".into(),
                },
                5,
            )
            .await
            .expect("query");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].vector_id, "doc-1_0");
    }

    #[tokio::test]
    async fn query_rejects_wrong_dimension() {
        let index = MemoryVectorIndex::new(2);
        let error = index
            .query(
                &[1.0, 0.0, 0.0],
                &SearchScope {
                    user_id: "user-a".into(),
                    document_id: "doc-1".into(),
                },
                5,
            )
            .await
            .unwrap_err();
        assert!(matches!(error, VectorIndexError::DimensionMismatch { .. }));
    }
}
