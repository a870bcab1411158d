//! Answer synthesis service: scoped retrieval, grounding, and chat persistence.

use crate::{
    answer::{
        prompt::{NO_MATCH_ANSWER, build_context, build_prompt},
        types::{AnswerError, AnswerSettings},
    },
    embedding::EmbeddingClient,
    metrics::CoreMetrics,
    store::{ChatMessage, RecordStore, UsageOperation, now_rfc3339},
    usage::{record_usage, word_count},
    vector::{SearchScope, VectorIndex},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Answers questions strictly from a single user's single document.
///
/// Ownership and the enabled flag are checked again here even though the access
/// layer already enforced them: the vector search filter and the chunk
/// hydration step both re-apply the (user, document) scope, treating the index
/// filter as an optimization rather than the security boundary.
pub struct AnswerService {
    store: Arc<dyn RecordStore>,
    embeddings: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    settings: AnswerSettings,
    metrics: Arc<CoreMetrics>,
}

/// Abstraction over the answer synthesizer used by the HTTP surface.
#[async_trait]
pub trait AnswerApi: Send + Sync {
    /// Answer `question` from the referenced document's content.
    async fn answer(
        &self,
        question: &str,
        user_id: &str,
        document_id: &str,
    ) -> Result<String, AnswerError>;

    /// List past exchanges for a user/document pair, newest first.
    async fn chat_history(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatMessage>, AnswerError>;
}

impl AnswerService {
    /// Build a new synthesizer from injected collaborators.
    pub fn new(
        store: Arc<dyn RecordStore>,
        embeddings: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        settings: AnswerSettings,
        metrics: Arc<CoreMetrics>,
    ) -> Self {
        Self {
            store,
            embeddings,
            index,
            settings,
            metrics,
        }
    }

    /// Persist one exchange and count it, sentinel answers included.
    async fn finish_exchange(
        &self,
        question: &str,
        answer: &str,
        user_id: &str,
        document_id: &str,
    ) -> Result<(), AnswerError> {
        self.store
            .insert_chat_message(ChatMessage {
                user_id: user_id.to_string(),
                document_id: document_id.to_string(),
                question: question.to_string(),
                answer: answer.to_string(),
                created_at: now_rfc3339(),
            })
            .await?;
        self.metrics.record_answer();
        Ok(())
    }
}

#[async_trait]
impl AnswerApi for AnswerService {
    async fn answer(
        &self,
        question: &str,
        user_id: &str,
        document_id: &str,
    ) -> Result<String, AnswerError> {
        if question.trim().is_empty() {
            return Err(AnswerError::BlankQuestion);
        }

        let document = self
            .store
            .find_document(document_id)
            .await?
            .filter(|document| document.user_id == user_id)
            .ok_or_else(|| AnswerError::UnknownDocument(document_id.to_string()))?;
        if !document.enabled {
            return Err(AnswerError::DocumentDisabled(document_id.to_string()));
        }

        let embedding = self.embeddings.embed(question).await?;
        if embedding.len() != self.settings.embedding_dimension {
            return Err(AnswerError::DimensionMismatch {
                expected: self.settings.embedding_dimension,
                actual: embedding.len(),
            });
        }
        record_usage(
            &self.store,
            user_id,
            UsageOperation::Embedding,
            word_count(question),
            &self.settings.embedding_model,
        )
        .await;

        let scope = SearchScope {
            user_id: user_id.to_string(),
            document_id: document_id.to_string(),
        };
        let matches = self
            .index
            .query(&embedding, &scope, self.settings.top_k)
            .await?;
        tracing::debug!(
            user_id,
            document_id,
            matches = matches.len(),
            "Retrieved candidate chunks"
        );

        if matches.is_empty() {
            self.finish_exchange(question, NO_MATCH_ANSWER, user_id, document_id)
                .await?;
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        // Hydrate in similarity-rank order, trusting only chunk records that
        // actually belong to this user and document.
        let mut chunk_texts = Vec::with_capacity(matches.len());
        for hit in &matches {
            match self.store.find_chunk_by_vector_id(&hit.vector_id).await? {
                Some(chunk)
                    if chunk.user_id == user_id && chunk.document_id == document_id =>
                {
                    chunk_texts.push(chunk.text);
                }
                Some(chunk) => {
                    tracing::error!(
                        vector_id = %hit.vector_id,
                        expected_user = user_id,
                        expected_document = document_id,
                        actual_user = %chunk.user_id,
                        actual_document = %chunk.document_id,
                        "Dropping search hit whose chunk record is scoped elsewhere"
                    );
                }
                None => {
                    tracing::warn!(
                        vector_id = %hit.vector_id,
                        "Dropping search hit without a backing chunk record"
                    );
                }
            }
        }

        if chunk_texts.is_empty() {
            self.finish_exchange(question, NO_MATCH_ANSWER, user_id, document_id)
                .await?;
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        let context = build_context(&chunk_texts);
        let prompt = build_prompt(&context, question);

        let answer = self.embeddings.generate(&prompt).await?;
        record_usage(
            &self.store,
            user_id,
            UsageOperation::Generation,
            word_count(&prompt) + word_count(&answer),
            &self.settings.generation_model,
        )
        .await;

        self.finish_exchange(question, &answer, user_id, document_id)
            .await?;
        tracing::info!(user_id, document_id, "Question answered");
        Ok(answer)
    }

    async fn chat_history(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<ChatMessage>, AnswerError> {
        self.store
            .list_chat_messages(user_id, document_id, self.settings.history_limit)
            .await
            .map_err(AnswerError::from)
    }
}
