//! In-memory [`RecordStore`] implementation.
//!
//! Collections are plain maps and vectors behind `std::sync::RwLock`; guards are
//! never held across an await point. Suitable for tests and single-process
//! local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{
    ChatMessage, ChunkRecord, Document, DocumentStatus, RecordStore, StoreError, UsageLog,
};

/// In-memory record store for tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<ChunkRecord>>,
    chat_messages: RwLock<Vec<ChatMessage>>,
    usage_logs: RwLock<Vec<UsageLog>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_document<T>(
        &self,
        document_id: &str,
        mutate: impl FnOnce(&mut Document) -> T,
    ) -> Result<T, StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Backend("documents lock poisoned".into()))?;
        let document = documents
            .get_mut(document_id)
            .ok_or_else(|| StoreError::UnknownDocument(document_id.to_string()))?;
        Ok(mutate(document))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Backend("documents lock poisoned".into()))?;
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn update_document_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        self.with_document(document_id, |document| document.status = status)
    }

    async fn update_document_chunk_count(
        &self,
        document_id: &str,
        total_chunks: usize,
    ) -> Result<(), StoreError> {
        self.with_document(document_id, |document| document.total_chunks = total_chunks)
    }

    async fn set_document_enabled(
        &self,
        document_id: &str,
        enabled: bool,
    ) -> Result<(), StoreError> {
        self.with_document(document_id, |document| document.enabled = enabled)
    }

    async fn find_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Backend("documents lock poisoned".into()))?;
        Ok(documents.get(document_id).cloned())
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<Document>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Backend("documents lock poisoned".into()))?;
        let mut owned: Vec<Document> = documents
            .values()
            .filter(|document| document.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn insert_chunk(&self, chunk: ChunkRecord) -> Result<(), StoreError> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|_| StoreError::Backend("chunks lock poisoned".into()))?;
        chunks.push(chunk);
        Ok(())
    }

    async fn find_chunk_by_vector_id(
        &self,
        vector_id: &str,
    ) -> Result<Option<ChunkRecord>, StoreError> {
        let chunks = self
            .chunks
            .read()
            .map_err(|_| StoreError::Backend("chunks lock poisoned".into()))?;
        Ok(chunks
            .iter()
            .find(|chunk| chunk.vector_id == vector_id)
            .cloned())
    }

    async fn insert_chat_message(&self, message: ChatMessage) -> Result<(), StoreError> {
        let mut messages = self
            .chat_messages
            .write()
            .map_err(|_| StoreError::Backend("chat lock poisoned".into()))?;
        messages.push(message);
        Ok(())
    }

    async fn list_chat_messages(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let messages = self
            .chat_messages
            .read()
            .map_err(|_| StoreError::Backend("chat lock poisoned".into()))?;
        Ok(messages
            .iter()
            .rev()
            .filter(|message| message.user_id == user_id && message.document_id == document_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_usage_log(&self, entry: UsageLog) -> Result<(), StoreError> {
        let mut logs = self
            .usage_logs
            .write()
            .map_err(|_| StoreError::Backend("usage lock poisoned".into()))?;
        logs.push(entry);
        Ok(())
    }

    async fn list_usage_logs(&self, user_id: &str) -> Result<Vec<UsageLog>, StoreError> {
        let logs = self
            .usage_logs
            .read()
            .map_err(|_| StoreError::Backend("usage lock poisoned".into()))?;
        Ok(logs
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }
}
