//! Helpers for constructing point payloads and identifiers.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::types::VectorRecord;

/// Build the payload object stored alongside each indexed vector.
///
/// The payload carries the chunk's vector identifier plus the scoping metadata
/// the search filter matches against.
pub(crate) fn build_payload(record: &VectorRecord) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "vector_id".into(),
        Value::String(record.vector_id.clone()),
    );
    payload.insert(
        "user_id".into(),
        Value::String(record.metadata.user_id.clone()),
    );
    payload.insert(
        "document_id".into(),
        Value::String(record.metadata.document_id.clone()),
    );
    payload.insert(
        "chunk_index".into(),
        Value::from(record.metadata.chunk_index as u64),
    );
    payload.insert(
        "filename".into(),
        Value::String(record.metadata.filename.clone()),
    );
    Value::Object(payload)
}

/// Derive the point identifier for a chunk's vector identifier.
///
/// Qdrant accepts only UUID or integer point ids, so the string vector id is
/// mapped to a UUIDv5 in a fixed namespace. The mapping is deterministic, which
/// is what makes upsert idempotent on the vector id.
pub(crate) fn point_id_for(vector_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, vector_id.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::types::VectorMetadata;

    #[test]
    fn point_id_is_deterministic() {
        let first = point_id_for("doc-1_0");
        let second = point_id_for("doc-1_0");
        assert_eq!(first, second);
        assert_ne!(first, point_id_for("doc-1_1"));
    }

    #[test]
    fn payload_carries_scope_metadata() {
        let record = VectorRecord {
            vector_id: "doc-1_3".into(),
            embedding: vec![0.0; 4],
            metadata: VectorMetadata {
                user_id: "user-a".into(),
                document_id: "doc-1".into(),
                chunk_index: 3,
                filename: "report.pdf".into(),
            },
        };

        let payload = build_payload(&record);
        assert_eq!(payload["vector_id"], "doc-1_3");
        assert_eq!(payload["user_id"], "user-a");
        assert_eq!(payload["document_id"], "doc-1");
        assert_eq!(payload["chunk_index"], 3);
        assert_eq!(payload["filename"], "report.pdf");
    }
}
