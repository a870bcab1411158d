//! Document ingestion pipeline: extraction, chunking, embedding, and indexing.

mod service;
mod types;

pub use service::{IngestApi, IngestionPipeline};
pub use types::{IngestError, IngestReceipt, IngestSettings};
