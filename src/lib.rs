#![deny(missing_docs)]

//! Core library for the Docquery document question-answering server.

/// Retrieval and grounded answer synthesis.
pub mod answer;
/// HTTP routing and REST handlers.
pub mod api;
/// Fixed-size overlapping text chunking.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Embedding and generation client abstraction and adapters.
pub mod embedding;
/// Plain-text extraction from stored document files.
pub mod extract;
/// Document ingestion pipeline and lifecycle management.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and answering metrics helpers.
pub mod metrics;
/// Record store abstraction for documents, chunks, chat, and usage.
pub mod store;
/// Usage accounting helpers.
pub mod usage;
/// Vector index abstraction and adapters.
pub mod vector;
