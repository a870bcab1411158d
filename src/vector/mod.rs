//! Vector index abstraction and adapters.
//!
//! The index stores one entry per chunk, keyed by the chunk's vector identifier
//! and tagged with owner/document metadata. Scoped filtering on that metadata is
//! the isolation boundary for search; callers additionally re-validate ownership
//! when hydrating chunk text.

pub mod client;
pub mod filters;
pub mod memory;
pub mod payload;
pub mod types;

pub use client::QdrantIndex;
pub use filters::build_scope_filter;
pub use memory::MemoryVectorIndex;
pub use types::{
    SearchScope, VectorIndex, VectorIndexError, VectorMatch, VectorMetadata, VectorRecord,
};
