//! Document extraction, chunking, and the per-session vector index.

pub mod document;
pub mod error;
pub mod in_memory_store;
pub mod index;
pub mod vector_store;

pub use error::IndexError;
pub use in_memory_store::InMemoryVectorStore;
pub use index::{DEFAULT_TOP_K, EmbedFn, RetrievedChunk, Retriever, SessionIndex};
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
