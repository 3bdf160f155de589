use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] docchat_llm::LlmError),

    #[error("vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error("no chunks to index")]
    EmptyChunks,

    #[error("embedding service returned no vector for the query")]
    EmptyEmbedding,
}
