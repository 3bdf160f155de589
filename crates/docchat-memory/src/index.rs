use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docchat_llm::LlmError;
use docchat_llm::provider::EmbedFuture;

use crate::document::Chunk;
use crate::error::IndexError;
use crate::vector_store::{VectorPoint, VectorStore};

pub const DEFAULT_TOP_K: usize = 4;

/// Batch embedding function, usually `AnyProvider::embed_fn()`.
pub type EmbedFn = Arc<dyn Fn(Vec<String>) -> EmbedFuture + Send + Sync>;

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub content: String,
    /// `<file>-<index>` or `Image-<file>`.
    pub source: String,
    pub score: f32,
}

/// Append-only vector index over one session's chunks.
///
/// Chunks live in a dedicated collection of the shared store. Embedding
/// happens before any write, so a failed `create` or `append` leaves the
/// index as it was.
pub struct SessionIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    embed: EmbedFn,
    len: usize,
}

impl fmt::Debug for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIndex")
            .field("collection", &self.collection)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl SessionIndex {
    /// Embed `chunks` and build a fresh index in a new collection.
    ///
    /// # Errors
    ///
    /// Returns `EmptyChunks` for empty input, or the embedding / store error.
    pub async fn create(
        store: Arc<dyn VectorStore>,
        embed: EmbedFn,
        chunks: &[Chunk],
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyChunks);
        }

        let vectors = embed_chunks(&embed, chunks).await?;
        let dimensions = vectors.first().map_or(0, Vec::len);
        if dimensions == 0 {
            return Err(IndexError::EmptyEmbedding);
        }

        let collection = format!("session-{}", uuid::Uuid::new_v4());
        store.ensure_collection(&collection, dimensions).await?;
        if let Err(e) = store.upsert(&collection, to_points(chunks, vectors)).await {
            let _ = store.delete_collection(&collection).await;
            return Err(e.into());
        }

        tracing::debug!(%collection, chunks = chunks.len(), dimensions, "session index created");
        Ok(Self {
            store,
            collection,
            embed,
            len: chunks.len(),
        })
    }

    /// Embed `chunks` and add them next to the existing content.
    ///
    /// # Errors
    ///
    /// Returns the embedding or store error; nothing is added in that case.
    pub async fn append(&mut self, chunks: &[Chunk]) -> Result<usize, IndexError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let vectors = embed_chunks(&self.embed, chunks).await?;
        self.store
            .upsert(&self.collection, to_points(chunks, vectors))
            .await?;
        self.len += chunks.len();

        tracing::debug!(collection = %self.collection, added = chunks.len(), total = self.len, "session index appended");
        Ok(chunks.len())
    }

    #[must_use]
    pub fn retriever(&self) -> Retriever {
        self.retriever_with_top_k(DEFAULT_TOP_K)
    }

    #[must_use]
    pub fn retriever_with_top_k(&self, top_k: usize) -> Retriever {
        Retriever {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            embed: Arc::clone(&self.embed),
            top_k: top_k.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Remove this index's collection from the shared store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the delete.
    pub async fn drop_collection(&self) -> Result<(), IndexError> {
        self.store.delete_collection(&self.collection).await?;
        Ok(())
    }
}

/// Similarity-search handle over a session collection.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    collection: String,
    embed: EmbedFn,
    top_k: usize,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Up to `top_k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded or the search fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>, IndexError> {
        let vector = (self.embed)(vec![query.to_owned()])
            .await?
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(IndexError::EmptyEmbedding)?;

        let hits = self.store.search(&self.collection, vector, self.top_k).await?;
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedChunk {
                content: payload_str(&hit.payload, "content"),
                source: payload_str(&hit.payload, "source"),
                score: hit.score,
            })
            .collect())
    }
}

async fn embed_chunks(embed: &EmbedFn, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, IndexError> {
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = embed(texts).await?;
    if vectors.len() != chunks.len() {
        return Err(LlmError::EmbeddingMismatch {
            expected: chunks.len(),
            actual: vectors.len(),
        }
        .into());
    }
    Ok(vectors)
}

fn to_points(chunks: &[Chunk], vectors: Vec<Vec<f32>>) -> Vec<VectorPoint> {
    chunks
        .iter()
        .zip(vectors)
        .map(|(chunk, vector)| VectorPoint {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            payload: HashMap::from([
                ("content".to_owned(), chunk.content.clone().into()),
                ("source".to_owned(), chunk.source_tag().into()),
                ("file".to_owned(), chunk.metadata.source.clone().into()),
                (
                    "content_type".to_owned(),
                    chunk.metadata.content_type.clone().into(),
                ),
                ("chunk_index".to_owned(), chunk.chunk_index.into()),
            ]),
        })
        .collect()
}

fn payload_str(payload: &HashMap<String, serde_json::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}
