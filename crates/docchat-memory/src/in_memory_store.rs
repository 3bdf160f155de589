use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
    /// Insertion order, used to break score ties deterministically.
    seq: u64,
}

struct InMemoryCollection {
    dimensions: usize,
    points: HashMap<String, StoredPoint>,
    next_seq: u64,
}

/// Process-local store shared by every session. Locks are never held across
/// an `.await`.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live collections.
    #[must_use]
    pub fn collection_count(&self) -> usize {
        self.collections.read().map_or(0, |cols| cols.len())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .field("collections", &self.collection_count())
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn poisoned(e: impl std::fmt::Display) -> VectorStoreError {
    VectorStoreError::Poisoned(e.to_string())
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: usize,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.collections.write().map_err(poisoned)?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    dimensions: vector_size,
                    points: HashMap::new(),
                    next_seq: 0,
                });
            Ok(())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.collections.write().map_err(poisoned)?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.collections.write().map_err(poisoned)?;
            let col = cols
                .get_mut(&collection)
                .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.clone()))?;

            if let Some(bad) = points.iter().find(|p| p.vector.len() != col.dimensions) {
                return Err(VectorStoreError::DimensionMismatch {
                    collection,
                    expected: col.dimensions,
                    actual: bad.vector.len(),
                });
            }

            for p in points {
                let seq = col.next_seq;
                col.next_seq += 1;
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                        seq,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(poisoned)?;
            let col = cols
                .get(&collection)
                .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.clone()))?;

            let mut scored: Vec<(u64, ScoredVectorPoint)> = col
                .points
                .iter()
                .map(|(id, sp)| {
                    (
                        sp.seq,
                        ScoredVectorPoint {
                            id: id.clone(),
                            score: cosine_similarity(&vector, &sp.vector),
                            payload: sp.payload.clone(),
                        },
                    )
                })
                .collect();

            scored.sort_by(|(seq_a, a), (seq_b, b)| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(seq_a.cmp(seq_b))
            });
            scored.truncate(limit);
            Ok(scored.into_iter().map(|(_, p)| p).collect())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<usize, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(poisoned)?;
            cols.get(&collection)
                .map(|col| col.points.len())
                .ok_or(VectorStoreError::CollectionNotFound(collection))
        })
    }
}
