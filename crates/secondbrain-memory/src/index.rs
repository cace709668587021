//! Append-only vector index over document chunks.

use std::sync::RwLock;

use crate::document::Chunk;

/// A chunk paired with its embedding. The index stores nothing else, so a vector can never
/// exist without the text it was computed from.
#[derive(Debug, Clone)]
pub struct ChunkVector {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("empty embedding vector")]
    EmptyEmbedding,

    #[error("index lock poisoned: {0}")]
    Lock(String),
}

/// Storage seam for chunk vectors. Implementations are append-only.
pub trait ChunkIndex: Send + Sync {
    /// Append vectors. Either all are added or none are.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if any embedding disagrees with the index
    /// dimension.
    fn add(&self, vectors: Vec<ChunkVector>) -> Result<(), IndexError>;

    /// Top `k` chunks by descending cosine similarity; ties keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if the query disagrees with the index dimension.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Entries {
    dimension: Option<usize>,
    vectors: Vec<ChunkVector>,
}

#[derive(Default)]
pub struct InMemoryIndex {
    entries: RwLock<Entries>,
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns an error if the embeddings do not share one non-zero dimension.
    pub fn build(vectors: Vec<ChunkVector>) -> Result<Self, IndexError> {
        let index = Self::new();
        index.add(vectors)?;
        Ok(index)
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.entries.read().ok().and_then(|e| e.dimension)
    }
}

impl ChunkIndex for InMemoryIndex {
    fn add(&self, vectors: Vec<ChunkVector>) -> Result<(), IndexError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| IndexError::Lock(e.to_string()))?;

        let mut dimension = entries.dimension;
        for v in &vectors {
            let actual = v.embedding.len();
            if actual == 0 {
                return Err(IndexError::EmptyEmbedding);
            }
            match dimension {
                Some(expected) if expected != actual => {
                    return Err(IndexError::DimensionMismatch { expected, actual });
                }
                Some(_) => {}
                None => dimension = Some(actual),
            }
        }

        entries.dimension = dimension;
        entries.vectors.extend(vectors);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| IndexError::Lock(e.to_string()))?;
        if k == 0 || entries.vectors.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = entries.dimension
            && expected != query.len()
        {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = entries
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, &v.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: entries.vectors[i].chunk.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.vectors.len())
    }
}
