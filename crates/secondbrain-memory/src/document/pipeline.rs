use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secondbrain_llm::LlmProvider;
use secondbrain_llm::error::LlmError;
use secondbrain_llm::provider::with_timeout;

use super::error::DocumentError;
use super::splitter::{SplitterConfig, TextSplitter};
use super::{DEFAULT_MAX_FILE_SIZE, load_documents};
use crate::index::{ChunkIndex, ChunkVector, InMemoryIndex};
use crate::retriever::{DEFAULT_TOP_K, RetrievalTool};

const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(120);

/// Turns one file into a ready-to-query [`RetrievalTool`].
pub struct IngestionPipeline<E> {
    embedder: Arc<E>,
    splitter: TextSplitter,
    max_file_size: u64,
    retrieval_k: usize,
    embed_timeout: Duration,
    query_timeout: Duration,
}

impl<E> std::fmt::Debug for IngestionPipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("splitter", &self.splitter.config())
            .field("max_file_size", &self.max_file_size)
            .field("retrieval_k", &self.retrieval_k)
            .finish_non_exhaustive()
    }
}

impl<E: LlmProvider> IngestionPipeline<E> {
    /// # Errors
    ///
    /// Returns `DocumentError::Configuration` if the splitter config is invalid or the
    /// provider has no embedding model.
    pub fn new(embedder: Arc<E>, config: SplitterConfig) -> Result<Self, DocumentError> {
        if !embedder.supports_embeddings() {
            return Err(DocumentError::Configuration(format!(
                "provider {} has no embedding model",
                embedder.name()
            )));
        }
        Ok(Self {
            embedder,
            splitter: TextSplitter::new(config)?,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            retrieval_k: DEFAULT_TOP_K,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            query_timeout: Duration::from_secs(30),
        })
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    #[must_use]
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    /// Bound for the batch embedding call during ingestion and each query embedding afterwards.
    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self.query_timeout = timeout;
        self
    }

    /// Load, split, embed and index `path`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an empty path, any loader error, `Embedding` if the
    /// provider fails, times out or returns the wrong number of vectors, and `Index` if the
    /// vectors disagree on dimension. Nothing is kept on failure.
    pub async fn ingest(&self, path: &Path) -> Result<RetrievalTool<E>, DocumentError> {
        if path.as_os_str().is_empty() {
            return Err(DocumentError::Configuration(
                "no document path provided".into(),
            ));
        }
        let started = Instant::now();

        let (format, documents) = load_documents(path, self.max_file_size).await?;
        let chunks = self.splitter.split_documents(&documents, &format);

        let vectors = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = with_timeout(
                "document embedding",
                self.embed_timeout,
                self.embedder.embed_batch(&texts),
            )
            .await?;
            if embeddings.len() != chunks.len() {
                return Err(LlmError::EmbeddingCount {
                    expected: chunks.len(),
                    actual: embeddings.len(),
                }
                .into());
            }
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| ChunkVector { chunk, embedding })
                .collect()
        };

        let index = InMemoryIndex::build(vectors)?;
        tracing::info!(
            path = %path.display(),
            %format,
            documents = documents.len(),
            chunks = index.len(),
            embedding_model = self.embedder.model(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "document ingested"
        );

        let index: Arc<dyn ChunkIndex> = Arc::new(index);
        Ok(RetrievalTool::new(Arc::clone(&self.embedder), index)
            .with_k(self.retrieval_k)
            .with_embed_timeout(self.query_timeout))
    }
}
