//! Knowledge-base lookup exposed to the agent as a tool.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use secondbrain_llm::LlmProvider;
use secondbrain_llm::provider::with_timeout;
use secondbrain_tools::executor::{ToolCall, ToolError, ToolExecutor, ToolOutput, deserialize_params};
use secondbrain_tools::registry::ToolDef;
use serde::Deserialize;

use crate::index::{ChunkIndex, ScoredChunk};

pub const TOOL_NAME: &str = "recuperador_base_conocimiento";
pub const TOOL_DESCRIPTION: &str = "Busca y devuelve información de la base de conocimiento personal.";
pub const DEFAULT_TOP_K: usize = 4;
pub const NO_RESULTS: &str = "No relevant information found in the knowledge base.";
const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RetrieverParams {
    /// Natural-language search query
    pub query: String,
}

/// Retrieval tool bound to exactly one index and the provider that embedded it.
pub struct RetrievalTool<E> {
    embedder: Arc<E>,
    index: Arc<dyn ChunkIndex>,
    k: usize,
    embed_timeout: Duration,
}

impl<E> std::fmt::Debug for RetrievalTool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalTool")
            .field("k", &self.k)
            .field("indexed_chunks", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl<E: LlmProvider> RetrievalTool<E> {
    #[must_use]
    pub fn new(embedder: Arc<E>, index: Arc<dyn ChunkIndex>) -> Self {
        Self {
            embedder,
            index,
            k: DEFAULT_TOP_K,
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k.max(1);
        self
    }

    #[must_use]
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn index(&self) -> &Arc<dyn ChunkIndex> {
        &self.index
    }

    /// Embed `query`, search the index, and render the hits.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::InvalidParams` for a blank query, `ToolError::Provider` if the
    /// embedding call fails, and `ToolError::Execution` if the index rejects the query vector.
    pub async fn retrieve(&self, query: &str) -> Result<String, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidParams {
                message: "query must not be empty".into(),
            });
        }

        let vector = with_timeout(
            "query embedding",
            self.embed_timeout,
            self.embedder.embed(query),
        )
        .await?;
        let hits = self
            .index
            .search(&vector, self.k)
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        tracing::debug!(hits = hits.len(), k = self.k, "knowledge base searched");
        Ok(format_hits(&hits))
    }
}

/// One `[n] source (chunk i, score s)` block per hit, separated by `---` lines.
#[must_use]
pub fn format_hits(hits: &[ScoredChunk]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_owned();
    }
    let mut out = String::new();
    for (n, hit) in hits.iter().enumerate() {
        if n > 0 {
            out.push_str("\n---\n");
        }
        let _ = writeln!(
            out,
            "[{}] {} (chunk {}, score {:.3})",
            n + 1,
            hit.chunk.metadata.source,
            hit.chunk.chunk_index,
            hit.score
        );
        out.push_str(&hit.chunk.content);
    }
    out
}

impl<E: LlmProvider> ToolExecutor for RetrievalTool<E> {
    fn tool_definitions(&self) -> Vec<ToolDef> {
        vec![ToolDef {
            id: TOOL_NAME,
            description: TOOL_DESCRIPTION,
            schema: schemars::schema_for!(RetrieverParams),
        }]
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> Result<Option<ToolOutput>, ToolError> {
        if call.tool_id != TOOL_NAME {
            return Ok(None);
        }
        let params: RetrieverParams = deserialize_params(&call.params)?;
        let summary = self.retrieve(&params.query).await?;
        Ok(Some(ToolOutput {
            tool_name: TOOL_NAME.to_owned(),
            summary,
        }))
    }
}
