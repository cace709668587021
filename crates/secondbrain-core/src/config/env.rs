use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SECONDBRAIN_MAX_TOOL_ITERATIONS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.agent.max_tool_iterations = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_RAG_MODEL") {
            self.llm.rag_model = v;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_MAX_TOKENS")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_retries = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_LLM_AVAILABLE_MODELS") {
            self.llm.available_models = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_CHUNK_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.ingest.chunk_size = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.ingest.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_RETRIEVAL_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.ingest.retrieval_k = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_MAX_FILE_SIZE")
            && let Ok(n) = v.parse::<u64>()
        {
            self.ingest.max_file_size = n;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_TIMEOUT_LLM")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.llm_seconds = secs;
        }
        if let Ok(v) = std::env::var("SECONDBRAIN_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
    }
}
