#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] secondbrain_llm::LlmError),

    #[error(transparent)]
    Channel(#[from] crate::channel::ChannelError),

    #[error(transparent)]
    Document(#[from] secondbrain_memory::DocumentError),

    #[error(transparent)]
    Tool(#[from] secondbrain_tools::executor::ToolError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no final answer after {max_iterations} model calls")]
    ToolLoopExceeded { max_iterations: usize },

    #[error("request cancelled")]
    Cancelled,
}
