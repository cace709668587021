mod error;
mod tool_execution;

use std::sync::Arc;
use std::time::Duration;

use secondbrain_llm::provider::{ChatResponse, LlmProvider, Message, Role, ToolDefinition};
use secondbrain_memory::ConversationStore;
use secondbrain_tools::executor::ToolExecutor;
use secondbrain_tools::registry::ToolRegistry;
use tokio_util::sync::CancellationToken;

pub use error::AgentError;
pub use tool_execution::tool_def_to_definition;

pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_RAG_SYSTEM_PROMPT: &str = "Eres un asistente personal. Usa la herramienta \
recuperador_base_conocimiento para buscar en la base de conocimiento del usuario antes de \
responder preguntas sobre sus documentos, y responde solo con la información encontrada.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    AwaitingToolResult,
}

/// Tool-calling question answering agent with per-thread checkpoints.
///
/// Each [`Agent::query`] runs one turn: the thread's committed history plus the new question
/// is sent to the model together with the executor's tools, tool calls are executed and fed
/// back, and the loop ends when the model answers in plain text. The turn is committed to the
/// shared [`ConversationStore`] only when it succeeds.
pub struct Agent<P: LlmProvider, T: ToolExecutor> {
    provider: P,
    tool_executor: T,
    registry: ToolRegistry,
    tool_defs: Vec<ToolDefinition>,
    conversations: Arc<ConversationStore>,
    system_prompt: String,
    max_tool_iterations: usize,
    llm_timeout: Duration,
    cancel_token: CancellationToken,
    state: AgentState,
}

impl<P: LlmProvider, T: ToolExecutor> std::fmt::Debug for Agent<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("tools", &self.tool_defs.len())
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider, T: ToolExecutor> Agent<P, T> {
    #[must_use]
    pub fn new(provider: P, tool_executor: T, conversations: Arc<ConversationStore>) -> Self {
        let registry = ToolRegistry::from_definitions(tool_executor.tool_definitions());
        let tool_defs: Vec<ToolDefinition> =
            registry.tools().iter().map(tool_def_to_definition).collect();
        tracing::debug!(
            tools = ?tool_defs.iter().map(|t| &t.name).collect::<Vec<_>>(),
            "agent tools registered"
        );
        Self {
            provider,
            tool_executor,
            registry,
            tool_defs,
            conversations,
            system_prompt: DEFAULT_RAG_SYSTEM_PROMPT.to_owned(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            cancel_token: CancellationToken::new(),
            state: AgentState::Idle,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max;
        self
    }

    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Token checked between tool-loop iterations. Cancelling it fails the current turn.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub fn state(&self) -> AgentState {
        self.state
    }

    #[must_use]
    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Answer `question` on `thread_id`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Llm` for provider failures and timeouts, `Cancelled` if the
    /// cancellation token fires, and `ToolLoopExceeded` if the model keeps requesting tools.
    /// The thread's checkpoint is left untouched on any error.
    pub async fn query(&mut self, thread_id: &str, question: &str) -> Result<String, AgentError> {
        let result = self.run_turn(thread_id, question).await;
        self.state = AgentState::Idle;
        match result {
            Ok((answer, turn)) => {
                self.conversations.commit(thread_id, turn);
                Ok(answer)
            }
            Err(e) => {
                tracing::error!(thread_id, error = %e, "turn failed, checkpoint unchanged");
                Err(e)
            }
        }
    }

    async fn run_turn(
        &mut self,
        thread_id: &str,
        question: &str,
    ) -> Result<(String, Vec<Message>), AgentError> {
        let history = self.conversations.history(thread_id);
        let mut turn = vec![Message::from_legacy(Role::User, question)];
        tracing::debug!(
            thread_id,
            history_len = history.len(),
            "starting agent turn"
        );

        for iteration in 0..self.max_tool_iterations {
            if self.cancel_token.is_cancelled() {
                tracing::info!(thread_id, iteration, "agent turn cancelled");
                return Err(AgentError::Cancelled);
            }

            let messages = self.request_messages(&history, &turn);
            let response = self.call_chat_with_tools(&messages).await?;
            tracing::debug!(iteration, ?response, "tool loop iteration");

            match response {
                ChatResponse::Text(text) => {
                    turn.push(Message::from_legacy(Role::Assistant, text.as_str()));
                    return Ok((text, turn));
                }
                ChatResponse::ToolUse { text, tool_calls } if tool_calls.is_empty() => {
                    let text = text.unwrap_or_default();
                    turn.push(Message::from_legacy(Role::Assistant, text.as_str()));
                    return Ok((text, turn));
                }
                ChatResponse::ToolUse { text, tool_calls } => {
                    self.state = AgentState::AwaitingToolResult;
                    turn.push(Message::tool_use(text.as_deref(), &tool_calls));
                    let results = self.handle_tool_calls(&tool_calls).await?;
                    turn.push(Message::tool_results(results));
                    self.state = AgentState::Idle;
                }
            }
        }

        tracing::warn!(
            thread_id,
            max_iterations = self.max_tool_iterations,
            "tool loop exhausted without a final answer"
        );
        Err(AgentError::ToolLoopExceeded {
            max_iterations: self.max_tool_iterations,
        })
    }

    fn request_messages(&self, history: &[Message], turn: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + turn.len() + 1);
        if !self.system_prompt.is_empty() {
            messages.push(Message::from_legacy(Role::System, self.system_prompt.as_str()));
        }
        messages.extend_from_slice(history);
        messages.extend_from_slice(turn);
        messages
    }
}
