use secondbrain_llm::provider::{
    ChatResponse, LlmProvider, Message, MessagePart, ToolDefinition, ToolUseRequest, with_timeout,
};
use secondbrain_tools::executor::{ToolCall, ToolError, ToolExecutor, truncate_tool_output};
use secondbrain_tools::registry::ToolDef;
use tracing::Instrument;

use super::{Agent, AgentError};

impl<P: LlmProvider, T: ToolExecutor> Agent<P, T> {
    pub(super) async fn call_chat_with_tools(
        &self,
        messages: &[Message],
    ) -> Result<ChatResponse, AgentError> {
        tracing::debug!(
            tool_count = self.tool_defs.len(),
            provider_name = self.provider.name(),
            message_count = messages.len(),
            "call_chat_with_tools"
        );
        let llm_span = tracing::info_span!("llm_call", model = %self.provider.model());
        let start = std::time::Instant::now();
        let response = with_timeout(
            "chat",
            self.llm_timeout,
            self.provider
                .chat_with_tools(messages, &self.tool_defs)
                .instrument(llm_span),
        )
        .await?;
        tracing::debug!(
            latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "llm responded"
        );
        Ok(response)
    }

    /// Run each requested call in order and collect one result part per call.
    ///
    /// Unknown tools and invalid parameters become error results so the model can correct
    /// itself; provider and execution failures abort the turn.
    pub(super) async fn handle_tool_calls(
        &self,
        tool_calls: &[ToolUseRequest],
    ) -> Result<Vec<MessagePart>, AgentError> {
        let mut result_parts = Vec::with_capacity(tool_calls.len());
        for tc in tool_calls {
            let span = tracing::info_span!("tool_exec", tool_name = %tc.name, idx = %tc.id);
            let result = if self.registry.find(&tc.name).is_some() {
                let call = ToolCall::from_input(tc.name.as_str(), &tc.input);
                self.tool_executor
                    .execute_tool_call(&call)
                    .instrument(span)
                    .await
            } else {
                Ok(None)
            };

            let (content, is_error) = match result {
                Ok(Some(out)) => (truncate_tool_output(&out.summary), false),
                Ok(None) => {
                    let err = ToolError::UnknownTool {
                        tool_id: tc.name.clone(),
                    };
                    tracing::warn!(tool = %tc.name, "model requested an unknown tool");
                    (format!("[error] {err}"), true)
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(tool = %tc.name, error = %e, "tool call rejected");
                    (format!("[error] {e}"), true)
                }
                Err(ToolError::Provider(e)) => return Err(AgentError::Llm(e)),
                Err(e) => return Err(e.into()),
            };

            result_parts.push(MessagePart::ToolResult {
                tool_use_id: tc.id.clone(),
                content,
                is_error,
            });
        }
        Ok(result_parts)
    }
}

/// Convert a registry definition into the shape sent on `chat_with_tools`.
#[must_use]
pub fn tool_def_to_definition(def: &ToolDef) -> ToolDefinition {
    ToolDefinition {
        name: def.id.to_owned(),
        description: def.description.to_owned(),
        parameters: def.parameters(),
    }
}
