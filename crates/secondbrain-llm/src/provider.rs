use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Structured fragment of a message. Plain turns carry no parts; tool traffic does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

impl Message {
    #[must_use]
    pub fn from_legacy(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            parts: vec![],
        }
    }

    /// Assistant message requesting one or more tool invocations.
    #[must_use]
    pub fn tool_use(text: Option<&str>, calls: &[ToolUseRequest]) -> Self {
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(MessagePart::Text {
                text: text.to_owned(),
            });
        }
        parts.extend(calls.iter().map(|c| MessagePart::ToolUse {
            id: c.id.clone(),
            name: c.name.clone(),
            input: c.input.clone(),
        }));
        let content = calls
            .iter()
            .map(|c| format!("[tool_use: {}({})]", c.name, c.id))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            role: Role::Assistant,
            content,
            parts,
        }
    }

    /// User-side message carrying tool results back to the model.
    #[must_use]
    pub fn tool_results(results: Vec<MessagePart>) -> Self {
        let content = results
            .iter()
            .filter_map(|p| match p {
                MessagePart::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => Some(format!("[tool_result: {tool_use_id}]\n{content}")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            role: Role::User,
            content,
            parts: results,
        }
    }

    #[must_use]
    pub fn to_llm_content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn has_tool_parts(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(
                p,
                MessagePart::ToolUse { .. } | MessagePart::ToolResult { .. }
            )
        })
    }
}

/// Tool exposed to the model on a `chat_with_tools` call.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatResponse {
    Text(String),
    ToolUse {
        text: Option<String>,
        tool_calls: Vec<ToolUseRequest>,
    },
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the assistant text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Send messages together with tool definitions. The model either answers with text or
    /// requests tool invocations.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if embeddings are unsupported or the request fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Embed several texts, preserving input order. Defaults to one request per text.
    ///
    /// # Errors
    ///
    /// Returns an error if any single embedding fails.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }

    fn supports_embeddings(&self) -> bool;

    fn name(&self) -> &str;

    /// Model identifier currently used for chat (or embeddings, for embedding-only providers).
    fn model(&self) -> &str;

    /// Switch the chat model used by subsequent requests.
    fn set_model(&mut self, model: &str);
}

/// Bound an external call by `duration`, mapping expiry to [`LlmError::Timeout`].
///
/// # Errors
///
/// Returns the inner error, or `LlmError::Timeout` if the call does not finish in time.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    duration: Duration,
    fut: F,
) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, seconds = duration.as_secs(), "external call timed out");
            Err(LlmError::Timeout {
                operation,
                seconds: duration.as_secs(),
            })
        }
    }
}
