//! Scripted provider for tests: canned chat replies and deterministic embeddings.

use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LlmError;
use crate::provider::{ChatResponse, LlmProvider, Message, ToolDefinition, ToolUseRequest};

pub const DEFAULT_EMBEDDING_DIM: usize = 64;

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<ChatResponse>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    calls: Arc<AtomicUsize>,
    model: String,
    pub default_response: String,
    /// When set, every tool-enabled call requests this tool and never answers.
    pub always_tool: Option<ToolUseRequest>,
    pub embedding_dim: usize,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            model: "mock-model".into(),
            default_response: "mock response".into(),
            always_tool: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            supports_embeddings: true,
            fail_chat: false,
            fail_embed: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    /// Text replies returned in order, then `default_response`.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::with_chat_responses(responses.into_iter().map(ChatResponse::Text).collect())
    }

    #[must_use]
    pub fn with_chat_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// Provider that requests `tool_name` on every tool-enabled call.
    #[must_use]
    pub fn always_calling(tool_name: &str, input: serde_json::Value) -> Self {
        Self {
            always_tool: Some(ToolUseRequest {
                id: "mock_call".into(),
                name: tool_name.into(),
                input,
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        model.clone_into(&mut self.model);
        self
    }

    /// Number of chat / chat-with-tools calls made so far, across clones.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists received by every chat call, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn next_response(&self, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let scripted = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(scripted.unwrap_or_else(|| ChatResponse::Text(self.default_response.clone())))
    }
}

/// Hashed bag-of-words vector, L2-normalized. Equal texts always map to equal vectors and
/// texts sharing words score higher under cosine similarity.
#[must_use]
pub fn hashed_embedding(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim.max(1)];
    let len = vector.len();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        word.to_lowercase().hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let slot = (hasher.finish() % len as u64) as usize;
        vector[slot] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        match self.next_response(messages).await? {
            ChatResponse::Text(text) => Ok(text),
            ChatResponse::ToolUse { text, .. } => Ok(text.unwrap_or_default()),
        }
    }

    async fn chat_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        if let Some(call) = &self.always_tool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_chat {
                return Err(LlmError::Other("mock LLM error".into()));
            }
            let n = self.calls.load(Ordering::SeqCst);
            return Ok(ChatResponse::ToolUse {
                text: None,
                tool_calls: vec![ToolUseRequest {
                    id: format!("{}_{n}", call.id),
                    ..call.clone()
                }],
            });
        }
        self.next_response(messages).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported {
                provider: "mock".into(),
            });
        }
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(hashed_embedding(text, self.embedding_dim))
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn set_model(&mut self, model: &str) {
        model.clone_into(&mut self.model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[tokio::test]
    async fn scripted_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        let msgs = [Message::from_legacy(Role::User, "hi")];
        assert_eq!(p.chat(&msgs).await.unwrap(), "first");
        assert_eq!(p.chat(&msgs).await.unwrap(), "mock response");
        assert_eq!(p.call_count(), 2);
        assert_eq!(p.requests().len(), 2);
    }

    #[tokio::test]
    async fn always_calling_never_answers() {
        let p = MockProvider::always_calling("lookup", serde_json::json!({"query": "x"}));
        for _ in 0..3 {
            let resp = p.chat_with_tools(&[], &[]).await.unwrap();
            assert!(matches!(resp, ChatResponse::ToolUse { .. }));
        }
        assert_eq!(p.call_count(), 3);
    }

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let p = MockProvider::default();
        let a = p.embed("the quick brown fox").await.unwrap();
        let b = p.embed("the quick brown fox").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let v = hashed_embedding("", 8);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let p = MockProvider::failing();
        assert!(p.chat(&[]).await.is_err());
        assert!(p.embed("x").await.is_err());
    }

    #[test]
    fn set_model_switches() {
        let mut p = MockProvider::default();
        p.set_model("other");
        assert_eq!(p.model(), "other");
    }
}
