//! Per-thread conversation checkpoints.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use secondbrain_llm::provider::{Message, MessagePart, Role};

/// Question/answer pair reconstructed from a thread's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// In-memory message history keyed by caller-supplied thread id.
///
/// Threads are created by their first commit and only removed by [`ConversationStore::clear`].
/// Each commit appends a whole turn under one write lock, so readers never observe half a turn.
#[derive(Debug, Default)]
pub struct ConversationStore {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

fn is_question(msg: &Message) -> bool {
    msg.role == Role::User
        && !msg
            .parts
            .iter()
            .any(|p| matches!(p, MessagePart::ToolResult { .. }))
}

fn is_answer(msg: &Message) -> bool {
    msg.role == Role::Assistant
        && !msg
            .parts
            .iter()
            .any(|p| matches!(p, MessagePart::ToolUse { .. }))
}

impl ConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the thread's messages; empty for unknown threads.
    #[must_use]
    pub fn history(&self, thread_id: &str) -> Vec<Message> {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a completed turn's messages to the thread.
    pub fn commit(&self, thread_id: &str, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        let mut threads = self.threads.write().unwrap_or_else(PoisonError::into_inner);
        let count = messages.len();
        threads
            .entry(thread_id.to_owned())
            .or_default()
            .extend(messages);
        tracing::debug!(thread_id, appended = count, "checkpoint committed");
    }

    /// Drop a thread's history. Returns whether the thread existed.
    pub fn clear(&self, thread_id: &str) -> bool {
        self.threads
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(thread_id)
            .is_some()
    }

    #[must_use]
    pub fn message_count(&self, thread_id: &str) -> usize {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(thread_id)
            .map_or(0, Vec::len)
    }

    /// Replay the thread as question/answer pairs, skipping intermediate tool traffic.
    #[must_use]
    pub fn turns(&self, thread_id: &str) -> Vec<Turn> {
        let mut turns = Vec::new();
        let mut open: Option<Turn> = None;
        for msg in self.history(thread_id) {
            if is_question(&msg) {
                if let Some(turn) = open.take() {
                    turns.push(turn);
                }
                open = Some(Turn {
                    question: msg.content,
                    answer: String::new(),
                });
            } else if is_answer(&msg)
                && let Some(turn) = open.as_mut()
            {
                turn.answer = msg.content;
            }
        }
        turns.extend(open);
        turns
    }
}

#[cfg(test)]
mod tests {
    use secondbrain_llm::provider::ToolUseRequest;

    use super::*;

    fn user(text: &str) -> Message {
        Message::from_legacy(Role::User, text)
    }

    fn assistant(text: &str) -> Message {
        Message::from_legacy(Role::Assistant, text)
    }

    #[test]
    fn unknown_thread_is_empty() {
        let store = ConversationStore::new();
        assert!(store.history("nope").is_empty());
        assert!(store.turns("nope").is_empty());
        assert_eq!(store.message_count("nope"), 0);
    }

    #[test]
    fn commit_appends_in_order() {
        let store = ConversationStore::new();
        store.commit("t", vec![user("q1"), assistant("a1")]);
        store.commit("t", vec![user("q2"), assistant("a2")]);
        let history = store.history("t");
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["q1", "a1", "q2", "a2"]);
    }

    #[test]
    fn threads_are_isolated() {
        let store = ConversationStore::new();
        store.commit("a", vec![user("for a")]);
        store.commit("b", vec![user("for b")]);
        assert_eq!(store.history("a").len(), 1);
        assert_eq!(store.history("b")[0].content, "for b");
        assert!(store.history("c").is_empty());
    }

    #[test]
    fn empty_commit_creates_nothing() {
        let store = ConversationStore::new();
        store.commit("t", vec![]);
        assert_eq!(store.message_count("t"), 0);
        assert!(!store.clear("t"));
    }

    #[test]
    fn clear_removes_thread() {
        let store = ConversationStore::new();
        store.commit("t", vec![user("q")]);
        assert!(store.clear("t"));
        assert!(!store.clear("t"));
        assert!(store.history("t").is_empty());
    }

    #[test]
    fn turns_skip_tool_traffic() {
        let store = ConversationStore::new();
        let call = ToolUseRequest {
            id: "c1".into(),
            name: "lookup".into(),
            input: serde_json::json!({"query": "x"}),
        };
        store.commit(
            "t",
            vec![
                user("what is x?"),
                Message::tool_use(None, &[call]),
                Message::tool_results(vec![MessagePart::ToolResult {
                    tool_use_id: "c1".into(),
                    content: "x is 42".into(),
                    is_error: false,
                }]),
                assistant("x is 42"),
            ],
        );
        store.commit("t", vec![user("thanks"), assistant("you're welcome")]);

        let turns = store.turns("t");
        assert_eq!(
            turns,
            vec![
                Turn {
                    question: "what is x?".into(),
                    answer: "x is 42".into()
                },
                Turn {
                    question: "thanks".into(),
                    answer: "you're welcome".into()
                },
            ]
        );
    }
}
