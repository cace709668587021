//! Tool-free chat loop with per-session history and runtime model switching.

use std::sync::Arc;
use std::time::Duration;

use secondbrain_llm::provider::{LlmProvider, Message, Role, with_timeout};
use secondbrain_memory::ConversationStore;
use tracing::Instrument;

use crate::agent::{AgentError, DEFAULT_LLM_TIMEOUT};

pub const MODEL_SWITCH_PREFIX: &str = "cambiar modelo a ";
pub const FAREWELL: &str = "¡Hasta Luego! Que tengas un buen día.";
pub const HISTORY_HEADER: &str = "Historial de la conversación:";

#[must_use]
pub fn default_available_models() -> Vec<String> {
    vec![
        "openchat/openchat-7b:free".into(),
        "meta-llama/llama-2-13b-chat".into(),
    ]
}

/// Model named by a `cambiar modelo a <model>` command, matched case-insensitively.
fn parse_model_switch(input: &str) -> Option<&str> {
    let head = input.get(..MODEL_SWITCH_PREFIX.len())?;
    head.eq_ignore_ascii_case(MODEL_SWITCH_PREFIX)
        .then(|| input[MODEL_SWITCH_PREFIX.len()..].trim())
}

pub struct DialogueAgent<P: LlmProvider> {
    provider: P,
    conversations: Arc<ConversationStore>,
    available_models: Vec<String>,
    system_prompt: Option<String>,
    llm_timeout: Duration,
}

impl<P: LlmProvider> std::fmt::Debug for DialogueAgent<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueAgent")
            .field("model", &self.provider.model())
            .field("available_models", &self.available_models)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> DialogueAgent<P> {
    #[must_use]
    pub fn new(provider: P, conversations: Arc<ConversationStore>) -> Self {
        Self {
            provider,
            conversations,
            available_models: default_available_models(),
            system_prompt: None,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_available_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.is_empty()).then_some(prompt);
        self
    }

    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    #[must_use]
    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    #[must_use]
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        self.conversations.history(session_id)
    }

    pub fn clear_history(&self, session_id: &str) {
        self.conversations.clear(session_id);
    }

    /// The session's exchanges as `Tú:` / `Asistente:` lines under [`HISTORY_HEADER`].
    #[must_use]
    pub fn transcript(&self, session_id: &str) -> String {
        let turns = self.conversations.turns(session_id);
        if turns.is_empty() {
            return format!("{HISTORY_HEADER} (vacío)");
        }
        let mut out = String::from(HISTORY_HEADER);
        for turn in turns {
            out.push_str("\nTú: ");
            out.push_str(&turn.question);
            out.push_str("\nAsistente: ");
            out.push_str(&turn.answer);
        }
        out
    }

    #[must_use]
    pub fn greeting(&self) -> String {
        format!(
            "¡Hola! Soy tu asistente personal.\n\
             Estoy usando el modelo {}\n\
             Puedes cambiar el modelo en cualquier momento diciendo \
             'cambiar modelo a [nombre del modelo]'.\n\
             Modelos disponibles: {}\n\
             ¿En qué puedo ayudarte hoy?",
            self.model(),
            self.available_models.join(", ")
        )
    }

    /// Switch the chat model used by later turns. History is kept.
    pub fn change_model(&mut self, model: &str) -> String {
        let previous = self.provider.model().to_owned();
        self.provider.set_model(model);
        tracing::info!(from = %previous, to = %model, "model switched");
        format!("Modelo cambiado a {model}")
    }

    /// Handle one line of user input on `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Configuration` for a model switch without a model name, and
    /// `AgentError::Llm` if the chat call fails or times out. Failed turns are not recorded.
    pub async fn process_input(
        &mut self,
        input: &str,
        session_id: &str,
    ) -> Result<String, AgentError> {
        if let Some(model) = parse_model_switch(input) {
            if model.is_empty() {
                return Err(AgentError::Configuration(
                    "model name must not be empty".into(),
                ));
            }
            return Ok(self.change_model(model));
        }

        let history = self.conversations.history(session_id);
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::from_legacy(Role::System, prompt.as_str()));
        }
        messages.extend(history);
        messages.push(Message::from_legacy(Role::User, input));

        let span = tracing::info_span!("llm_call", model = %self.provider.model());
        let chat = self.provider.chat(&messages).instrument(span);
        let reply = match with_timeout("chat", self.llm_timeout, chat).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session_id, error = %e, "dialogue turn failed");
                return Err(e.into());
            }
        };

        self.conversations.commit(
            session_id,
            vec![
                Message::from_legacy(Role::User, input),
                Message::from_legacy(Role::Assistant, reply.as_str()),
            ],
        );
        Ok(reply)
    }
}
