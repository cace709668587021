/// Typed error for channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input source closed while a read was in flight.
    #[error("channel closed")]
    ChannelClosed,

    #[error("{0}")]
    Other(String),
}

/// Incoming message from a channel.
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    pub text: String,
}

/// Line-oriented conversation surface used by the chat and rag loops.
pub trait Channel: Send {
    /// Receive the next message. Returns `None` on EOF or when the user ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn recv(&mut self)
    -> impl Future<Output = Result<Option<ChannelMessage>, ChannelError>> + Send;

    /// Send an assistant reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Report a failed turn without ending the session. Defaults to a plain `send`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying I/O fails.
    fn send_error(&mut self, text: &str) -> impl Future<Output = Result<(), ChannelError>> + Send {
        self.send(text)
    }
}
