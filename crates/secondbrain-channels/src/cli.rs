use secondbrain_core::channel::{Channel, ChannelError, ChannelMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub const USER_PROMPT: &str = "Tú: ";
pub const ASSISTANT_PREFIX: &str = "Asistente: ";

type Reader = Box<dyn AsyncBufRead + Unpin + Send>;
type Writer = Box<dyn AsyncWrite + Unpin + Send>;

/// Line-per-turn terminal channel. `exit` (any case) or end of input closes it.
pub struct CliChannel {
    reader: Reader,
    writer: Writer,
    prompt: bool,
}

impl std::fmt::Debug for CliChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliChannel")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl CliChannel {
    /// Interactive channel over the process's stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::from_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).with_prompt(true)
    }

    /// Channel over arbitrary streams, without the input prompt.
    #[must_use]
    pub fn from_io(
        reader: impl AsyncBufRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            prompt: false,
        }
    }

    /// Print `Tú: ` before each read.
    #[must_use]
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ChannelError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for CliChannel {
    async fn recv(&mut self) -> Result<Option<ChannelMessage>, ChannelError> {
        loop {
            if self.prompt {
                self.writer.write_all(USER_PROMPT.as_bytes()).await?;
                self.writer.flush().await?;
            }

            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                tracing::debug!("stdin closed");
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") {
                return Ok(None);
            }
            return Ok(Some(ChannelMessage {
                text: trimmed.to_owned(),
            }));
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        self.write_line(&format!("{ASSISTANT_PREFIX}{text}")).await
    }

    async fn send_error(&mut self, text: &str) -> Result<(), ChannelError> {
        self.write_line(&format!("{ASSISTANT_PREFIX}[error] {text}"))
            .await
    }
}
