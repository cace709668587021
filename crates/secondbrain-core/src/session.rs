//! Read-answer loops that drive an agent over a [`Channel`] until the user leaves.

use secondbrain_llm::provider::LlmProvider;
use secondbrain_tools::executor::ToolExecutor;
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, AgentError};
use crate::channel::{Channel, ChannelMessage};
use crate::dialogue::{DialogueAgent, FAREWELL};

async fn next_message<C: Channel>(
    channel: &mut C,
    shutdown: &CancellationToken,
) -> Result<Option<ChannelMessage>, AgentError> {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => {
            tracing::info!("shutting down");
            Ok(None)
        }
        msg = channel.recv() => Ok(msg?),
    }
}

/// Greet, then answer each line on `session_id` until `exit`, end of input or `shutdown`.
/// Signs off with the farewell followed by the session transcript.
///
/// # Errors
///
/// Only channel I/O failures end the loop with an error. Failed turns are reported on the
/// channel and the loop continues.
pub async fn run_dialogue<P: LlmProvider, C: Channel>(
    agent: &mut DialogueAgent<P>,
    channel: &mut C,
    session_id: &str,
    shutdown: &CancellationToken,
) -> Result<(), AgentError> {
    channel.send(&agent.greeting()).await?;

    while let Some(msg) = next_message(channel, shutdown).await? {
        match agent.process_input(&msg.text, session_id).await {
            Ok(reply) => channel.send(&reply).await?,
            Err(e) => channel.send_error(&e.to_string()).await?,
        }
    }

    channel.send(FAREWELL).await?;
    channel.send(&agent.transcript(session_id)).await?;
    Ok(())
}

/// Answer each line as a question on `thread_id` until `exit`, end of input or cancellation
/// of the agent's token, then say goodbye.
///
/// # Errors
///
/// Only channel I/O failures end the loop with an error.
pub async fn run_agent<P: LlmProvider, T: ToolExecutor, C: Channel>(
    agent: &mut Agent<P, T>,
    channel: &mut C,
    thread_id: &str,
) -> Result<(), AgentError> {
    let shutdown = agent.cancel_token();

    while let Some(msg) = next_message(channel, &shutdown).await? {
        match agent.query(thread_id, &msg.text).await {
            Ok(answer) => channel.send(&answer).await?,
            Err(AgentError::Cancelled) => break,
            Err(e) => channel.send_error(&e.to_string()).await?,
        }
    }

    channel.send(FAREWELL).await?;
    Ok(())
}
