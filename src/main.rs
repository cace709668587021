use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use secondbrain_channels::CliChannel;
use secondbrain_core::config::{Config, resolve_config_path};
use secondbrain_core::vault::{EnvVaultProvider, Secret};
use secondbrain_core::{Agent, DialogueAgent, run_agent, run_dialogue};
use secondbrain_llm::openai::OpenAiProvider;
use secondbrain_memory::document::{DocumentError, SplitterConfig};
use secondbrain_memory::{ConversationStore, IngestionPipeline};
use tokio_util::sync::CancellationToken;

/// Personal assistant: free-form chat, or questions answered from one of your documents.
#[derive(Parser, Debug)]
#[command(name = "secondbrain", version, about, long_about = None)]
struct Cli {
    /// Config file (overrides `SECONDBRAIN_CONFIG`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat with the model; say `cambiar modelo a <model>` to switch models.
    Chat {
        #[arg(long, default_value = "default")]
        session: String,
    },
    /// Ingest a document and answer questions about it.
    Rag {
        file: Option<PathBuf>,
        #[arg(long, default_value = "default")]
        thread: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)?;
    config.resolve_secrets(&EnvVaultProvider).await?;
    config.validate()?;
    tracing::debug!(path = %config_path.display(), "configuration loaded");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        signal_token.cancel();
    });

    match cli.command {
        Command::Chat { session } => run_chat(&config, &session, shutdown).await,
        Command::Rag { file, thread } => run_rag(&config, file, &thread, shutdown).await,
    }
}

async fn run_chat(
    config: &Config,
    session: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let provider = create_chat_provider(config, &config.llm.model)?;
    let mut agent = DialogueAgent::new(provider, Arc::new(ConversationStore::new()))
        .with_available_models(config.llm.available_models.clone())
        .with_system_prompt(config.agent.dialogue_system_prompt.as_str())
        .with_llm_timeout(Duration::from_secs(config.timeouts.llm_seconds));

    tracing::info!(session, model = agent.model(), "starting chat");
    let mut channel = CliChannel::new();
    run_dialogue(&mut agent, &mut channel, session, &shutdown)
        .await
        .context("chat session ended unexpectedly")
}

async fn run_rag(
    config: &Config,
    file: Option<PathBuf>,
    thread: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let Some(path) = file else {
        return Err(DocumentError::Configuration(
            "rag needs the path of a document to ingest".into(),
        )
        .into());
    };

    let splitter = SplitterConfig {
        chunk_size: config.ingest.chunk_size,
        chunk_overlap: config.ingest.chunk_overlap,
    };
    let pipeline = IngestionPipeline::new(Arc::new(create_embedder(config)?), splitter)?
        .with_max_file_size(config.ingest.max_file_size)
        .with_retrieval_k(config.ingest.retrieval_k)
        .with_embed_timeout(Duration::from_secs(config.timeouts.embedding_seconds));

    let tool = pipeline
        .ingest(&path)
        .await
        .with_context(|| format!("failed to ingest {}", path.display()))?;

    let provider = create_chat_provider(config, &config.llm.rag_model)?;
    let mut agent = Agent::new(provider, tool, Arc::new(ConversationStore::new()))
        .with_system_prompt(config.agent.rag_system_prompt.as_str())
        .with_max_tool_iterations(config.agent.max_tool_iterations)
        .with_llm_timeout(Duration::from_secs(config.timeouts.llm_seconds))
        .with_cancel_token(shutdown);

    tracing::info!(
        thread,
        document = %path.display(),
        model = %config.llm.rag_model,
        "document ready, ask away"
    );
    let mut channel = CliChannel::new();
    run_agent(&mut agent, &mut channel, thread)
        .await
        .context("rag session ended unexpectedly")
}

fn require_key<'a>(key: Option<&'a Secret>, what: &str) -> anyhow::Result<&'a str> {
    match key {
        Some(secret) => Ok(secret.expose()),
        None => bail!(
            "no {what} API key: set OPENROUTER_API_KEY or SECONDBRAIN_LLM_API_KEY \
             (SECONDBRAIN_EMBEDDING_API_KEY for a separate embedding key)"
        ),
    }
}

fn create_chat_provider(config: &Config, model: &str) -> anyhow::Result<OpenAiProvider> {
    let key = require_key(config.secrets.llm_api_key.as_ref(), "chat")?;
    let mut provider = OpenAiProvider::new(
        key.to_owned(),
        config.llm.base_url.clone(),
        model.to_owned(),
        config.llm.max_tokens,
        None,
    )
    .context("failed to build chat provider")?
    .with_max_retries(config.llm.max_retries);
    if let Some(temperature) = config.llm.temperature {
        provider = provider.with_temperature(temperature);
    }
    Ok(provider)
}

fn create_embedder(config: &Config) -> anyhow::Result<OpenAiProvider> {
    let key = require_key(config.secrets.embedding_api_key.as_ref(), "embedding")?;
    let provider = OpenAiProvider::new(
        key.to_owned(),
        config.embedding.base_url.clone(),
        config.embedding.model.clone(),
        config.llm.max_tokens,
        Some(config.embedding.model.clone()),
    )
    .context("failed to build embedding provider")?
    .with_name("embeddings")
    .with_max_retries(config.llm.max_retries);
    Ok(provider)
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
