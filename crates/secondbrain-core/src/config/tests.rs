use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use serial_test::serial;

use super::*;
use crate::vault::Secret;

const ENV_KEYS: [&str; 19] = [
    "SECONDBRAIN_CONFIG",
    "SECONDBRAIN_MAX_TOOL_ITERATIONS",
    "SECONDBRAIN_LLM_BASE_URL",
    "SECONDBRAIN_LLM_MODEL",
    "SECONDBRAIN_LLM_RAG_MODEL",
    "SECONDBRAIN_LLM_MAX_TOKENS",
    "SECONDBRAIN_LLM_MAX_RETRIES",
    "SECONDBRAIN_LLM_AVAILABLE_MODELS",
    "SECONDBRAIN_EMBEDDING_BASE_URL",
    "SECONDBRAIN_EMBEDDING_MODEL",
    "SECONDBRAIN_CHUNK_SIZE",
    "SECONDBRAIN_CHUNK_OVERLAP",
    "SECONDBRAIN_RETRIEVAL_K",
    "SECONDBRAIN_MAX_FILE_SIZE",
    "SECONDBRAIN_TIMEOUT_LLM",
    "SECONDBRAIN_TIMEOUT_EMBEDDING",
    "SECONDBRAIN_LLM_API_KEY",
    "SECONDBRAIN_EMBEDDING_API_KEY",
    "OPENROUTER_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

struct MapVault(HashMap<&'static str, &'static str>);

impl VaultProvider for MapVault {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let value = self.0.get(key).map(|v| (*v).to_owned());
        Box::pin(async move { Ok(value) })
    }
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.agent.max_tool_iterations, 10);
    assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.llm.model, "openchat/openchat-7b:free");
    assert_eq!(config.llm.max_retries, 2);
    assert_eq!(
        config.llm.available_models,
        ["openchat/openchat-7b:free", "meta-llama/llama-2-13b-chat"]
    );
    assert_eq!(config.ingest.chunk_size, 1000);
    assert_eq!(config.ingest.chunk_overlap, 200);
    assert_eq!(config.ingest.retrieval_k, 4);
    assert_eq!(config.ingest.max_file_size, 50 * 1024 * 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn shipped_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let content = std::fs::read_to_string(path).unwrap();
    let shipped: Config = toml::from_str(&content).unwrap();
    assert_eq!(
        toml::Value::try_from(&shipped).unwrap(),
        toml::Value::try_from(Config::default()).unwrap()
    );
    assert!(!content.contains("name ="));
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/secondbrain.toml")).unwrap();
    assert_eq!(config.ingest.chunk_size, 1000);
    assert_eq!(config.timeouts.llm_seconds, 120);
}

#[test]
#[serial]
fn partial_file_keeps_other_defaults() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[llm]
model = "meta-llama/llama-2-13b-chat"

[ingest]
chunk_size = 500
chunk_overlap = 50
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.model, "meta-llama/llama-2-13b-chat");
    assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
    assert_eq!(config.ingest.chunk_size, 500);
    assert_eq!(config.ingest.chunk_overlap, 50);
    assert_eq!(config.ingest.retrieval_k, 4);
    assert_eq!(config.agent.max_tool_iterations, 10);
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[ingest\nchunk_size = ").unwrap();
    let err = Config::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[llm]\nmodel = \"from-file\"\n").unwrap();

    unsafe { std::env::set_var("SECONDBRAIN_LLM_MODEL", "from-env") };
    unsafe { std::env::set_var("SECONDBRAIN_CHUNK_SIZE", "321") };
    unsafe { std::env::set_var("SECONDBRAIN_TIMEOUT_EMBEDDING", "7") };
    unsafe { std::env::set_var("SECONDBRAIN_LLM_AVAILABLE_MODELS", "a, b,,c") };
    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.llm.model, "from-env");
    assert_eq!(config.ingest.chunk_size, 321);
    assert_eq!(config.timeouts.embedding_seconds, 7);
    assert_eq!(config.llm.available_models, ["a", "b", "c"]);
}

#[test]
#[serial]
fn unparsable_env_values_are_ignored() {
    clear_env();
    unsafe { std::env::set_var("SECONDBRAIN_RETRIEVAL_K", "many") };
    let config = Config::load(Path::new("/nonexistent/secondbrain.toml")).unwrap();
    clear_env();
    assert_eq!(config.ingest.retrieval_k, 4);
}

#[test]
fn validate_rejects_overlap_not_smaller_than_size() {
    let mut config = Config::default();
    config.ingest.chunk_overlap = config.ingest.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_zero_iterations_and_k() {
    let mut config = Config::default();
    config.agent.max_tool_iterations = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.ingest.retrieval_k = 0;
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn secrets_prefer_specific_keys() {
    let vault = MapVault(HashMap::from([
        ("OPENROUTER_API_KEY", "router-key"),
        ("SECONDBRAIN_LLM_API_KEY", "llm-key"),
        ("SECONDBRAIN_EMBEDDING_API_KEY", "embed-key"),
    ]));
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(config.secrets.llm_api_key.unwrap().expose(), "llm-key");
    assert_eq!(
        config.secrets.embedding_api_key.unwrap().expose(),
        "embed-key"
    );
}

#[tokio::test]
async fn embedding_key_falls_back_to_chat_key() {
    let vault = MapVault(HashMap::from([("OPENROUTER_API_KEY", "router-key")]));
    let mut config = Config::default();
    config.resolve_secrets(&vault).await.unwrap();
    assert_eq!(config.secrets.llm_api_key.unwrap().expose(), "router-key");
    assert_eq!(
        config.secrets.embedding_api_key.unwrap().expose(),
        "router-key"
    );
}

#[tokio::test]
async fn secrets_absent_when_vault_empty() {
    let mut config = Config::default();
    config
        .resolve_secrets(&MapVault(HashMap::new()))
        .await
        .unwrap();
    assert!(config.secrets.llm_api_key.is_none());
    assert!(config.secrets.embedding_api_key.is_none());
}

#[test]
#[serial]
fn config_path_resolution_order() {
    clear_env();
    assert_eq!(resolve_config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
    unsafe { std::env::set_var("SECONDBRAIN_CONFIG", "/etc/sb.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/sb.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("local.toml"))),
        PathBuf::from("local.toml")
    );
    clear_env();
}

#[test]
fn debug_output_redacts_secrets() {
    let mut config = Config::default();
    config.secrets.llm_api_key = Some(Secret::new("sk-should-not-appear"));
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-should-not-appear"));
    assert!(debug.contains("[REDACTED]"));
}
