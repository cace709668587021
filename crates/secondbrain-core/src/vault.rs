use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

/// API key or other credential. Never printed: `Debug` and `Display` both redact.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Pluggable secret retrieval backend.
pub trait VaultProvider: Send + Sync {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>>;
}

/// First of `keys` that the vault knows, in order.
///
/// # Errors
///
/// Returns the first backend error; later keys are not consulted.
pub async fn first_secret(
    vault: &dyn VaultProvider,
    keys: &[&str],
) -> anyhow::Result<Option<Secret>> {
    for key in keys {
        if let Some(value) = vault.get_secret(key).await? {
            tracing::debug!(key, "secret resolved");
            return Ok(Some(Secret::new(value)));
        }
    }
    Ok(None)
}

/// Reads secrets from environment variables. Empty values count as unset.
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move { Ok(std::env::var(&key).ok().filter(|v| !v.trim().is_empty())) })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn secret_is_redacted() {
        let s = Secret::new("sk-live-123");
        assert_eq!(format!("{s:?}"), "[REDACTED]");
        assert_eq!(format!("{s}"), "[REDACTED]");
        assert_eq!(s.expose(), "sk-live-123");
    }

    #[tokio::test]
    #[serial]
    async fn first_secret_follows_key_order() {
        unsafe { std::env::set_var("SECONDBRAIN_TEST_SECOND", "two") };
        let found = first_secret(
            &EnvVaultProvider,
            &["SECONDBRAIN_TEST_FIRST", "SECONDBRAIN_TEST_SECOND"],
        )
        .await
        .unwrap();
        unsafe { std::env::remove_var("SECONDBRAIN_TEST_SECOND") };
        assert_eq!(found.unwrap().expose(), "two");

        let none = first_secret(&EnvVaultProvider, &["SECONDBRAIN_TEST_FIRST"])
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn secret_deserializes_transparently() {
        let s: Secret = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s.expose(), "abc");
    }

    #[tokio::test]
    #[serial]
    async fn env_vault_reads_and_skips_blank() {
        unsafe { std::env::set_var("SECONDBRAIN_TEST_VAULT_KEY", "value") };
        unsafe { std::env::set_var("SECONDBRAIN_TEST_VAULT_BLANK", "  ") };
        let vault = EnvVaultProvider;
        assert_eq!(
            vault.get_secret("SECONDBRAIN_TEST_VAULT_KEY").await.unwrap(),
            Some("value".into())
        );
        assert!(
            vault
                .get_secret("SECONDBRAIN_TEST_VAULT_BLANK")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            vault
                .get_secret("SECONDBRAIN_TEST_VAULT_MISSING")
                .await
                .unwrap()
                .is_none()
        );
        unsafe { std::env::remove_var("SECONDBRAIN_TEST_VAULT_KEY") };
        unsafe { std::env::remove_var("SECONDBRAIN_TEST_VAULT_BLANK") };
    }
}
