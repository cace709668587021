use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const BASE_BACKOFF_SECS: u64 = 1;
const MAX_BACKOFF_SECS: u64 = 30;

/// Delay before the next attempt: `Retry-After` seconds if the server sent one, otherwise
/// exponential backoff capped at 30s.
pub(crate) fn retry_delay(response: Option<&reqwest::Response>, attempt: u32) -> Duration {
    if let Some(response) = response
        && let Some(val) = response.headers().get(reqwest::header::RETRY_AFTER)
        && let Ok(s) = val.to_str()
        && let Ok(secs) = s.trim().parse::<u64>()
    {
        return Duration::from_secs(secs.min(MAX_BACKOFF_SECS));
    }
    backoff(attempt)
}

fn backoff(attempt: u32) -> Duration {
    let secs = BASE_BACKOFF_SECS
        .checked_shl(attempt)
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    Duration::from_secs(secs)
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Send an HTTP request, retrying up to `max_retries` times on 429, 5xx and transient
/// transport failures.
///
/// `f` builds and sends a fresh request on every attempt. A 5xx on the final attempt is
/// returned to the caller so it can report the status; a 429 on the final attempt becomes
/// `LlmError::RateLimited`.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` when rate limiting outlasts the retries, or
/// `LlmError::Http` for transport errors that are not transient or persist.
pub(crate) async fn send_with_retry<F, Fut>(
    provider_name: &str,
    max_retries: u32,
    mut f: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let response = match f().await {
            Ok(response) => response,
            Err(e) if attempt < max_retries && is_transient(&e) => {
                let delay = retry_delay(None, attempt);
                attempt += 1;
                tracing::warn!(
                    provider = provider_name,
                    error = %e,
                    "request failed, retrying in {}s ({attempt}/{max_retries})",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            Err(e) => return Err(LlmError::Http(e)),
        };

        let status = response.status();
        let retryable =
            status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
        if !retryable {
            return Ok(response);
        }
        if attempt >= max_retries {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Ok(response);
        }

        let delay = retry_delay(Some(&response), attempt);
        attempt += 1;
        tracing::warn!(
            provider = provider_name,
            status = status.as_u16(),
            "retrying in {}s ({attempt}/{max_retries})",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn get(server: &MockServer, max_retries: u32) -> Result<reqwest::Response, LlmError> {
        let client = reqwest::Client::new();
        let url = format!("{}/test", server.uri());
        send_with_retry("test", max_retries, || client.get(&url).send()).await
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let response = get(&server, 3).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn exhausted_rate_limit_returns_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .expect(2)
            .mount(&server)
            .await;

        let result = get(&server, 1).await;
        assert!(
            matches!(result, Err(LlmError::RateLimited)),
            "expected RateLimited, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn succeeds_after_one_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = get(&server, 2).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn server_error_is_retried_then_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let response = get(&server, 2).await.unwrap();
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let response = get(&server, 2).await.unwrap();
        assert_eq!(response.status(), 401);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff(0), Duration::from_secs(1));
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(10), Duration::from_secs(MAX_BACKOFF_SECS));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn backoff_stays_bounded(attempt in 0u32..200) {
            let delay = backoff(attempt);
            prop_assert!(delay.as_secs() >= BASE_BACKOFF_SECS);
            prop_assert!(delay.as_secs() <= MAX_BACKOFF_SECS);
        }
    }
}
