use std::time::Duration;

use minerva_core::{AppError, HttpConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

const USER_AGENT: &str = "Minerva/0.1 (oer-harvester)";

/// Builds the shared HTTP client with the configured timeout.
pub(crate) fn build_client(http: &HttpConfig) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(http.timeout)
        .build()
        .map_err(|e| AppError::ClientError(e.to_string()))
}

/// Maps a transport-level reqwest error onto the application taxonomy.
pub(crate) fn map_transport_error(e: reqwest::Error, http: &HttpConfig) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(http.timeout.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {}", e))
    } else {
        AppError::ClientError(e.to_string())
    }
}

/// Whether a failed attempt is worth repeating. Timeouts and server errors
/// are only retried for idempotent requests.
fn should_retry(err: &AppError, idempotent: bool) -> bool {
    match err {
        AppError::Timeout(_) | AppError::ClientError(_) => idempotent && err.is_retryable(),
        other => other.is_retryable(),
    }
}

/// Sends a request, retrying transient failures with backoff.
///
/// Retries on:
/// - Connect errors, and timeouts when `idempotent` is set
/// - Rate limiting (429), with exponential backoff
/// - Server errors (5xx), only when `idempotent` is set
///
/// `build` is called once per attempt since a `RequestBuilder` is consumed by `send`.
pub(crate) async fn send_with_retry<F>(
    build: F,
    http: &HttpConfig,
    idempotent: bool,
) -> Result<Response, AppError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = AppError::Generic("No attempts made".to_string());
    let base_ms = http.retry_base_delay.as_millis() as u64;

    for attempt in 1..=http.max_retries.max(1) {
        let more_attempts = attempt < http.max_retries;
        match build().send().await {
            Ok(resp) => {
                let status = resp.status();

                if status.is_success() {
                    return Ok(resp);
                }

                if status == StatusCode::TOO_MANY_REQUESTS {
                    last_error = AppError::RateLimitExceeded;
                    if should_retry(&last_error, idempotent) && more_attempts {
                        sleep(Duration::from_millis(base_ms * 2_u64.pow(attempt))).await;
                        continue;
                    }
                    return Err(last_error);
                }

                if status.is_server_error() {
                    last_error =
                        AppError::ClientError(format!("Server error: HTTP {}", status.as_u16()));
                    if should_retry(&last_error, idempotent) && more_attempts {
                        sleep(Duration::from_millis(base_ms * attempt as u64)).await;
                        continue;
                    }
                    return Err(last_error);
                }

                // Remaining 4xx are caller errors
                let url = resp.url().clone();
                let body = resp.text().await.unwrap_or_default();
                return Err(AppError::ClientError(format!(
                    "HTTP {} from {}: {}",
                    status.as_u16(),
                    url,
                    body.chars().take(200).collect::<String>()
                )));
            }
            Err(e) => {
                last_error = map_transport_error(e, http);
                if should_retry(&last_error, idempotent) && more_attempts {
                    sleep(Duration::from_millis(base_ms * attempt as u64)).await;
                    continue;
                }
                return Err(last_error);
            }
        }
    }

    Err(last_error)
}
