//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::{LogClientError, LogClientResult};
use crate::types::LogClientConfig;

use super::helpers::{backoff_ceiling, parse_retry_after, MAX_BACKOFF};

/// HTTP backend for making requests (holds reqwest client and config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) config: LogClientConfig,
}

impl HttpBackend {
    /// GET a text body.
    pub(crate) async fn get_text(&self, url: &str) -> LogClientResult<String> {
        let response = self.request(reqwest::Method::GET, url, None).await?;
        response
            .text()
            .await
            .map_err(|e| LogClientError::Network {
                message: format!("failed to read response body: {}", e),
            })
    }

    /// POST a JSON body and decode a JSON response.
    pub(crate) async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> LogClientResult<T> {
        let response = self
            .request(reqwest::Method::POST, url, Some(body))
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            debug!(url = %url, "empty response (204)");
            return serde_json::from_value(serde_json::Value::Array(Vec::new())).map_err(|e| {
                LogClientError::InvalidResponse {
                    message: format!("unexpected empty response: {}", e),
                }
            });
        }

        response
            .json()
            .await
            .map_err(|e| LogClientError::InvalidResponse {
                message: format!("failed to parse response: {}", e),
            })
    }

    /// Make a request, retrying transient failures with jittered backoff.
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> LogClientResult<reqwest::Response> {
        use rand::Rng;

        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            let result = self.request_once(method.clone(), url, body).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        LogClientError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(MAX_BACKOFF);
                            let base_ms = capped.as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff = backoff_ceiling(retries);
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying log request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> LogClientResult<reqwest::Response> {
        let mut request = self.client.request(method, url);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LogClientError::Timeout {
                    after: Duration::from_secs(self.config.timeout_secs),
                }
            } else {
                LogClientError::from(e)
            }
        })?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            404 => Err(LogClientError::NotFound {
                url: url.to_string(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);

                Err(LogClientError::RateLimited { retry_after })
            }

            400..=499 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(LogClientError::InvalidResponse {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(LogClientError::Network {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}
