//! `GraphClient` — thin `reqwest` wrapper with bounded 429/Retry-After
//! retry, grounded on `lnxdrive-graph/src/client.rs`'s `execute_with_retry`
//! but without the teacher's `AdaptiveRateLimiter`/`TokenBucket` proactive
//! throttling, which has no counterpart in this service's scope (reactive
//! 429 handling only, per the Open Question 1 decision in DESIGN.md).

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{info, warn};

use crate::error::GraphError;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Parses a `Retry-After` header value, tried as integer seconds first then
/// as an RFC2822 HTTP-date; falls back to `default` if neither parses or the
/// date is already past.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Ok(secs) = u64::try_from(target.signed_duration_since(now).num_seconds()) {
                if secs <= 3600 {
                    return Duration::from_secs(secs);
                }
            }
        }
    }

    warn!(value, "could not parse Retry-After header, using default");
    default
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.saturating_pow(attempt))
}

#[derive(Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    max_retries: u32,
}

impl GraphClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: crate::url::BASE_URL.to_string(),
            access_token: access_token.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds an authenticated request against an absolute URL (callers
    /// pass fully-built Graph URLs assembled by `GraphMailUrlBuilder`).
    fn request_absolute(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.access_token)
    }

    /// Sends a request, retrying on HTTP 429 up to `max_retries` times. The
    /// `Retry-After` header is honored when present; otherwise the retry
    /// delay is an exponential backoff (`500ms * 2^attempt`).
    pub async fn execute_with_retry(&self, method: Method, url: &str) -> Result<Response, GraphError> {
        for attempt in 0..=self.max_retries {
            let response = self
                .request_absolute(method.clone(), url)
                .send()
                .await
                .map_err(|e| GraphError::RequestFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(GraphError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt + 1,
                    });
                }

                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                    .unwrap_or_else(|| backoff_for_attempt(attempt));

                info!(url, attempt, retry_after_ms = retry_after.as_millis(), "received 429, backing off");
                tokio::time::sleep(retry_after).await;
                continue;
            }

            if attempt > 0 {
                info!(url, attempt, "request succeeded after retry");
            }
            return Ok(response);
        }

        unreachable!("retry loop always returns before exhausting its range")
    }

    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, GraphError> {
        let response = self.execute_with_retry(Method::GET, url).await?;
        self.parse_response(url, response).await
    }

    pub async fn post_json(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, GraphError> {
        let response = self
            .request_absolute(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.parse_response(url, response).await
    }

    async fn parse_response(&self, url: &str, response: Response) -> Result<serde_json::Value, GraphError> {
        let status = response.status();
        if !status.is_success() {
            let body: String = response.text().await.unwrap_or_default().chars().take(512).collect();
            return Err(GraphError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body_prefix: body,
            });
        }
        response.json().await.map_err(|e| GraphError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_retry_after_reads_integer_seconds() {
        assert_eq!(parse_retry_after("12", DEFAULT_RETRY_AFTER), Duration::from_secs(12));
    }

    #[test]
    fn parse_retry_after_falls_back_on_garbage() {
        assert_eq!(parse_retry_after("not-a-number", DEFAULT_RETRY_AFTER), DEFAULT_RETRY_AFTER);
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        assert_eq!(backoff_for_attempt(0), Duration::from_millis(500));
        assert_eq!(backoff_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(backoff_for_attempt(2), Duration::from_millis(2000));
    }
}
