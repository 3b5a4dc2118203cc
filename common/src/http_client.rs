use crate::errors::AppError;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument};

/// Timeout-bounded JSON HTTP client.
///
/// Deliberately single-attempt: retry policy belongs to callers, and the
/// forecast path must never retry on its own. Transport failures, timeouts
/// and non-2xx statuses map to [`AppError::UpstreamUnavailable`]; a body
/// that fails to deserialize maps to [`AppError::MalformedResponse`].
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Fetch JSON from a URL with a bounded timeout. One attempt, no retry.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T>(&self, url: &str) -> Result<T, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| AppError::upstream(format!("request to {} timed out", url)))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::upstream(format!("request to {} timed out", url))
                } else {
                    AppError::upstream(format!("request to {} failed: {}", url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::upstream(format!("failed reading body from {}: {}", url, e)))?;
        let json: T = serde_json::from_str(&text)
            .map_err(|e| AppError::malformed(format!("unexpected response body: {}", e)))?;

        info!("Request successful");
        Ok(json)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(10)
    }
}
