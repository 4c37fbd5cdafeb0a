//! Throttled HTTP client for the Indico export API.
//!
//! Every request goes through a fixed inter-request delay and a bounded
//! retry policy. Client errors (4xx) are permanent; server errors and
//! transport failures are retried with exponential backoff.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use indicoharvest_shared::{HarvestConfig, HarvestError, Result, RetryPolicy};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("indicoharvest/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one Indico server.
pub struct IndicoClient {
    client: Client,
    base_url: Url,
    delay: Duration,
    timeout: Duration,
    download_timeout: Duration,
    retry: RetryPolicy,
}

impl IndicoClient {
    /// Build a client from the harvest configuration.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| HarvestError::config(format!("invalid base URL '{}': {e}", config.base_url)))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| HarvestError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            delay: config.request_delay,
            timeout: config.timeout,
            download_timeout: config.download_timeout,
            retry: config.retry,
        })
    }

    /// The server origin this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Event export endpoint with contribution detail.
    pub fn export_url(&self, event_id: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("export/event/{event_id}.json"))
            .map_err(|e| HarvestError::config(format!("invalid event id '{event_id}': {e}")))?;
        url.set_query(Some("detail=contributions"));
        Ok(url)
    }

    /// Resolve a possibly-relative href against the server origin.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        Url::parse(href)
            .or_else(|_| self.base_url.join(href))
            .map_err(|e| HarvestError::validation(format!("invalid URL '{href}': {e}")))
    }

    /// GET an API endpoint (listing timeout).
    pub async fn get_api(&self, url: &Url) -> Result<reqwest::Response> {
        self.get_with_retry(url, self.timeout).await
    }

    /// GET an attachment (download timeout).
    pub async fn get_download(&self, url: &Url) -> Result<reqwest::Response> {
        self.get_with_retry(url, self.download_timeout).await
    }

    async fn get_with_retry(&self, url: &Url, timeout: Duration) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            // Self-throttle: fixed delay before every outgoing request.
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }

            debug!(%url, attempt, "GET");
            match self.try_get(url, timeout).await {
                Ok(response) => return Ok(response),
                Err((transient, message)) => {
                    if transient && attempt < self.retry.max_attempts {
                        let backoff = self.retry.delay_after(attempt);
                        warn!(
                            %url,
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %message,
                            "request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(HarvestError::Fetch(message));
                }
            }
        }
    }

    /// Single attempt. The bool in the error marks transient failures.
    async fn try_get(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> std::result::Result<reqwest::Response, (bool, String)> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| (true, format!("{url}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err((status.is_server_error(), format!("{url}: HTTP {status}")))
        }
    }
}
