//! Page fetching against the source website.
//!
//! This module provides [`PageFetcher`], a thin HTTP client used for listing
//! pages, item pages, and the advisory image HEAD probe. All requests carry
//! per-request timeouts; nothing here retries. The fetcher also owns the
//! politeness delays imposed between successive requests to the source site
//! (downstream API calls are not throttled).

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{Result, VernissageError};

/// HTTP client configuration for fetching source-site pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Page request timeout in seconds.
    pub timeout: u64,
    /// Timeout for the advisory image HEAD probe, in seconds.
    pub probe_timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
    /// Delay between successive listing-page fetches.
    pub page_delay: Duration,
    /// Delay between successive item fetches.
    pub item_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            probe_timeout: 5,
            user_agent: "Mozilla/5.0 (compatible; Vernissage/1.0; +https://github.com/stormlightlabs/vernissage)"
                .to_string(),
            page_delay: Duration::from_millis(500),
            item_delay: Duration::from_millis(300),
        }
    }
}

/// HTTP client for source-site pages.
///
/// Reuses one connection pool for all page fetches of a run.
pub struct PageFetcher {
    client: Client,
    config: FetchConfig,
}

impl PageFetcher {
    /// Builds a fetcher from the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(VernissageError::HttpError)?;

        Ok(Self { client, config })
    }

    /// Fetches a page and returns the response body as text.
    ///
    /// Non-success status codes are errors; timeouts are mapped to
    /// [`VernissageError::Timeout`].
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.config.user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VernissageError::Timeout { timeout: self.config.timeout }
                } else {
                    VernissageError::HttpError(e)
                }
            })?
            .error_for_status()?;

        let content = response.text().await?;

        Ok(content)
    }

    /// Issues a metadata-only HEAD request and returns the declared
    /// content length, if the server reports one.
    ///
    /// The probe is advisory: any error (network, timeout, missing header,
    /// unparsable value) yields `None` and the caller accepts the image.
    pub async fn head_content_length(&self, url: &Url) -> Option<u64> {
        let response = self
            .client
            .head(url.clone())
            .header("User-Agent", &self.config.user_agent)
            .timeout(Duration::from_secs(self.config.probe_timeout))
            .send()
            .await
            .ok()?;

        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .parse::<u64>()
            .ok()
    }

    /// Sleeps the configured delay between listing-page fetches.
    pub async fn page_pause(&self) {
        tokio::time::sleep(self.config.page_delay).await;
    }

    /// Sleeps the configured delay between item fetches.
    pub async fn item_pause(&self) {
        tokio::time::sleep(self.config.item_delay).await;
    }

    /// The configured page timeout, for diagnostics.
    pub fn timeout(&self) -> u64 {
        self.config.timeout
    }
}
