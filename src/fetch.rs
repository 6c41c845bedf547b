//! Article page retrieval.
//!
//! [`ArticleFetcher`] is the seam the orchestrator fetches through, so tests
//! can count and fail requests without a network. [`HttpArticleFetcher`] is
//! the production implementation on top of `reqwest`.

use crate::error::ArticleFetchError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use std::time::Instant;
use tracing::{debug, instrument};

/// Identifies this client to article hosts.
pub const DEFAULT_ARTICLE_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; MetaDigestHtmlFetcher/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const ARTICLE_ACCEPT: &str = "text/html,application/xhtml+xml,*/*";

/// Capability: download an article page as text.
pub trait ArticleFetcher {
    /// Fetch `url` and return the response body.
    ///
    /// Network failures and non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String, ArticleFetchError>;
}

/// `reqwest`-backed fetcher.
///
/// Sends a descriptive `User-Agent` and an HTML `Accept` header, follows up to
/// ten redirects, and relies on the client defaults for timeouts.
#[derive(Debug, Clone)]
pub struct HttpArticleFetcher {
    client: Client,
}

impl HttpArticleFetcher {
    /// Build a fetcher with its own client.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Sent as the `User-Agent` header on every request
    ///
    /// # Returns
    ///
    /// The fetcher, or an error if the TLS backend cannot be initialised.
    pub fn new(user_agent: &str) -> Result<Self, ArticleFetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ARTICLE_ACCEPT));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl ArticleFetcher for HttpArticleFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, ArticleFetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArticleFetchError::Status { status });
        }

        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched article page"
        );
        Ok(body)
    }
}
