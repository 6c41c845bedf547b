//! The public digest operation.
//!
//! [`NewsDigest::latest`] fetches the feed, shortlists the most recent
//! entries and enriches them. The cache is handed in at construction so a
//! host creates it once per process and every run shares it.

use crate::cache::DescriptionCache;
use crate::config::DigestConfig;
use crate::enrich::Enricher;
use crate::error::FeedError;
use crate::extract::{AnyExtractor, DescriptionExtractor};
use crate::feed::{FeedSource, HttpFeedSource};
use crate::fetch::{ArticleFetcher, HttpArticleFetcher};
use crate::models::NewsResponse;
use crate::selector::{DEFAULT_LIMIT, select_recent};
use std::error::Error;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct NewsDigest<S, F, E> {
    feed: S,
    enricher: Enricher<F, E>,
    limit: usize,
}

impl<S, F, E> NewsDigest<S, F, E>
where
    S: FeedSource,
    F: ArticleFetcher,
    E: DescriptionExtractor,
{
    pub fn new(feed: S, enricher: Enricher<F, E>) -> Self {
        Self {
            feed,
            enricher,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn enricher(&self) -> &Enricher<F, E> {
        &self.enricher
    }

    /// Build the current digest.
    ///
    /// Fetches the feed, keeps the `limit` most recent distinct entries and
    /// fills in their descriptions from the cache or the article pages.
    ///
    /// # Returns
    ///
    /// A [`NewsResponse`] with at most `limit` items, newest first.
    ///
    /// # Errors
    ///
    /// Only a failure to acquire or parse the feed is returned as an error;
    /// article-level problems show up as empty descriptions.
    #[instrument(level = "info", skip_all, fields(limit = self.limit))]
    pub async fn latest(&self) -> Result<NewsResponse, FeedError> {
        let raw = self.feed.fetch_items().await?;
        let total = raw.len();

        let shortlist = select_recent(raw, self.limit);
        info!(total, shortlisted = shortlist.len(), "Shortlisted feed entries");

        let items = self.enricher.enrich(shortlist).await;
        Ok(NewsResponse { items })
    }
}

/// The digest as wired for production use.
pub type HttpNewsDigest = NewsDigest<HttpFeedSource, HttpArticleFetcher, AnyExtractor>;

impl HttpNewsDigest {
    /// Wire HTTP feed and article clients from `config` around `cache`.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated settings for URLs, limits, pacing and extractor
    /// * `cache` - Shared description cache, reused across every run
    pub fn from_config(
        config: &DigestConfig,
        cache: Arc<DescriptionCache>,
    ) -> Result<Self, Box<dyn Error>> {
        let feed = HttpFeedSource::new(
            &config.feed_url,
            &config.feed_user_agent,
            config.feed_timeout(),
        )?;
        let fetcher = HttpArticleFetcher::new(&config.article_user_agent)?;
        let enricher = Enricher::new(fetcher, AnyExtractor::from(config.extractor), cache)
            .with_pacing(config.pacing());

        Ok(NewsDigest::new(feed, enricher).with_limit(config.limit))
    }
}
