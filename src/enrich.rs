//! Enrichment of shortlisted feed entries with page descriptions.
//!
//! Entries are processed strictly one after another:
//!
//! 1. An entry without a link gets an empty description, no network access.
//! 2. A fresh cache hit is used as-is, no network access.
//! 3. Otherwise the page is fetched and run through the extractor; a
//!    non-empty result is cached.
//! 4. After every attempted fetch, successful or not, the loop waits for the
//!    pacing delay before moving on. Cache hits and link-less entries skip it.
//!
//! A failing article is logged and yields an empty description. Nothing in
//! this module returns an error, so one bad page never sinks the digest.

use crate::cache::DescriptionCache;
use crate::extract::DescriptionExtractor;
use crate::fetch::ArticleFetcher;
use crate::models::{FeedEntry, NewsItem};
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Gap between consecutive article fetches.
pub const DEFAULT_PACING: Duration = Duration::from_millis(250);

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoLink,
    CacheHit,
    Extracted,
    /// Fetched, but the page had no usable meta description.
    Missing,
    Failed,
}

impl Outcome {
    fn fetched(self) -> bool {
        matches!(self, Outcome::Extracted | Outcome::Missing | Outcome::Failed)
    }
}

/// Drives fetch, extract and cache for a shortlist.
#[derive(Debug)]
pub struct Enricher<F, E> {
    fetcher: F,
    extractor: E,
    cache: Arc<DescriptionCache>,
    pacing: Duration,
}

impl<F, E> Enricher<F, E>
where
    F: ArticleFetcher,
    E: DescriptionExtractor,
{
    pub fn new(fetcher: F, extractor: E, cache: Arc<DescriptionCache>) -> Self {
        Self {
            fetcher,
            extractor,
            cache,
            pacing: DEFAULT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn cache(&self) -> &Arc<DescriptionCache> {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Enrich `entries` in order.
    ///
    /// # Arguments
    ///
    /// * `entries` - The shortlist, already ordered and deduplicated
    ///
    /// # Returns
    ///
    /// One [`NewsItem`] per entry, in the same order. Entries whose page could
    /// not be fetched or had no description carry an empty description.
    #[instrument(level = "info", skip_all, fields(count = entries.len()))]
    pub async fn enrich(&self, entries: Vec<FeedEntry>) -> Vec<NewsItem> {
        let t0 = Instant::now();

        let results: Vec<(NewsItem, Outcome)> = stream::iter(entries)
            .then(|entry| async move {
                let (description, outcome) = self.describe(&entry.link).await;
                (entry.into_news_item(description), outcome)
            })
            .collect()
            .await;

        let count = |wanted: Outcome| results.iter().filter(|(_, o)| *o == wanted).count();
        info!(
            items = results.len(),
            cache_hits = count(Outcome::CacheHit),
            extracted = count(Outcome::Extracted),
            missing = count(Outcome::Missing),
            failed = count(Outcome::Failed),
            no_link = count(Outcome::NoLink),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Enrichment complete"
        );

        results.into_iter().map(|(item, _)| item).collect()
    }

    /// Resolve the description for a single link.
    async fn describe(&self, link: &str) -> (String, Outcome) {
        if link.is_empty() {
            return (String::new(), Outcome::NoLink);
        }

        if let Some(text) = self.cache.get(link) {
            debug!(%link, "Description cache hit");
            return (text, Outcome::CacheHit);
        }

        let result = match self.fetcher.fetch(link).await {
            Ok(html) => {
                let description = self.extractor.extract(&html);
                if description.is_empty() {
                    debug!(%link, "Page has no meta description");
                    (description, Outcome::Missing)
                } else {
                    debug!(
                        %link,
                        description = %truncate_for_log(&description, 80),
                        "Extracted description"
                    );
                    self.cache.put(link, &description);
                    (description, Outcome::Extracted)
                }
            }
            Err(e) => {
                warn!(%link, error = %e, "Article enrichment failed; leaving description empty");
                (String::new(), Outcome::Failed)
            }
        };

        if result.1.fetched() && !self.pacing.is_zero() {
            sleep(self.pacing).await;
        }
        result
    }
}
