//! Time-bounded description cache keyed by article URL.
//!
//! Entries expire lazily: a stale entry is ignored on read but stays in the
//! map until it is overwritten or [`DescriptionCache::purge_expired`] runs.
//! The cache lives for the whole process and is never persisted.
//!
//! Reads and writes go through [`DashMap`], so overlapping digest runs can
//! share one cache. A reader always sees a whole entry or none, and racing
//! writers resolve last-writer-wins.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How long an extracted description is trusted: six hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// A cached description and the instant it was captured.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub text: String,
    pub captured_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() < ttl
    }
}

#[derive(Debug)]
pub struct DescriptionCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl Default for DescriptionCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl DescriptionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached text for `link` if it is younger than the TTL.
    ///
    /// The key is matched exactly; no URL normalization happens.
    pub fn get(&self, link: &str) -> Option<String> {
        self.entries
            .get(link)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.text.clone())
    }

    /// Store `text` for `link`, replacing any previous entry.
    ///
    /// # Arguments
    ///
    /// * `link` - Article URL, used verbatim as the key
    /// * `text` - Extracted description
    ///
    /// Blank text is never stored so a failed extraction is retried on the
    /// next run instead of being pinned for a whole TTL.
    pub fn put(&self, link: &str, text: &str) {
        if text.trim().is_empty() {
            debug!(%link, "Refusing to cache empty description");
            return;
        }
        self.entries.insert(
            link.to_string(),
            CacheEntry {
                text: text.to_string(),
                captured_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every stale entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(self.ttl));
        let removed = before.saturating_sub(self.entries.len());
        debug!(removed, remaining = self.entries.len(), "Purged expired descriptions");
        removed
    }
}
