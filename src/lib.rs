//! # Meta Digest
//!
//! Builds a small news digest from a syndication feed. The feed carries no
//! usable description, so each of the most recent entries is enriched with
//! the `og:description` (or `description`) meta tag of its article page.
//!
//! ## Pipeline
//!
//! 1. **Feed**: [`feed::FeedSource`] yields raw items
//! 2. **Selection**: [`selector::select_recent`] keeps the newest N (default 5)
//! 3. **Enrichment**: [`enrich::Enricher`] fetches pages one at a time with a
//!    250 ms gap, extracting descriptions and caching them for six hours
//! 4. **Result**: [`models::NewsResponse`] with one item per shortlisted entry
//!
//! Only a feed failure is an error. A broken article leaves its description
//! empty and the rest of the digest intact.
//!
//! ## Usage
//!
//! ```no_run
//! use meta_digest::{DescriptionCache, DigestConfig, HttpNewsDigest};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(DescriptionCache::default());
//! let digest = HttpNewsDigest::from_config(&DigestConfig::default(), cache)?;
//! let response = digest.latest().await?;
//! for item in &response.items {
//!     println!("{} - {}", item.title, item.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod digest;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod selector;
mod utils;

pub use cache::DescriptionCache;
pub use config::DigestConfig;
pub use digest::{HttpNewsDigest, NewsDigest};
pub use enrich::Enricher;
pub use error::{ArticleFetchError, ConfigError, FeedError};
pub use extract::{DescriptionExtractor, HtmlDocumentExtractor, MetaTagExtractor};
pub use feed::{FeedSource, HttpFeedSource};
pub use fetch::{ArticleFetcher, HttpArticleFetcher};
pub use models::{NewsItem, NewsResponse};
