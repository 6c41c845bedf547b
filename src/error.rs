//! Error types for the digest pipeline.
//!
//! Only [`FeedError`] ever crosses the public [`crate::NewsDigest::latest`]
//! boundary. [`ArticleFetchError`] is recovered inside the enrichment loop and
//! degrades to an empty description; a missing meta tag is not an error at all.

use reqwest::StatusCode;
use thiserror::Error;

/// The feed could not be acquired: unreachable, timed out, or unparseable.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed returned HTTP {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("failed to parse feed: {0}")]
    Parse(String),
}

/// A single article page could not be retrieved.
#[derive(Debug, Error)]
pub enum ArticleFetchError {
    #[error("article request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("article returned HTTP {status}")]
    Status { status: StatusCode },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid feed url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
