//! Runtime configuration.
//!
//! Settings come from built-in defaults, optionally overlaid by a YAML file,
//! and finally by the binary's command-line flags and environment variables.
//! Every field is optional in the file:
//!
//! ```yaml
//! feed_url: https://news.yahoo.co.jp/rss/topics/top-picks.xml
//! limit: 5
//! description_ttl_secs: 21600
//! pacing_ms: 250
//! feed_timeout_secs: 10
//! extractor: meta_tag   # or html_document
//! ```

use crate::cache::DEFAULT_TTL;
use crate::enrich::DEFAULT_PACING;
use crate::error::ConfigError;
use crate::extract::ExtractorKind;
use crate::feed::{DEFAULT_FEED_TIMEOUT, DEFAULT_FEED_URL, DEFAULT_FEED_USER_AGENT};
use crate::fetch::DEFAULT_ARTICLE_USER_AGENT;
use crate::selector::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

const MAX_LIMIT: usize = 50;
const MAX_PACING_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Feed to build the digest from.
    pub feed_url: String,
    /// Maximum number of items in a digest.
    pub limit: usize,
    pub description_ttl_secs: u64,
    /// Delay after each article fetch.
    pub pacing_ms: u64,
    pub feed_timeout_secs: u64,
    pub feed_user_agent: String,
    pub article_user_agent: String,
    pub extractor: ExtractorKind,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            limit: DEFAULT_LIMIT,
            description_ttl_secs: DEFAULT_TTL.as_secs(),
            pacing_ms: DEFAULT_PACING.as_millis() as u64,
            feed_timeout_secs: DEFAULT_FEED_TIMEOUT.as_secs(),
            feed_user_agent: DEFAULT_FEED_USER_AGENT.to_string(),
            article_user_agent: DEFAULT_ARTICLE_USER_AGENT.to_string(),
            extractor: ExtractorKind::default(),
        }
    }
}

impl DigestConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load and validate the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read, [`ConfigError::Parse`]
    /// for invalid YAML, or a validation error from [`DigestConfig::validate`].
    #[instrument(level = "info", skip_all, fields(%path))]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(&yaml)?;
        config.validate()?;
        info!(feed_url = %config.feed_url, limit = config.limit, "Loaded configuration");
        Ok(config)
    }

    /// Check the values make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.feed_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.feed_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.feed_url.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        if self.limit > MAX_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "limit {} exceeds maximum of {}",
                self.limit, MAX_LIMIT
            )));
        }
        if self.pacing_ms > MAX_PACING_MS {
            return Err(ConfigError::Invalid(format!(
                "pacing_ms {} exceeds maximum of {}",
                self.pacing_ms, MAX_PACING_MS
            )));
        }
        if self.feed_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "feed_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn description_ttl(&self) -> Duration {
        Duration::from_secs(self.description_ttl_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DigestConfig::default();
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.limit, 5);
        assert_eq!(config.description_ttl(), Duration::from_secs(6 * 60 * 60));
        assert_eq!(config.pacing(), Duration::from_millis(250));
        assert_eq!(config.feed_timeout(), Duration::from_secs(10));
        assert_eq!(config.extractor, ExtractorKind::MetaTag);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DigestConfig::from_yaml(
            "feed_url: https://example.com/feed.xml\nextractor: html_document\n",
        )
        .unwrap();
        assert_eq!(config.feed_url, "https://example.com/feed.xml");
        assert_eq!(config.extractor, ExtractorKind::HtmlDocument);
        assert_eq!(config.limit, 5);
        assert_eq!(config.pacing_ms, 250);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(DigestConfig::from_yaml("").unwrap(), DigestConfig::default());
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        assert!(matches!(
            DigestConfig::from_yaml("limit: [not, a, number]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DigestConfig {
            feed_url: "ftp://example.com/feed".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        config.feed_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        config.feed_url = DEFAULT_FEED_URL.to_string();
        config.limit = 500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.limit = 5;
        config.feed_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limit: 3\npacing_ms: 0").unwrap();

        let config = DigestConfig::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.limit, 3);
        assert_eq!(config.pacing(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = DigestConfig::load("/nonexistent/meta_digest.yaml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
