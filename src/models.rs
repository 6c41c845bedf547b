//! Data models for feed entries and the enriched digest.
//!
//! This module defines the records that flow through the pipeline:
//! - [`RawFeedItem`]: One record as produced by the feed parser
//! - [`FeedEntry`]: A raw item with its publish timestamp resolved for ordering
//! - [`NewsItem`]: One enriched entry of the digest returned to callers
//! - [`NewsResponse`]: The whole digest, serialized as `{ "items": [...] }`
//!
//! [`NewsItem`] serializes with camelCase field names (`pubDate`) to match the
//! JSON shape consumed by the front end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed record exactly as the parser found it.
///
/// Every field is optional because real feeds omit things freely. The two
/// date fields are kept apart so the selector can prefer one and fall back
/// to the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedItem {
    /// The entry title.
    pub title: Option<String>,
    /// The article URL.
    pub link: Option<String>,
    /// Preferred, ISO 8601 style date (`dc:date`, Atom `published`/`updated`).
    pub iso_date: Option<String>,
    /// Secondary, RFC 2822 style date (RSS `pubDate`).
    pub pub_date: Option<String>,
}

/// A feed entry with its ordering timestamp derived.
///
/// `timestamp` is `None` when no date field could be parsed; such entries
/// sort after every dated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// The original date string, kept for display.
    pub raw_date: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Drop the ordering timestamp and attach a description.
    pub fn into_news_item(self, description: String) -> NewsItem {
        NewsItem {
            title: self.title,
            link: self.link,
            pub_date: self.raw_date,
            description,
        }
    }
}

/// One entry of the digest.
///
/// `description` is an empty string when enrichment produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// The raw date string from the feed, never a reformatted timestamp.
    pub pub_date: String,
    pub description: String,
}

/// The digest returned by [`crate::NewsDigest::latest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsResponse {
    /// Between 0 and `limit` items, most recent first.
    pub items: Vec<NewsItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_item_serializes_camel_case() {
        let item = NewsItem {
            title: "Title".to_string(),
            link: "https://example.com/a".to_string(),
            pub_date: "Thu, 02 Jan 2025 03:04:05 GMT".to_string(),
            description: "Desc".to_string(),
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["pubDate"], "Thu, 02 Jan 2025 03:04:05 GMT");
        assert!(json.get("pub_date").is_none());
    }

    #[test]
    fn test_news_response_shape() {
        let json = r#"{
            "items": [
                {"title": "T", "link": "L", "pubDate": "D", "description": ""}
            ]
        }"#;

        let response: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].pub_date, "D");
        assert_eq!(response.items[0].description, "");
    }

    #[test]
    fn test_into_news_item_keeps_raw_date() {
        let entry = FeedEntry {
            title: "T".to_string(),
            link: "https://example.com".to_string(),
            raw_date: "2025-01-02T03:04:05+09:00".to_string(),
            timestamp: Some(Utc::now()),
        };

        let item = entry.into_news_item("summary".to_string());
        assert_eq!(item.pub_date, "2025-01-02T03:04:05+09:00");
        assert_eq!(item.description, "summary");
    }
}
