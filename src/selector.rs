//! Recency-based shortlisting of feed items.
//!
//! Each raw item gets an ordering timestamp from its preferred date field,
//! falling back to the secondary one. Items are then sorted newest first
//! (stable, so ties keep feed order), deduplicated by link and truncated.
//! Items whose dates cannot be parsed sort last instead of failing.

use crate::models::{FeedEntry, RawFeedItem};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use itertools::Itertools;
use tracing::{debug, instrument};

/// Number of entries in a digest unless configured otherwise.
pub const DEFAULT_LIMIT: usize = 5;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a feed date string into a UTC instant.
///
/// Accepts RFC 3339, RFC 2822 and a few naive layouts (read as UTC).
/// Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Resolve a raw item into a [`FeedEntry`].
///
/// The preferred date wins when it parses. Otherwise the secondary date is
/// tried. When neither parses, the first present string is kept for display
/// and the timestamp is `None`.
pub fn to_entry(item: RawFeedItem) -> FeedEntry {
    let RawFeedItem {
        title,
        link,
        iso_date,
        pub_date,
    } = item;

    let candidates = [iso_date, pub_date];
    let parsed = candidates
        .iter()
        .flatten()
        .find_map(|raw| parse_timestamp(raw).map(|ts| (raw.clone(), ts)));

    let (raw_date, timestamp) = match parsed {
        Some((raw, ts)) => (raw, Some(ts)),
        None => (
            candidates.into_iter().flatten().next().unwrap_or_default(),
            None,
        ),
    };

    FeedEntry {
        title: title.unwrap_or_default(),
        link: link.unwrap_or_default(),
        raw_date,
        timestamp,
    }
}

/// Select the `limit` most recent entries.
///
/// # Arguments
///
/// * `items` - Raw feed items in document order
/// * `limit` - Maximum length of the shortlist
///
/// # Returns
///
/// Entries newest first, one per distinct link. Undated entries come last in
/// feed order. An empty feed yields an empty shortlist.
#[instrument(level = "debug", skip_all, fields(total = items.len(), limit = limit))]
pub fn select_recent(items: Vec<RawFeedItem>, limit: usize) -> Vec<FeedEntry> {
    let mut entries: Vec<FeedEntry> = items.into_iter().map(to_entry).collect();

    // `None` < `Some`, so undated entries land at the tail. sort_by is stable.
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let undated = entries.iter().filter(|e| e.timestamp.is_none()).count();

    let shortlist: Vec<FeedEntry> = entries
        .into_iter()
        .enumerate()
        .unique_by(|(idx, entry)| {
            if entry.link.is_empty() {
                Err(*idx)
            } else {
                Ok(entry.link.clone())
            }
        })
        .map(|(_, entry)| entry)
        .take(limit)
        .collect();

    debug!(selected = shortlist.len(), undated, "Selected recent feed entries");
    shortlist
}
