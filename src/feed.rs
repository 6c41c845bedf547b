//! Syndication feed acquisition.
//!
//! [`FeedSource`] hands the digest a flat list of [`RawFeedItem`]s. The HTTP
//! implementation downloads the feed with a 10 second budget and parses it
//! with [`parse_feed`], which understands RSS (`<item>`) and Atom (`<entry>`)
//! documents. Any failure here is a [`FeedError`] and fails the whole digest.

use crate::error::FeedError;
use crate::models::RawFeedItem;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Yahoo! News top picks.
pub const DEFAULT_FEED_URL: &str = "https://news.yahoo.co.jp/rss/topics/top-picks.xml";

pub const DEFAULT_FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies this client to the feed host.
pub const DEFAULT_FEED_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; MetaDigestFeedFetcher/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8";

/// Capability: produce the current list of feed items.
pub trait FeedSource {
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError>;
}

/// Fetches and parses a feed over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    /// Build a source for `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - Feed location, fetched on every [`FeedSource::fetch_items`] call
    /// * `user_agent` - Sent as the `User-Agent` header
    /// * `timeout` - Budget for the whole request, body included
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeedSource {
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status,
                url: self.url.clone(),
            });
        }

        let bytes = response.bytes().await?;
        let items = parse_feed(&bytes)?;
        info!(count = items.len(), bytes = bytes.len(), "Fetched feed");
        Ok(items)
    }
}

/// Which item field the parser is currently collecting text for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    DcDate,
    Published,
    Updated,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("atom:").unwrap_or(name);
        match name {
            "title" => Some(Field::Title),
            "link" => Some(Field::Link),
            "pubDate" => Some(Field::PubDate),
            "dc:date" => Some(Field::DcDate),
            "published" => Some(Field::Published),
            "updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    dc_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl ItemBuilder {
    fn set(&mut self, field: Field, text: String) {
        if text.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::DcDate => &mut self.dc_date,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        slot.get_or_insert(text);
    }

    /// Atom `<link href=".."/>`: take the first alternate (or rel-less) link.
    fn set_atom_link(&mut self, e: &BytesStart<'_>) -> Result<(), FeedError> {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().map_err(parse_error)?.trim().to_string();
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        let alternate = rel.as_deref().is_none_or(|r| r == "alternate");
        if let (Some(href), true) = (href, alternate) {
            self.set(Field::Link, href);
        }
        Ok(())
    }

    fn build(self) -> RawFeedItem {
        RawFeedItem {
            title: self.title,
            link: self.link,
            iso_date: self.published.or(self.updated).or(self.dc_date),
            pub_date: self.pub_date,
        }
    }
}

fn parse_error(e: impl std::fmt::Display) -> FeedError {
    FeedError::Parse(format!("XML parse error: {}", e))
}

fn is_item(name: &str) -> bool {
    matches!(name, "item" | "entry" | "atom:entry")
}

fn is_feed_root(name: &str) -> bool {
    matches!(name, "rss" | "rdf:RDF" | "feed" | "atom:feed")
}

/// Parse an RSS or Atom document into raw items, in document order.
///
/// # Arguments
///
/// * `xml` - The raw feed bytes
///
/// # Returns
///
/// One [`RawFeedItem`] per `<item>` or `<entry>`. A valid feed with no items
/// yields an empty list.
///
/// # Errors
///
/// [`FeedError::Parse`] for malformed XML, or for a document without an
/// `<rss>`, `<rdf:RDF>` or `<feed>` root.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<RawFeedItem>, FeedError> {
    let mut reader = Reader::from_reader(xml);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut saw_root = false;

    let mut current_item: Option<ItemBuilder> = None;
    let mut current_field: Option<(Field, String)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                saw_root |= is_feed_root(&name);

                if is_item(&name) {
                    current_item = Some(ItemBuilder::default());
                } else if let Some(ref mut item) = current_item {
                    if current_field.is_none() {
                        if let Some(field) = Field::from_name(&name) {
                            if field == Field::Link {
                                item.set_atom_link(&e)?;
                            }
                            current_field = Some((field, name));
                            text.clear();
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(ref mut item) = current_item {
                    if Field::from_name(&name) == Some(Field::Link) {
                        item.set_atom_link(&e)?;
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if is_item(&name) {
                    if let Some(builder) = current_item.take() {
                        items.push(builder.build());
                    }
                    current_field = None;
                } else if current_field.as_ref().is_some_and(|(_, open)| *open == name) {
                    if let (Some((field, _)), Some(item)) = (current_field.take(), current_item.as_mut()) {
                        item.set(field, text.trim().to_string());
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if current_field.is_some() {
                    text.push_str(&e.decode().map_err(parse_error)?);
                }
            }
            Ok(Event::CData(e)) => {
                if current_field.is_some() {
                    text.push_str(&e.decode().map_err(parse_error)?);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_field.is_some() {
                    if let Some(ch) = e.resolve_char_ref().map_err(parse_error)? {
                        text.push(ch);
                    } else {
                        let entity = e.decode().map_err(parse_error)?;
                        match resolve_predefined_entity(&entity) {
                            Some(resolved) => text.push_str(resolved),
                            None => {
                                text.push('&');
                                text.push_str(&entity);
                                text.push(';');
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(parse_error(e)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(FeedError::Parse(
            "document has no RSS or Atom root element".to_string(),
        ));
    }

    debug!(count = items.len(), "Parsed feed items");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::{Reply, TestServer};
    use reqwest::StatusCode;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Top Picks</title>
    <link>https://news.example.com/</link>
    <item>
      <title>First &amp; foremost</title>
      <link>https://news.example.com/a/1</link>
      <pubDate>Thu, 02 Jan 2025 03:04:05 GMT</pubDate>
    </item>
    <item>
      <title><![CDATA[Second <b>story</b>]]></title>
      <link>https://news.example.com/a/2</link>
      <dc:date>2025-01-02T04:00:00Z</dc:date>
    </item>
    <item>
      <title>No link</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <link href="https://example.org/"/>
  <entry>
    <title>Atom entry</title>
    <link rel="self" href="https://example.org/self/1"/>
    <link rel="alternate" href="https://example.org/posts/1"/>
    <updated>2025-01-03T00:00:00Z</updated>
    <published>2025-01-01T00:00:00Z</published>
  </entry>
  <entry>
    <title>Only updated</title>
    <link href="https://example.org/posts/2"/>
    <updated>2025-01-04T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title.as_deref(), Some("First & foremost"));
        assert_eq!(items[0].link.as_deref(), Some("https://news.example.com/a/1"));
        assert_eq!(items[0].pub_date.as_deref(), Some("Thu, 02 Jan 2025 03:04:05 GMT"));
        assert_eq!(items[0].iso_date, None);

        assert_eq!(items[1].title.as_deref(), Some("Second <b>story</b>"));
        assert_eq!(items[1].iso_date.as_deref(), Some("2025-01-02T04:00:00Z"));
        assert_eq!(items[1].pub_date, None);

        assert_eq!(items[2].link, None);
    }

    #[test]
    fn test_channel_title_is_not_an_item() {
        let items = parse_feed(RSS.as_bytes()).unwrap();
        assert!(items.iter().all(|i| i.title.as_deref() != Some("Top Picks")));
    }

    #[test]
    fn test_parse_atom_entries() {
        let items = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].link.as_deref(), Some("https://example.org/posts/1"));
        assert_eq!(items[0].iso_date.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(items[1].iso_date.as_deref(), Some("2025-01-04T00:00:00Z"));
    }

    #[test]
    fn test_empty_channel_is_ok() {
        let xml = r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        assert!(parse_feed(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let xml = r#"<rss><channel><item><title>Broken</item></channel></rss>"#;
        assert!(matches!(parse_feed(xml.as_bytes()), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_non_feed_document_is_parse_error() {
        let html = "<html><head><title>Not a feed</title></head></html>";
        assert!(matches!(parse_feed(html.as_bytes()), Err(FeedError::Parse(_))));
        assert!(matches!(parse_feed(b""), Err(FeedError::Parse(_))));
    }

    fn source(server: &TestServer, path: &str, timeout: Duration) -> HttpFeedSource {
        HttpFeedSource::new(&server.url(path), DEFAULT_FEED_USER_AGENT, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_http_feed_fetches_and_parses() {
        let server = TestServer::start(vec![("/rss.xml", Reply::ok(RSS))]).await;

        let items = source(&server, "/rss.xml", DEFAULT_FEED_TIMEOUT)
            .fetch_items()
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title.as_deref(), Some("First & foremost"));
    }

    #[tokio::test]
    async fn test_http_feed_sends_user_agent_and_accept() {
        let server = TestServer::start(vec![("/rss.xml", Reply::ok(RSS))]).await;

        source(&server, "/rss.xml", DEFAULT_FEED_TIMEOUT)
            .fetch_items()
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains(&format!(
            "user-agent: {}\r\n",
            DEFAULT_FEED_USER_AGENT.to_lowercase()
        )));
        assert!(requests[0].contains(&format!("accept: {FEED_ACCEPT}\r\n")));
    }

    #[tokio::test]
    async fn test_http_feed_non_success_is_status_error() {
        let server = TestServer::start(Vec::new()).await;
        let url = server.url("/rss.xml");

        let err = source(&server, "/rss.xml", DEFAULT_FEED_TIMEOUT)
            .fetch_items()
            .await
            .unwrap_err();

        match err {
            FeedError::Status { status, url: failed } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(failed, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_feed_times_out() {
        let server = TestServer::start(vec![(
            "/slow.xml",
            Reply::ok(RSS).delayed(Duration::from_secs(5)),
        )])
        .await;

        let err = source(&server, "/slow.xml", Duration::from_millis(200))
            .fetch_items()
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Request(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_http_feed_html_body_is_parse_error() {
        let server = TestServer::start(vec![("/rss.xml", Reply::ok("<html><body>moved</body></html>"))]).await;

        let err = source(&server, "/rss.xml", DEFAULT_FEED_TIMEOUT)
            .fetch_items()
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }
}
