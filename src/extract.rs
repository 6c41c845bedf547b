//! Meta-description extraction from article HTML.
//!
//! The orchestrator only knows the [`DescriptionExtractor`] capability. Two
//! implementations exist:
//!
//! | Extractor | Method | Notes |
//! |-----------|--------|-------|
//! | [`MetaTagExtractor`] | Regex over `<meta>` tags | Default; tolerant of broken markup around the tags |
//! | [`HtmlDocumentExtractor`] | `scraper` HTML parser | Full parse; decodes every entity |
//!
//! Both search `og:description` first and then `<meta name="description">`,
//! returning an empty string when neither carries non-empty content. A miss
//! is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Capability: turn a page's HTML into a short description.
pub trait DescriptionExtractor {
    /// Return the best available description, or `""` if none is found.
    fn extract(&self, html: &str) -> String;
}

/// Which [`DescriptionExtractor`] the binary wires in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    #[default]
    MetaTag,
    HtmlDocument,
}

// Quoted attribute values may contain a raw `>`.
static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<meta\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap());

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(amp|lt|gt|#39|apos|quot);").unwrap());

/// Decode the five standard HTML entities in one pass.
///
/// `&amp;lt;` becomes `&lt;`, not `<`.
pub fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures| match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "#39" | "apos" => "'",
            _ => "\"",
        })
        .into_owned()
}

/// Regex-based extractor.
///
/// Every `<meta>` tag is tokenised into attributes so attribute order does
/// not matter; names and the `property`/`name` values compare
/// case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaTagExtractor;

impl MetaTagExtractor {
    fn meta_tags(html: &str) -> impl Iterator<Item = HashMap<String, String>> + '_ {
        META_TAG.captures_iter(html).map(|tag| {
            ATTRIBUTE
                .captures_iter(&tag[1])
                .map(|attr| {
                    let name = attr[1].to_ascii_lowercase();
                    let value = attr
                        .get(2)
                        .or_else(|| attr.get(3))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    (name, value)
                })
                .collect()
        })
    }

    fn find_content(html: &str, keys: &[&str], wanted: &str) -> Option<String> {
        Self::meta_tags(html).find_map(|attrs| {
            let matches = keys.iter().any(|key| {
                attrs
                    .get(*key)
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted))
            });
            if !matches {
                return None;
            }
            attrs
                .get("content")
                .map(|content| decode_entities(content).trim().to_string())
                .filter(|content| !content.is_empty())
        })
    }
}

impl DescriptionExtractor for MetaTagExtractor {
    fn extract(&self, html: &str) -> String {
        if let Some(og) = Self::find_content(html, &["property", "name"], "og:description") {
            return og;
        }
        if let Some(desc) = Self::find_content(html, &["name"], "description") {
            return desc;
        }
        debug!(bytes = html.len(), "No meta description found");
        String::new()
    }
}

/// Extractor backed by a real HTML parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDocumentExtractor;

impl HtmlDocumentExtractor {
    fn find_content(document: &Html, meta: &Selector, keys: &[&str], wanted: &str) -> Option<String> {
        document.select(meta).find_map(|element| {
            let el = element.value();
            let matches = keys.iter().any(|key| {
                el.attr(key)
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted))
            });
            if !matches {
                return None;
            }
            el.attr("content")
                .map(|content| content.trim().to_string())
                .filter(|content| !content.is_empty())
        })
    }
}

impl DescriptionExtractor for HtmlDocumentExtractor {
    fn extract(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let Ok(meta) = Selector::parse("meta[content]") else {
            return String::new();
        };

        Self::find_content(&document, &meta, &["property", "name"], "og:description")
            .or_else(|| Self::find_content(&document, &meta, &["name"], "description"))
            .unwrap_or_default()
    }
}

/// Pick an extractor at runtime.
#[derive(Debug, Clone, Copy)]
pub enum AnyExtractor {
    MetaTag(MetaTagExtractor),
    HtmlDocument(HtmlDocumentExtractor),
}

impl From<ExtractorKind> for AnyExtractor {
    fn from(kind: ExtractorKind) -> Self {
        match kind {
            ExtractorKind::MetaTag => AnyExtractor::MetaTag(MetaTagExtractor),
            ExtractorKind::HtmlDocument => AnyExtractor::HtmlDocument(HtmlDocumentExtractor),
        }
    }
}

impl DescriptionExtractor for AnyExtractor {
    fn extract(&self, html: &str) -> String {
        match self {
            AnyExtractor::MetaTag(e) => e.extract(html),
            AnyExtractor::HtmlDocument(e) => e.extract(html),
        }
    }
}
