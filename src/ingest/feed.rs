// src/ingest/feed.rs
//! Wire-format parsing for feed payloads: RSS XML and predictable HTML item
//! lists. Payloads are untrusted; a malformed item skips that item, never
//! the whole payload.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;

use crate::ingest::types::Candidate;

pub const TITLE_MAX_CHARS: usize = 200;
pub const SUMMARY_MAX_CHARS: usize = 300;
const HTML_TITLE_MIN_CHARS: usize = 10;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// Normalize feed text: entity decode, tag strip, quote and whitespace
/// normalization. Trailing punctuation is kept; the admission filter needs it.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = RE_TAGS.replace_all(&out, " ").to_string();

    // 3) Normalize curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    out = RE_WS.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Cap at `max` chars, appending an ellipsis when anything was cut.
pub fn clip_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Parse an RSS payload into Candidates. Items missing a title or link are
/// skipped; a description falls back to the title (some feeds omit it).
pub fn parse_rss(source: &str, xml: &str, fetched_at: i64) -> Result<Vec<Candidate>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).with_context(|| format!("parsing {source} rss xml"))?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        let link = it.link.map(|l| l.trim().to_string()).unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        let described = it.description.as_deref().map(normalize_text).unwrap_or_default();
        let summary = if described.is_empty() { title.clone() } else { described };
        out.push(Candidate {
            source: source.to_string(),
            title: clip_chars(&title, TITLE_MAX_CHARS),
            summary: clip_chars(&summary, SUMMARY_MAX_CHARS),
            link,
            published_at_raw: it.pub_date.map(|d| d.trim().to_string()),
            fetched_at,
        });
    }
    Ok(out)
}

/// Parse a predictable HTML item list: every anchor whose text survives
/// normalization at a headline-ish length becomes a Candidate. Links are
/// deduplicated within the page and resolved against the page origin.
/// No publish dates here; the freshness gate substitutes fetch time.
pub fn parse_html_list(source: &str, page_url: &str, html: &str, fetched_at: i64) -> Vec<Candidate> {
    static RE_ANCHOR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"(?is)<a\b[^>]*?href\s*=\s*["']([^"'#]+)["'][^>]*>(.*?)</a>"#).unwrap());

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for cap in RE_ANCHOR.captures_iter(html) {
        let href = cap[1].trim();
        let title = normalize_text(&cap[2]);
        if title.chars().count() < HTML_TITLE_MIN_CHARS {
            continue;
        }
        let link = resolve_href(page_url, href);
        if link.is_empty() || !seen.insert(link.clone()) {
            continue;
        }
        let title = clip_chars(&title, TITLE_MAX_CHARS);
        out.push(Candidate {
            source: source.to_string(),
            summary: title.clone(),
            title,
            link,
            published_at_raw: None,
            fetched_at,
        });
    }
    out
}

/// Resolve a possibly relative href against the page origin. Anything that is
/// neither absolute nor root-relative is dropped (javascript:, mailto:, ...).
fn resolve_href(page_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix('/') {
        if let Some(origin) = page_origin(page_url) {
            return format!("{origin}/{rest}");
        }
    }
    String::new()
}

fn page_origin(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    match url[scheme_end..].find('/') {
        Some(i) => Some(&url[..scheme_end + i]),
        None => Some(url),
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
