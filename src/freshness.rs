// src/freshness.rs
//! Publish-date parsing and the staleness gate. Feed date formats vary per
//! source, so parsing runs a cascade from strict to loose. An unparseable
//! date is not a rejection: the item is admitted as "unknown age" and the
//! fetch time stands in for ordering.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Parsed and within the staleness window.
    Fresh(DateTime<Utc>),
    /// Parsed but older than the window; syndication caches love these.
    Stale(DateTime<Utc>),
    /// Could not be parsed; admit, substitute fetch time downstream.
    Unknown,
}

/// Strict-to-loose parser cascade. RFC-822 first (the dominant RSS format),
/// then RFC-3339, then a short table of naive formats assumed UTC.
pub fn parse_publish_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(dt) = OffsetDateTime::parse(s, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0))
    {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Gate a candidate's raw date against the staleness window.
pub fn evaluate(raw: Option<&str>, now: DateTime<Utc>, max_age_days: i64) -> Freshness {
    let Some(parsed) = raw.and_then(parse_publish_date) else {
        return Freshness::Unknown;
    };
    if now.signed_duration_since(parsed) > Duration::days(max_age_days) {
        Freshness::Stale(parsed)
    } else {
        Freshness::Fresh(parsed)
    }
}
