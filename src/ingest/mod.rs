// src/ingest/mod.rs
pub mod feed;
pub mod types;

use crate::config::{FeedFormat, FeedSource, FetchConfig};
use crate::ingest::types::{Candidate, SourceProvider};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Raw candidates parsed from sources."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Sources that failed, timed out or returned garbage."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch+parse time in milliseconds.");
    });
}

/// HTTP-backed source. One instance per configured feed; the reqwest client
/// is shared across all of them.
pub struct HttpFeedSource {
    source: FeedSource,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(source: FeedSource, client: reqwest::Client) -> Self {
        Self { source, client }
    }
}

#[async_trait]
impl SourceProvider for HttpFeedSource {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>> {
        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(&self.source.url)
            .send()
            .await
            .with_context(|| format!("{} http get", self.source.name))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("{} returned status {status}", self.source.name));
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("{} reading body", self.source.name))?;

        let fetched_at = chrono::Utc::now().timestamp();
        let items = match self.source.format {
            FeedFormat::Rss => feed::parse_rss(&self.source.name, &body, fetched_at)?,
            FeedFormat::Html => {
                feed::parse_html_list(&self.source.name, &self.source.url, &body, fetched_at)
            }
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_fetch_ms").record(ms);
        Ok(items)
    }

    fn name(&self) -> String {
        self.source.name.clone()
    }
}

/// Build one provider per configured source over a shared HTTP client.
pub fn providers_from_config(
    sources: &[FeedSource],
    fetch: &FetchConfig,
) -> Result<Vec<Arc<dyn SourceProvider>>> {
    let client = reqwest::Client::builder()
        .user_agent(&fetch.user_agent)
        .connect_timeout(Duration::from_secs(4))
        .timeout(fetch.per_source_timeout())
        .build()
        .context("building http client")?;
    Ok(sources
        .iter()
        .map(|s| Arc::new(HttpFeedSource::new(s.clone(), client.clone())) as Arc<dyn SourceProvider>)
        .collect())
}

/// Fetch all sources concurrently. Each source runs in its own task; a source
/// that errors, panics or is still pending at the ceiling contributes zero
/// candidates and bumps the error counter. Never fails the batch.
/// Returns (merged candidates, failed source count).
pub async fn fetch_all(
    providers: Vec<Arc<dyn SourceProvider>>,
    ceiling: Duration,
    per_source_cap: usize,
) -> (Vec<Candidate>, usize) {
    ensure_metrics_described();

    let deadline = tokio::time::Instant::now() + ceiling;
    let mut handles = Vec::with_capacity(providers.len());
    for p in providers {
        let name = p.name();
        let handle = tokio::spawn(async move { p.fetch_latest().await });
        handles.push((name, handle));
    }

    let mut merged = Vec::new();
    let mut failed = 0usize;
    for (name, handle) in handles {
        let abort = handle.abort_handle();
        match tokio::time::timeout_at(deadline, handle).await {
            Ok(Ok(Ok(mut items))) => {
                items.truncate(per_source_cap);
                counter!("ingest_candidates_total").increment(items.len() as u64);
                tracing::debug!(source = %name, items = items.len(), "source fetched");
                merged.append(&mut items);
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = ?e, source = %name, "source error");
                counter!("ingest_source_errors_total").increment(1);
                failed += 1;
            }
            Ok(Err(join_err)) => {
                tracing::warn!(error = ?join_err, source = %name, "source task failed");
                counter!("ingest_source_errors_total").increment(1);
                failed += 1;
            }
            Err(_elapsed) => {
                abort.abort();
                tracing::warn!(source = %name, "source still pending at ceiling, dropped");
                counter!("ingest_source_errors_total").increment(1);
                failed += 1;
            }
        }
    }
    (merged, failed)
}
