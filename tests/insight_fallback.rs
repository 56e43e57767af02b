// tests/insight_fallback.rs
//! A reasoning outage must never block a run: articles still come out with
//! template narratives and the lower score baseline. When the service does
//! answer, its text is published verbatim on the higher baseline.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use alphafeed::config::PipelineConfig;
use alphafeed::ingest::types::{Candidate, SourceProvider};
use alphafeed::insight::reasoning::{DisabledReasoning, FixedReasoning};
use alphafeed::insight::FixedJitter;
use alphafeed::pipeline::run_once;
use alphafeed::snapshot::load_snapshot;
use alphafeed::TradeAction;

struct StaticFeed {
    items: Vec<Candidate>,
}

#[async_trait]
impl SourceProvider for StaticFeed {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> String {
        "mock".to_string()
    }
}

fn feed(title: &str, summary: &str, link: &str) -> Vec<Arc<dyn SourceProvider>> {
    vec![Arc::new(StaticFeed {
        items: vec![Candidate {
            source: "MockWire".into(),
            title: title.into(),
            summary: summary.into(),
            link: link.into(),
            published_at_raw: Some(Utc::now().to_rfc2822()),
            fetched_at: Utc::now().timestamp(),
        }],
    })]
}

fn test_cfg(dir: &std::path::Path) -> PipelineConfig {
    let mut cfg = PipelineConfig::default();
    cfg.snapshot.path = dir.join("market_snapshot.json");
    cfg.snapshot.dedup_path = dir.join("seen_ids.json");
    cfg
}

#[tokio::test]
async fn template_narrative_when_reasoning_is_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_cfg(tmp.path());

    // Four bull cues, no macro term: bullish, not breaking.
    let summary = run_once(
        &cfg,
        feed(
            "NVDA profit surges to record high",
            "Data center demand stays firm",
            "https://mock.example/nvda",
        ),
        &DisabledReasoning,
        &mut FixedJitter(0),
        None,
    )
    .await
    .expect("run");
    assert_eq!(summary.counts.admitted, 1);

    let articles = load_snapshot(&cfg.snapshot.path);
    let a = &articles[0];
    assert!(!a.is_breaking);
    assert!(!a.vip_tier.ai_analysis.narrative.is_empty());
    // Fallback baseline 62 + 7 * strength 4, zero jitter.
    assert_eq!(a.vip_tier.ai_analysis.impact_score, 90);
    assert_eq!(a.vip_tier.trading_strategy.action, TradeAction::Buy);
}

#[tokio::test]
async fn external_narrative_is_published_verbatim() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_cfg(tmp.path());

    let reasoning = FixedReasoning {
        text: "Guidance points to a stronger quarter.".to_string(),
    };
    let summary = run_once(
        &cfg,
        feed(
            "AAPL announces quarterly dividend",
            "Board sets the payout date",
            "https://mock.example/aapl-div",
        ),
        &reasoning,
        &mut FixedJitter(0),
        None,
    )
    .await
    .expect("run");
    assert_eq!(summary.counts.admitted, 1);

    let articles = load_snapshot(&cfg.snapshot.path);
    let a = &articles[0];
    assert_eq!(
        a.vip_tier.ai_analysis.narrative,
        "Guidance points to a stronger quarter."
    );
    // External baseline 68 + 7 * strength 1, zero jitter.
    assert_eq!(a.vip_tier.ai_analysis.impact_score, 75);
}
