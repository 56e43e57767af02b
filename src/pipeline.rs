// src/pipeline.rs
//! One pipeline run: fetch -> freshness -> admission -> sentiment -> dedup ->
//! insight -> assemble -> persist. The processing core is a function of
//! (candidates, dedup index); all IO sits in the thin `run_once` shell.
//! Only persistence failures propagate; every other error is absorbed at
//! the stage where it happens.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::admission::{self, Admission};
use crate::article::{build_article, Article};
use crate::config::PipelineConfig;
use crate::dedup::{article_id, DedupIndex};
use crate::freshness::{self, Freshness};
use crate::ingest::{self, types::Candidate, types::SourceProvider};
use crate::insight::{self, reasoning::ReasoningClient, Jitter};
use crate::sentiment::score_text;
use crate::snapshot;
use crate::vocab::Vocab;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed pipeline runs.");
        describe_counter!("pipeline_admitted_total", "Candidates that became articles.");
        describe_counter!("pipeline_stale_total", "Candidates rejected by the freshness gate.");
        describe_counter!("pipeline_dropped_total", "Candidates rejected by the admission filter.");
        describe_counter!("pipeline_dedup_total", "Candidates already present in the dedup index.");
        describe_histogram!("pipeline_run_ms", "Wall time of one run in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Per-run stage tally, reported in the summary log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub candidates: usize,
    pub stale: usize,
    pub dropped: usize,
    pub deduped: usize,
    pub admitted: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources: usize,
    pub sources_failed: usize,
    pub counts: StageCounts,
    pub wrote_snapshot: bool,
}

/// Per-run knobs lifted out of [`PipelineConfig`] so the decision core
/// stays a pure function of its arguments.
#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    pub max_age_days: i64,
    pub article_limit: usize,
    pub reasoning_deadline: Duration,
}

impl RunPolicy {
    fn from_config(cfg: &PipelineConfig, limit: Option<usize>) -> Self {
        Self {
            max_age_days: cfg.freshness.max_age_days,
            article_limit: limit.unwrap_or(cfg.snapshot.max_articles),
            reasoning_deadline: cfg.reasoning.timeout(),
        }
    }
}

/// The decision core. Walks candidates in discovery order and returns the
/// assembled articles; the index picks up every emitted id. Stops at the
/// article limit without touching the index for candidates it never looked at.
pub async fn process_candidates(
    candidates: Vec<Candidate>,
    index: &mut DedupIndex,
    vocab: &Vocab,
    reasoning: &dyn ReasoningClient,
    jitter: &mut dyn Jitter,
    now: DateTime<Utc>,
    policy: RunPolicy,
) -> (Vec<Article>, StageCounts) {
    let mut counts = StageCounts {
        candidates: candidates.len(),
        ..StageCounts::default()
    };
    let mut articles = Vec::new();

    for candidate in candidates {
        if articles.len() >= policy.article_limit {
            break;
        }

        let published_at = match freshness::evaluate(
            candidate.published_at_raw.as_deref(),
            now,
            policy.max_age_days,
        ) {
            Freshness::Fresh(dt) => dt,
            Freshness::Stale(dt) => {
                counts.stale += 1;
                counter!("pipeline_stale_total").increment(1);
                tracing::debug!(link = %candidate.link, published = %dt, "stale, skipped");
                continue;
            }
            Freshness::Unknown => DateTime::from_timestamp(candidate.fetched_at, 0).unwrap_or(now),
        };

        let text = candidate.combined_text();
        match admission::evaluate(&candidate.title, &text, vocab) {
            Admission::Dropped(reason) => {
                counts.dropped += 1;
                counter!("pipeline_dropped_total").increment(1);
                tracing::debug!(link = %candidate.link, reason = reason.as_str(), "dropped");
                continue;
            }
            Admission::Admitted(reason) => {
                tracing::debug!(link = %candidate.link, reason = reason.as_str(), "admitted");
            }
        }

        let id = article_id(&candidate.link);
        if !index.insert(id.clone()) {
            counts.deduped += 1;
            counter!("pipeline_dedup_total").increment(1);
            continue;
        }

        let reading = score_text(&text, vocab);
        let is_breaking = admission::is_breaking(&text, vocab);
        let insight = insight::generate(
            reasoning,
            insight::InsightRequest {
                title: &candidate.title,
                summary: &candidate.summary,
                source: &candidate.source,
                text: &text,
                reading,
                is_breaking,
            },
            vocab,
            jitter,
            policy.reasoning_deadline,
        )
        .await;

        counts.admitted += 1;
        counter!("pipeline_admitted_total").increment(1);
        articles.push(build_article(
            &candidate,
            id,
            reading,
            is_breaking,
            published_at,
            insight,
        ));
    }

    (articles, counts)
}

/// Fetch, decide, persist. Returns the run summary; fails only when the
/// snapshot or dedup index cannot be written.
pub async fn run_once(
    cfg: &PipelineConfig,
    providers: Vec<Arc<dyn SourceProvider>>,
    reasoning: &dyn ReasoningClient,
    jitter: &mut dyn Jitter,
    limit: Option<usize>,
) -> Result<RunSummary> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let sources = providers.len();
    let (candidates, sources_failed) = ingest::fetch_all(
        providers,
        cfg.fetch.ceiling(),
        cfg.fetch.per_source_cap,
    )
    .await;

    let mut index = DedupIndex::load(&cfg.snapshot.dedup_path);
    if index.is_empty() {
        // First run on this host: the current snapshot is the only history.
        for a in snapshot::load_snapshot(&cfg.snapshot.path) {
            index.insert(a.id);
        }
    }

    let (articles, counts) = process_candidates(
        candidates,
        &mut index,
        crate::vocab::vocab(),
        reasoning,
        jitter,
        Utc::now(),
        RunPolicy::from_config(cfg, limit),
    )
    .await;

    let wrote_snapshot =
        snapshot::write_snapshot(&cfg.snapshot.path, &articles).context("persisting snapshot")?;
    if wrote_snapshot {
        index
            .save(&cfg.snapshot.dedup_path)
            .context("persisting dedup index")?;
    }

    counter!("pipeline_runs_total").increment(1);
    histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);

    tracing::info!(
        sources,
        sources_failed,
        candidates = counts.candidates,
        admitted = counts.admitted,
        stale = counts.stale,
        dropped = counts.dropped,
        deduped = counts.deduped,
        wrote_snapshot,
        "run complete"
    );

    Ok(RunSummary {
        sources,
        sources_failed,
        counts,
        wrote_snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::reasoning::DisabledReasoning;
    use crate::insight::FixedJitter;
    use crate::vocab::vocab;
    use chrono::TimeZone;

    fn cand(title: &str, summary: &str, link: &str) -> Candidate {
        Candidate {
            source: "TestWire".into(),
            title: title.into(),
            summary: summary.into(),
            link: link.into(),
            published_at_raw: Some("Fri, 09 Aug 2024 12:00:00 GMT".into()),
            fetched_at: Utc.with_ymd_and_hms(2024, 8, 10, 12, 0, 0).unwrap().timestamp(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 10, 12, 0, 0).unwrap()
    }

    fn policy(article_limit: usize) -> RunPolicy {
        RunPolicy {
            max_age_days: 3,
            article_limit,
            reasoning_deadline: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn admitted_candidate_becomes_an_article() {
        let mut index = DedupIndex::new();
        let (articles, counts) = process_candidates(
            vec![cand(
                "Fed raises rates by 25bps",
                "Policy decision lands",
                "https://x/1",
            )],
            &mut index,
            vocab(),
            &DisabledReasoning,
            &mut FixedJitter(0),
            now(),
            policy(20),
        )
        .await;
        assert_eq!(articles.len(), 1);
        assert!(articles[0].is_breaking);
        assert!(articles[0].vip_tier.ai_analysis.impact_score >= 95);
        assert_eq!(counts.admitted, 1);
        assert!(index.contains(&articles[0].id));
    }

    #[tokio::test]
    async fn same_link_twice_emits_once() {
        let mut index = DedupIndex::new();
        let (articles, counts) = process_candidates(
            vec![
                cand("Fed raises rates by 25bps", "s", "https://x/1"),
                cand("Fed raises rates by 25bps", "s", "https://x/1"),
            ],
            &mut index,
            vocab(),
            &DisabledReasoning,
            &mut FixedJitter(0),
            now(),
            policy(20),
        )
        .await;
        assert_eq!(articles.len(), 1);
        assert_eq!(counts.deduped, 1);
    }

    #[tokio::test]
    async fn stale_candidates_never_reach_admission() {
        let mut index = DedupIndex::new();
        let mut c = cand("Fed raises rates by 25bps", "s", "https://x/old");
        c.published_at_raw = Some("Thu, 01 Aug 2024 12:00:00 GMT".into());
        let (articles, counts) = process_candidates(
            vec![c],
            &mut index,
            vocab(),
            &DisabledReasoning,
            &mut FixedJitter(0),
            now(),
            policy(20),
        )
        .await;
        assert!(articles.is_empty());
        assert_eq!(counts.stale, 1);
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn unknown_dates_fall_back_to_fetch_time() {
        let mut index = DedupIndex::new();
        let mut c = cand("Fed raises rates by 25bps", "s", "https://x/nodate");
        c.published_at_raw = None;
        let (articles, _) = process_candidates(
            vec![c.clone()],
            &mut index,
            vocab(),
            &DisabledReasoning,
            &mut FixedJitter(0),
            now(),
            policy(20),
        )
        .await;
        assert_eq!(articles[0].published_at.timestamp(), c.fetched_at);
    }

    #[tokio::test]
    async fn limit_stops_processing_and_leaves_index_untouched_beyond_it() {
        let mut index = DedupIndex::new();
        let batch = vec![
            cand("Fed raises rates by 25bps", "s", "https://x/1"),
            cand("CPI print comes in hot", "s", "https://x/2"),
            cand("GDP growth beats forecasts", "s", "https://x/3"),
        ];
        let (articles, _) = process_candidates(
            batch,
            &mut index,
            vocab(),
            &DisabledReasoning,
            &mut FixedJitter(0),
            now(),
            policy(2),
        )
        .await;
        assert_eq!(articles.len(), 2);
        assert_eq!(index.len(), 2);
        assert!(!index.contains(&article_id("https://x/3")));
    }
}
