// src/insight/mod.rs
//! Insight assembly: a narrative (external reasoning preferred, templates
//! otherwise) and the 0-100 impact score.

pub mod reasoning;
pub mod templates;

use std::time::Duration;

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::sentiment::SentimentReading;
use crate::vocab::Vocab;
use reasoning::ReasoningClient;
use templates::{detect_cluster, narrative_for};

pub const FALLBACK_BASELINE: u32 = 62;
pub const EXTERNAL_BASELINE: u32 = 68;
pub const STRENGTH_WEIGHT: u32 = 7;
/// The formula can never reach the breaking band.
pub const NON_BREAKING_CEILING: u32 = 94;
pub const BREAKING_SCORE: u8 = 97;
/// Inclusive jitter bound; kept below STRENGTH_WEIGHT so jitter never
/// reorders two items of different strength.
pub const JITTER_SPAN: u32 = 5;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "insight_external_total",
            "Narratives produced by the external reasoning service."
        );
        describe_counter!(
            "insight_fallback_total",
            "Narratives produced by the template fallback."
        );
    });
}

/// Display-variety randomness, injectable so tests pin the deterministic part.
pub trait Jitter {
    /// Next value in 0..=JITTER_SPAN.
    fn next(&mut self) -> u32;
}

pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn next(&mut self) -> u32 {
        use rand::Rng;
        rand::rng().random_range(0..=JITTER_SPAN)
    }
}

/// Fixed value, for tests.
pub struct FixedJitter(pub u32);

impl Jitter for FixedJitter {
    fn next(&mut self) -> u32 {
        self.0.min(JITTER_SPAN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub narrative: String,
    pub impact_score: u8,
    pub used_external: bool,
}

/// Impact formula. Breaking overrides everything; otherwise a clamped
/// baseline+strength sum, with a higher baseline when the external service
/// answered (higher trust in the narrative it scored).
pub fn impact_score(
    strength: u32,
    is_breaking: bool,
    used_external: bool,
    jitter: &mut dyn Jitter,
) -> u8 {
    if is_breaking {
        return BREAKING_SCORE;
    }
    let baseline = if used_external {
        EXTERNAL_BASELINE
    } else {
        FALLBACK_BASELINE
    };
    let raw = baseline + STRENGTH_WEIGHT * strength + jitter.next().min(JITTER_SPAN);
    raw.min(NON_BREAKING_CEILING) as u8
}

/// Everything the generator needs to know about one admitted candidate.
#[derive(Debug, Clone, Copy)]
pub struct InsightRequest<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub source: &'a str,
    /// Combined lowercase text, used for cluster detection.
    pub text: &'a str,
    pub reading: SentimentReading,
    pub is_breaking: bool,
}

/// Produce the narrative and score for one admitted candidate. The external
/// call is the only network touch here; it runs under `deadline` and any
/// failure or timeout lands on the template path.
pub async fn generate(
    client: &dyn ReasoningClient,
    req: InsightRequest<'_>,
    vocab: &Vocab,
    jitter: &mut dyn Jitter,
    deadline: Duration,
) -> Insight {
    ensure_metrics_described();

    let external = match tokio::time::timeout(
        deadline,
        client.narrate(req.title, req.summary, req.source),
    )
    .await
    {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(provider = client.provider_name(), "reasoning timed out");
            None
        }
    };
    let used_external = external.is_some();
    let narrative = match external {
        Some(from_service) => {
            counter!("insight_external_total").increment(1);
            from_service
        }
        None => {
            counter!("insight_fallback_total").increment(1);
            let bare_fact = req.title.eq_ignore_ascii_case(req.summary);
            let cluster = detect_cluster(req.text, bare_fact, vocab);
            tracing::debug!(?cluster, provider = client.provider_name(), "template narrative");
            narrative_for(req.reading.sentiment, cluster, req.source)
        }
    };

    Insight {
        narrative,
        impact_score: impact_score(req.reading.strength, req.is_breaking, used_external, jitter),
        used_external,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::{score_text, Sentiment};
    use crate::vocab::vocab;
    use reasoning::{DisabledReasoning, FixedReasoning};

    #[test]
    fn breaking_pins_the_score_regardless_of_strength() {
        for strength in [0, 1, 5, 40] {
            for jitter in [0, JITTER_SPAN] {
                let s = impact_score(strength, true, false, &mut FixedJitter(jitter));
                assert_eq!(s, BREAKING_SCORE);
            }
        }
    }

    #[test]
    fn formula_is_monotonic_in_strength_across_all_jitter() {
        // worst case for s+1 (jitter 0) still beats best case for s (max jitter)
        for s in 0..4 {
            let hi = impact_score(s + 1, false, false, &mut FixedJitter(0));
            let lo = impact_score(s, false, false, &mut FixedJitter(JITTER_SPAN));
            assert!(hi > lo, "strength {} not above strength {}", s + 1, s);
        }
    }

    #[test]
    fn formula_stays_below_the_breaking_band() {
        let s = impact_score(40, false, true, &mut FixedJitter(JITTER_SPAN));
        assert_eq!(u32::from(s), NON_BREAKING_CEILING);
        assert!(u32::from(s) < u32::from(BREAKING_SCORE));
    }

    #[test]
    fn external_success_scores_on_a_higher_baseline() {
        let ext = impact_score(2, false, true, &mut FixedJitter(3));
        let fal = impact_score(2, false, false, &mut FixedJitter(3));
        assert_eq!(u32::from(ext), EXTERNAL_BASELINE + 14 + 3);
        assert_eq!(u32::from(fal), FALLBACK_BASELINE + 14 + 3);
    }

    #[tokio::test]
    async fn fallback_never_fails() {
        let text = "company announces common stock sale";
        let reading = score_text(text, vocab());
        assert_eq!(reading.sentiment, Sentiment::Bearish);
        let req = InsightRequest {
            title: "Company announces common stock sale",
            summary: "Proceeds to repay debt",
            source: "TestWire",
            text,
            reading,
            is_breaking: false,
        };
        let out = generate(
            &DisabledReasoning,
            req,
            vocab(),
            &mut FixedJitter(0),
            Duration::from_secs(1),
        )
        .await;
        assert!(!out.narrative.is_empty());
        assert!(!out.used_external);
        assert!(out.impact_score <= 100);
    }

    #[tokio::test]
    async fn external_text_is_used_verbatim_when_available() {
        let req = InsightRequest {
            title: "t",
            summary: "s",
            source: "TestWire",
            text: "t s",
            reading: score_text("t s", vocab()),
            is_breaking: false,
        };
        let out = generate(
            &FixedReasoning {
                text: "Guidance implies mid-teens growth.".into(),
            },
            req,
            vocab(),
            &mut FixedJitter(0),
            Duration::from_secs(1),
        )
        .await;
        assert!(out.used_external);
        assert_eq!(out.narrative, "Guidance implies mid-teens growth.");
        assert_eq!(u32::from(out.impact_score), EXTERNAL_BASELINE);
    }

    struct StalledReasoning;

    #[async_trait::async_trait]
    impl ReasoningClient for StalledReasoning {
        async fn narrate(&self, _title: &str, _summary: &str, _source: &str) -> Option<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Some("too late".into())
        }

        fn provider_name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn deadline_overrun_falls_back_to_templates() {
        let text = "dow rallies on earnings beat";
        let req = InsightRequest {
            title: "Dow rallies on earnings beat",
            summary: "Broad gains across the index",
            source: "TestWire",
            text,
            reading: score_text(text, vocab()),
            is_breaking: false,
        };
        let started = std::time::Instant::now();
        let out = generate(
            &StalledReasoning,
            req,
            vocab(),
            &mut FixedJitter(0),
            Duration::from_millis(20),
        )
        .await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!out.used_external);
        assert!(!out.narrative.is_empty());
    }
}
