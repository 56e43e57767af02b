// src/vocab.rs
//! Keyword tables driving admission and sentiment. The canonical tables ship
//! embedded in the binary; an operator can swap them wholesale with
//! ALPHAFEED_VOCAB pointing at a JSON file of the same shape. Matching is
//! plain lowercase substring containment, multi-word phrases included.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;

pub const ENV_VOCAB_PATH: &str = "ALPHAFEED_VOCAB";

#[derive(Debug, Clone, Deserialize)]
pub struct Vocab {
    pub noise_phrases: Vec<String>,
    pub alpha_keywords: Vec<String>,
    pub macro_indicators: Vec<String>,
    pub tracked_tickers: Vec<String>,
    pub bull_cues: Vec<String>,
    pub bear_cues: Vec<String>,
    #[serde(default)]
    pub override_rules: Vec<OverrideRule>,
}

/// A sentiment adjustment: fires when every `all` term and at least one
/// `any` term (when the list is non-empty) appear in the text.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRule {
    #[serde(default)]
    pub all: Vec<String>,
    #[serde(default)]
    pub any: Vec<String>,
    pub bear_delta: u32,
}

impl OverrideRule {
    pub fn matches(&self, text: &str) -> bool {
        let all_hit = self.all.iter().all(|t| text.contains(t.as_str()));
        let any_hit = self.any.is_empty() || self.any.iter().any(|t| text.contains(t.as_str()));
        all_hit && any_hit
    }
}

impl Vocab {
    fn lowercased(mut self) -> Self {
        fn lc(v: &mut [String]) {
            for s in v.iter_mut() {
                *s = s.to_lowercase();
            }
        }
        lc(&mut self.noise_phrases);
        lc(&mut self.alpha_keywords);
        lc(&mut self.macro_indicators);
        lc(&mut self.tracked_tickers);
        lc(&mut self.bull_cues);
        lc(&mut self.bear_cues);
        for r in self.override_rules.iter_mut() {
            lc(&mut r.all);
            lc(&mut r.any);
        }
        self
    }
}

static EMBEDDED: Lazy<Vocab> = Lazy::new(|| {
    let raw = include_str!("data/vocab.json");
    serde_json::from_str::<Vocab>(raw)
        .expect("valid embedded vocab")
        .lowercased()
});

static ACTIVE: Lazy<Vocab> = Lazy::new(|| {
    if let Ok(p) = std::env::var(ENV_VOCAB_PATH) {
        match load_from_path(Path::new(&p)) {
            Ok(v) => return v,
            Err(e) => {
                tracing::warn!(error = ?e, path = %p, "vocab override unusable, using embedded");
            }
        }
    }
    EMBEDDED.clone()
});

/// Process-wide tables. Stages take `&Vocab` so tests can pass their own.
pub fn vocab() -> &'static Vocab {
    &ACTIVE
}

pub fn load_from_path(path: &Path) -> anyhow::Result<Vocab> {
    use anyhow::Context;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading vocab from {}", path.display()))?;
    let v: Vocab =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(v.lowercased())
}

/// True when any table entry occurs in `text` (already lowercase).
pub fn contains_any(text: &str, table: &[String]) -> bool {
    table.iter().any(|t| text.contains(t.as_str()))
}

/// Number of table entries that occur in `text` at least once. Each entry
/// counts once no matter how often it repeats.
pub fn count_hits(text: &str, table: &[String]) -> u32 {
    table.iter().filter(|t| text.contains(t.as_str())).count() as u32
}
