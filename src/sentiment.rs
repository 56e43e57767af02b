// src/sentiment.rs
//! Deterministic keyword sentiment. Cues are matched as lowercase substrings
//! (multi-word phrases literally), counted once per cue, then a short list of
//! override rules adds bearish weight for patterns the raw counts miss.
//! Same text in, same reading out.

use serde::{Deserialize, Serialize};

use crate::vocab::{self, Vocab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "BULLISH",
            Sentiment::Bearish => "BEARISH",
            Sentiment::Neutral => "NEUTRAL",
        }
    }
}

/// Output of one scoring pass. `strength` feeds the impact formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentReading {
    pub sentiment: Sentiment,
    pub strength: u32,
    pub bull_hits: u32,
    pub bear_hits: u32,
}

/// Score combined lowercase text. Pure: no clock, no IO, no randomness.
pub fn score_text(text: &str, vocab: &Vocab) -> SentimentReading {
    let bull_hits = vocab::count_hits(text, &vocab.bull_cues);
    let mut bear_hits = vocab::count_hits(text, &vocab.bear_cues);

    for rule in &vocab.override_rules {
        if rule.matches(text) {
            bear_hits += rule.bear_delta;
        }
    }

    let sentiment = match bull_hits.cmp(&bear_hits) {
        std::cmp::Ordering::Greater => Sentiment::Bullish,
        std::cmp::Ordering::Less => Sentiment::Bearish,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    };

    SentimentReading {
        sentiment,
        strength: bull_hits.max(bear_hits),
        bull_hits,
        bear_hits,
    }
}
