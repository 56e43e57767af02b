// src/article.rs
//! The tiered output model. Field names here are the wire contract of the
//! snapshot document; downstream readers bind to them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::types::Candidate;
use crate::insight::Insight;
use crate::sentiment::{Sentiment, SentimentReading};

/// Access-gated placeholder for price fields; never a computed value.
pub const GATED_PLACEHOLDER: &str = "VIP only";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub sentiment: Sentiment,
    pub is_breaking: bool,
    pub published_at: DateTime<Utc>,
    pub free_tier: FreeTier,
    pub vip_tier: VipTier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreeTier {
    pub title: String,
    pub title_original: String,
    pub summary: String,
    pub link: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VipTier {
    pub ai_analysis: AiAnalysis,
    pub trading_strategy: TradingStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiAnalysis {
    pub narrative: String,
    pub impact_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TradingStrategy {
    pub action: TradeAction,
    pub target_price: String,
    pub stop_loss: String,
}

impl TradingStrategy {
    /// Gated strategy row: a real action, placeholder prices.
    pub fn gated(action: TradeAction) -> Self {
        Self {
            action,
            target_price: GATED_PLACEHOLDER.to_string(),
            stop_loss: GATED_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    /// Purely sentiment-derived; no other inputs.
    pub fn from_sentiment(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Bullish => TradeAction::Buy,
            Sentiment::Bearish => TradeAction::Sell,
            Sentiment::Neutral => TradeAction::Hold,
        }
    }
}

/// Assemble the immutable output record from the pipeline pieces.
pub fn build_article(
    candidate: &Candidate,
    id: String,
    reading: SentimentReading,
    is_breaking: bool,
    published_at: DateTime<Utc>,
    insight: Insight,
) -> Article {
    Article {
        id,
        sentiment: reading.sentiment,
        is_breaking,
        published_at,
        free_tier: FreeTier {
            title: candidate.title.clone(),
            title_original: candidate.title.clone(),
            summary: candidate.summary.clone(),
            link: candidate.link.clone(),
            source_name: candidate.source.clone(),
        },
        vip_tier: VipTier {
            ai_analysis: AiAnalysis {
                narrative: insight.narrative,
                impact_score: insight.impact_score,
            },
            trading_strategy: TradingStrategy::gated(TradeAction::from_sentiment(
                reading.sentiment,
            )),
        },
    }
}
