// src/config.rs
//! Pipeline configuration: TOML file with env-var path override and a
//! built-in seed catalog used when no file is present.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "ALPHAFEED_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/alphafeed.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub freshness: FreshnessConfig,
    pub reasoning: ReasoningConfig,
    pub snapshot: SnapshotConfig,
    pub schedule: ScheduleConfig,
    pub sources: Vec<FeedSource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Hard deadline for a single source request, seconds.
    pub per_source_timeout_secs: u64,
    /// Ceiling for the whole concurrent fetch phase, seconds.
    pub ceiling_secs: u64,
    /// At most this many raw items are taken per source.
    pub per_source_cap: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            per_source_timeout_secs: 10,
            ceiling_secs: 20,
            per_source_cap: 8,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

impl FetchConfig {
    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_secs(self.per_source_timeout_secs)
    }
    pub fn ceiling(&self) -> Duration {
        Duration::from_secs(self.ceiling_secs)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Items with a parseable publish date older than this are rejected.
    pub max_age_days: i64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self { max_age_days: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub enabled: bool,
    pub model: String,
    pub api_url: String,
    /// Per-call deadline, independent of the fetch phase timeouts.
    pub timeout_secs: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-4o-mini".to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            timeout_secs: 6,
        }
    }
}

impl ReasoningConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub dedup_path: PathBuf,
    /// Upper bound on articles emitted per run.
    pub max_articles: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("public/market_snapshot.json"),
            dedup_path: PathBuf::from("data/seen_ids.json"),
            max_articles: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_secs: 180 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub format: FeedFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    #[default]
    Rss,
    Html,
}

/// Seed catalog used when no config file exists anywhere.
pub fn default_seed() -> Vec<FeedSource> {
    let rss = |name: &str, url: &str| FeedSource {
        name: name.to_string(),
        url: url.to_string(),
        format: FeedFormat::Rss,
    };
    vec![
        rss("Yahoo Finance", "https://finance.yahoo.com/news/rssindex"),
        rss("Yahoo Top Stories", "https://finance.yahoo.com/rss/topstories"),
        rss("Investing.com", "https://www.investing.com/rss/news.rss"),
        rss("Seeking Alpha", "https://seekingalpha.com/feed.xml"),
        rss("MarketWatch", "https://www.marketwatch.com/rss/topstories"),
    ]
}

/// Load config from an explicit path.
pub fn load_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let mut cfg: PipelineConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    if cfg.sources.is_empty() {
        cfg.sources = default_seed();
    }
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $ALPHAFEED_CONFIG
/// 2) config/alphafeed.toml
/// 3) built-in defaults with the seed catalog
pub fn load_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("ALPHAFEED_CONFIG points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    Ok(PipelineConfig {
        sources: default_seed(),
        ..PipelineConfig::default()
    })
}
