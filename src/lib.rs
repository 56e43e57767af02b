// src/lib.rs
// Public library surface for the pipeline stages (and integration tests).

pub mod admission;
pub mod article;
pub mod config;
pub mod dedup;
pub mod freshness;
pub mod ingest;
pub mod insight;
pub mod pipeline;
pub mod scheduler;
pub mod sentiment;
pub mod snapshot;
pub mod vocab;

// ---- Re-exports for stable public API ----
pub use crate::article::{Article, TradeAction};
pub use crate::config::PipelineConfig;
pub use crate::sentiment::Sentiment;
pub use crate::dedup::DedupIndex;
pub use crate::pipeline::{run_once, RunSummary};
pub use crate::snapshot::select_publish_candidate;
