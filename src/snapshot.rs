// src/snapshot.rs
//! Snapshot persistence and the downstream selection interface. The document
//! is a JSON array of Articles, replaced wholesale each successful run via
//! tmp file + rename so a concurrent reader never sees a torn write. An
//! empty batch leaves the previous snapshot in place.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::article::Article;

/// Persist the batch. Returns false when the batch was empty and the
/// previous snapshot was intentionally left untouched.
pub fn write_snapshot(path: &Path, articles: &[Article]) -> Result<bool> {
    if articles.is_empty() {
        tracing::info!(path = %path.display(), "empty batch, keeping previous snapshot");
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
    }
    let json = serde_json::to_vec_pretty(articles).context("serializing snapshot")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(true)
}

/// Read the current snapshot. Missing file is an empty view; a corrupt file
/// is logged and treated as empty (the next successful run repairs it).
pub fn load_snapshot(path: &Path) -> Vec<Article> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, path = %path.display(), "snapshot unreadable, treating as empty");
            Vec::new()
        }
    }
}

/// Pick the highest-priority unpublished article: breaking first, then
/// impact score descending. Ties keep snapshot order. The caller owns the
/// published-id ledger; this function only reads it.
pub fn select_publish_candidate<'a>(
    articles: &'a [Article],
    published: &HashSet<String>,
) -> Option<&'a Article> {
    let mut best: Option<&Article> = None;
    for a in articles {
        if published.contains(&a.id) {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => {
                (a.is_breaking, a.vip_tier.ai_analysis.impact_score)
                    > (b.is_breaking, b.vip_tier.ai_analysis.impact_score)
            }
        };
        if better {
            best = Some(a);
        }
    }
    best
}
