// src/dedup.rs
//! Content-addressed article identity and the cross-run seen-id index.
//! The index is an explicit value: loaded once at the start of a run, passed
//! into the pipeline, saved after a successful snapshot write.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Stable id: hex of the first 8 bytes of SHA-256 over the canonical link.
/// Same link, same id, across runs and processes.
pub fn article_id(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Ids tracked before the oldest get pruned.
const MAX_TRACKED_IDS: usize = 10_000;

#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    order: Vec<String>, // oldest first
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        let mut idx = Self::default();
        for id in ids {
            idx.insert(id);
        }
        idx
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns false when the id was already tracked.
    pub fn insert(&mut self, id: String) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        if self.order.len() > MAX_TRACKED_IDS {
            let drop_n = self.order.len() - MAX_TRACKED_IDS;
            for old in self.order.drain(..drop_n) {
                self.seen.remove(&old);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Load from disk. A missing file is an empty index; a corrupt file is
    /// logged and treated as empty rather than wedging every future run.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Self::from_ids(ids),
            Err(e) => {
                tracing::warn!(error = ?e, path = %path.display(), "dedup index unreadable, starting empty");
                Self::default()
            }
        }
    }

    /// Persist via tmp file + rename so readers never see a torn write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(&self.order).context("serializing dedup index")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }
}
