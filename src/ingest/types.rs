// src/ingest/types.rs
use anyhow::Result;

/// A raw item pulled from one feed, before any admission decision.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,  // e.g., "Yahoo Finance"
    pub title: String,   // normalized display text
    pub summary: String, // normalized, length-capped
    pub link: String,    // canonical identity, verbatim from the feed
    /// Publish date exactly as the feed sent it; parsed downstream.
    pub published_at_raw: Option<String>,
    pub fetched_at: i64, // unix seconds when the fetch ran
}

impl Candidate {
    /// Lowercase title+summary, the text every keyword stage matches against.
    pub fn combined_text(&self) -> String {
        let mut t = String::with_capacity(self.title.len() + self.summary.len() + 1);
        t.push_str(&self.title);
        t.push(' ');
        t.push_str(&self.summary);
        t.to_lowercase()
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Candidate>>;
    fn name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_text_lowercases_both_fields() {
        let c = Candidate {
            source: "T".into(),
            title: "Fed RAISES rates".into(),
            summary: "Markets React".into(),
            link: "https://x/1".into(),
            published_at_raw: None,
            fetched_at: 0,
        };
        assert_eq!(c.combined_text(), "fed raises rates markets react");
    }
}
