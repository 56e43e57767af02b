// src/insight/reasoning.rs
//! External reasoning seam. `None` means unavailable: missing key, transport
//! error, non-success status, timeout or empty output. Callers fall back to
//! templates; nothing in here ever raises.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReasoningConfig;

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// One short professional narrative for the item, or None.
    async fn narrate(&self, title: &str, summary: &str, source: &str) -> Option<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynReasoningClient = Arc<dyn ReasoningClient>;

/// Build a client from config + environment. Disabled config or a missing
/// OPENAI_API_KEY both end up returning None on every call.
pub fn build_client(cfg: &ReasoningConfig) -> DynReasoningClient {
    if !cfg.enabled {
        return Arc::new(DisabledReasoning);
    }
    Arc::new(OpenAiReasoning::from_config(cfg))
}

/// Chat-completions style provider.
pub struct OpenAiReasoning {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiReasoning {
    pub fn from_config(cfg: &ReasoningConfig) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(cfg.timeout())
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            api_url: cfg.api_url.clone(),
            model: cfg.model.clone(),
            timeout: cfg.timeout(),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a market analyst. Write 1-2 sentences of \
professional analysis of the news item. Do not restate the headline. No \
emojis, no hedging filler. Output only the analysis.";

#[async_trait]
impl ReasoningClient for OpenAiReasoning {
    async fn narrate(&self, title: &str, summary: &str, source: &str) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let user = format!("Headline: {title}\nSummary: {summary}\nSource: {source}");
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.2,
            max_tokens: 120,
        };

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "reasoning call rejected");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        let cleaned = sanitize_narrative(content);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Always unavailable; the template path carries the run.
pub struct DisabledReasoning;

#[async_trait]
impl ReasoningClient for DisabledReasoning {
    async fn narrate(&self, _title: &str, _summary: &str, _source: &str) -> Option<String> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests and offline runs.
#[derive(Clone)]
pub struct FixedReasoning {
    pub text: String,
}

#[async_trait]
impl ReasoningClient for FixedReasoning {
    async fn narrate(&self, _title: &str, _summary: &str, _source: &str) -> Option<String> {
        let cleaned = sanitize_narrative(&self.text);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

/// ASCII-only, single line, <=320 chars. Collapses whitespace.
pub fn sanitize_narrative(input: &str) -> String {
    let mut out = String::with_capacity(320);
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.len() >= 320 {
            break;
        }
    }
    out.trim().to_string()
}
