// src/enrich/openai.rs
//! Chat-completions backed summarizer/translator.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TextEnricher;
use crate::config::EnrichmentConfig;

pub struct OpenAiEnricher {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
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

impl OpenAiEnricher {
    pub fn from_config(cfg: &EnrichmentConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.api_key)?;
        let http = reqwest::Client::builder()
            .user_agent("embassy-alert/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building enrichment http client")?;
        Ok(Self {
            http,
            api_key,
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            max_tokens,
        };

        let body: Resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completions request")?
            .error_for_status()
            .context("chat completions non-2xx")?
            .json()
            .await
            .context("chat completions body")?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            bail!("empty completion from {}", self.model);
        }
        Ok(content)
    }
}

/// "ENV" (any case) means read `OPENAI_API_KEY`.
fn resolve_api_key(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("env") {
        return std::env::var("OPENAI_API_KEY").map_err(|_| anyhow!("Missing OPENAI_API_KEY env var"));
    }
    if raw.is_empty() {
        bail!("enrichment api_key is empty");
    }
    Ok(raw.to_string())
}

#[async_trait]
impl TextEnricher for OpenAiEnricher {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let system = format!(
            "Summarize the news article the user sends. Use between {min_len} and {max_len} words. \
             Keep country names and mission names exactly as written. Output only the summary."
        );
        // Roughly two tokens per word leaves room for the upper bound.
        let budget = u32::try_from(max_len.saturating_mul(2)).unwrap_or(u32::MAX);
        self.complete(&system, text, budget).await
    }

    async fn translate(&self, text: &str, source_lang: &str, dest_lang: &str) -> Result<String> {
        let system = format!(
            "Translate the user's text from language '{source_lang}' to language '{dest_lang}'. \
             Output only the translation."
        );
        let budget = u32::try_from(text.len().saturating_mul(2).max(64)).unwrap_or(u32::MAX);
        self.complete(&system, text, budget).await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
