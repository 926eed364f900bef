// src/enrich/mod.rs
//! Text enrichment: summarization + translation behind one interface.

pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::EnrichmentConfig;

#[async_trait]
pub trait TextEnricher: Send + Sync {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String>;
    async fn translate(&self, text: &str, source_lang: &str, dest_lang: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynEnricher = Arc<dyn TextEnricher>;

/// Every call fails; used when enrichment is switched off.
pub struct DisabledEnricher;

#[async_trait]
impl TextEnricher for DisabledEnricher {
    async fn summarize(&self, _text: &str, _max_len: usize, _min_len: usize) -> Result<String> {
        bail!("text enrichment is disabled")
    }
    async fn translate(&self, _text: &str, _source_lang: &str, _dest_lang: &str) -> Result<String> {
        bail!("text enrichment is disabled")
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Call-shaping knobs for `summarize_then_translate`.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub input_chars: usize,
    pub summary_max_len: usize,
    pub summary_min_len: usize,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            input_chars: 1000,
            summary_max_len: 80,
            summary_min_len: 20,
            source_lang: "en".to_string(),
            target_lang: "ko".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&EnrichmentConfig> for EnrichmentSettings {
    fn from(cfg: &EnrichmentConfig) -> Self {
        Self {
            input_chars: cfg.input_chars,
            summary_max_len: cfg.summary_max_len,
            summary_min_len: cfg.summary_min_len,
            source_lang: cfg.source_lang.clone(),
            target_lang: cfg.target_lang.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

/// Summarize a bounded prefix of `body`, then translate the summary.
pub async fn summarize_then_translate(
    enricher: &dyn TextEnricher,
    body: &str,
    settings: &EnrichmentSettings,
) -> Result<String> {
    let prefix: String = body.chars().take(settings.input_chars).collect();

    let summary = tokio::time::timeout(
        settings.timeout,
        enricher.summarize(&prefix, settings.summary_max_len, settings.summary_min_len),
    )
    .await
    .context("summarize deadline")?
    .with_context(|| format!("summarize via {}", enricher.name()))?;

    let translated = tokio::time::timeout(
        settings.timeout,
        enricher.translate(&summary, &settings.source_lang, &settings.target_lang),
    )
    .await
    .context("translate deadline")?
    .with_context(|| format!("translate via {}", enricher.name()))?;

    Ok(translated.trim().to_string())
}

/// Build the enricher the config asks for.
pub fn build_enricher(cfg: &EnrichmentConfig) -> Result<DynEnricher> {
    if !cfg.enabled {
        tracing::warn!("text enrichment disabled; foreign-language items will fail classification every cycle");
        return Ok(Arc::new(DisabledEnricher));
    }
    match cfg.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiEnricher::from_config(cfg)?)),
        other => bail!("unsupported enrichment provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextEnricher for Recording {
        async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("summarize:{}:{max_len}:{min_len}", text.chars().count()));
            Ok(format!("summary of {}", text.chars().count()))
        }
        async fn translate(&self, text: &str, src: &str, dest: &str) -> Result<String> {
            self.seen.lock().unwrap().push(format!("translate:{src}->{dest}"));
            Ok(format!("[{dest}] {text} "))
        }
        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct Stuck;

    #[async_trait]
    impl TextEnricher for Stuck {
        async fn summarize(&self, _t: &str, _max: usize, _min: usize) -> Result<String> {
            std::future::pending::<()>().await;
            unreachable!()
        }
        async fn translate(&self, t: &str, _s: &str, _d: &str) -> Result<String> {
            Ok(t.to_string())
        }
        fn name(&self) -> &'static str {
            "stuck"
        }
    }

    #[tokio::test]
    async fn prefix_is_bounded_and_summary_translated() {
        let rec = Recording {
            seen: Mutex::new(vec![]),
        };
        let body = "가".repeat(5000);
        let out = summarize_then_translate(&rec, &body, &EnrichmentSettings::default())
            .await
            .expect("enrich ok");
        assert_eq!(out, "[ko] summary of 1000");
        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["summarize:1000:80:20", "translate:en->ko"]);
    }

    #[tokio::test]
    async fn disabled_enricher_fails() {
        let res =
            summarize_then_translate(&DisabledEnricher, "text", &EnrichmentSettings::default()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_enricher_hits_deadline() {
        let settings = EnrichmentSettings {
            timeout: Duration::from_secs(5),
            ..EnrichmentSettings::default()
        };
        let err = summarize_then_translate(&Stuck, "text", &settings)
            .await
            .unwrap_err();
        assert!(crate::error::is_timeout(&err));
    }
}
