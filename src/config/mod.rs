// src/config/mod.rs
//! Monitor configuration: TOML file + env overrides.
//!
//! Lookup order:
//! 1) $MONITOR_CONFIG_PATH
//! 2) config/monitor.toml
//! 3) built-in defaults
//!
//! The webhook URL has no default and must come from the file or `DISCORD_WEBHOOK_URL`.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::FeedQuery;

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";
/// Upper bound on the poll interval (one week).
pub const MAX_POLL_INTERVAL_SECS: u64 = 7 * 24 * 3600;

fn default_liveness_host() -> String {
    "0.0.0.0".to_string()
}
fn default_liveness_port() -> u16 {
    8000
}
fn default_poll_interval_secs() -> u64 {
    3600
}
fn default_candidate_limit() -> usize {
    5
}
fn default_http_timeout_secs() -> u64 {
    20
}
fn default_mention() -> String {
    "@everyone".to_string()
}
fn default_alert_log_path() -> PathBuf {
    PathBuf::from("log.txt")
}
fn default_markers() -> Vec<String> {
    ["주한", "대한민국 대사관", "한국 내 대사관", "서울 주재", "한국 대사관"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_feeds() -> Vec<FeedQuery> {
    vec![
        FeedQuery::new(
            "https://news.google.com/rss/search?q=대한민국+대사관+철수&hl={lang}",
            "ko",
        ),
        FeedQuery::new(
            "https://news.google.com/rss/search?q=embassy+evacuation+South+Korea&hl={lang}",
            "en",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_liveness_host")]
    pub liveness_host: String,
    #[serde(default = "default_liveness_port")]
    pub liveness_port: u16,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Broadcast marker placed at the top of every alert.
    #[serde(default = "default_mention")]
    pub mention: String,
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
    #[serde(default = "default_alert_log_path")]
    pub alert_log_path: PathBuf,
    /// Unset = in-memory registry (dedup lost on restart).
    #[serde(default)]
    pub seen_links_path: Option<PathBuf>,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedQuery>,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            liveness_host: default_liveness_host(),
            liveness_port: default_liveness_port(),
            poll_interval_secs: default_poll_interval_secs(),
            candidate_limit: default_candidate_limit(),
            http_timeout_secs: default_http_timeout_secs(),
            mention: default_mention(),
            markers: default_markers(),
            alert_log_path: default_alert_log_path(),
            seen_links_path: None,
            feeds: default_feeds(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_enrich_timeout_secs() -> u64 {
    60
}
fn default_input_chars() -> usize {
    1000
}
fn default_summary_max_len() -> usize {
    80
}
fn default_summary_min_len() -> usize {
    20
}
fn default_source_lang() -> String {
    "en".to_string()
}
fn default_target_lang() -> String {
    "ko".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Only "openai" for now (any OpenAI-compatible endpoint via `base_url`).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_enrich_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_input_chars")]
    pub input_chars: usize,
    #[serde(default = "default_summary_max_len")]
    pub summary_max_len: usize,
    #[serde(default = "default_summary_min_len")]
    pub summary_min_len: usize,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_enrich_timeout_secs(),
            input_chars: default_input_chars(),
            summary_max_len: default_summary_max_len(),
            summary_min_len: default_summary_min_len(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
        }
    }
}

impl MonitorConfig {
    /// Parse a TOML file. Env overrides are not applied here.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading monitor config from {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut cfg: MonitorConfig = toml::from_str(content).context("parsing monitor config")?;
        cfg.enrichment.provider = cfg.enrichment.provider.trim().to_lowercase();
        Ok(cfg)
    }

    /// File (env path → default path → defaults), then env overrides, then validation.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from_file(&default_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("DISCORD_WEBHOOK_URL") {
            self.webhook_url = v;
        }
        if let Some(port) = env_parse::<u16>("LIVENESS_PORT")?.or(env_parse::<u16>("PORT")?) {
            self.liveness_port = port;
        }
        if let Some(secs) = env_parse::<u64>("POLL_INTERVAL_SECS")? {
            self.poll_interval_secs = secs;
        }
        if let Some(n) = env_parse::<usize>("CANDIDATE_LIMIT")? {
            self.candidate_limit = n;
        }
        if let Ok(p) = std::env::var("SEEN_LINKS_PATH") {
            self.seen_links_path = Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var("ALERT_LOG_PATH") {
            self.alert_log_path = PathBuf::from(p);
        }
        Ok(())
    }

    /// Feeds whose headlines cannot be classified without enrichment (not in the target language).
    pub fn feeds_needing_enrichment(&self) -> Vec<&FeedQuery> {
        if self.enrichment.enabled {
            return Vec::new();
        }
        self.feeds
            .iter()
            .filter(|f| !f.lang.eq_ignore_ascii_case(&self.enrichment.target_lang))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.webhook_url.trim().is_empty() {
            bail!("webhook_url is not set (config file or DISCORD_WEBHOOK_URL)");
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be > 0");
        }
        if self.poll_interval_secs > MAX_POLL_INTERVAL_SECS {
            bail!(
                "poll_interval_secs must be <= {MAX_POLL_INTERVAL_SECS} (one week), got {}",
                self.poll_interval_secs
            );
        }
        if self.candidate_limit == 0 {
            bail!("candidate_limit must be > 0");
        }
        if self.feeds.is_empty() {
            bail!("no feeds configured");
        }
        if self.markers.iter().all(|m| m.trim().is_empty()) {
            bail!("relevance markers are empty; nothing would ever be dispatched");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(None),
    }
}
