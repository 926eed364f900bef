// src/resolve.rs
//! Article resolver: follow the feed link's redirects and pull readable body text.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArticle {
    pub canonical_url: String,
    pub body_text: String,
}

#[async_trait]
pub trait ArticleResolver: Send + Sync {
    async fn resolve(&self, link: &str) -> Result<ResolvedArticle>;
}

pub struct HttpArticleResolver {
    client: reqwest::Client,
}

impl HttpArticleResolver {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("embassy-alert/0.1")
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building article http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleResolver for HttpArticleResolver {
    async fn resolve(&self, link: &str) -> Result<ResolvedArticle> {
        let resp = self
            .client
            .get(link)
            .send()
            .await
            .with_context(|| format!("article get {link}"))?
            .error_for_status()
            .context("article non-2xx")?;

        let canonical_url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_text_content_type(&content_type) {
            bail!("non-text article response ({content_type}) from {canonical_url}");
        }

        let raw = resp.text().await.context("article .text()")?;
        Ok(ResolvedArticle {
            canonical_url,
            body_text: extract_text(&raw),
        })
    }
}

/// Missing content type is tolerated; anything declared must be textual.
fn is_text_content_type(ct: &str) -> bool {
    let ct = ct.trim().to_ascii_lowercase();
    ct.is_empty()
        || ct.starts_with("text/")
        || ct.starts_with("application/xhtml")
        || ct.starts_with("application/xml")
}

/// Reduce an HTML page to plain text.
pub fn extract_text(html: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS
        .get_or_init(|| Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>").unwrap());
    let stripped = re_blocks.replace_all(html, " ");

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap());
    let stripped = re_tags.replace_all(&stripped, " ");

    let decoded = html_escape::decode_html_entities(&stripped);

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}
