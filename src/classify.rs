// src/classify.rs
//! Classifier: derive {country, reported time, localized summary} from title + body.
//!
//! Titles mentioning an embassy in English take the foreign branch: the country comes from
//! the title, the time is "now", and the summary is the enriched (summarized + translated)
//! article body. Everything else takes the home branch: country and date are pulled from
//! the Korean body text with fixed patterns and the title is used as the summary. Only the
//! foreign branch calls the enricher.

use anyhow::Result;
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::enrich::{summarize_then_translate, DynEnricher, EnrichmentSettings};
use crate::ingest::types::NewsItem;
use crate::resolve::ResolvedArticle;

pub const UNKNOWN_FOREIGN_COUNTRY: &str = "해외국가";
pub const UNKNOWN_COUNTRY: &str = "알 수 없음";
pub const REPORTED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

static RE_FOREIGN_COUNTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]+) Embassy").expect("foreign country regex"));
static RE_HOME_COUNTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[가-힣]{2,10} 대사관").expect("home country regex"));
static RE_HOME_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}월 \d{1,2}일|\d{4}년 \d{1,2}월 \d{1,2}일").expect("home date regex")
});

const MISSION_SUFFIX: &str = " 대사관";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Foreign,
    Home,
}

impl Branch {
    pub fn for_title(title: &str) -> Self {
        if title.to_lowercase().contains("embassy") {
            Branch::Foreign
        } else {
            Branch::Home
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAlert {
    pub title: String,
    pub link: String,
    pub country: String,
    pub reported_time: String,
    pub localized_summary: String,
}

/// Country from an English title, e.g. "Korean Embassy ..." -> "Korean".
pub fn foreign_country(title: &str) -> String {
    RE_FOREIGN_COUNTRY
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_FOREIGN_COUNTRY.to_string())
}

/// Country and reported date from Korean body text; date falls back to `now`.
pub fn home_country_and_time(body: &str, now: DateTime<Local>) -> (String, String) {
    let country = RE_HOME_COUNTRY
        .find(body)
        .map(|m| m.as_str().trim_end_matches(MISSION_SUFFIX).to_string())
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());
    let time = RE_HOME_DATE
        .find(body)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| now.format(REPORTED_TIME_FORMAT).to_string());
    (country, time)
}

pub struct Classifier {
    enricher: DynEnricher,
    settings: EnrichmentSettings,
}

impl Classifier {
    pub fn new(enricher: DynEnricher, settings: EnrichmentSettings) -> Self {
        Self { enricher, settings }
    }

    pub async fn classify(
        &self,
        item: &NewsItem,
        article: &ResolvedArticle,
        now: DateTime<Local>,
    ) -> Result<ClassifiedAlert> {
        let (country, reported_time, localized_summary) = match Branch::for_title(&item.title) {
            Branch::Foreign => {
                let summary =
                    summarize_then_translate(self.enricher.as_ref(), &article.body_text, &self.settings)
                        .await?;
                (
                    foreign_country(&item.title),
                    now.format(REPORTED_TIME_FORMAT).to_string(),
                    summary,
                )
            }
            Branch::Home => {
                let (country, time) = home_country_and_time(&article.body_text, now);
                (country, time, item.title.clone())
            }
        };

        Ok(ClassifiedAlert {
            title: item.title.clone(),
            link: item.link.clone(),
            country,
            reported_time,
            localized_summary,
        })
    }
}
