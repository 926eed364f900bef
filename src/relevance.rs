// src/relevance.rs
//! Relevance gate: an alert passes if its localized summary mentions a home-mission marker.

use crate::classify::ClassifiedAlert;

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    markers: Vec<String>,
}

impl RelevanceFilter {
    /// Blank markers are dropped; an empty string would otherwise match everything.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers = markers
            .into_iter()
            .map(Into::into)
            .filter(|m: &String| !m.trim().is_empty())
            .collect();
        Self { markers }
    }

    /// Case-sensitive substring match, OR across markers.
    pub fn matched_marker(&self, summary: &str) -> Option<&str> {
        self.markers
            .iter()
            .find(|m| summary.contains(m.as_str()))
            .map(String::as_str)
    }

    pub fn accepts(&self, alert: &ClassifiedAlert) -> bool {
        self.matched_marker(&alert.localized_summary).is_some()
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}
