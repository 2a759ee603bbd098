//! news.rs: value types flowing through the pipeline.
//!
//! `NewsItem` is what producers hand to the hub; `Analysis` is what subscribers
//! receive. Both are immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Short-term market tone of a news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Case-insensitive parse of `BULLISH` / `BEARISH` / `NEUTRAL`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BULLISH" => Some(Self::Bullish),
            "BEARISH" => Some(Self::Bearish),
            "NEUTRAL" => Some(Self::Neutral),
            _ => None,
        }
    }
}

/// Normalized unit of text to be analyzed.
///
/// Missing JSON fields deserialize to empty strings so the API can report them
/// as validation errors instead of a body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl NewsItem {
    pub fn new(
        source: impl Into<String>,
        headline: impl Into<String>,
        url: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            headline: headline.into(),
            url,
            content: content.into(),
        }
    }

    /// Names of required fields that are blank. Empty means the item is valid.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.source.trim().is_empty() {
            out.push("source");
        }
        if self.headline.trim().is_empty() {
            out.push("headline");
        }
        if self.content.trim().is_empty() {
            out.push("content");
        }
        out
    }

    pub fn is_valid(&self) -> bool {
        self.blank_fields().is_empty()
    }
}

/// Structured sentiment/risk/summary result for one `NewsItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub headline: String,
    pub url: Option<String>,
    pub sentiment: Sentiment,
    /// Downside risk / uncertainty, always within 1..=10.
    pub risk_score: u8,
    pub summary: String,
}

impl Analysis {
    /// Build an analysis for `item`, consuming it. Assigns a fresh id and the
    /// current time; clamps `risk_score` into range.
    pub fn for_item(item: NewsItem, sentiment: Sentiment, risk_score: i64, summary: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source: item.source,
            headline: item.headline,
            url: item.url,
            sentiment,
            risk_score: clamp_risk(risk_score),
            summary,
        }
    }
}

/// Clamp any integer into the valid risk range 1..=10.
pub fn clamp_risk(raw: i64) -> u8 {
    raw.clamp(1, 10) as u8
}
