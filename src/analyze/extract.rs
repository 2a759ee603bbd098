// src/analyze/extract.rs
//! Lenient field extraction from model replies.
//!
//! Replies are expected to be JSON but regularly arrive wrapped in prose or
//! markdown, truncated, or with one broken field. Each field is matched on its
//! own so a bad `sentiment` never costs us a good `summary`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::news::{clamp_risk, Sentiment};

pub const DEFAULT_RISK_SCORE: u8 = 5;
pub const DEFAULT_SUMMARY: &str = "Summary unavailable.";

static RE_SENTIMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"sentiment"\s*:\s*"(BULLISH|BEARISH|NEUTRAL)""#).expect("sentiment regex")
});
static RE_RISK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""riskScore"\s*:\s*(-?\d{1,2})"#).expect("risk regex"));
static RE_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("summary regex")
});

/// Fields recovered from a raw reply; always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnalysis {
    pub sentiment: Sentiment,
    pub risk_score: u8,
    pub summary: String,
}

/// Extract sentiment, risk score and summary from `raw`. Never fails.
pub fn parse_analysis(raw: &str) -> ParsedAnalysis {
    let text = raw.trim();
    ParsedAnalysis {
        sentiment: match_sentiment(text),
        risk_score: match_risk(text),
        summary: match_summary(text),
    }
}

fn match_sentiment(text: &str) -> Sentiment {
    RE_SENTIMENT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| Sentiment::from_label(m.as_str()))
        .unwrap_or_default()
}

fn match_risk(text: &str) -> u8 {
    RE_RISK
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(clamp_risk)
        .unwrap_or(DEFAULT_RISK_SCORE)
}

fn match_summary(text: &str) -> String {
    RE_SUMMARY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| unescape(m.as_str()).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_string())
}

/// Undo the common JSON string escapes. Unknown escapes are kept verbatim.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
