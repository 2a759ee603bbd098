// src/analyze/rules.rs
//! Keyword rules backing the `mock` analysis mode.
//!
//! No I/O and deterministic, so it doubles as the default backend for local
//! runs and tests.

use crate::news::{Analysis, NewsItem, Sentiment};

const BULLISH_KEYWORDS: &[&str] = &["beats", "surge", "record", "upgrade"];
const BEARISH_KEYWORDS: &[&str] = &["miss", "plunge", "downgrade", "lawsuit"];

#[derive(Debug, Clone, Default)]
pub struct RuleAnalyzer;

impl RuleAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Bullish keywords win over bearish ones when both appear.
    pub fn classify(&self, item: &NewsItem) -> Sentiment {
        let text = format!("{} {}", item.headline, item.content).to_lowercase();
        if BULLISH_KEYWORDS.iter().any(|k| text.contains(k)) {
            Sentiment::Bullish
        } else if BEARISH_KEYWORDS.iter().any(|k| text.contains(k)) {
            Sentiment::Bearish
        } else {
            Sentiment::Neutral
        }
    }

    pub fn analyze(&self, item: NewsItem) -> Analysis {
        let sentiment = self.classify(&item);
        let risk = match sentiment {
            Sentiment::Bullish => 3,
            Sentiment::Bearish => 8,
            Sentiment::Neutral => 5,
        };
        let summary = format!("Mock summary: {}", item.headline);
        Analysis::for_item(item, sentiment, risk, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_headline_scores_low_risk() {
        let item = NewsItem::new(
            "Reuters",
            "Stock surges to record highs",
            None,
            "Beats expectations",
        );
        let a = RuleAnalyzer::new().analyze(item);
        assert_eq!(a.sentiment, Sentiment::Bullish);
        assert_eq!(a.risk_score, 3);
        assert!(a.summary.contains("Stock surges to record highs"));
        assert_eq!(a.source, "Reuters");
    }

    #[test]
    fn bearish_keywords_in_content() {
        let item = NewsItem::new(
            "Bloomberg",
            "Bank faces questions",
            None,
            "A new LAWSUIT alleges the bank misled investors.",
        );
        let a = RuleAnalyzer::new().analyze(item);
        assert_eq!(a.sentiment, Sentiment::Bearish);
        assert_eq!(a.risk_score, 8);
    }

    #[test]
    fn no_keywords_is_neutral() {
        let item = NewsItem::new("WSJ", "Markets open", None, "Trading was quiet.");
        let a = RuleAnalyzer::new().analyze(item);
        assert_eq!(a.sentiment, Sentiment::Neutral);
        assert_eq!(a.risk_score, 5);
    }
}
