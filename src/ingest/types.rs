// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::news::NewsItem;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Article as returned by NewsAPI. Every field may be null or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawArticle {
    pub source: Option<ArticleSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// ISO-8601 / RFC 3339, e.g. "2024-05-01T12:30:00Z".
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// Envelope of the NewsAPI `top-headlines` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsApiResponse {
    pub status: Option<String>,
    pub total_results: Option<u64>,
    pub articles: Vec<RawArticle>,
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

impl RawArticle {
    /// Trimmed title, if any. This is the dedup key.
    pub fn headline(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    /// source = source.name or "Unknown"; content = description, else content,
    /// else title (first non-blank wins); headline = title.
    pub fn to_news_item(&self) -> NewsItem {
        let source = self
            .source
            .as_ref()
            .and_then(|s| non_blank(&s.name))
            .unwrap_or("Unknown");
        let headline = self.headline().unwrap_or_default();
        let content = non_blank(&self.description)
            .or_else(|| non_blank(&self.content))
            .unwrap_or(headline);
        NewsItem::new(source, headline, self.url.clone(), content)
    }
}

/// A source of article batches (remote API, fixture file, test double).
#[async_trait::async_trait]
pub trait BatchFetch: Send + Sync {
    async fn fetch_batch(&self) -> Result<Vec<RawArticle>>;
    fn name(&self) -> &'static str;
}
