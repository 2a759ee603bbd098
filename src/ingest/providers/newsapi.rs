// src/ingest/providers/newsapi.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::ingest::types::{BatchFetch, NewsApiResponse, RawArticle};

/// Rotated one per fetch so consecutive polls cover different desks.
pub const CATEGORIES: [&str; 4] = ["business", "technology", "science", "general"];

/// NewsAPI `top-headlines` client.
pub struct NewsApiFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    country: String,
    next_category: AtomicUsize,
}

impl NewsApiFetcher {
    pub fn new(base_url: &str, api_key: Option<String>, country: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("market-news-stream/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building NewsAPI HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            country: country.to_string(),
            next_category: AtomicUsize::new(0),
        })
    }

    fn next_category(&self) -> &'static str {
        let i = self.next_category.fetch_add(1, Ordering::Relaxed);
        CATEGORIES[i % CATEGORIES.len()]
    }
}

#[async_trait]
impl BatchFetch for NewsApiFetcher {
    async fn fetch_batch(&self) -> Result<Vec<RawArticle>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("NewsAPI key is not configured"))?;
        let category = self.next_category();
        let url = format!("{}/v2/top-headlines", self.base_url);

        tracing::info!(
            url = %format!("{url}?country={}&category={category}&apiKey=[HIDDEN]", self.country),
            "fetching news from NewsAPI"
        );

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("country", self.country.as_str()),
                ("category", category),
                ("apiKey", key),
            ])
            .send()
            .await
            .context("NewsAPI request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("NewsAPI error {status}: {body}");
        }

        let body: NewsApiResponse = resp.json().await.context("decoding NewsAPI response")?;
        if body.status.as_deref() == Some("error") {
            bail!("NewsAPI reported status=error");
        }
        tracing::debug!(
            category,
            articles = body.articles.len(),
            total = ?body.total_results,
            "NewsAPI batch received"
        );
        Ok(body.articles)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_rotate_and_wrap() {
        let f = NewsApiFetcher::new("https://newsapi.org/", Some("k".into()), "us").unwrap();
        let seq: Vec<_> = (0..5).map(|_| f.next_category()).collect();
        assert_eq!(
            seq,
            vec!["business", "technology", "science", "general", "business"]
        );
        assert_eq!(f.base_url, "https://newsapi.org");
    }

    #[tokio::test]
    async fn missing_key_errors_without_network() {
        let f = NewsApiFetcher::new("http://127.0.0.1:9", None, "us").unwrap();
        let err = f.fetch_batch().await.unwrap_err();
        assert!(err.to_string().contains("key"));
    }
}
