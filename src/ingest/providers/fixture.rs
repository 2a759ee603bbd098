// src/ingest/providers/fixture.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::types::{BatchFetch, NewsApiResponse, RawArticle};

/// Reads a NewsAPI-shaped JSON file on every fetch. Used for local runs and demos.
pub struct FixtureFetcher {
    path: PathBuf,
}

impl FixtureFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BatchFetch for FixtureFetcher {
    async fn fetch_batch(&self) -> Result<Vec<RawArticle>> {
        tracing::info!(path = %self.path.display(), "reading news from fixture file");
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading fixture {}", self.path.display()))?;
        let body: NewsApiResponse = serde_json::from_str(&raw)
            .with_context(|| format!("parsing fixture {}", self.path.display()))?;
        Ok(body.articles)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
