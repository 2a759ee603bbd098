// src/ingest/mod.rs
//! Feed ingestion: batch fetchers, ordering/dedup helpers and the poller.

pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashSet;

use crate::ingest::types::RawArticle;

pub use scheduler::{FeedPoller, FeedTiming};
pub use types::{BatchFetch, NewsApiResponse};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_fetches_total", "Batch fetch attempts.");
        describe_counter!("feed_fetch_errors_total", "Batch fetches that failed.");
        describe_counter!(
            "feed_items_emitted_total",
            "Articles forwarded to the hub after throttling."
        );
        describe_counter!(
            "feed_duplicates_total",
            "Articles skipped because their headline was already seen."
        );
        describe_gauge!(
            "feed_last_fetch_ts",
            "Unix ts of the last successful batch fetch."
        );
    });
}

/// Headlines already emitted by the poller. Append-only for the poller's
/// lifetime; grows with feed volume.
#[derive(Debug, Default)]
pub struct SeenSet {
    inner: Mutex<HashSet<String>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, headline: &str) -> bool {
        self.inner.lock().contains(headline)
    }

    /// Returns `true` if the headline was not present before.
    pub fn insert(&self, headline: &str) -> bool {
        self.inner.lock().insert(headline.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse `publishedAt`; missing or unparseable values yield `None`.
pub fn published_at(article: &RawArticle) -> Option<DateTime<Utc>> {
    article
        .published_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Oldest first. Stable, so ties keep fetch order; undated articles go first.
pub fn order_batch(mut batch: Vec<RawArticle>) -> Vec<RawArticle> {
    batch.sort_by_key(published_at);
    batch
}

/// Drop untitled articles and those whose headline is already in `seen`.
/// Returns the survivors and the number of duplicates skipped.
pub fn fresh_articles(batch: Vec<RawArticle>, seen: &SeenSet) -> (Vec<RawArticle>, usize) {
    let mut dup = 0usize;
    let mut keep = Vec::with_capacity(batch.len());
    for article in batch {
        let Some(headline) = article.headline() else {
            tracing::debug!(url = ?article.url, "skipping untitled article");
            continue;
        };
        if seen.contains(headline) {
            dup += 1;
            continue;
        }
        keep.push(article);
    }
    (keep, dup)
}
