// src/ingest/scheduler.rs
//! Feed poller: fetch on a fixed interval, order, dedupe, and release articles
//! into the hub one at a time with a throttle delay between them.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::hub::NewsSink;
use crate::ingest::types::{BatchFetch, RawArticle};
use crate::ingest::{ensure_metrics_described, fresh_articles, order_batch, SeenSet};

/// Articles waiting for their throttle slot.
const EMIT_QUEUE: usize = 1024;

#[derive(Clone, Copy, Debug)]
pub struct FeedTiming {
    pub poll_interval: Duration,
    pub throttle: Duration,
}

impl Default for FeedTiming {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

impl From<&FeedConfig> for FeedTiming {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            poll_interval: cfg.poll_interval(),
            throttle: cfg.throttle(),
        }
    }
}

#[derive(Clone)]
pub struct FeedPoller {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn BatchFetch>,
    sink: Arc<dyn NewsSink>,
    timing: FeedTiming,
    seen: Arc<SeenSet>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FeedPoller {
    pub fn new(fetcher: Arc<dyn BatchFetch>, sink: Arc<dyn NewsSink>, timing: FeedTiming) -> Self {
        ensure_metrics_described();
        Self {
            inner: Arc::new(Inner {
                fetcher,
                sink,
                timing,
                seen: Arc::new(SeenSet::new()),
                task: Mutex::new(None),
            }),
        }
    }

    /// Begin polling (first fetch immediately). Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut slot = self.inner.task.lock();
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("feed poller already running");
            return false;
        }

        let handle = tokio::spawn(run(
            self.inner.fetcher.clone(),
            self.inner.sink.clone(),
            self.inner.seen.clone(),
            self.inner.timing,
        ));
        *slot = Some(handle);
        info!(
            fetcher = self.inner.fetcher.name(),
            poll_interval = ?self.inner.timing.poll_interval,
            throttle = ?self.inner.timing.throttle,
            "feed poller started"
        );
        true
    }

    /// Cancel polling and any pending throttled emission. Returns `true` if a
    /// running loop was stopped.
    pub fn stop(&self) -> bool {
        let Some(handle) = self.inner.task.lock().take() else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();
        if was_running {
            info!("feed poller stopped");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Headlines emitted so far (kept across stop/start).
    pub fn seen(&self) -> &SeenSet {
        &self.inner.seen
    }
}

async fn run(
    fetcher: Arc<dyn BatchFetch>,
    sink: Arc<dyn NewsSink>,
    seen: Arc<SeenSet>,
    timing: FeedTiming,
) {
    let (tx, rx) = mpsc::channel(EMIT_QUEUE);
    tokio::join!(
        poll_loop(fetcher, seen.clone(), timing.poll_interval, tx),
        emit_loop(rx, sink, seen, timing.throttle),
    );
}

async fn poll_loop(
    fetcher: Arc<dyn BatchFetch>,
    seen: Arc<SeenSet>,
    interval: Duration,
    tx: mpsc::Sender<RawArticle>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        counter!("feed_fetches_total").increment(1);

        let batch = match AssertUnwindSafe(fetcher.fetch_batch()).catch_unwind().await {
            Ok(Ok(b)) => b,
            Ok(Err(e)) => {
                warn!(error = ?e, fetcher = fetcher.name(), "feed fetch failed; next tick retries");
                counter!("feed_fetch_errors_total").increment(1);
                continue;
            }
            Err(_panic) => {
                warn!(fetcher = fetcher.name(), "feed fetch panicked; next tick retries");
                counter!("feed_fetch_errors_total").increment(1);
                continue;
            }
        };
        gauge!("feed_last_fetch_ts").set(chrono::Utc::now().timestamp() as f64);

        let fetched = batch.len();
        let (fresh, duplicates) = fresh_articles(order_batch(batch), &seen);
        counter!("feed_duplicates_total").increment(duplicates as u64);
        info!(
            fetcher = fetcher.name(),
            fetched,
            queued = fresh.len(),
            duplicates,
            "feed batch fetched"
        );

        for article in fresh {
            if tx.send(article).await.is_err() {
                return;
            }
        }
    }
}

async fn emit_loop(
    mut rx: mpsc::Receiver<RawArticle>,
    sink: Arc<dyn NewsSink>,
    seen: Arc<SeenSet>,
    throttle: Duration,
) {
    while let Some(article) = rx.recv().await {
        let Some(headline) = article.headline() else {
            continue;
        };
        // Queued twice (same batch or overlapping batches): skip without waiting.
        if seen.contains(headline) {
            counter!("feed_duplicates_total").increment(1);
            continue;
        }

        tokio::time::sleep(throttle).await;

        if !seen.insert(headline) {
            counter!("feed_duplicates_total").increment(1);
            continue;
        }
        let item = article.to_news_item();
        debug!(source = %item.source, headline = %item.headline, "feed item emitted");
        counter!("feed_items_emitted_total").increment(1);
        sink.ingest(item);
    }
}
