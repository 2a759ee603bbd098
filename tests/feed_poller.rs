// tests/feed_poller.rs
//
// Poller behaviour against a scripted fetcher and a recording sink.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use market_news_stream::hub::NewsSink;
use market_news_stream::ingest::types::{ArticleSource, RawArticle};
use market_news_stream::ingest::{BatchFetch, FeedPoller, FeedTiming};
use market_news_stream::news::NewsItem;

/// Hands out one scripted batch per call; an empty script yields empty batches.
#[derive(Default)]
struct Scripted {
    batches: Mutex<VecDeque<Result<Vec<RawArticle>>>>,
    calls: Mutex<usize>,
}

impl Scripted {
    fn new(batches: Vec<Result<Vec<RawArticle>>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl BatchFetch for Scripted {
    async fn fetch_batch(&self) -> Result<Vec<RawArticle>> {
        *self.calls.lock() += 1;
        self.batches.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<NewsItem>>);

impl Recorder {
    fn headlines(&self) -> Vec<String> {
        self.0.lock().iter().map(|i| i.headline.clone()).collect()
    }
}

impl NewsSink for Recorder {
    fn ingest(&self, item: NewsItem) {
        self.0.lock().push(item);
    }
}

fn article(title: &str, published_at: &str) -> RawArticle {
    RawArticle {
        source: Some(ArticleSource {
            id: None,
            name: Some("Reuters".into()),
        }),
        title: Some(title.into()),
        description: Some(format!("{title} description")),
        url: Some(format!("https://example.test/{title}")),
        published_at: Some(published_at.into()),
        ..RawArticle::default()
    }
}

fn fast() -> FeedTiming {
    FeedTiming {
        poll_interval: Duration::from_millis(40),
        throttle: Duration::from_millis(5),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test]
async fn same_headline_in_two_batches_is_ingested_once() {
    let fetcher = Scripted::new(vec![
        Ok(vec![article("Rates hold", "2024-05-01T10:00:00Z")]),
        Ok(vec![article("Rates hold", "2024-05-01T10:00:00Z")]),
    ]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher.clone(), sink.clone(), fast());

    assert!(poller.start());
    settle().await;
    poller.stop();

    assert!(fetcher.calls() >= 2);
    assert_eq!(sink.headlines(), vec!["Rates hold".to_string()]);
    assert!(poller.seen().contains("Rates hold"));
}

#[tokio::test]
async fn batch_is_emitted_oldest_first() {
    let fetcher = Scripted::new(vec![Ok(vec![
        article("T2", "2024-05-01T12:00:00Z"),
        article("T1", "2024-05-01T11:00:00Z"),
    ])]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher, sink.clone(), fast());

    poller.start();
    settle().await;
    poller.stop();

    assert_eq!(sink.headlines(), vec!["T1".to_string(), "T2".to_string()]);
}

#[tokio::test]
async fn duplicate_within_one_batch_is_emitted_once() {
    let fetcher = Scripted::new(vec![Ok(vec![
        article("Same", "2024-05-01T11:00:00Z"),
        article("Same", "2024-05-01T11:05:00Z"),
    ])]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher, sink.clone(), fast());

    poller.start();
    settle().await;
    poller.stop();

    assert_eq!(sink.headlines(), vec!["Same".to_string()]);
}

#[tokio::test]
async fn missing_fields_fall_back() {
    let bare = RawArticle {
        title: Some("Only a title".into()),
        ..RawArticle::default()
    };
    let fetcher = Scripted::new(vec![Ok(vec![bare])]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher, sink.clone(), fast());

    poller.start();
    settle().await;
    poller.stop();

    let items = sink.0.lock().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source, "Unknown");
    assert_eq!(items[0].content, "Only a title");
    assert_eq!(items[0].url, None);
}

#[tokio::test]
async fn fetch_error_is_retried_on_next_tick() {
    let fetcher = Scripted::new(vec![
        Err(anyhow::anyhow!("upstream 503")),
        Ok(vec![article("Recovered", "2024-05-01T09:00:00Z")]),
    ]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher.clone(), sink.clone(), fast());

    poller.start();
    settle().await;
    assert!(poller.is_running());
    poller.stop();

    assert!(fetcher.calls() >= 2);
    assert_eq!(sink.headlines(), vec!["Recovered".to_string()]);
}

#[tokio::test]
async fn start_is_idempotent_and_stop_halts_fetching() {
    let fetcher = Scripted::new(Vec::new());
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher.clone(), sink, fast());

    assert!(!poller.is_running());
    assert!(poller.start());
    assert!(!poller.start());
    assert!(poller.is_running());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(poller.stop());
    assert!(!poller.is_running());
    assert!(!poller.stop());

    let after_stop = fetcher.calls();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(fetcher.calls(), after_stop);

    // Restart works and keeps polling.
    assert!(poller.start());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fetcher.calls() > after_stop);
    poller.stop();
}

#[tokio::test]
async fn stop_cancels_pending_throttled_items() {
    let fetcher = Scripted::new(vec![Ok(vec![
        article("A", "2024-05-01T10:00:00Z"),
        article("B", "2024-05-01T10:01:00Z"),
        article("C", "2024-05-01T10:02:00Z"),
    ])]);
    let sink = Arc::new(Recorder::default());
    let timing = FeedTiming {
        poll_interval: Duration::from_secs(60),
        throttle: Duration::from_millis(200),
    };
    let poller = FeedPoller::new(fetcher, sink.clone(), timing);

    poller.start();
    // First emission lands after one throttle delay; stop before the second.
    tokio::time::sleep(Duration::from_millis(300)).await;
    poller.stop();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(sink.headlines(), vec!["A".to_string()]);
}

#[tokio::test]
async fn untitled_articles_are_skipped() {
    let untitled = RawArticle {
        description: Some("no title".into()),
        ..RawArticle::default()
    };
    let fetcher = Scripted::new(vec![Ok(vec![untitled, article("Titled", "2024-05-01T10:00:00Z")])]);
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher, sink.clone(), fast());

    poller.start();
    settle().await;
    poller.stop();

    assert_eq!(sink.headlines(), vec!["Titled".to_string()]);
}

#[tokio::test]
async fn failing_fetcher_never_emits() {
    struct Down;
    #[async_trait]
    impl BatchFetch for Down {
        async fn fetch_batch(&self) -> Result<Vec<RawArticle>> {
            bail!("connection refused")
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(Arc::new(Down), sink.clone(), fast());
    poller.start();
    settle().await;
    assert!(poller.is_running());
    poller.stop();
    assert!(sink.headlines().is_empty());
}

#[tokio::test]
async fn panicking_fetch_is_retried_and_poller_keeps_running() {
    struct PanicsOnce {
        calls: Mutex<usize>,
    }
    #[async_trait]
    impl BatchFetch for PanicsOnce {
        async fn fetch_batch(&self) -> Result<Vec<RawArticle>> {
            let call = {
                let mut calls = self.calls.lock();
                *calls += 1;
                *calls
            };
            if call == 1 {
                panic!("decoder blew up");
            }
            Ok(vec![article("After panic", "2024-05-01T10:00:00Z")])
        }
        fn name(&self) -> &'static str {
            "panics-once"
        }
    }

    let fetcher = Arc::new(PanicsOnce {
        calls: Mutex::new(0),
    });
    let sink = Arc::new(Recorder::default());
    let poller = FeedPoller::new(fetcher.clone(), sink.clone(), fast());

    poller.start();
    settle().await;
    assert!(poller.is_running());
    poller.stop();

    assert!(*fetcher.calls.lock() >= 2);
    assert_eq!(sink.headlines(), vec!["After panic".to_string()]);
}
