//! Demo generator: cycles through a few canned headlines so the stream has
//! something to show without a live feed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::hub::NewsSink;
use crate::news::NewsItem;

pub fn samples() -> Vec<NewsItem> {
    vec![
        NewsItem::new(
            "Reuters",
            "Tech giant beats earnings expectations",
            Some("https://example.com/a".into()),
            "The company reported quarterly earnings above analyst estimates and raised guidance.",
        ),
        NewsItem::new(
            "Bloomberg",
            "Bank faces lawsuit over disclosures",
            Some("https://example.com/b".into()),
            "A new lawsuit alleges the bank misled investors. Shares fell in early trading.",
        ),
        NewsItem::new(
            "WSJ",
            "Oil prices surge amid supply concerns",
            Some("https://example.com/c".into()),
            "Crude oil rose sharply as traders reacted to possible supply disruptions.",
        ),
        NewsItem::new(
            "CNBC",
            "Regulator signals possible rate cuts",
            Some("https://example.com/d".into()),
            "Comments hinted at easing policy, lifting equity futures.",
        ),
    ]
}

#[derive(Clone)]
pub struct DemoFeed {
    sink: Arc<dyn NewsSink>,
    interval: Duration,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DemoFeed {
    pub fn new(sink: Arc<dyn NewsSink>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }
        let sink = self.sink.clone();
        let interval = self.interval;
        *slot = Some(tokio::spawn(async move {
            let samples = samples();
            let mut next = 0usize;
            loop {
                tokio::time::sleep(interval).await;
                sink.ingest(samples[next % samples.len()].clone());
                next = next.wrapping_add(1);
            }
        }));
        info!(interval = ?self.interval, "demo feed started");
        true
    }

    pub fn stop(&self) -> bool {
        match self.task.lock().take() {
            Some(h) => {
                h.abort();
                info!("demo feed stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelSink(mpsc::UnboundedSender<NewsItem>);

    impl NewsSink for ChannelSink {
        fn ingest(&self, item: NewsItem) {
            let _ = self.0.send(item);
        }
    }

    #[tokio::test]
    async fn cycles_samples_round_robin() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let demo = DemoFeed::new(Arc::new(ChannelSink(tx)), Duration::from_millis(5));
        assert!(demo.start());
        assert!(!demo.start());
        assert!(demo.is_running());

        let expected: Vec<String> = samples().into_iter().map(|s| s.headline).collect();
        for i in 0..5 {
            let got = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(got.headline, expected[i % expected.len()]);
        }

        assert!(demo.stop());
        assert!(!demo.stop());
        assert!(!demo.is_running());
    }

    #[test]
    fn samples_are_valid_items() {
        assert!(samples().iter().all(NewsItem::is_valid));
    }
}
