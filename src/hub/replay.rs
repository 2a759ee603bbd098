// src/hub/replay.rs
//! Replay broadcaster: keeps the last N analyses and fans every new one out to
//! all live subscribers.
//!
//! A single task owns the ring buffer and the subscriber list. Publishing and
//! subscribing are both commands on one queue, so a new subscriber sees the
//! snapshot and then every later emission with no gap and no duplicate.
//! Subscriber queues are unbounded: a slow reader buffers, it never misses
//! events. A closed subscriber is pruned on the next command.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use metrics::gauge;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::news::Analysis;

/// Depth of the history handed to late subscribers.
pub const REPLAY_CAPACITY: usize = 50;

enum Command {
    Publish(Analysis),
    Subscribe(mpsc::UnboundedSender<Analysis>),
}

#[derive(Clone)]
pub struct ReplayBroadcaster {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl ReplayBroadcaster {
    /// Spawn the owning task.
    pub fn spawn(replay_capacity: usize) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(cmd_rx, replay_capacity));
        Self { cmd_tx }
    }

    pub fn publish(&self, analysis: Analysis) {
        if self.cmd_tx.send(Command::Publish(analysis)).is_err() {
            warn!("replay broadcaster is gone; analysis discarded");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.cmd_tx.send(Command::Subscribe(tx)).is_err() {
            warn!("replay broadcaster is gone; subscription will be empty");
        }
        Subscription { rx }
    }
}

async fn run(mut cmd_rx: mpsc::UnboundedReceiver<Command>, capacity: usize) {
    let mut history: VecDeque<Analysis> = VecDeque::with_capacity(capacity);
    let mut subscribers: Vec<mpsc::UnboundedSender<Analysis>> = Vec::new();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            Command::Publish(analysis) => {
                subscribers.retain(|sub| sub.send(analysis.clone()).is_ok());

                history.push_back(analysis);
                while history.len() > capacity {
                    history.pop_front();
                }
            }
            Command::Subscribe(tx) => {
                subscribers.retain(|s| !s.is_closed());
                for past in history.iter() {
                    if tx.send(past.clone()).is_err() {
                        break;
                    }
                }
                debug!(replayed = history.len(), "subscriber attached");
                subscribers.push(tx);
            }
        }
        gauge!("hub_subscribers").set(subscribers.len() as f64);
    }
}

/// Live view of the analysis stream for one subscriber.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Analysis>,
}

impl Subscription {
    /// Next analysis; `None` only if the hub has shut down.
    pub async fn recv(&mut self) -> Option<Analysis> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Analysis;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Analysis>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::{NewsItem, Sentiment};
    use std::time::Duration;

    fn analysis(n: usize) -> Analysis {
        Analysis::for_item(
            NewsItem::new("test", format!("headline {n}"), None, "body"),
            Sentiment::Neutral,
            5,
            String::new(),
        )
    }

    async fn next(sub: &mut Subscription) -> Analysis {
        tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out waiting for analysis")
            .expect("stream closed")
    }

    #[tokio::test]
    async fn late_subscriber_gets_history_in_order_then_live() {
        let b = ReplayBroadcaster::spawn(REPLAY_CAPACITY);
        for i in 0..3 {
            b.publish(analysis(i));
        }
        let mut sub = b.subscribe();
        for i in 0..3 {
            assert_eq!(next(&mut sub).await.headline, format!("headline {i}"));
        }
        b.publish(analysis(3));
        assert_eq!(next(&mut sub).await.headline, "headline 3");
    }

    #[tokio::test]
    async fn history_is_capped_to_most_recent() {
        let b = ReplayBroadcaster::spawn(REPLAY_CAPACITY);
        for i in 0..(REPLAY_CAPACITY + 20) {
            b.publish(analysis(i));
        }
        let mut sub = b.subscribe();
        for i in 20..(REPLAY_CAPACITY + 20) {
            assert_eq!(next(&mut sub).await.headline, format!("headline {i}"));
        }
        // Nothing older than the window is left over.
        b.publish(analysis(999));
        assert_eq!(next(&mut sub).await.headline, "headline 999");
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let b = ReplayBroadcaster::spawn(REPLAY_CAPACITY);
        let mut s1 = b.subscribe();
        let mut s2 = b.subscribe();
        b.publish(analysis(1));
        assert_eq!(next(&mut s1).await.headline, "headline 1");
        assert_eq!(next(&mut s2).await.headline, "headline 1");
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_others() {
        let b = ReplayBroadcaster::spawn(REPLAY_CAPACITY);
        let dropped = b.subscribe();
        let mut kept = b.subscribe();
        drop(dropped);
        b.publish(analysis(7));
        assert_eq!(next(&mut kept).await.headline, "headline 7");
    }

    #[tokio::test]
    async fn idle_subscriber_receives_every_event_of_a_long_burst() {
        let b = ReplayBroadcaster::spawn(REPLAY_CAPACITY);
        let mut sub = b.subscribe();
        let n = 1_000;
        for i in 0..n {
            b.publish(analysis(i));
        }
        for i in 0..n {
            assert_eq!(next(&mut sub).await.headline, format!("headline {i}"));
        }
    }
}
