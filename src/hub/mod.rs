// src/hub/mod.rs
//! Ingestion & distribution hub.
//!
//! Producers call `ingest` (never blocks). A dispatcher pulls items off a
//! bounded queue and runs at most `MAX_IN_FLIGHT` analyses at once; each
//! success goes to the replay broadcaster, which multicasts to subscribers.
//! Per-item failures are logged and dropped; the dispatcher keeps running.

pub mod replay;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use metrics::{counter, gauge};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::analyze::DynAnalyzer;
use crate::config::HubSettings;
use crate::news::NewsItem;

pub use replay::{ReplayBroadcaster, Subscription, REPLAY_CAPACITY};

/// Ceiling on concurrently running analyses.
pub const MAX_IN_FLIGHT: usize = 8;

/// Anything that accepts news items for analysis (the hub, or a test double).
pub trait NewsSink: Send + Sync {
    fn ingest(&self, item: NewsItem);
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Items buffered ahead of the workers; beyond this new items are dropped.
    pub ingest_capacity: usize,
    pub max_in_flight: usize,
    pub replay_capacity: usize,
    pub analysis_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::from(&HubSettings::default())
    }
}

impl From<&HubSettings> for HubConfig {
    fn from(s: &HubSettings) -> Self {
        Self {
            ingest_capacity: s.ingest_capacity,
            max_in_flight: MAX_IN_FLIGHT,
            replay_capacity: REPLAY_CAPACITY,
            analysis_timeout: Duration::from_secs(s.analysis_timeout_secs.max(1)),
        }
    }
}

/// Cheap-to-clone handle onto the running pipeline.
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::Sender<NewsItem>,
    broadcaster: ReplayBroadcaster,
}

impl Hub {
    /// Start the dispatcher and broadcaster tasks. Must be called inside a
    /// tokio runtime.
    pub fn spawn(analyzer: DynAnalyzer, cfg: HubConfig) -> Self {
        let (tx, rx) = mpsc::channel(cfg.ingest_capacity.max(1));
        let broadcaster = ReplayBroadcaster::spawn(cfg.replay_capacity);

        info!(
            backend = analyzer.name(),
            max_in_flight = cfg.max_in_flight,
            ingest_capacity = cfg.ingest_capacity,
            "hub started"
        );
        tokio::spawn(dispatch_loop(rx, analyzer, broadcaster.clone(), cfg));

        Self { tx, broadcaster }
    }

    /// Best-effort enqueue. Drops the item (with a warning) when the queue is full.
    pub fn ingest(&self, item: NewsItem) {
        match self.tx.try_send(item) {
            Ok(()) => {
                counter!("hub_items_ingested_total").increment(1);
            }
            Err(TrySendError::Full(item)) => {
                warn!(headline = %item.headline, "ingestion queue full; dropping item");
                counter!("hub_items_dropped_total").increment(1);
            }
            Err(TrySendError::Closed(item)) => {
                warn!(headline = %item.headline, "hub dispatcher stopped; dropping item");
                counter!("hub_items_dropped_total").increment(1);
            }
        }
    }

    /// Replay of up to the last 50 analyses, then live ones.
    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }
}

impl NewsSink for Hub {
    fn ingest(&self, item: NewsItem) {
        Hub::ingest(self, item)
    }
}

struct InFlight;

impl InFlight {
    fn enter() -> Self {
        gauge!("hub_in_flight").increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!("hub_in_flight").decrement(1.0);
    }
}

async fn dispatch_loop(
    mut rx: mpsc::Receiver<NewsItem>,
    analyzer: DynAnalyzer,
    broadcaster: ReplayBroadcaster,
    cfg: HubConfig,
) {
    let permits = Arc::new(Semaphore::new(cfg.max_in_flight.max(1)));

    loop {
        // Take a slot first so waiting items stay in the queue.
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let Some(item) = rx.recv().await else {
            break;
        };

        let analyzer = analyzer.clone();
        let broadcaster = broadcaster.clone();
        let timeout = cfg.analysis_timeout;

        tokio::spawn(async move {
            let _permit = permit;
            let _in_flight = InFlight::enter();
            let headline = item.headline.clone();

            let fut = AssertUnwindSafe(analyzer.analyze(item)).catch_unwind();
            match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(Ok(analysis))) => {
                    debug!(id = %analysis.id, headline = %headline, "analysis complete");
                    counter!("hub_analyses_emitted_total").increment(1);
                    broadcaster.publish(analysis);
                }
                Ok(Ok(Err(e))) => {
                    warn!(error = ?e, headline = %headline, "analysis failed; item dropped");
                    counter!("hub_analysis_failures_total").increment(1);
                }
                Ok(Err(_panic)) => {
                    warn!(headline = %headline, "analysis panicked; item dropped");
                    counter!("hub_analysis_failures_total").increment(1);
                }
                Err(_elapsed) => {
                    warn!(headline = %headline, ?timeout, "analysis timed out; item dropped");
                    counter!("hub_analysis_failures_total").increment(1);
                }
            }
        });
    }

    info!("hub dispatch loop finished");
}
