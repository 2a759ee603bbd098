//! Wiring: builds every component from `AppConfig` and exposes the router.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

use crate::analyze::AnalyzerBackend;
use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::demo::DemoFeed;
use crate::hub::{Hub, HubConfig, NewsSink};
use crate::ingest::providers::build_fetcher;
use crate::ingest::{FeedPoller, FeedTiming};

pub struct Services {
    pub hub: Hub,
    pub feed: FeedPoller,
    pub demo: DemoFeed,
}

impl Services {
    /// Build the pipeline. Misconfiguration (unusable analysis backend, enabled
    /// feed without credentials) is returned as an error so startup can abort.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let analyzer = AnalyzerBackend::from_config(&cfg.ai)?.into_shared();
        let hub = Hub::spawn(analyzer, HubConfig::from(&cfg.hub));

        let sink: Arc<dyn NewsSink> = Arc::new(hub.clone());
        let fetcher = build_fetcher(&cfg.feed)?;
        let feed = FeedPoller::new(fetcher, sink.clone(), FeedTiming::from(&cfg.feed));
        let demo = DemoFeed::new(sink, cfg.demo.interval());

        Ok(Self { hub, feed, demo })
    }

    /// Start the background producers that are enabled at boot.
    pub fn start_enabled(&self, cfg: &AppConfig) {
        if cfg.feed.enabled {
            self.feed.start();
        }
        if cfg.demo.enabled {
            self.demo.start();
        }
        info!(
            feed = self.feed.is_running(),
            demo = self.demo.is_running(),
            "producers started"
        );
    }

    pub fn router(&self) -> Router {
        api::router(AppState {
            hub: self.hub.clone(),
            feed: self.feed.clone(),
        })
    }
}
