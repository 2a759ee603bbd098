// src/ingest/providers/mod.rs
pub mod fixture;
pub mod newsapi;

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::{FeedConfig, FeedSource};
use crate::ingest::types::BatchFetch;

pub use fixture::FixtureFetcher;
pub use newsapi::NewsApiFetcher;

/// Build the configured batch source. A poller that is enabled at boot but has
/// no way to fetch is a startup error.
pub fn build_fetcher(cfg: &FeedConfig) -> Result<Arc<dyn BatchFetch>> {
    match cfg.source {
        FeedSource::File => Ok(Arc::new(FixtureFetcher::new(&cfg.fixture_path))),
        FeedSource::Api => {
            let key = cfg.resolved_api_key();
            if key.is_none() {
                if cfg.enabled {
                    bail!("feed.enabled with source=api but no NewsAPI key (set NEWS_API_KEY)");
                }
                tracing::warn!("no NewsAPI key configured; feed fetches will fail until one is set");
            }
            Ok(Arc::new(NewsApiFetcher::new(&cfg.base_url, key, &cfg.country)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_needs_no_key() {
        let cfg = FeedConfig {
            source: FeedSource::File,
            enabled: true,
            ..FeedConfig::default()
        };
        assert_eq!(build_fetcher(&cfg).unwrap().name(), "fixture");
    }

    #[serial_test::serial]
    #[test]
    fn enabled_api_source_without_key_fails_fast() {
        std::env::remove_var("NEWS_API_KEY");
        let mut cfg = FeedConfig {
            source: FeedSource::Api,
            enabled: true,
            ..FeedConfig::default()
        };
        assert!(build_fetcher(&cfg).is_err());

        // Disabled at boot: builds, fetches fail later.
        cfg.enabled = false;
        assert_eq!(build_fetcher(&cfg).unwrap().name(), "newsapi");

        cfg.enabled = true;
        cfg.api_key = "inline-key".into();
        assert!(build_fetcher(&cfg).is_ok());
    }
}
