// src/config/feed.rs
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};

/// Where the feed poller gets its article batches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// NewsAPI `top-headlines`.
    #[default]
    Api,
    /// NewsAPI-shaped JSON file on disk.
    File,
}

impl FromStr for FeedSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "file" => Ok(Self::File),
            other => anyhow::bail!("unsupported feed source '{other}' (expected: api, file)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Start the poller at boot. The control endpoints work either way.
    pub enabled: bool,
    pub source: FeedSource,
    pub poll_interval_secs: u64,
    /// Spacing between consecutive emissions from a batch.
    pub throttle_ms: u64,
    /// Empty or "ENV" means: read `NEWS_API_KEY`.
    pub api_key: String,
    pub base_url: String,
    pub country: String,
    pub fixture_path: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source: FeedSource::Api,
            poll_interval_secs: 120,
            throttle_ms: 5_000,
            api_key: String::new(),
            base_url: "https://newsapi.org".to_string(),
            country: "us".to_string(),
            fixture_path: "config/news-mock-data.json".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        let k = self.api_key.trim();
        if k.is_empty() || k.eq_ignore_ascii_case("env") {
            env::var("NEWS_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        } else {
            Some(k.to_string())
        }
    }
}
