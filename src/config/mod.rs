// src/config/mod.rs
//! Application configuration: optional TOML file plus environment overrides.

pub mod ai;
pub mod feed;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs, str::FromStr, time::Duration};

pub use ai::{AiConfig, AiMode};
pub use feed::{FeedConfig, FeedSource};

const ENV_PATH: &str = "APP_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3,
        }
    }
}

impl DemoConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Hub buffering knobs. Concurrency (8) and replay depth (50) are fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub ingest_capacity: usize,
    pub analysis_timeout_secs: u64,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            ingest_capacity: 1024,
            analysis_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub feed: FeedConfig,
    pub demo: DemoConfig,
    pub hub: HubSettings,
}

impl AppConfig {
    /// Parse a TOML file. Missing sections/keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $APP_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path {}", pb.display()));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Overlay the documented environment variables. Unparseable values are errors.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_parse::<AiMode>("AI_MODE")? {
            self.ai.mode = v;
        }
        if let Some(v) = env_string("AI_MODEL") {
            self.ai.model = Some(v);
        }
        if let Some(v) = env_string("AI_BASE_URL") {
            self.ai.base_url = Some(v);
        }
        if let Some(v) = env_parse::<bool>("FEED_ENABLED")? {
            self.feed.enabled = v;
        }
        if let Some(v) = env_parse::<FeedSource>("FEED_SOURCE")? {
            self.feed.source = v;
        }
        if let Some(v) = env_parse::<u64>("FEED_POLL_INTERVAL_SECS")? {
            self.feed.poll_interval_secs = v;
        }
        if let Some(v) = env_parse::<u64>("FEED_THROTTLE_MS")? {
            self.feed.throttle_ms = v;
        }
        if let Some(v) = env_string("FEED_FIXTURE_PATH") {
            self.feed.fixture_path = v;
        }
        if let Some(v) = env_parse::<bool>("DEMO_ENABLED")? {
            self.demo.enabled = v;
        }
        if let Some(v) = env_parse::<u64>("DEMO_INTERVAL_SECS")? {
            self.demo.interval_secs = v;
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}='{raw}': {e}")),
    }
}
