// src/analyze/mod.rs
//! Analysis capability: turns one `NewsItem` into one `Analysis`.
//!
//! The hub only sees the `NewsAnalyzer` trait. Production backends are picked
//! once at startup through `AnalyzerBackend::from_config`.

pub mod ai_adapter;
pub mod extract;
pub mod rules;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{AiConfig, AiMode};
use crate::news::{Analysis, NewsItem};

pub use ai_adapter::{LlmAnalyzer, LlmEndpoint};
pub use extract::{parse_analysis, ParsedAnalysis};
pub use rules::RuleAnalyzer;

#[async_trait]
pub trait NewsAnalyzer: Send + Sync {
    /// Analyze one item. Errors are per-item; callers drop the item and move on.
    async fn analyze(&self, item: NewsItem) -> Result<Analysis>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynAnalyzer = Arc<dyn NewsAnalyzer>;

/// Backend selected by `ai.mode`.
pub enum AnalyzerBackend {
    Rules(RuleAnalyzer),
    Llm(LlmAnalyzer),
}

impl AnalyzerBackend {
    /// Build the configured backend. Fails fast when the selected backend
    /// cannot work (e.g. `openai` without a key).
    pub fn from_config(cfg: &AiConfig) -> Result<Self> {
        let backend = match cfg.mode {
            AiMode::Mock => Self::Rules(RuleAnalyzer::new()),
            AiMode::OpenAi => {
                let key = cfg
                    .resolved_api_key()
                    .context("ai.mode=openai but no API key is configured (set OPENAI_API_KEY)")?;
                let endpoint = LlmEndpoint::OpenAi {
                    base_url: cfg.base_url_or_default(),
                    api_key: key,
                };
                Self::Llm(LlmAnalyzer::new(endpoint, cfg.model_or_default(), cfg.timeout_secs)?)
            }
            AiMode::Ollama => {
                let endpoint = LlmEndpoint::Ollama {
                    base_url: cfg.base_url_or_default(),
                };
                Self::Llm(LlmAnalyzer::new(endpoint, cfg.model_or_default(), cfg.timeout_secs)?)
            }
        };
        info!(
            mode = %cfg.mode,
            backend = backend.name(),
            model = %cfg.model_or_default(),
            "analysis backend ready"
        );
        Ok(backend)
    }

    pub fn into_shared(self) -> DynAnalyzer {
        Arc::new(self)
    }
}

#[async_trait]
impl NewsAnalyzer for AnalyzerBackend {
    async fn analyze(&self, item: NewsItem) -> Result<Analysis> {
        match self {
            Self::Rules(r) => Ok(r.analyze(item)),
            Self::Llm(l) => l.analyze(item).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Rules(_) => "rules",
            Self::Llm(l) => l.provider_name(),
        }
    }
}
