// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fmt, str::FromStr};

fn default_timeout_secs() -> u64 {
    30
}

/// Which analysis backend to run. Resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiMode {
    /// Keyword rules, no network.
    #[default]
    Mock,
    /// OpenAI-compatible chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// Local Ollama chat endpoint.
    Ollama,
}

impl FromStr for AiMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => anyhow::bail!("unsupported AI mode '{other}' (expected: mock, openai, ollama)"),
        }
    }
}

impl fmt::Display for AiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mock => "mock",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub mode: AiMode,
    /// Model name; each mode has its own default.
    pub model: Option<String>,
    /// Endpoint root, e.g. `https://api.openai.com/v1` or `http://localhost:11434`.
    pub base_url: Option<String>,
    /// Empty or "ENV" means: read `OPENAI_API_KEY`.
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mode: AiMode::default(),
            model: None,
            base_url: None,
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Key from config, or from the environment when set to "ENV"/empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        let k = self.api_key.trim();
        if k.is_empty() || k.eq_ignore_ascii_case("env") {
            env::var("OPENAI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        } else {
            Some(k.to_string())
        }
    }

    pub fn model_or_default(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.mode {
                AiMode::OpenAi => "gpt-4o-mini",
                AiMode::Ollama => "llama3.1",
                AiMode::Mock => "rules",
            }
            .to_string()
        })
    }

    pub fn base_url_or_default(&self) -> String {
        let url = self.base_url.clone().unwrap_or_else(|| {
            match self.mode {
                AiMode::Ollama => "http://localhost:11434",
                _ => "https://api.openai.com/v1",
            }
            .to_string()
        });
        url.trim_end_matches('/').to_string()
    }
}
