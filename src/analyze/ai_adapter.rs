//! AI adapter: chat-model backed analysis (OpenAI-compatible or Ollama).
//! The reply text goes through the lenient extractor, so a sloppy model answer
//! still yields a usable `Analysis`.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyze::extract::parse_analysis;
use crate::news::{Analysis, NewsItem};

pub const SYSTEM_PROMPT: &str = r#"You are a financial news analyst.
Return ONLY valid JSON, no markdown, no extra text.
Schema:
{
  "sentiment": "BULLISH|BEARISH|NEUTRAL",
  "riskScore": 1-10,
  "summary": "1-2 sentence summary"
}
Guidelines:
- sentiment reflects short-term market tone
- riskScore is downside risk / uncertainty (10 is very risky)"#;

pub fn user_prompt(item: &NewsItem) -> String {
    format!(
        "Analyze this financial news item.\n\nSOURCE: {}\nHEADLINE: {}\nCONTENT:\n{}\n",
        item.source, item.headline, item.content
    )
}

/// Remote chat endpoint flavour.
#[derive(Debug, Clone)]
pub enum LlmEndpoint {
    /// `POST {base_url}/chat/completions` with a bearer key.
    OpenAi { base_url: String, api_key: String },
    /// `POST {base_url}/api/chat`, non-streaming.
    Ollama { base_url: String },
}

pub struct LlmAnalyzer {
    http: reqwest::Client,
    endpoint: LlmEndpoint,
    model: String,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResp {
    message: ChoiceMsg,
}

impl LlmAnalyzer {
    pub fn new(endpoint: LlmEndpoint, model: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("market-news-stream/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("building HTTP client for analysis backend")?;
        Ok(Self {
            http,
            endpoint,
            model: model.into(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        match self.endpoint {
            LlmEndpoint::OpenAi { .. } => "openai",
            LlmEndpoint::Ollama { .. } => "ollama",
        }
    }

    pub async fn analyze(&self, item: NewsItem) -> Result<Analysis> {
        let user = user_prompt(&item);
        debug!(
            provider = self.provider_name(),
            source = %item.source,
            headline = %item.headline,
            "sending prompt"
        );

        let raw = self.complete(SYSTEM_PROMPT, &user).await?;
        debug!(headline = %item.headline, reply = %raw, "model reply");

        let parsed = parse_analysis(&raw);
        Ok(Analysis::for_item(
            item,
            parsed.sentiment,
            i64::from(parsed.risk_score),
            parsed.summary,
        ))
    }

    /// One chat round-trip; returns the assistant text.
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let messages = vec![
            Msg {
                role: "system",
                content: system,
            },
            Msg {
                role: "user",
                content: user,
            },
        ];

        let content = match &self.endpoint {
            LlmEndpoint::OpenAi { base_url, api_key } => {
                let req = OpenAiReq {
                    model: &self.model,
                    messages,
                    temperature: 0.2,
                };
                let resp = self
                    .http
                    .post(format!("{base_url}/chat/completions"))
                    .bearer_auth(api_key)
                    .json(&req)
                    .send()
                    .await
                    .context("openai request failed")?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(anyhow!("openai API error {status}: {body}"));
                }
                let body: OpenAiResp = resp.json().await.context("decoding openai response")?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
            LlmEndpoint::Ollama { base_url } => {
                let req = OllamaReq {
                    model: &self.model,
                    messages,
                    stream: false,
                };
                let resp = self
                    .http
                    .post(format!("{base_url}/api/chat"))
                    .json(&req)
                    .send()
                    .await
                    .context("ollama request failed")?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(anyhow!("ollama API error {status}: {body}"));
                }
                let body: OllamaResp = resp.json().await.context("decoding ollama response")?;
                body.message.content
            }
        };

        content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("{} returned an empty reply", self.provider_name()))
    }
}
