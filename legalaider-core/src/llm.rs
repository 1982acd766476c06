//! Text-generation collaborator.
//!
//! Everything that talks to a language model goes through [`TextGenerator`]:
//! prompt in, text out. The HTTP implementation supports Ollama, Claude and
//! OpenAI; tests swap in deterministic stubs.

use crate::config::{LlmConfig, LlmProvider};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an analytics assistant for a legal AI product. Follow the requested output format exactly and return only JSON.";

/// Completion interface for the text-generation collaborator.
///
/// Implementations must be safe to call from several worker threads.
/// `generate` must return within [`timeout_ms`](TextGenerator::timeout_ms)
/// and report an exhausted budget as [`Error::CollaboratorTimeout`]. Callers
/// discard responses that arrive late but cannot interrupt a call in
/// progress.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Time budget for a single call, in milliseconds.
    fn timeout_ms(&self) -> u64 {
        crate::config::default_llm_timeout_secs() * 1000
    }
}

/// Create the default HTTP-backed generator.
pub fn create_text_generator(llm: &LlmConfig) -> Result<Box<dyn TextGenerator>> {
    Ok(Box::new(HttpTextGenerator::new(llm)?))
}

/// Remove a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a model response into `T`.
///
/// Tries the fence-stripped text first, then the outermost `{...}` span.
/// The error string describes why neither attempt matched.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, String> {
    let cleaned = strip_code_fence(raw);
    match serde_json::from_str::<T>(cleaned) {
        Ok(value) => Ok(value),
        Err(first) => {
            let extracted = extract_json_object(cleaned).ok_or_else(|| first.to_string())?;
            serde_json::from_str::<T>(extracted).map_err(|e| e.to_string())
        }
    }
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

struct HttpTextGenerator {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: u32,
    timeout_ms: u64,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpTextGenerator {
    fn new(config: &LlmConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| config.provider.default_endpoint().to_string());
        let api_key = match config.provider {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => config
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok()),
            LlmProvider::OpenAI => config
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
        };

        if matches!(config.provider, LlmProvider::Claude | LlmProvider::OpenAI) && api_key.is_none()
        {
            return Err(Error::Config(
                "llm.api_key (or provider env var) is required".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Llm(format!("failed to build tokio runtime: {e}")))?;
        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint,
            api_key,
            max_tokens: config.max_tokens,
            timeout_ms: timeout_secs * 1000,
            runtime,
            http,
        })
    }

    fn request_error(&self, provider: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::CollaboratorTimeout {
                operation: format!("{provider} request"),
                timeout_ms: self.timeout_ms,
            }
        } else {
            Error::Llm(format!("{provider} request failed: {e}"))
        }
    }

    async fn post(
        &self,
        provider: &str,
        url: String,
        headers: HeaderMap,
        body: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(provider, e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| self.request_error(provider, e))?;
        if !status.is_success() {
            return Err(Error::Llm(format!(
                "{} returned {}: {}",
                provider,
                status.as_u16(),
                body
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let budget = Duration::from_millis(self.timeout_ms);
        let request = async {
            let base = self.endpoint.trim_end_matches('/');
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

            match self.provider {
                LlmProvider::Ollama => {
                    let json = self
                        .post(
                            "ollama",
                            format!("{base}/api/generate"),
                            headers,
                            json!({
                                "model": self.model,
                                "system": SYSTEM_PROMPT,
                                "prompt": prompt,
                                "stream": false,
                            }),
                        )
                        .await?;
                    json.get("response")
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("ollama response missing string field `response`".to_string())
                        })
                }
                LlmProvider::Claude => {
                    headers.insert(
                        "x-api-key",
                        HeaderValue::from_str(self.api_key.as_deref().unwrap_or_default())
                            .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                    );
                    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

                    let json = self
                        .post(
                            "claude",
                            format!("{base}/v1/messages"),
                            headers,
                            json!({
                                "model": self.model,
                                "max_tokens": self.max_tokens,
                                "temperature": 0,
                                "system": SYSTEM_PROMPT,
                                "messages": [{ "role": "user", "content": prompt }],
                            }),
                        )
                        .await?;
                    json.get("content")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("text"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| Error::Llm("claude response missing content[0].text".to_string()))
                }
                LlmProvider::OpenAI => {
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!(
                            "Bearer {}",
                            self.api_key.as_deref().unwrap_or_default()
                        ))
                        .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                    );

                    let json = self
                        .post(
                            "openai",
                            format!("{base}/v1/chat/completions"),
                            headers,
                            json!({
                                "model": self.model,
                                "messages": [
                                    { "role": "system", "content": SYSTEM_PROMPT },
                                    { "role": "user", "content": prompt }
                                ]
                            }),
                        )
                        .await?;
                    json.get("choices")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("message"))
                        .and_then(|v| v.get("content"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("openai response missing choices[0].message.content".to_string())
                        })
                }
            }
        };

        self.runtime
            .block_on(tokio::time::timeout(budget, request))
            .map_err(|_| Error::CollaboratorTimeout {
                operation: format!("{} request", self.provider.as_str()),
                timeout_ms: self.timeout_ms,
            })?
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}
