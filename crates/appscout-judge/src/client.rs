//! Client for an OpenAI-compatible chat-completions service.
//!
//! All pipeline judgment calls go through [`JudgeClient::complete`], which
//! owns the rate-limit retry policy: HTTP 429 is the only retried failure,
//! with an escalating sleep between attempts, and exhausting every attempt
//! surfaces [`JudgeError::QuotaExhausted`] so the caller can stop the run.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::JudgeError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Judgment-service client with the pipeline's retry and cooldown policy.
pub struct JudgeClient {
    http: reqwest::Client,
    auth_header: HeaderValue,
    base_url: String,
    model: String,
    max_attempts: u32,
    backoff_base_secs: u64,
    cooldown_secs: u64,
}

impl JudgeClient {
    /// Creates a client against the default service endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        model: &str,
        max_attempts: u32,
        backoff_base_secs: u64,
        cooldown_secs: u64,
    ) -> Result<Self, JudgeError> {
        Self::with_base_url(
            api_key,
            model,
            max_attempts,
            backoff_base_secs,
            cooldown_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock,
    /// or for an OpenAI-compatible proxy).
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`JudgeError::InvalidApiKey`] if the key
    /// cannot be carried in an `Authorization` header.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        max_attempts: u32,
        backoff_base_secs: u64,
        cooldown_secs: u64,
        base_url: &str,
    ) -> Result<Self, JudgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let auth_header = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| JudgeError::InvalidApiKey)?;

        Ok(Self {
            http,
            auth_header,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
            max_attempts: max_attempts.max(1),
            backoff_base_secs,
            cooldown_secs,
        })
    }

    /// Sends `prompt` and returns the raw completion text.
    ///
    /// Retries only on HTTP 429, sleeping `backoff_base_secs * attempt`
    /// between attempts. Any other failure is returned immediately. After a
    /// successful call a fixed cooldown sleep spaces out consecutive calls.
    ///
    /// # Errors
    ///
    /// [`JudgeError::QuotaExhausted`] when every attempt was rate limited;
    /// otherwise the first non-retryable [`JudgeError`].
    pub async fn complete(&self, prompt: &str) -> Result<String, JudgeError> {
        for attempt in 1..=self.max_attempts {
            match self.chat_once(prompt, attempt).await {
                Ok(content) => {
                    if self.cooldown_secs > 0 {
                        tokio::time::sleep(Duration::from_secs(self.cooldown_secs)).await;
                    }
                    return Ok(content);
                }
                Err(JudgeError::RateLimited { attempt }) => {
                    if attempt >= self.max_attempts {
                        return Err(JudgeError::QuotaExhausted);
                    }
                    let delay = retry_delay(self.backoff_base_secs, attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = delay.as_secs(),
                        "judgment service rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(other) => return Err(other),
            }
        }
        Err(JudgeError::QuotaExhausted)
    }

    async fn chat_once(&self, prompt: &str, attempt: u32) -> Result<String, JudgeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        debug!(model = %self.model, attempt, "judgment service chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(JudgeError::RateLimited { attempt });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(JudgeError::EmptyResponse)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth_header.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

/// Sleep before the next attempt after the `attempt`-th rate-limited call:
/// the base scaled linearly by the attempt number (base, 2x base, ...).
fn retry_delay(backoff_base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(backoff_base_secs.saturating_mul(u64::from(attempt)))
}
