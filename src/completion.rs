//! Completion providers and the completion gateway.
//!
//! Concrete [`CompletionService`] implementations:
//! - **[`DisabledCompletion`]**: always fails; used when no provider is configured.
//! - **[`OpenAiCompletion`]**: calls the OpenAI chat completions API.
//!
//! [`CompletionGateway`] wraps a service with the turn's timeout and latency
//! measurement and maps every failure to a fatal [`AssistError`].
//!
//! # Retry Strategy
//!
//! By default the OpenAI provider makes a single attempt. With
//! `completion.max_retries > 0`:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! The gateway timeout bounds the whole call, retries included.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use civic_assist_core::completion::{CompletionRequest, CompletionService};
use civic_assist_core::error::AssistError;

use crate::config::CompletionConfig;

// ============ Disabled Provider ============

/// A provider that refuses every request.
pub struct DisabledCompletion;

#[async_trait]
impl CompletionService for DisabledCompletion {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        bail!("Completion provider is disabled. Set [completion] provider in config.")
    }
}

// ============ OpenAI Provider ============

/// Completion provider using `POST {base_url}/chat/completions`.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

/// Marker prefix for errors that mean the response body was unusable.
const MALFORMED: &str = "Invalid OpenAI response";

impl OpenAiCompletion {
    /// Create a provider from configuration and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not set.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    /// Create a provider with an explicit key.
    pub fn with_api_key(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| anyhow!("{}: {}", MALFORMED, e))?;
                        return parse_chat_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("{}: missing choices[0].message.content", MALFORMED))?;

    if content.trim().is_empty() {
        bail!("{}: empty completion content", MALFORMED);
    }

    Ok(content.to_string())
}

/// Create the [`CompletionService`] named by `config.provider`.
pub fn create_completion_service(config: &CompletionConfig) -> Result<Arc<dyn CompletionService>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompletion)),
        "openai" => Ok(Arc::new(OpenAiCompletion::new(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}

// ============ Gateway ============

/// Output of a successful gateway call.
#[derive(Debug, Clone)]
pub struct GatewayCompletion {
    pub content: String,
    pub raw_latency_ms: u64,
}

/// Single, time-bounded call into a [`CompletionService`].
///
/// Dropping the future returned by [`complete`](Self::complete) drops the
/// in-flight HTTP request, so an aborted turn stops the external call.
#[derive(Clone)]
pub struct CompletionGateway {
    service: Arc<dyn CompletionService>,
    timeout: Duration,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionGateway {
    pub fn new(
        service: Arc<dyn CompletionService>,
        timeout: Duration,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            service,
            timeout,
            max_tokens,
            temperature,
        }
    }

    pub fn from_config(service: Arc<dyn CompletionService>, config: &CompletionConfig) -> Self {
        Self::new(
            service,
            Duration::from_secs(config.timeout_secs),
            config.max_tokens,
            config.temperature,
        )
    }

    pub fn provider(&self) -> &str {
        self.service.name()
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<GatewayCompletion, AssistError> {
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.service.complete(&request)).await;
        let raw_latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Err(_) => {
                tracing::error!(
                    provider = self.provider(),
                    timeout_secs = self.timeout.as_secs(),
                    "completion timed out"
                );
                Err(AssistError::CompletionTimeout(self.timeout))
            }
            Ok(Err(e)) => {
                tracing::error!(provider = self.provider(), error = %e, "completion failed");
                let msg = e.to_string();
                if msg.starts_with(MALFORMED) {
                    Err(AssistError::MalformedCompletion(msg))
                } else {
                    Err(AssistError::Completion(msg))
                }
            }
            Ok(Ok(content)) if content.trim().is_empty() => Err(
                AssistError::MalformedCompletion("empty completion content".to_string()),
            ),
            Ok(Ok(content)) => {
                tracing::info!(
                    provider = self.provider(),
                    latency_ms = raw_latency_ms,
                    "completion received"
                );
                Ok(GatewayCompletion {
                    content,
                    raw_latency_ms,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Result<String, String>, Duration);

    #[async_trait]
    impl CompletionService for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            tokio::time::sleep(self.1).await;
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    fn gateway(result: Result<String, String>, delay_ms: u64, timeout_ms: u64) -> CompletionGateway {
        CompletionGateway::new(
            Arc::new(Fixed(result, Duration::from_millis(delay_ms))),
            Duration::from_millis(timeout_ms),
            1000,
            0.7,
        )
    }

    #[test]
    fn test_parse_chat_response_ok() {
        let v = json!({"choices": [{"message": {"role": "assistant", "content": "Call 311."}}]});
        assert_eq!(parse_chat_response(&v).unwrap(), "Call 311.");
    }

    #[test]
    fn test_parse_chat_response_missing_choices() {
        let err = parse_chat_response(&json!({"choices": []})).unwrap_err();
        assert!(err.to_string().starts_with(MALFORMED));
        assert!(parse_chat_response(&json!({"error": "x"})).is_err());
    }

    #[test]
    fn test_parse_chat_response_empty_content() {
        let v = json!({"choices": [{"message": {"content": "   "}}]});
        assert!(parse_chat_response(&v).is_err());
    }

    #[test]
    fn test_create_disabled_provider() {
        let svc = create_completion_service(&CompletionConfig::default()).unwrap();
        assert_eq!(svc.name(), "disabled");
    }

    #[tokio::test]
    async fn test_gateway_success_reports_latency() {
        let out = gateway(Ok("Answer".into()), 5, 1_000)
            .complete("sys", "user")
            .await
            .unwrap();
        assert_eq!(out.content, "Answer");
        assert!(out.raw_latency_ms < 1_000);
    }

    #[tokio::test]
    async fn test_gateway_maps_service_error() {
        let err = gateway(Err("OpenAI API error 503".into()), 0, 1_000)
            .complete("sys", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::Completion(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_gateway_maps_malformed() {
        let err = gateway(Err(format!("{}: missing", MALFORMED)), 0, 1_000)
            .complete("sys", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::MalformedCompletion(_)));
    }

    #[tokio::test]
    async fn test_gateway_timeout_is_fatal() {
        let err = gateway(Ok("late".into()), 500, 20)
            .complete("sys", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::CompletionTimeout(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_disabled_provider_fails_through_gateway() {
        let gw = CompletionGateway::new(Arc::new(DisabledCompletion), Duration::from_secs(1), 10, 0.0);
        let err = gw.complete("s", "u").await.unwrap_err();
        assert!(matches!(err, AssistError::Completion(_)));
    }
}
