//! OpenAI-compatible chat-completions client used by the fallback handler.

use async_trait::async_trait;
use brick_core::ExternalServiceError;
use brick_core::fallback::{Completion, CompletionClient, CompletionRequest};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::config::LlmConfig;

/// Error bodies are cut to this many characters before they reach payloads and logs.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Fails only when the HTTP client cannot be built (TLS backend init).
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.settings.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ExternalServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ExternalServiceError::NotConfigured("OPENAI_API_KEY is not set".to_string())
        })?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|err| ExternalServiceError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ExternalServiceError::Transport(err.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = %status, "completion service returned non-success status");
            return Err(ExternalServiceError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        parse_completion(&body)
    }
}

/// Read `choices[0].message.content` and `choices[0].finish_reason`.
pub fn parse_completion(body: &str) -> Result<Completion, ExternalServiceError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|err| ExternalServiceError::Malformed(err.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ExternalServiceError::Malformed("response has no choices".to_string()))?;
    let content = choice
        .message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ExternalServiceError::Malformed("first choice has no content".to_string()))?;

    Ok(Completion {
        content,
        finish_reason: choice.finish_reason,
    })
}
