//! Model-backed reply for turns no specific action can answer.
//!
//! The external completion call is the only suspension point in the crate.
//! It is attempted exactly once, bounded by a timeout, and cancellable through
//! the token the caller passes in. Every failure becomes the fixed apology.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::context::ActionContext;
use crate::envelope::{Envelope, Speaker};
use crate::error::ExternalServiceError;
use crate::response::Response;

pub const APOLOGY: &str =
    "I apologize, but I'm having trouble understanding. Could you please rephrase your request?";

/// `{business_name}` is replaced with the conversation's `business_name` slot.
pub const DEFAULT_PERSONA: &str =
    "You are BFF (Brick For Food), an AI assistant for a fine dining restaurant.";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Prior turns included in the transcript.
pub const TRANSCRIPT_TURNS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for an OpenAI-style chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub finish_reason: Option<String>,
}

impl Completion {
    /// The model stopped on its own rather than hitting the token cap.
    pub fn finished_normally(&self) -> bool {
        self.finish_reason.as_deref() == Some("stop")
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ExternalServiceError>;
}

#[derive(Debug, Clone)]
pub struct FallbackSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub persona_template: String,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 150,
            timeout: Duration::from_secs(10),
            persona_template: DEFAULT_PERSONA.to_string(),
        }
    }
}

pub struct FallbackHandler {
    client: Arc<dyn CompletionClient>,
    settings: FallbackSettings,
}

impl FallbackHandler {
    pub fn new(client: Arc<dyn CompletionClient>, settings: FallbackSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &FallbackSettings {
        &self.settings
    }

    pub fn persona(&self, envelope: &Envelope) -> String {
        let business = envelope
            .slot_text("business_name")
            .unwrap_or_else(|| "our restaurant".to_string());
        self.settings
            .persona_template
            .replace("{business_name}", &business)
    }

    /// Persona, then up to [`TRANSCRIPT_TURNS`] prior turns oldest first, then
    /// the current user message.
    pub fn transcript(&self, envelope: &Envelope) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::new(Role::System, self.persona(envelope))];
        messages.extend(envelope.recent_history(TRANSCRIPT_TURNS).iter().map(|turn| {
            let role = match turn.speaker {
                Speaker::User => Role::User,
                Speaker::Bot => Role::Assistant,
            };
            ChatMessage::new(role, turn.text.clone())
        }));
        messages.push(ChatMessage::new(
            Role::User,
            envelope.latest_message.text.clone(),
        ));
        messages
    }

    pub fn request_for(&self, envelope: &Envelope) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: self.transcript(envelope),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Never fails: external faults come back as the apology with
    /// `source = "default"` in the payload.
    pub async fn run(
        &self,
        envelope: &Envelope,
        ctx: &ActionContext,
        cancel: &CancellationToken,
    ) -> Response {
        let request = self.request_for(envelope);
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExternalServiceError::Cancelled),
            result = tokio::time::timeout(self.settings.timeout, self.client.complete(&request)) => {
                result.unwrap_or(Err(ExternalServiceError::Timeout(self.settings.timeout)))
            }
        };

        let elapsed = started.elapsed();
        let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let response_time = elapsed.as_secs_f64();

        match outcome {
            Ok(completion) => {
                let confidence = completion.finished_normally();
                ctx.metrics.record_fallback(true, latency_ms);
                tracing::info!(
                    parent: &ctx.span,
                    latency_ms,
                    model = %self.settings.model,
                    finish_reason = completion.finish_reason.as_deref().unwrap_or("<none>"),
                    "fallback answered by model"
                );
                Response::text(completion.content).with_custom(
                    "fallback_data",
                    json!({
                        "source": "model",
                        "model": self.settings.model,
                        "response_time": response_time,
                        "latency_ms": latency_ms,
                        "confidence": confidence,
                        "finish_reason": completion.finish_reason,
                    }),
                )
            }
            Err(err) => {
                ctx.metrics.record_fallback(false, latency_ms);
                tracing::error!(parent: &ctx.span, latency_ms, error = %err, "fallback degraded to default reply");
                Response::text(APOLOGY).with_custom(
                    "fallback_data",
                    json!({
                        "source": "default",
                        "error": err.to_string(),
                        "response_time": response_time,
                        "latency_ms": latency_ms,
                    }),
                )
            }
        }
    }
}
