//! JSON shapes exchanged with the dialogue manager over the webhook.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::envelope::{Envelope, LatestMessage, SlotMap, Speaker, Turn};
use crate::error::DispatchError;
use crate::response::Response;

/// Body of `POST /webhook`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookRequest {
    pub next_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub tracker: Tracker,
}

/// The dialogue manager's view of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tracker {
    pub latest_message: LatestMessage,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub slots: SlotMap,
    /// Full event log; only user and bot utterances are kept.
    #[serde(default)]
    pub events: Vec<TrackerEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackerEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl WebhookRequest {
    pub fn into_envelope(self) -> Result<Envelope, DispatchError> {
        let mut history: Vec<Turn> = self
            .tracker
            .events
            .into_iter()
            .filter_map(|event| {
                let speaker = match event.event.as_str() {
                    "user" => Speaker::User,
                    "bot" => Speaker::Bot,
                    _ => return None,
                };
                Some(Turn {
                    speaker,
                    text: event.text.unwrap_or_default(),
                })
            })
            .collect();
        // The tracker log already ends with the turn being answered.
        if history.last().is_some_and(|turn| {
            turn.speaker == Speaker::User && turn.text == self.tracker.latest_message.text
        }) {
            history.pop();
        }

        let mut envelope = Envelope {
            action_name: self.next_action,
            sender_id: self.sender_id,
            latest_message: self.tracker.latest_message,
            slots: self.tracker.slots,
            history,
        };
        envelope.trim_history();
        envelope.validate()?;
        Ok(envelope)
    }
}

/// Body returned from `POST /webhook`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookResponse {
    pub events: Vec<WireEvent>,
    pub responses: Vec<BotMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BotMessage {
    pub text: String,
    #[schema(value_type = Object)]
    pub custom: serde_json::Map<String, Value>,
}

/// A slot mutation as the dialogue manager expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WireEvent {
    Slot {
        name: String,
        #[schema(value_type = Object)]
        value: Value,
    },
}

impl From<Response> for WebhookResponse {
    fn from(response: Response) -> Self {
        WebhookResponse {
            events: response
                .mutations
                .into_iter()
                .map(|m| WireEvent::Slot {
                    name: m.slot_name,
                    value: m.value,
                })
                .collect(),
            responses: vec![BotMessage {
                text: response.text,
                custom: response.custom,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::HISTORY_WINDOW;
    use serde_json::json;

    #[test]
    fn tracker_events_become_bounded_history() {
        let mut events = vec![json!({"event": "action", "name": "action_listen"})];
        for i in 0..12 {
            events.push(json!({"event": "user", "text": format!("u{i}")}));
            events.push(json!({"event": "slot", "name": "x", "value": i}));
        }
        events.push(json!({"event": "bot", "text": "last bot"}));

        let request: WebhookRequest = serde_json::from_value(json!({
            "next_action": "action_handle_feedback",
            "sender_id": "guest-7",
            "tracker": {
                "latest_message": { "text": "great food" },
                "events": events
            }
        }))
        .expect("request parses");

        let envelope = request.into_envelope().expect("valid envelope");
        assert_eq!(envelope.history.len(), HISTORY_WINDOW);
        assert_eq!(envelope.history[0].text, "u3");
        assert_eq!(envelope.history.last().map(|t| t.speaker), Some(Speaker::Bot));
        assert_eq!(envelope.sender_id.as_deref(), Some("guest-7"));
    }

    #[test]
    fn current_user_message_is_not_repeated_in_history() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "next_action": "action_default_fallback",
            "tracker": {
                "latest_message": { "text": "do you have valet parking?" },
                "events": [
                    {"event": "action", "name": "action_listen"},
                    {"event": "user", "text": "hi"},
                    {"event": "bot", "text": "Welcome!"},
                    {"event": "action", "name": "action_listen"},
                    {"event": "user", "text": "do you have valet parking?"}
                ]
            }
        }))
        .expect("request parses");

        let envelope = request.into_envelope().expect("valid envelope");
        let texts: Vec<_> = envelope.history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["hi", "Welcome!"]);
    }

    #[test]
    fn earlier_identical_user_turn_is_kept() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "next_action": "action_default_fallback",
            "tracker": {
                "latest_message": { "text": "hello?" },
                "events": [
                    {"event": "user", "text": "hello?"},
                    {"event": "bot", "text": "Hi there!"}
                ]
            }
        }))
        .expect("request parses");

        let envelope = request.into_envelope().expect("valid envelope");
        assert_eq!(envelope.history.len(), 2);
        assert_eq!(envelope.history[0].text, "hello?");
    }

    #[test]
    fn response_serializes_text_custom_and_slot_events() {
        let response = Response::text("Excellent choice!")
            .with_custom("cuisine", "Seafood")
            .with_mutation("current_cuisine", "Seafood");
        let value = serde_json::to_value(WebhookResponse::from(response)).unwrap();
        assert_eq!(
            value,
            json!({
                "events": [{"event": "slot", "name": "current_cuisine", "value": "Seafood"}],
                "responses": [{"text": "Excellent choice!", "custom": {"cuisine": "Seafood"}}]
            })
        );
    }

    #[test]
    fn empty_action_name_is_rejected() {
        let request: WebhookRequest = serde_json::from_value(json!({
            "next_action": "",
            "tracker": { "latest_message": { "text": "hello" } }
        }))
        .unwrap();
        assert!(matches!(
            request.into_envelope(),
            Err(DispatchError::MalformedEnvelope { .. })
        ));
    }
}
