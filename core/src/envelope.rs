use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::DispatchError;

/// Caller-owned conversation state, keyed by slot name.
pub type SlotMap = serde_json::Map<String, Value>;

/// Number of prior turns an envelope keeps.
pub const HISTORY_WINDOW: usize = 10;

/// Everything a handler may read for one conversational turn.
///
/// Built fresh by the caller for every turn. Handlers only read it; state
/// changes travel back as [`crate::response::SlotSet`] requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    pub action_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub latest_message: LatestMessage,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub slots: SlotMap,
    #[serde(default)]
    pub history: Vec<Turn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatestMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Extraction order is preserved; lookups resolve to the first match.
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Intent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Entity {
    #[serde(rename = "entity", alias = "name")]
    pub name: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Envelope {
    pub fn new(action_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            sender_id: None,
            latest_message: LatestMessage {
                text: text.into(),
                intent: None,
                entities: Vec::new(),
            },
            slots: SlotMap::new(),
            history: Vec::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.latest_message.entities.push(Entity {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    pub fn with_intent(mut self, name: impl Into<String>, confidence: Option<f64>) -> Self {
        self.latest_message.intent = Some(Intent {
            name: name.into(),
            confidence,
        });
        self
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_turn(mut self, speaker: Speaker, text: impl Into<String>) -> Self {
        self.history.push(Turn {
            speaker,
            text: text.into(),
        });
        self
    }

    /// Parse an envelope from loosely typed JSON, reporting the offending
    /// field when the structure is wrong.
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        let mut envelope: Envelope = serde_json::from_value(value).map_err(|err| {
            let message = err.to_string();
            let field = field_from_serde_message(&message).unwrap_or_else(|| "envelope".to_string());
            DispatchError::malformed(field, message)
        })?;
        envelope.trim_history();
        envelope.validate()?;
        Ok(envelope)
    }

    /// Keep only the last [`HISTORY_WINDOW`] turns.
    pub fn trim_history(&mut self) {
        if self.history.len() > HISTORY_WINDOW {
            self.history.drain(..self.history.len() - HISTORY_WINDOW);
        }
    }

    /// Structural checks serde cannot express.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.action_name.trim().is_empty() {
            return Err(DispatchError::malformed(
                "action_name",
                "action name must not be empty",
            ));
        }
        if let Some(intent) = &self.latest_message.intent {
            if intent.name.trim().is_empty() {
                return Err(DispatchError::malformed(
                    "latest_message.intent.name",
                    "intent name must not be empty",
                ));
            }
            if let Some(confidence) = intent.confidence {
                if !(0.0..=1.0).contains(&confidence) {
                    return Err(DispatchError::malformed(
                        "latest_message.intent.confidence",
                        format!("confidence {confidence} is outside [0, 1]"),
                    ));
                }
            }
        }
        if let Some(index) = self
            .latest_message
            .entities
            .iter()
            .position(|entity| entity.name.is_empty())
        {
            return Err(DispatchError::malformed(
                format!("latest_message.entities[{index}].entity"),
                "entity name must not be empty",
            ));
        }
        Ok(())
    }

    /// Value of the first entity named `name`, or `None` when the upstream
    /// model extracted nothing under that name.
    pub fn get_entity(&self, name: &str) -> Option<&Value> {
        self.latest_message
            .entities
            .iter()
            .find(|entity| entity.name == name)
            .map(|entity| &entity.value)
    }

    /// [`Self::get_entity`] rendered as text. Empty strings count as absent.
    pub fn entity_text(&self, name: &str) -> Option<String> {
        self.get_entity(name).and_then(value_text)
    }

    /// Slot value, with an explicit `null` treated the same as an unset slot.
    pub fn get_slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).filter(|value| !value.is_null())
    }

    pub fn slot_text(&self, name: &str) -> Option<String> {
        self.get_slot(name).and_then(value_text)
    }

    pub fn intent_confidence(&self) -> Option<f64> {
        self.latest_message
            .intent
            .as_ref()
            .and_then(|intent| intent.confidence)
    }

    /// The last `limit` turns, oldest first.
    pub fn recent_history(&self, limit: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Pull a field name out of serde's "missing field `x`" style messages.
pub fn field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        if let Some(start) = msg.find(pattern) {
            let after = &msg[start + pattern.len()..];
            if let Some(end) = after.find('`') {
                return Some(after[..end].to_string());
            }
        }
    }
    None
}
