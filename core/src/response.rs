use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::envelope::SlotMap;
use crate::error::MissingEntity;

/// Structured data forwarded verbatim to the chat UI.
pub type Payload = serde_json::Map<String, Value>;

/// A handler's request to change one caller-owned slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlotSet {
    pub slot_name: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

impl SlotSet {
    pub fn new(slot_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            slot_name: slot_name.into(),
            value: value.into(),
        }
    }
}

/// What a handler hands back for a turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Response {
    pub text: String,
    #[schema(value_type = Object)]
    pub custom: Payload,
    /// Applied by the caller in order; a later set of the same slot wins.
    pub mutations: Vec<SlotSet>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn with_mutation(mut self, slot_name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.mutations.push(SlotSet::new(slot_name, value));
        self
    }

    /// Apply this response's mutations to a caller-side slot store.
    pub fn apply_to(&self, slots: &mut SlotMap) {
        apply_mutations(slots, &self.mutations);
    }
}

impl From<MissingEntity> for Response {
    fn from(missing: MissingEntity) -> Self {
        Response::text(missing.question)
    }
}

pub fn apply_mutations(slots: &mut SlotMap, mutations: &[SlotSet]) {
    for mutation in mutations {
        slots.insert(mutation.slot_name.clone(), mutation.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_mutations_override_earlier_ones() {
        let response = Response::text("ok")
            .with_mutation("current_cuisine", "Italian")
            .with_mutation("party_size", "4")
            .with_mutation("current_cuisine", "Seafood");
        let mut slots = SlotMap::new();
        slots.insert("occasion".to_string(), json!("birthday"));
        response.apply_to(&mut slots);
        assert_eq!(slots["current_cuisine"], json!("Seafood"));
        assert_eq!(slots["party_size"], json!("4"));
        assert_eq!(slots["occasion"], json!("birthday"));
    }

    #[test]
    fn missing_entity_becomes_clarifying_reply_without_mutations() {
        let response = Response::from(MissingEntity {
            entity: "food_item",
            question: "What would you like to order from our menu?",
        });
        assert_eq!(response.text, "What would you like to order from our menu?");
        assert!(response.mutations.is_empty());
        assert!(response.custom.is_empty());
    }
}
