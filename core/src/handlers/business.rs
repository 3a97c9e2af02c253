use chrono::Weekday;
use serde_json::{Map, Value, json};

use super::ActionHandler;
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::format::{title_case, weekday_name};
use crate::response::Response;

/// Profile values used when onboarding a restaurant.
#[derive(Debug, Clone)]
pub struct BusinessDefaults {
    pub name: String,
    pub business_type: String,
    pub cuisine: String,
    /// `(day, open, close)` in 24h `HH:MM`.
    pub operating_hours: Vec<(Weekday, String, String)>,
    pub ai_features: Vec<(String, bool)>,
}

impl BusinessDefaults {
    pub fn standard() -> Self {
        let hours = [
            (Weekday::Mon, "09:00", "22:00"),
            (Weekday::Tue, "09:00", "22:00"),
            (Weekday::Wed, "09:00", "22:00"),
            (Weekday::Thu, "09:00", "22:00"),
            (Weekday::Fri, "09:00", "23:00"),
            (Weekday::Sat, "10:00", "23:00"),
            (Weekday::Sun, "10:00", "22:00"),
        ];
        let features = [
            "autoUpsell",
            "allergyWarnings",
            "dietaryRecommendations",
            "smartPairing",
        ];
        Self {
            name: "New Restaurant".to_string(),
            business_type: "restaurant".to_string(),
            cuisine: "contemporary".to_string(),
            operating_hours: hours
                .iter()
                .map(|(day, open, close)| (*day, open.to_string(), close.to_string()))
                .collect(),
            ai_features: features.iter().map(|f| (f.to_string(), true)).collect(),
        }
    }

    fn hours_json(&self) -> Value {
        let hours: Map<String, Value> = self
            .operating_hours
            .iter()
            .map(|(day, open, close)| {
                (
                    weekday_name(*day).to_string(),
                    json!({ "open": open, "close": close }),
                )
            })
            .collect();
        Value::Object(hours)
    }

    fn features_json(&self) -> Value {
        let features: Map<String, Value> = self
            .ai_features
            .iter()
            .map(|(name, enabled)| (name.clone(), Value::Bool(*enabled)))
            .collect();
        Value::Object(features)
    }
}

pub struct SetBusinessInfo {
    defaults: BusinessDefaults,
}

impl SetBusinessInfo {
    pub fn new(defaults: BusinessDefaults) -> Self {
        Self { defaults }
    }
}

impl ActionHandler for SetBusinessInfo {
    fn name(&self) -> ActionName {
        ActionName::SetBusinessInfo
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let name = envelope
            .entity_text("business_name")
            .unwrap_or_else(|| self.defaults.name.clone());
        let cuisine = envelope
            .entity_text("cuisine_type")
            .unwrap_or_else(|| self.defaults.cuisine.clone());
        let business_type = &self.defaults.business_type;

        let text = format!(
            "I've set up your restaurant profile:\n\n\
             • Name: {name}\n\
             • Cuisine: {}\n\
             • Type: {}\n\n\
             I've configured standard operating hours and enabled all AI features. \
             You can customize these settings anytime through the dashboard.",
            title_case(&cuisine),
            title_case(business_type),
        );

        tracing::info!(parent: &ctx.span, business = %name, cuisine = %cuisine, "business profile configured");

        Response::text(text)
            .with_custom(
                "business_info",
                json!({
                    "name": name,
                    "type": business_type,
                    "cuisine": cuisine,
                    "operating_hours": self.defaults.hours_json(),
                    "ai_features": self.defaults.features_json(),
                }),
            )
            .with_mutation("business_name", name.clone())
            .with_mutation("cuisine_type", cuisine.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;

    fn run(envelope: Envelope) -> Response {
        let ctx = ActionContext::fixed(at("2024-03-15", "09:00"));
        SetBusinessInfo::new(BusinessDefaults::standard()).run(&envelope, &ctx)
    }

    #[test]
    fn defaults_fill_missing_entities() {
        let response = run(Envelope::new("action_set_business_info", "set me up"));
        assert!(response.text.contains("• Name: New Restaurant\n"));
        assert!(response.text.contains("• Cuisine: Contemporary\n"));
        assert!(response.text.contains("• Type: Restaurant\n\n"));
        let info = &response.custom["business_info"];
        assert_eq!(info["operating_hours"]["friday"], json!({"open": "09:00", "close": "23:00"}));
        assert_eq!(info["ai_features"]["smartPairing"], true);
        assert_eq!(response.mutations[0].value, "New Restaurant");
        assert_eq!(response.mutations[1].value, "contemporary");
    }

    #[test]
    fn supplied_entities_are_stored_as_given() {
        let response = run(Envelope::new("action_set_business_info", "we're Casa Luz, mexican")
            .with_entity("business_name", "Casa Luz")
            .with_entity("cuisine_type", "mexican street food"));
        assert!(response.text.contains("• Cuisine: Mexican Street Food\n"));
        assert_eq!(response.custom["business_info"]["cuisine"], "mexican street food");
        assert_eq!(response.mutations[0].slot_name, "business_name");
        assert_eq!(response.mutations[0].value, "Casa Luz");
        assert_eq!(response.mutations[1].slot_name, "cuisine_type");
    }
}
