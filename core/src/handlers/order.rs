use serde_json::{Value, json};

use super::{ActionHandler, lookup_ci, owned};
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::error::MissingEntity;
use crate::response::Response;

const ASK_FOR_ITEM: MissingEntity = MissingEntity {
    entity: "food_item",
    question: "What would you like to order from our menu?",
};

/// Dish → cuisine, and cuisine → the two wines suggested with an order.
#[derive(Debug, Clone)]
pub struct MenuTable {
    pub cuisines: Vec<(String, String)>,
    pub pairings: Vec<(String, Vec<String>)>,
}

impl MenuTable {
    pub fn standard() -> Self {
        let cuisines = [
            ("steak", "Contemporary"),
            ("salmon", "Seafood"),
            ("risotto", "Italian"),
            ("sushi", "Japanese"),
            ("dosa", "Indian"),
            ("tacos", "Mexican"),
        ];
        let pairings = [
            ("Contemporary", ["Cabernet Sauvignon", "Malbec"]),
            ("Seafood", ["Chardonnay", "Sauvignon Blanc"]),
            ("Italian", ["Chianti", "Barolo"]),
            ("Japanese", ["Junmai Daiginjo Sake", "Riesling"]),
            ("Indian", ["Gewürztraminer", "Rosé"]),
            ("Mexican", ["Tempranillo", "Albariño"]),
        ];
        Self {
            cuisines: cuisines
                .iter()
                .map(|(dish, cuisine)| (dish.to_string(), cuisine.to_string()))
                .collect(),
            pairings: pairings
                .iter()
                .map(|(cuisine, wines)| (cuisine.to_string(), owned(wines)))
                .collect(),
        }
    }

    pub fn cuisine_for(&self, dish: &str) -> Option<&str> {
        lookup_ci(&self.cuisines, dish).map(String::as_str)
    }

    pub fn pairings_for(&self, cuisine: &str) -> &[String] {
        self.pairings
            .iter()
            .find(|(name, _)| name == cuisine)
            .map(|(_, wines)| wines.as_slice())
            .unwrap_or_default()
    }
}

pub struct ProcessOrder {
    menu: MenuTable,
}

impl ProcessOrder {
    pub fn new(menu: MenuTable) -> Self {
        Self { menu }
    }
}

impl ActionHandler for ProcessOrder {
    fn name(&self) -> ActionName {
        ActionName::ProcessOrder
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let Some(food_item) = envelope.entity_text("food_item") else {
            return ASK_FOR_ITEM.into();
        };
        let quantity = envelope
            .get_entity("quantity")
            .filter(|value| !matches!(value, Value::Null))
            .cloned()
            .unwrap_or_else(|| json!(1));
        let quantity_text = match &quantity {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let mut ordered_items = match envelope.get_slot("ordered_items") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        ordered_items.push(json!({ "item": food_item, "quantity": quantity }));

        let cuisine = self.menu.cuisine_for(&food_item);

        let mut text =
            format!("Excellent choice! I've added {quantity_text}x {food_item} to your selection.");
        if let Some(cuisine) = cuisine {
            let wines = self.menu.pairings_for(cuisine);
            if !wines.is_empty() {
                text.push_str(&format!(
                    "\n\nMay I suggest a pairing with our {}?",
                    wines.join(" or ")
                ));
            }
        }

        tracing::debug!(
            parent: &ctx.span,
            food_item = %food_item,
            cuisine = cuisine.unwrap_or("<unmapped>"),
            items = ordered_items.len(),
            "order updated"
        );

        Response::text(text)
            .with_custom("order_data", ordered_items.clone())
            .with_custom("cuisine", cuisine)
            .with_custom("show_customization", true)
            .with_mutation("ordered_items", ordered_items)
            .with_mutation("current_cuisine", cuisine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;

    fn run(envelope: Envelope) -> Response {
        let ctx = ActionContext::fixed(at("2024-03-15", "19:00"));
        ProcessOrder::new(MenuTable::standard()).run(&envelope, &ctx)
    }

    #[test]
    fn salmon_without_quantity_defaults_to_one() {
        let response = run(Envelope::new("action_process_order", "salmon please")
            .with_entity("food_item", "salmon"));

        assert!(response.text.contains("1x salmon"));
        assert!(response.text.contains("Chardonnay or Sauvignon Blanc"));
        assert_eq!(response.custom["cuisine"], json!("Seafood"));
        assert_eq!(response.custom["show_customization"], json!(true));
        assert_eq!(response.mutations.len(), 2);
        assert_eq!(response.mutations[0].slot_name, "ordered_items");
        assert_eq!(
            response.mutations[0].value,
            json!([{ "item": "salmon", "quantity": 1 }])
        );
        assert_eq!(response.mutations[1].slot_name, "current_cuisine");
        assert_eq!(response.mutations[1].value, json!("Seafood"));
    }

    #[test]
    fn missing_food_item_asks_and_mutates_nothing() {
        let response = run(Envelope::new("action_process_order", "I'd like to order")
            .with_entity("quantity", 2));
        assert_eq!(response.text, "What would you like to order from our menu?");
        assert!(response.mutations.is_empty());
    }

    #[test]
    fn appends_to_existing_order_and_keeps_quantity() {
        let response = run(Envelope::new("action_process_order", "three tacos")
            .with_entity("food_item", "Tacos")
            .with_entity("quantity", "3")
            .with_slot("ordered_items", json!([{ "item": "dosa", "quantity": 1 }])));

        assert!(response.text.starts_with("Excellent choice! I've added 3x Tacos"));
        assert!(response.text.contains("Tempranillo or Albariño"));
        assert_eq!(
            response.custom["order_data"],
            json!([
                { "item": "dosa", "quantity": 1 },
                { "item": "Tacos", "quantity": "3" }
            ])
        );
        assert_eq!(response.custom["cuisine"], json!("Mexican"));
    }

    #[test]
    fn unmapped_dish_has_no_pairing_and_null_cuisine() {
        let response = run(Envelope::new("action_process_order", "a burger")
            .with_entity("food_item", "burger"));
        assert_eq!(
            response.text,
            "Excellent choice! I've added 1x burger to your selection."
        );
        assert_eq!(response.custom["cuisine"], Value::Null);
        assert_eq!(response.mutations[1].value, Value::Null);
    }

    #[test]
    fn identical_envelopes_give_identical_responses() {
        let envelope = Envelope::new("action_process_order", "sushi")
            .with_entity("food_item", "sushi");
        let first = serde_json::to_string(&run(envelope.clone())).unwrap();
        let second = serde_json::to_string(&run(envelope)).unwrap();
        assert_eq!(first, second);
    }
}
