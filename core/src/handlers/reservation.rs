use serde_json::json;

use super::{ActionHandler, lookup_ci};
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::response::Response;

/// Seating offered for a party, chosen by size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatingTier {
    Window,
    Alcove,
    Private,
}

impl SeatingTier {
    /// `p ≤ 2` window, `p ≤ 6` alcove, larger parties private.
    pub fn for_party(party_size: u32) -> Self {
        if party_size <= 2 {
            SeatingTier::Window
        } else if party_size <= 6 {
            SeatingTier::Alcove
        } else {
            SeatingTier::Private
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatingTier::Window => "window",
            SeatingTier::Alcove => "alcove",
            SeatingTier::Private => "private",
        }
    }

    fn recommendation(&self) -> &'static str {
        match self {
            SeatingTier::Window => "Our intimate window tables overlooking the garden",
            SeatingTier::Alcove => "Our semi-private alcove seating",
            SeatingTier::Private => "Our elegant private dining room",
        }
    }
}

/// Special touches arranged for known occasions.
#[derive(Debug, Clone)]
pub struct OccasionTable {
    pub touches: Vec<(String, String)>,
}

impl OccasionTable {
    pub fn standard() -> Self {
        let touches = [
            (
                "anniversary",
                "We'll ensure a romantic table setting with complimentary champagne.",
            ),
            ("birthday", "We'll arrange for a special dessert presentation."),
            (
                "business",
                "We'll reserve our private dining room for your comfort.",
            ),
        ];
        Self {
            touches: touches
                .iter()
                .map(|(occasion, touch)| (occasion.to_string(), touch.to_string()))
                .collect(),
        }
    }

    pub fn touch_for(&self, occasion: &str) -> Option<&str> {
        lookup_ci(&self.touches, occasion).map(String::as_str)
    }
}

pub struct HandleReservation {
    occasions: OccasionTable,
}

impl HandleReservation {
    pub fn new(occasions: OccasionTable) -> Self {
        Self { occasions }
    }
}

impl ActionHandler for HandleReservation {
    fn name(&self) -> ActionName {
        ActionName::HandleReservation
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let party_size_raw = envelope.entity_text("party_size");
        let date = envelope.entity_text("date");
        let occasion = envelope.entity_text("occasion");

        let party_size = party_size_raw
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok());
        if party_size_raw.is_some() && party_size.is_none() {
            tracing::debug!(
                parent: &ctx.span,
                party_size = party_size_raw.as_deref().unwrap_or_default(),
                "ignoring non-numeric party size"
            );
        }

        let mut text = String::from("I'd be delighted to assist with your reservation.");

        if let Some(touch) = occasion.as_deref().and_then(|o| self.occasions.touch_for(o)) {
            text.push_str(&format!("\n\n{touch}"));
        }

        let seating = party_size.map(SeatingTier::for_party);
        match (party_size, seating) {
            (Some(size), Some(tier)) => {
                text.push_str(&format!("\n\nFor your party of {size}, I recommend:"));
                text.push_str(&format!("\n• {}", tier.recommendation()));
            }
            _ => text.push_str("\n\nHow many guests will be joining you?"),
        }

        text.push_str("\n\nWould you like to proceed with the reservation?");

        let mut response = Response::text(text).with_custom(
            "reservation",
            json!({
                "party_size": party_size,
                "date": date,
                "occasion": occasion,
                "seating": seating.map(|tier| tier.as_str()),
            }),
        );
        // Nothing is stored until the guest count is known.
        let Some(size) = party_size else {
            return response;
        };
        response = response.with_mutation("party_size", size);
        if let Some(date) = date {
            response = response.with_mutation("reservation_date", date);
        }
        if let Some(occasion) = occasion {
            response = response.with_mutation("occasion", occasion);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;

    fn run(envelope: Envelope) -> Response {
        let ctx = ActionContext::fixed(at("2024-03-15", "10:00"));
        HandleReservation::new(OccasionTable::standard()).run(&envelope, &ctx)
    }

    #[test]
    fn tiers_are_inclusive_at_their_upper_bounds() {
        for p in 0..=2 {
            assert_eq!(SeatingTier::for_party(p), SeatingTier::Window);
        }
        for p in 3..=6 {
            assert_eq!(SeatingTier::for_party(p), SeatingTier::Alcove);
        }
        for p in [7, 8, 12, 40] {
            assert_eq!(SeatingTier::for_party(p), SeatingTier::Private);
        }
    }

    #[test]
    fn anniversary_for_two_gets_champagne_and_window() {
        let response = run(Envelope::new("action_handle_reservation", "table for two")
            .with_entity("occasion", "anniversary")
            .with_entity("party_size", "2"));
        assert!(response
            .text
            .contains("We'll ensure a romantic table setting with complimentary champagne."));
        assert!(response.text.contains("window tables"));
        assert!(response.text.contains("For your party of 2, I recommend:"));
        assert!(response.text.ends_with("Would you like to proceed with the reservation?"));
        assert_eq!(response.custom["reservation"]["seating"], "window");
    }

    #[test]
    fn large_party_gets_private_room_and_slots() {
        let response = run(Envelope::new("action_handle_reservation", "ten of us on friday")
            .with_entity("party_size", 10)
            .with_entity("date", "friday"));
        assert!(response.text.contains("• Our elegant private dining room"));
        let slots: Vec<_> = response
            .mutations
            .iter()
            .map(|m| m.slot_name.as_str())
            .collect();
        assert_eq!(slots, ["party_size", "reservation_date"]);
        assert_eq!(response.mutations[0].value, json!(10));
    }

    #[test]
    fn unknown_occasion_and_missing_size_ask_for_guests() {
        let response = run(Envelope::new("action_handle_reservation", "book a table")
            .with_entity("occasion", "graduation")
            .with_entity("party_size", "a few"));
        assert_eq!(
            response.text,
            "I'd be delighted to assist with your reservation.\n\n\
             How many guests will be joining you?\n\n\
             Would you like to proceed with the reservation?"
        );
        assert!(response.mutations.is_empty());
    }

    #[test]
    fn missing_party_size_stores_nothing_yet() {
        let response = run(Envelope::new("action_handle_reservation", "birthday dinner friday")
            .with_entity("date", "friday")
            .with_entity("occasion", "birthday"));
        assert!(response.text.contains("How many guests will be joining you?"));
        assert!(response.text.contains("special dessert presentation"));
        assert!(response.mutations.is_empty());
        assert_eq!(response.custom["reservation"]["date"], "friday");
        assert!(response.custom["reservation"]["party_size"].is_null());
    }
}
