use chrono::Timelike;

use super::{ActionHandler, owned};
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    /// `[6, 11)` morning, `[11, 17)` afternoon, everything else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=10 => DayPart::Morning,
            11..=16 => DayPart::Afternoon,
            _ => DayPart::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationTable {
    pub morning: Vec<String>,
    pub afternoon: Vec<String>,
    pub evening: Vec<String>,
}

impl RecommendationTable {
    pub fn standard() -> Self {
        Self {
            morning: owned(&[
                "Our signature Eggs Benedict with house-made hollandaise",
                "Artisanal pastry selection from our in-house bakery",
                "Organic steel-cut oatmeal with seasonal berries",
            ]),
            afternoon: owned(&[
                "Chef's tasting menu with wine pairings",
                "House-aged prime ribeye with truffle butter",
                "Wild-caught salmon with citrus beurre blanc",
            ]),
            evening: owned(&[
                "Seven-course degustation menu",
                "Dry-aged Tomahawk steak for two",
                "Fresh seafood tower with champagne",
            ]),
        }
    }

    pub fn for_part(&self, part: DayPart) -> &[String] {
        match part {
            DayPart::Morning => &self.morning,
            DayPart::Afternoon => &self.afternoon,
            DayPart::Evening => &self.evening,
        }
    }
}

pub struct ShowRecommendations {
    table: RecommendationTable,
}

impl ShowRecommendations {
    pub fn new(table: RecommendationTable) -> Self {
        Self { table }
    }
}

impl ActionHandler for ShowRecommendations {
    fn name(&self) -> ActionName {
        ActionName::ShowRecommendations
    }

    fn run(&self, _envelope: &Envelope, ctx: &ActionContext) -> Response {
        let part = DayPart::from_hour(ctx.now().hour());

        let mut text = String::from("Allow me to present our chef's recommendations:\n\n");
        for dish in self.table.for_part(part) {
            text.push_str(&format!("• {dish}\n"));
        }
        text.push_str(
            "\nEach dish is crafted with seasonal ingredients from our local artisanal partners.",
        );

        Response::text(text).with_custom("time_of_day", part.as_str())
    }
}
