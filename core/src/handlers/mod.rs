//! One handler per recognized intent.
//!
//! Every handler is a pure function of the envelope, its own lookup table and
//! the clock in the [`ActionContext`]. None of them hold mutable state.

pub mod business;
pub mod feedback;
pub mod forecast;
pub mod inventory;
pub mod order;
pub mod pricing;
pub mod recommendations;
pub mod reservation;
pub mod wine;

use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::response::Response;

pub use business::{BusinessDefaults, SetBusinessInfo};
pub use feedback::{FeedbackKeywords, HandleFeedback, Sentiment};
pub use forecast::{ForecastPrep, ForecastTable, Service};
pub use inventory::{CheckInventory, InventoryTable, StockItem};
pub use order::{MenuTable, ProcessOrder};
pub use pricing::{AdjustPrice, PricingTable};
pub use recommendations::{DayPart, RecommendationTable, ShowRecommendations};
pub use reservation::{HandleReservation, OccasionTable, SeatingTier};
pub use wine::{SommelierTable, SuggestWine};

pub trait ActionHandler: Send + Sync {
    fn name(&self) -> ActionName;

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response;
}

/// Static data for every handler, built once at process start.
#[derive(Debug, Clone)]
pub struct Tables {
    pub menu: MenuTable,
    pub recommendations: RecommendationTable,
    pub sommelier: SommelierTable,
    pub occasions: OccasionTable,
    pub pricing: PricingTable,
    pub inventory: InventoryTable,
    pub feedback: FeedbackKeywords,
    pub business: BusinessDefaults,
    pub forecast: ForecastTable,
}

impl Tables {
    pub fn standard() -> Self {
        Self {
            menu: MenuTable::standard(),
            recommendations: RecommendationTable::standard(),
            sommelier: SommelierTable::standard(),
            occasions: OccasionTable::standard(),
            pricing: PricingTable::standard(),
            inventory: InventoryTable::standard(),
            feedback: FeedbackKeywords::standard(),
            business: BusinessDefaults::standard(),
            forecast: ForecastTable::standard(),
        }
    }

    /// One handler per action, in [`ActionName::ALL`] order.
    pub fn into_handlers(self) -> Vec<Box<dyn ActionHandler>> {
        vec![
            Box::new(ProcessOrder::new(self.menu)),
            Box::new(ShowRecommendations::new(self.recommendations)),
            Box::new(SuggestWine::new(self.sommelier)),
            Box::new(HandleReservation::new(self.occasions)),
            Box::new(AdjustPrice::new(self.pricing)),
            Box::new(CheckInventory::new(self.inventory)),
            Box::new(HandleFeedback::new(self.feedback)),
            Box::new(SetBusinessInfo::new(self.business)),
            Box::new(ForecastPrep::new(self.forecast)),
        ]
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::standard()
    }
}

/// `(key, value)` lookup ignoring ASCII case on the key.
pub(crate) fn lookup_ci<'a, V>(entries: &'a [(String, V)], key: &str) -> Option<&'a V> {
    entries
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

pub(crate) fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
