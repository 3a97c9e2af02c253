use chrono::{Datelike, Timelike, Weekday};
use serde_json::json;

use super::ActionHandler;
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::format::{currency, signed_percent};
use crate::response::Response;

/// Demand-based pricing factors.
#[derive(Debug, Clone)]
pub struct PricingTable {
    pub base_price: f64,
    /// `(name, first_hour, last_hour)`; both hours are inside the window.
    pub peak_windows: Vec<(String, u32, u32)>,
    pub peak_factor: f64,
    /// Days not listed price at 1.0.
    pub day_factors: Vec<(Weekday, f64)>,
}

impl PricingTable {
    pub fn standard() -> Self {
        Self {
            base_price: 20.0,
            peak_windows: vec![("lunch".to_string(), 11, 14), ("dinner".to_string(), 18, 21)],
            peak_factor: 1.2,
            day_factors: vec![
                (Weekday::Mon, 0.9),
                (Weekday::Fri, 1.2),
                (Weekday::Sat, 1.3),
                (Weekday::Sun, 1.1),
            ],
        }
    }

    pub fn day_factor(&self, day: Weekday) -> f64 {
        self.day_factors
            .iter()
            .find(|(d, _)| *d == day)
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }

    pub fn peak_window(&self, hour: u32) -> Option<&str> {
        self.peak_windows
            .iter()
            .find(|(_, start, end)| (*start..=*end).contains(&hour))
            .map(|(name, _, _)| name.as_str())
    }
}

pub struct AdjustPrice {
    table: PricingTable,
}

impl AdjustPrice {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }
}

impl ActionHandler for AdjustPrice {
    fn name(&self) -> ActionName {
        ActionName::AdjustPrice
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let now = ctx.now();
        let food_item = envelope.entity_text("food_item");

        let day_factor = self.table.day_factor(now.weekday());
        let peak = self.table.peak_window(now.hour());
        let peak_factor = if peak.is_some() {
            self.table.peak_factor
        } else {
            1.0
        };
        let base = self.table.base_price;
        let adjusted = base * day_factor * peak_factor;

        let mut text = format!(
            "Current pricing for {}:\n\n",
            food_item.as_deref().unwrap_or("menu items")
        );
        text.push_str(&format!("Base price: {}\n", currency(base)));
        if day_factor != 1.0 {
            text.push_str(&format!("Day adjustment: {}\n", signed_percent(day_factor)));
        }
        if peak_factor != 1.0 {
            text.push_str(&format!(
                "Peak hour adjustment: {}\n",
                signed_percent(peak_factor)
            ));
        }
        text.push_str(&format!("\nFinal price: {}", currency(adjusted)));

        tracing::debug!(parent: &ctx.span, day_factor, peak_factor, adjusted, "price adjusted");

        Response::text(text).with_custom(
            "price_data",
            json!({
                "item": food_item,
                "base": base,
                "adjusted": adjusted,
                "peak_window": peak,
                "factors": { "day": day_factor, "peak": peak_factor },
            }),
        )
    }
}
