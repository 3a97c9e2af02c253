use chrono::{Datelike, Timelike, Weekday};
use serde_json::{Map, Value, json};

use super::ActionHandler;
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::format::{title_case, weekday_name};
use crate::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Lunch,
    Dinner,
}

impl Service {
    /// Lunch covers `[6, 16)`, dinner everything else.
    pub fn from_hour(hour: u32) -> Self {
        if (6..16).contains(&hour) {
            Service::Lunch
        } else {
            Service::Dinner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Lunch => "lunch",
            Service::Dinner => "dinner",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepRatio {
    pub item: String,
    /// Amount per expected cover.
    pub per_cover: f64,
    pub unit: String,
}

#[derive(Debug, Clone)]
pub struct ForecastTable {
    /// `(day, lunch covers, dinner covers)`
    pub historical_covers: Vec<(Weekday, u32, u32)>,
    pub weather_factor: f64,
    pub event_factor: f64,
    pub prep: Vec<PrepRatio>,
}

impl ForecastTable {
    pub fn standard() -> Self {
        let prep = [
            ("rice", 0.2, "kg"),
            ("vegetables", 0.3, "kg"),
            ("proteins", 0.25, "kg"),
            ("sauces", 0.1, "L"),
        ];
        Self {
            historical_covers: vec![
                (Weekday::Mon, 100, 150),
                (Weekday::Tue, 90, 130),
                (Weekday::Wed, 95, 140),
                (Weekday::Thu, 110, 160),
                (Weekday::Fri, 130, 200),
                (Weekday::Sat, 150, 220),
                (Weekday::Sun, 140, 180),
            ],
            weather_factor: 1.0,
            event_factor: 1.0,
            prep: prep
                .iter()
                .map(|(item, per_cover, unit)| PrepRatio {
                    item: item.to_string(),
                    per_cover: *per_cover,
                    unit: unit.to_string(),
                })
                .collect(),
        }
    }

    pub fn covers(&self, day: Weekday, service: Service) -> u32 {
        self.historical_covers
            .iter()
            .find(|(d, _, _)| *d == day)
            .map(|(_, lunch, dinner)| match service {
                Service::Lunch => *lunch,
                Service::Dinner => *dinner,
            })
            .unwrap_or_default()
    }
}

pub struct ForecastPrep {
    table: ForecastTable,
}

impl ForecastPrep {
    pub fn new(table: ForecastTable) -> Self {
        Self { table }
    }
}

impl ActionHandler for ForecastPrep {
    fn name(&self) -> ActionName {
        ActionName::ForecastPrep
    }

    fn run(&self, _envelope: &Envelope, ctx: &ActionContext) -> Response {
        let now = ctx.now();
        let day = now.weekday();
        let service = Service::from_hour(now.hour());

        let base = self.table.covers(day, service);
        let forecast = f64::from(base) * self.table.weather_factor * self.table.event_factor;
        let expected_covers = forecast as u64;

        let mut text = String::from(
            "Based on historical data and current factors, here are today's prep recommendations:\n\n",
        );
        let mut prep = Map::new();
        for ratio in &self.table.prep {
            let amount = format!("{}{}", (forecast * ratio.per_cover) as u64, ratio.unit);
            text.push_str(&format!("• {}: {amount}\n", title_case(&ratio.item)));
            prep.insert(ratio.item.clone(), Value::String(amount));
        }
        text.push_str(&format!("\nExpected covers: {expected_covers}"));

        tracing::debug!(
            parent: &ctx.span,
            day = weekday_name(day),
            service = service.as_str(),
            expected_covers,
            "prep forecast computed"
        );

        Response::text(text).with_custom(
            "forecast_data",
            json!({
                "day": weekday_name(day),
                "service": service.as_str(),
                "expected_covers": expected_covers,
                "prep": prep,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;

    fn run_at(date: &str, time: &str) -> Response {
        let ctx = ActionContext::fixed(at(date, time));
        ForecastPrep::new(ForecastTable::standard())
            .run(&Envelope::new("action_forecast_prep", "what should we prep?"), &ctx)
    }

    #[test]
    fn friday_dinner_prep() {
        let response = run_at("2024-03-15", "17:00");
        assert_eq!(
            response.text,
            "Based on historical data and current factors, here are today's prep recommendations:\n\n\
             • Rice: 40kg\n\
             • Vegetables: 60kg\n\
             • Proteins: 50kg\n\
             • Sauces: 20L\n\
             \nExpected covers: 200"
        );
        assert_eq!(response.custom["forecast_data"]["service"], "dinner");
        assert_eq!(response.custom["forecast_data"]["day"], "friday");
    }

    #[test]
    fn tuesday_lunch_truncates_fractions() {
        let response = run_at("2024-03-12", "12:00");
        // 90 covers: rice 18, vegetables 27, proteins 22.5 -> 22, sauces 9
        assert!(response.text.contains("• Proteins: 22kg\n"));
        assert!(response.text.ends_with("Expected covers: 90"));
        assert_eq!(response.custom["forecast_data"]["prep"]["sauces"], "9L");
    }

    #[test]
    fn same_clock_gives_identical_responses() {
        let handler = ForecastPrep::new(ForecastTable::standard());
        let ctx = ActionContext::fixed(at("2024-03-16", "11:00"));
        let envelope = Envelope::new("action_forecast_prep", "prep list please");
        let first = serde_json::to_string(&handler.run(&envelope, &ctx)).unwrap();
        let second = serde_json::to_string(&handler.run(&envelope, &ctx)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn service_boundaries() {
        assert_eq!(Service::from_hour(5), Service::Dinner);
        assert_eq!(Service::from_hour(6), Service::Lunch);
        assert_eq!(Service::from_hour(15), Service::Lunch);
        assert_eq!(Service::from_hour(16), Service::Dinner);
    }
}
