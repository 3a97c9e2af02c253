use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name the dialogue manager uses to request the fallback handler directly.
pub const FALLBACK_ACTION: &str = "action_default_fallback";

/// The closed set of actions this server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ActionName {
    #[serde(rename = "action_process_order")]
    ProcessOrder,
    #[serde(rename = "action_show_recommendations")]
    ShowRecommendations,
    #[serde(rename = "action_suggest_wine")]
    SuggestWine,
    #[serde(rename = "action_handle_reservation")]
    HandleReservation,
    #[serde(rename = "action_adjust_price")]
    AdjustPrice,
    #[serde(rename = "action_check_inventory")]
    CheckInventory,
    #[serde(rename = "action_handle_feedback")]
    HandleFeedback,
    #[serde(rename = "action_set_business_info")]
    SetBusinessInfo,
    #[serde(rename = "action_forecast_prep")]
    ForecastPrep,
}

impl ActionName {
    pub const ALL: [ActionName; 9] = [
        ActionName::ProcessOrder,
        ActionName::ShowRecommendations,
        ActionName::SuggestWine,
        ActionName::HandleReservation,
        ActionName::AdjustPrice,
        ActionName::CheckInventory,
        ActionName::HandleFeedback,
        ActionName::SetBusinessInfo,
        ActionName::ForecastPrep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::ProcessOrder => "action_process_order",
            ActionName::ShowRecommendations => "action_show_recommendations",
            ActionName::SuggestWine => "action_suggest_wine",
            ActionName::HandleReservation => "action_handle_reservation",
            ActionName::AdjustPrice => "action_adjust_price",
            ActionName::CheckInventory => "action_check_inventory",
            ActionName::HandleFeedback => "action_handle_feedback",
            ActionName::SetBusinessInfo => "action_set_business_info",
            ActionName::ForecastPrep => "action_forecast_prep",
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = String;

    /// Exact match only; no trimming or case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
