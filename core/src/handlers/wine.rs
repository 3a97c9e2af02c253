use serde_json::json;

use super::{ActionHandler, lookup_ci, owned};
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::format::title_case;
use crate::response::Response;

const DEFER_TO_SOMMELIER: &str =
    "I'd be happy to have our sommelier suggest the perfect wine pairing for your selection.";

/// Sommelier selections per cuisine, grouped by wine type in display order.
#[derive(Debug, Clone)]
pub struct SommelierTable {
    pub cuisines: Vec<(String, Vec<(String, Vec<String>)>)>,
}

impl SommelierTable {
    pub fn standard() -> Self {
        let cellar: [(&str, Vec<(&str, Vec<&str>)>); 3] = [
            (
                "Contemporary",
                vec![
                    ("red", vec!["2018 Château Margaux", "2016 Opus One"]),
                    ("white", vec!["2019 Puligny-Montrachet"]),
                ],
            ),
            (
                "Seafood",
                vec![
                    ("white", vec!["2020 Chablis Grand Cru", "2019 Meursault"]),
                    ("sparkling", vec!["Krug Grande Cuvée"]),
                ],
            ),
            (
                "Italian",
                vec![
                    ("red", vec!["2015 Barolo Riserva", "2017 Brunello di Montalcino"]),
                    ("white", vec!["2020 Gavi di Gavi"]),
                ],
            ),
        ];
        Self {
            cuisines: cellar
                .into_iter()
                .map(|(cuisine, kinds)| {
                    let kinds = kinds
                        .into_iter()
                        .map(|(kind, wines)| (kind.to_string(), owned(&wines)))
                        .collect();
                    (cuisine.to_string(), kinds)
                })
                .collect(),
        }
    }

    pub fn selections_for(&self, cuisine: &str) -> Option<&[(String, Vec<String>)]> {
        lookup_ci(&self.cuisines, cuisine).map(Vec::as_slice)
    }
}

pub struct SuggestWine {
    table: SommelierTable,
}

impl SuggestWine {
    pub fn new(table: SommelierTable) -> Self {
        Self { table }
    }
}

impl ActionHandler for SuggestWine {
    fn name(&self) -> ActionName {
        ActionName::SuggestWine
    }

    fn run(&self, envelope: &Envelope, _ctx: &ActionContext) -> Response {
        let cuisine = envelope.slot_text("current_cuisine");
        let selections = cuisine
            .as_deref()
            .and_then(|cuisine| self.table.selections_for(cuisine));

        let Some(selections) = selections else {
            return Response::text(DEFER_TO_SOMMELIER).with_custom("cuisine", cuisine);
        };

        let mut text = String::from("Our sommelier recommends:\n\n");
        for (kind, wines) in selections {
            text.push_str(&format!("{} Wines:\n", title_case(kind)));
            for wine in wines {
                text.push_str(&format!("• {wine}\n"));
            }
        }

        let wines: serde_json::Map<_, _> = selections
            .iter()
            .map(|(kind, wines)| (kind.clone(), json!(wines)))
            .collect();
        Response::text(text)
            .with_custom("cuisine", cuisine)
            .with_custom("wines", wines)
    }
}
