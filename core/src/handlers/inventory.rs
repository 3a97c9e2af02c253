use serde_json::json;

use super::ActionHandler;
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::format::title_case;
use crate::response::Response;

#[derive(Debug, Clone, PartialEq)]
pub struct StockItem {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub threshold: u32,
}

impl StockItem {
    pub fn new(name: &str, quantity: u32, unit: &str, threshold: u32) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            threshold,
        }
    }

    /// Strictly below: stock sitting exactly at the threshold is fine.
    pub fn needs_reorder(&self) -> bool {
        self.quantity < self.threshold
    }
}

/// Stock levels grouped by category, in display order.
#[derive(Debug, Clone)]
pub struct InventoryTable {
    pub categories: Vec<(String, Vec<StockItem>)>,
}

impl InventoryTable {
    pub fn standard() -> Self {
        Self {
            categories: vec![
                (
                    "proteins".to_string(),
                    vec![
                        StockItem::new("ribeye", 45, "steaks", 20),
                        StockItem::new("salmon", 38, "fillets", 15),
                        StockItem::new("chicken", 85, "breasts", 30),
                    ],
                ),
                (
                    "produce".to_string(),
                    vec![
                        StockItem::new("lettuce", 25, "heads", 10),
                        StockItem::new("tomatoes", 50, "kg", 20),
                        StockItem::new("onions", 75, "kg", 25),
                    ],
                ),
                (
                    "dairy".to_string(),
                    vec![
                        StockItem::new("butter", 40, "kg", 15),
                        StockItem::new("cream", 30, "L", 10),
                        StockItem::new("cheese", 55, "kg", 20),
                    ],
                ),
            ],
        }
    }

    pub fn find(&self, name: &str) -> Option<&StockItem> {
        self.categories
            .iter()
            .flat_map(|(_, items)| items.iter())
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }
}

fn reorder_alert(name: &str) -> String {
    format!("⚠️ {name} is below reorder threshold!")
}

pub struct CheckInventory {
    table: InventoryTable,
}

impl CheckInventory {
    pub fn new(table: InventoryTable) -> Self {
        Self { table }
    }
}

impl ActionHandler for CheckInventory {
    fn name(&self) -> ActionName {
        ActionName::CheckInventory
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let item = envelope.entity_text("food_item");
        tracing::info!(
            parent: &ctx.span,
            item = item.as_deref().unwrap_or("<all>"),
            "inventory check requested"
        );

        let mut alerts = Vec::new();
        let mut text = match item.as_deref() {
            Some(requested) => match self.table.find(requested) {
                Some(stock) => {
                    if stock.needs_reorder() {
                        alerts.push(reorder_alert(requested));
                    }
                    format!(
                        "Current inventory for {requested}:\n• Quantity: {} {}\n",
                        stock.quantity, stock.unit
                    )
                }
                None => format!(
                    "I don't have {requested} in our inventory records. \
                     Our kitchen manager can check on it for you."
                ),
            },
            None => {
                let mut text = String::from("Current inventory status:\n\n");
                for (category, items) in &self.table.categories {
                    text.push_str(&format!("{}:\n", title_case(category)));
                    for stock in items {
                        text.push_str(&format!(
                            "• {}: {} {}\n",
                            title_case(&stock.name),
                            stock.quantity,
                            stock.unit
                        ));
                        if stock.needs_reorder() {
                            alerts.push(reorder_alert(&stock.name));
                        }
                    }
                    text.push('\n');
                }
                text
            }
        };

        if !alerts.is_empty() {
            text.push_str("\nAlerts:\n");
            text.push_str(&alerts.join("\n"));
            tracing::warn!(parent: &ctx.span, alerts = alerts.len(), "stock below reorder threshold");
        }

        Response::text(text).with_custom(
            "inventory_data",
            json!({
                "timestamp": ctx.now().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "alerts": alerts,
                "checked_item": item,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::at;

    fn run(table: InventoryTable, envelope: Envelope) -> Response {
        let ctx = ActionContext::fixed(at("2024-03-15", "07:45"));
        CheckInventory::new(table).run(&envelope, &ctx)
    }

    #[test]
    fn full_report_has_no_alerts_with_standard_stock() {
        let response = run(
            InventoryTable::standard(),
            Envelope::new("action_check_inventory", "how's stock?"),
        );
        assert!(response.text.starts_with("Current inventory status:\n\nProteins:\n• Ribeye: 45 steaks\n"));
        assert!(response.text.contains("Produce:\n• Lettuce: 25 heads\n"));
        assert!(!response.text.contains("Alerts:"));
        assert_eq!(response.custom["inventory_data"]["alerts"], json!([]));
        assert_eq!(
            response.custom["inventory_data"]["timestamp"],
            "2024-03-15T07:45:00"
        );
    }

    #[test]
    fn low_lettuce_raises_an_alert() {
        let mut table = InventoryTable::standard();
        table.categories[1].1[0] = StockItem::new("lettuce", 5, "heads", 10);

        let response = run(table, Envelope::new("action_check_inventory", "stock?"));
        let alerts = response.custom["inventory_data"]["alerts"]
            .as_array()
            .expect("alerts array");
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].as_str().unwrap().contains("lettuce"));
        assert!(response.text.ends_with("\nAlerts:\n⚠️ lettuce is below reorder threshold!"));
    }

    #[test]
    fn specific_item_lookup_ignores_case() {
        let response = run(
            InventoryTable::standard(),
            Envelope::new("action_check_inventory", "salmon?").with_entity("food_item", "Salmon"),
        );
        assert_eq!(response.text, "Current inventory for Salmon:\n• Quantity: 38 fillets\n");
        assert_eq!(response.custom["inventory_data"]["checked_item"], "Salmon");
    }

    #[test]
    fn unknown_item_gets_a_deferral() {
        let response = run(
            InventoryTable::standard(),
            Envelope::new("action_check_inventory", "truffles?").with_entity("food_item", "truffles"),
        );
        assert!(response.text.starts_with("I don't have truffles in our inventory records."));
        assert_eq!(response.custom["inventory_data"]["alerts"], json!([]));
    }

    #[test]
    fn stock_at_threshold_is_not_low() {
        assert!(!StockItem::new("cream", 10, "L", 10).needs_reorder());
        assert!(StockItem::new("cream", 9, "L", 10).needs_reorder());
    }
}
