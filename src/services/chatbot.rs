//! Inventory assistant.
//!
//! With an AI provider configured, questions are answered by the model from a text snapshot
//! of the inventory. Without one, or when the provider fails, a keyword router answers from
//! the same services directly.

use crate::{
    entities::inventory_item,
    errors::ServiceResult,
    services::{
        ai::AiClient,
        inventory::InventoryService,
        orders::{OrderService, OrderView},
    },
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{error, instrument};
use utoipa::ToSchema;
use validator::Validate;

const LIST_LIMIT: usize = 10;
const RECENT_ORDERS: u64 = 5;

pub const HELP_TEXT: &str = "I can help you with:\n\
- Check stock levels (e.g., \"stock level for 10mm Wrench\")\n\
- List inventory items (e.g., \"show all tools\")\n\
- Check low stock items (e.g., \"what items are running low?\")\n\
- View recent orders (e.g., \"show recent orders\")\n\
Please rephrase your question.";

const SYSTEM_PROMPT: &str = "You are an inventory management assistant. Answer questions based on \
the provided inventory data. Be concise and helpful.";

static FOR_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:for|of)\s+(.+?)(?:\s|$|\?)").expect("valid regex"));
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"](.+?)['"]"#).expect("valid regex"));
static STOCK_LEVEL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i).*?stock\s+level\s*").expect("valid regex"));

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChatbotQueryRequest {
    #[validate(length(min = 3, max = 1000))]
    #[schema(example = "stock level for 10mm Wrench")]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatbotResponse {
    pub response: String,
}

/// What a rule-mode question is about. The first matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    StockLevel,
    ListItems,
    LowStock,
    RecentOrders,
    CategorySummary,
    Help,
}

fn mentions(query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| query.contains(k))
}

/// Classifies an already lowercased question.
pub fn classify(query: &str) -> Intent {
    if mentions(query, &["stock", "level", "quantity", "how many", "available"]) {
        Intent::StockLevel
    } else if mentions(query, &["list", "show", "all items", "inventory"]) {
        Intent::ListItems
    } else if mentions(query, &["low stock", "running low", "reorder", "shortage"]) {
        Intent::LowStock
    } else if mentions(query, &["recent", "order", "usage", "history"]) {
        Intent::RecentOrders
    } else if mentions(query, &["tools", "materials", "consumables", "category"]) {
        Intent::CategorySummary
    } else {
        Intent::Help
    }
}

/// Category label implied by the question, if any.
pub fn infer_category(query: &str) -> Option<&'static str> {
    if query.contains("tool") {
        Some("Tools")
    } else if query.contains("material") {
        Some("Materials")
    } else if query.contains("consumable") {
        Some("Consumables")
    } else {
        None
    }
}

/// Item name from "... for X", a quoted name, or up to three words after "stock level".
pub fn extract_item_name(query: &str) -> Option<String> {
    let capture = |re: &Regex| {
        re.captures(query)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    if let Some(name) = capture(&FOR_ITEM).or_else(|| capture(&QUOTED)) {
        return Some(name);
    }

    let rest = STOCK_LEVEL_PREFIX.replace(query, "");
    let name = rest.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

pub fn stock_level_reply(item: &inventory_item::Model) -> String {
    let mut reply = format!(
        "We currently have {} {} of '{}' in stock.",
        item.quantity, item.unit, item.name
    );
    if item.quantity <= item.reorder_threshold {
        let _ = write!(
            reply,
            "\n⚠️ Warning: Stock is below reorder threshold ({}).",
            item.reorder_threshold
        );
    }
    if let Some(predicted) = item.forecast_predicted_usage.filter(|p| *p != 0) {
        let _ = write!(
            reply,
            "\n📊 AI predicts usage of {predicted} {unit}. Expected remaining: {} {unit}.",
            item.quantity - predicted,
            unit = item.unit
        );
    }
    reply
}

pub fn list_reply(category: Option<&str>, items: &[inventory_item::Model]) -> String {
    if items.is_empty() {
        return match category {
            Some(category) => format!("No items found in category: {category}"),
            None => "No items in inventory.".to_string(),
        };
    }
    let shown = items.len().min(LIST_LIMIT);
    let header = match category {
        Some(category) => format!("Items in {category} (showing {shown} of {}):", items.len()),
        None => format!("All inventory items (showing {shown} of {}):", items.len()),
    };
    let lines = items
        .iter()
        .take(LIST_LIMIT)
        .enumerate()
        .map(|(i, item)| format!("{}. {} - {} {}", i + 1, item.name, item.quantity, item.unit))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{header}\n{lines}")
}

pub fn low_stock_reply(items: &[inventory_item::Model]) -> String {
    if items.is_empty() {
        return "All items are sufficiently stocked. ✅".to_string();
    }
    let lines = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. {} - {} {} (threshold: {})",
                i + 1,
                item.name,
                item.quantity,
                item.unit,
                item.reorder_threshold
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("⚠️ {} item(s) are running low:\n{lines}", items.len())
}

pub fn recent_orders_reply(orders: &[OrderView]) -> String {
    if orders.is_empty() {
        return "No recent orders found.".to_string();
    }
    let lines = orders
        .iter()
        .enumerate()
        .map(|(i, order)| {
            format!(
                "{}. {} - {} item(s) - {}",
                i + 1,
                order.order_type,
                order.items.len(),
                order.created_at.format("%-m/%-d/%Y")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Recent orders:\n{lines}")
}

pub fn category_reply(category: &str, items: &[inventory_item::Model]) -> String {
    if items.is_empty() {
        return format!("No items found in category: {category}");
    }
    let total: i64 = items.iter().map(|item| i64::from(item.quantity)).sum();
    format!(
        "Category: {category}\nTotal items: {}\nCombined quantity: {total}",
        items.len()
    )
}

#[derive(Clone)]
pub struct ChatbotService {
    inventory: InventoryService,
    orders: OrderService,
    ai: AiClient,
}

impl ChatbotService {
    pub fn new(inventory: InventoryService, orders: OrderService, ai: AiClient) -> Self {
        Self {
            inventory,
            orders,
            ai,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn query(&self, request: ChatbotQueryRequest) -> ServiceResult<ChatbotResponse> {
        request.validate()?;
        let normalized = request.query.trim().to_lowercase();

        if self.ai.enabled() {
            let context = self.inventory_context(&normalized).await;
            let prompt = format!(
                "Question: {}\n\nInventory Context:\n{context}\n\n\
                 Instructions:\n- Be concise and helpful\n- Use emojis when appropriate\n\
                 - Format numbers clearly\n- If asking about specific items, search the context data\n\
                 - If data is not in context, say you don't have that information\n\nAnswer:",
                request.query
            );
            match self.ai.complete(SYSTEM_PROMPT, &prompt).await {
                Ok(response) => return Ok(ChatbotResponse { response }),
                Err(e) => error!(error = %e, "AI assistant failed, answering with rules"),
            }
        }

        let response = self.answer_with_rules(&normalized).await?;
        Ok(ChatbotResponse { response })
    }

    /// Rule-mode answer for a lowercased question.
    pub async fn answer_with_rules(&self, query: &str) -> ServiceResult<String> {
        let reply = match classify(query) {
            Intent::StockLevel => match extract_item_name(query) {
                Some(name) if name.chars().count() >= 2 => {
                    match self.inventory.search_by_name(&name).await? {
                        Some(item) => stock_level_reply(&item),
                        None => format!(
                            "Item \"{name}\" not found. Please check the spelling or try a different name."
                        ),
                    }
                }
                _ => "Please specify an item name. Example: \"stock level for 10mm Wrench\""
                    .to_string(),
            },
            Intent::ListItems => {
                let category = infer_category(query);
                let items = self.inventory.find_all(category, None).await?;
                list_reply(category, &items)
            }
            Intent::LowStock => low_stock_reply(&self.inventory.find_low_stock().await?),
            Intent::RecentOrders => recent_orders_reply(&self.orders.recent(RECENT_ORDERS).await?),
            Intent::CategorySummary => match infer_category(query) {
                Some(category) => {
                    let items = self.inventory.find_all(Some(category), None).await?;
                    category_reply(category, &items)
                }
                None => "Please specify a category: Tools, Materials, or Consumables.".to_string(),
            },
            Intent::Help => HELP_TEXT.to_string(),
        };
        Ok(reply)
    }

    /// Text snapshot handed to the model. Lookup failures leave their section out.
    async fn inventory_context(&self, query: &str) -> String {
        let mut context = String::new();

        match self.inventory.find_all(None, None).await {
            Ok(items) if !items.is_empty() => {
                context.push_str("Current Inventory:\n");
                for item in &items {
                    let _ = write!(
                        context,
                        "- {}: {} {} (Category: {}, Threshold: {})",
                        item.name, item.quantity, item.unit, item.category, item.reorder_threshold
                    );
                    if let Some(predicted) = item.forecast_predicted_usage.filter(|p| *p != 0) {
                        let _ = write!(context, " [AI Forecast: {predicted} {}]", item.unit);
                    }
                    context.push('\n');
                }
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "failed to load inventory context"),
        }

        if mentions(query, &["low", "shortage", "reorder"]) {
            match self.inventory.find_low_stock().await {
                Ok(items) if !items.is_empty() => {
                    context.push_str("\nLow Stock Items:\n");
                    for item in &items {
                        let _ = writeln!(
                            context,
                            "- {}: {} {} (below threshold of {})",
                            item.name, item.quantity, item.unit, item.reorder_threshold
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "failed to load low stock context"),
            }
        }

        if mentions(query, &["order", "usage", "history"]) {
            match self.orders.recent(RECENT_ORDERS).await {
                Ok(orders) if !orders.is_empty() => {
                    context.push_str("\nRecent Orders:\n");
                    for order in &orders {
                        let _ = writeln!(
                            context,
                            "- {} order: {} items on {}",
                            order.order_type,
                            order.items.len(),
                            order.created_at.format("%-m/%-d/%Y")
                        );
                    }
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "failed to load order context"),
            }
        }

        if context.is_empty() {
            "No inventory data available.".to_string()
        } else {
            context
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ItemUnit;
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    fn item(name: &str, quantity: i32, threshold: i32, predicted: Option<i32>) -> inventory_item::Model {
        let now = Utc::now();
        inventory_item::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category: "Tools".into(),
            quantity,
            unit: ItemUnit::Pcs,
            reorder_threshold: threshold,
            last_updated: now,
            forecast_predicted_usage: predicted,
            forecast_date: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case("stock level for 10mm wrench", Intent::StockLevel)]
    #[case("how many hammers?", Intent::StockLevel)]
    #[case("show all tools", Intent::ListItems)]
    #[case("what items are running low?", Intent::LowStock)]
    #[case("any recent orders?", Intent::RecentOrders)]
    #[case("tell me about consumables", Intent::CategorySummary)]
    #[case("hello there", Intent::Help)]
    fn intents(#[case] query: &str, #[case] expected: Intent) {
        assert_eq!(classify(query), expected);
    }

    #[rstest]
    #[case("stock level for 10mm wrench", Some("10mm"))]
    #[case("what is the quantity of hammer?", Some("hammer"))]
    #[case("stock of 'duct tape'", Some("'duct"))]
    #[case("quantity 'duct tape'", Some("duct tape"))]
    #[case("stock level drill bits set large", Some("drill bits set"))]
    #[case("stock level", None)]
    fn item_names(#[case] query: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_item_name(query).as_deref(), expected);
    }

    #[test]
    fn stock_level_mentions_threshold_and_forecast() {
        let reply = stock_level_reply(&item("10mm Wrench", 5, 5, Some(3)));
        assert_eq!(
            reply,
            "We currently have 5 pcs of '10mm Wrench' in stock.\n\
             ⚠️ Warning: Stock is below reorder threshold (5).\n\
             📊 AI predicts usage of 3 pcs. Expected remaining: 2 pcs."
        );
        assert_eq!(
            stock_level_reply(&item("Hammer", 40, 5, None)),
            "We currently have 40 pcs of 'Hammer' in stock."
        );
    }

    #[test]
    fn list_is_capped_at_ten() {
        let items: Vec<_> = (0..12).map(|i| item(&format!("Item {i}"), i, 1, None)).collect();
        let reply = list_reply(Some("Tools"), &items);
        assert!(reply.starts_with("Items in Tools (showing 10 of 12):\n1. Item 0 - 0 pcs"));
        assert_eq!(reply.lines().count(), 11);
        assert_eq!(list_reply(None, &[]), "No items in inventory.");
    }

    #[test]
    fn low_stock_and_category_replies() {
        assert_eq!(low_stock_reply(&[]), "All items are sufficiently stocked. ✅");
        assert_eq!(
            low_stock_reply(&[item("Tape", 1, 5, None)]),
            "⚠️ 1 item(s) are running low:\n1. Tape - 1 pcs (threshold: 5)"
        );
        assert_eq!(
            category_reply("Tools", &[item("A", 2, 1, None), item("B", 3, 1, None)]),
            "Category: Tools\nTotal items: 2\nCombined quantity: 5"
        );
    }
}
