//! Demand forecasting sweep.
//!
//! For each inventory item the daily usage history is sent to the AI provider, which answers
//! with a predicted usage figure. A timeout, provider error or unreadable reply falls back to
//! the rounded-up daily average of the same history.

use crate::{
    entities::inventory_item,
    errors::ServiceResult,
    services::{
        ai::AiClient,
        inventory::InventoryService,
        orders::{DailyUsage, OrderService},
    },
};
use chrono::{Months, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

const SYSTEM_PROMPT: &str = "You are an inventory forecasting AI. Analyze historical usage data \
and predict future usage. Return ONLY a JSON object with format: {\"predictedUsage\": number}";

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("valid regex"));

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSummary {
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// `ceil(sum / days)` of the daily totals; 0 without history.
pub fn fallback_forecast(history: &[DailyUsage]) -> i32 {
    if history.is_empty() {
        return 0;
    }
    let total: i64 = history.iter().map(|day| day.total_usage).sum();
    let days = history.len() as i64;
    let average = (total + days - 1).div_euclid(days);
    i32::try_from(average).unwrap_or(i32::MAX)
}

/// Reads `predictedUsage` from the first `{...}` in a provider reply, rounded up.
///
/// Missing, zero or non-numeric values yield `None`.
pub fn parse_predicted_usage(reply: &str) -> Option<i32> {
    let object = JSON_OBJECT.find(reply)?;
    let parsed: serde_json::Value = serde_json::from_str(object.as_str()).ok()?;
    let predicted = parsed.get("predictedUsage")?.as_f64()?;
    if predicted == 0.0 || !predicted.is_finite() {
        return None;
    }
    Some(predicted.ceil() as i32)
}

fn user_prompt(item_name: &str, history: &[DailyUsage]) -> String {
    let data = serde_json::to_string_pretty(history).unwrap_or_else(|_| "[]".into());
    format!(
        "Item: {item_name}\nHistorical Daily Usage:\n{data}\n\n\
         Task: Predict the usage for the next period based on trends, patterns, and seasonality.\n\n\
         Important:\n- Consider trends (increasing/decreasing usage)\n- Consider day of week patterns\n\
         - Consider seasonal patterns\n- Be conservative but realistic\n- Round to whole numbers\n\n\
         Return JSON with predictedUsage field."
    )
}

#[derive(Clone)]
pub struct ForecastingService {
    inventory: InventoryService,
    orders: OrderService,
    ai: AiClient,
    history_months: u32,
}

impl ForecastingService {
    pub fn new(
        inventory: InventoryService,
        orders: OrderService,
        ai: AiClient,
        history_months: u32,
    ) -> Self {
        Self {
            inventory,
            orders,
            ai,
            history_months,
        }
    }

    /// Predicted usage for one item's history.
    pub async fn forecast(&self, item_name: &str, history: &[DailyUsage]) -> i32 {
        if self.ai.enabled() {
            let reply = self
                .ai
                .complete(SYSTEM_PROMPT, &user_prompt(item_name, history))
                .await;
            match reply.map(|text| parse_predicted_usage(&text)) {
                Ok(Some(predicted)) => {
                    info!(item = item_name, predicted, "AI forecast");
                    return predicted;
                }
                Ok(None) => error!(item = item_name, "invalid response format from AI"),
                Err(e) => error!(item = item_name, error = %e, "AI forecasting failed"),
            }
        }
        warn!(item = item_name, "using fallback forecast");
        fallback_forecast(history)
    }

    /// Forecasts every item. A failing item is logged and counted; the sweep continues.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ServiceResult<ForecastSummary> {
        info!("starting demand forecasting sweep");
        let items = self.inventory.find_all(None, None).await?;
        let end = Utc::now();
        let start = end
            .checked_sub_months(Months::new(self.history_months))
            .unwrap_or(end);

        let mut summary = ForecastSummary::default();
        for item in items {
            summary.processed += 1;
            match self.forecast_item(&item, start, end).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(item = %item.name, error = %e, "error forecasting item");
                }
            }
        }

        info!(?summary, "demand forecasting sweep completed");
        Ok(summary)
    }

    async fn forecast_item(
        &self,
        item: &inventory_item::Model,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> ServiceResult<bool> {
        let history = self.orders.historical_usage(item.id, start, end).await?;
        if history.is_empty() {
            warn!(item = %item.name, "no historical data");
            return Ok(false);
        }

        let predicted = self.forecast(&item.name, &history).await;
        self.inventory.update_forecast(item.id, predicted).await?;
        info!(item = %item.name, predicted, "updated forecast");
        Ok(true)
    }
}
