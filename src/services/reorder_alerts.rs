use crate::{
    entities::{inventory_item, AlertType},
    errors::ServiceResult,
    services::{
        alerts::{AlertService, CreateAlertRequest},
        inventory::InventoryService,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderSummary {
    pub manual_threshold: usize,
    pub forecast_based: usize,
    pub failed: usize,
}

pub fn threshold_message(item: &inventory_item::Model) -> String {
    format!(
        "Stock for '{}' is low. Current: {}, Threshold: {}.",
        item.name, item.quantity, item.reorder_threshold
    )
}

pub fn forecast_message(item: &inventory_item::Model) -> String {
    format!(
        "AI predicts stock shortage for '{}'. Current: {}, Predicted usage: {}, Expected remaining: {}.",
        item.name,
        item.quantity,
        item.predicted_usage(),
        item.expected_remaining()
    )
}

/// Raises alerts for items under their threshold, now or after forecast usage.
#[derive(Clone)]
pub struct ReorderAlertService {
    inventory: InventoryService,
    alerts: AlertService,
}

impl ReorderAlertService {
    pub fn new(inventory: InventoryService, alerts: AlertService) -> Self {
        Self { inventory, alerts }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> ServiceResult<ReorderSummary> {
        info!("starting reorder alert sweep");
        let mut summary = ReorderSummary::default();

        for item in self.inventory.find_low_stock().await? {
            if self
                .raise(&item, threshold_message(&item), AlertType::ManualThreshold)
                .await
            {
                summary.manual_threshold += 1;
            } else {
                summary.failed += 1;
            }
        }

        for item in self.inventory.find_forecast_based_low_stock().await? {
            if self
                .raise(&item, forecast_message(&item), AlertType::ForecastBased)
                .await
            {
                summary.forecast_based += 1;
            } else {
                summary.failed += 1;
            }
        }

        info!(?summary, "reorder alert sweep completed");
        Ok(summary)
    }

    async fn raise(&self, item: &inventory_item::Model, message: String, alert_type: AlertType) -> bool {
        let request = CreateAlertRequest {
            item_id: item.id,
            item_name: item.name.clone(),
            message,
            alert_type,
        };
        match self.alerts.create(request).await {
            Ok(_) => {
                info!(item = %item.name, %alert_type, "alert raised");
                true
            }
            Err(e) => {
                error!(item = %item.name, error = %e, "failed to raise alert");
                false
            }
        }
    }
}
