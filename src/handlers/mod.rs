pub mod alerts;
pub mod auth;
pub mod categories;
pub mod chatbot;
pub mod common;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod users;
pub mod ws;

use crate::{
    config::AiConfig,
    db::DbPool,
    events::EventSender,
    services::{
        ai::AiClient, alerts::AlertService, categories::CategoryService, chatbot::ChatbotService,
        forecasting::ForecastingService, inventory::InventoryService, orders::OrderService,
        reorder_alerts::ReorderAlertService, users::UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: InventoryService,
    pub categories: CategoryService,
    pub orders: OrderService,
    pub alerts: AlertService,
    pub users: UserService,
    pub forecasting: ForecastingService,
    pub reorder_alerts: ReorderAlertService,
    pub chatbot: ChatbotService,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        ai_config: AiConfig,
        history_months: u32,
    ) -> Self {
        let inventory = InventoryService::new(db_pool.clone(), event_sender.clone());
        let orders = OrderService::new(db_pool.clone(), event_sender.clone());
        let alerts = AlertService::new(db_pool.clone(), event_sender);
        let ai = AiClient::new(ai_config);

        Self {
            forecasting: ForecastingService::new(
                inventory.clone(),
                orders.clone(),
                ai.clone(),
                history_months,
            ),
            reorder_alerts: ReorderAlertService::new(inventory.clone(), alerts.clone()),
            chatbot: ChatbotService::new(inventory.clone(), orders.clone(), ai),
            categories: CategoryService::new(db_pool.clone()),
            users: UserService::new(db_pool),
            inventory,
            orders,
            alerts,
        }
    }
}
