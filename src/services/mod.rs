// Core services
pub mod alerts;
pub mod categories;
pub mod inventory;
pub mod orders;
pub mod users;

// Scheduled sweeps
pub mod forecasting;
pub mod reorder_alerts;

// Assistant and external AI provider
pub mod ai;
pub mod chatbot;
