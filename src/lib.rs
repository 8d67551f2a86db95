//! Stockroom API
//!
//! Inventory tracking service: stock items and categories, incoming/outgoing orders that move
//! stock atomically, low-stock alerts, usage forecasting, a small chatbot and a realtime push
//! channel.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod jobs;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod realtime;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::realtime::RealtimeHub;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub event_sender: EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
    pub hub: RealtimeHub,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: AppConfig,
        event_sender: EventSender,
        hub: RealtimeHub,
    ) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration as u64),
        )));
        let services = handlers::AppServices::new(
            db.clone(),
            event_sender.clone(),
            config.ai.clone(),
            config.jobs.history_months,
        );

        Self {
            db,
            config,
            event_sender,
            services,
            auth,
            hub,
        }
    }
}

/// All versioned API routes, mounted under `/api/v1`.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .merge(handlers::auth::routes(auth.clone()))
        .merge(handlers::users::routes(auth.clone()))
        .merge(handlers::inventory::routes(auth.clone()))
        .merge(handlers::categories::routes(auth.clone()))
        .merge(handlers::orders::routes(auth.clone()))
        .merge(handlers::alerts::routes(auth.clone()))
        .merge(handlers::chatbot::routes(auth))
        .merge(handlers::ws::routes())
}

/// CORS policy from configuration: explicit origins when set, permissive otherwise.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Builds the complete HTTP application.
pub fn build_router(state: AppState) -> Router {
    let cfg = state.config.clone();

    Router::<AppState>::new()
        .route("/", get(|| async { "stockroom-api up" }))
        .merge(handlers::health::routes())
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::RequestSpanMaker))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)))
        .layer(cors_layer(&cfg))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
