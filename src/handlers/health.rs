use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Records the process start; call once at startup.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// Liveness probe
async fn liveness() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness probe; reports database reachability and realtime session count.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db).await {
        Ok(latency) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "uptimeSecs": uptime_secs(),
                "checks": {
                    "database": { "status": "up", "latencyMs": latency.as_millis() as u64 },
                    "realtime": { "status": "up", "sessions": state.hub.session_count() },
                },
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "uptimeSecs": uptime_secs(),
                "checks": {
                    "database": { "status": "down", "error": e.to_string() },
                },
            })),
        ),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/ready", get(readiness))
}
