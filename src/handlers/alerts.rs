use super::common::{parse_id, success_response, take_param, take_parsed};
use crate::{
    auth::{guards::ADMIN_ONLY, AuthService, GuardRouterExt},
    db::ListQuery,
    entities::alert,
    errors::ServiceError,
    services::alerts::{AlertCount, AlertFilter},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v1/alerts/count",
    responses((status = 200, description = "Number of active alerts", body = AlertCount)),
    tag = "alerts"
)]
pub async fn active_count(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let count = state.services.alerts.active_count().await?;
    Ok(Json(AlertCount { count }))
}

/// Lists alerts newest first, narrowed by `status`, `startDate` and `endDate`.
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    responses(
        (status = 200, description = "Alert list returned"),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = AlertFilter {
        status: take_parsed(&mut params, "status")?,
        start_date: take_param(&mut params, "startDate"),
        end_date: take_param(&mut params, "endDate"),
    };
    let list = state
        .services
        .alerts
        .list(filter, ListQuery::from_params(params))
        .await?;
    Ok(success_response(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/{id}",
    params(("id" = String, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert found", body = alert::Model),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse),
    ),
    tag = "alerts"
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let alert = state.services.alerts.find_one(parse_id(&id)?).await?;
    Ok(success_response(alert))
}

/// Dismisses an alert. Also served as "mark as read".
#[utoipa::path(
    patch,
    path = "/api/v1/alerts/{id}/dismiss",
    params(("id" = String, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert dismissed", body = alert::Model),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse),
    ),
    tag = "alerts"
)]
pub async fn dismiss_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let alert = state.services.alerts.dismiss(parse_id(&id)?).await?;
    Ok(success_response(alert))
}

#[utoipa::path(
    patch,
    path = "/api/v1/alerts/item/{item_id}/dismiss",
    params(("item_id" = String, Path, description = "Inventory item ID")),
    responses((status = 200, description = "Open alerts of the item dismissed")),
    tag = "alerts"
)]
pub async fn dismiss_item_alerts(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let dismissed = state
        .services
        .alerts
        .dismiss_all_for_item(parse_id(&item_id)?)
        .await?;
    Ok(success_response(json!({ "dismissed": dismissed })))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/trigger/forecasting",
    responses(
        (status = 200, description = "Forecasting sweep completed"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    tag = "alerts"
)]
pub async fn trigger_forecasting(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.forecasting.run().await?;
    Ok(success_response(json!({
        "message": "Forecasting job completed successfully",
        "summary": summary,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/trigger/reorder-alerts",
    responses(
        (status = 200, description = "Reorder alert sweep completed"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    tag = "alerts"
)]
pub async fn trigger_reorder_alerts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.reorder_alerts.run().await?;
    Ok(success_response(json!({
        "message": "Reorder alerts job completed successfully",
        "summary": summary,
    })))
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    let user_routes = Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/count", get(active_count))
        .route("/alerts/unread-count", get(active_count))
        .route("/alerts/:id", get(get_alert))
        .route("/alerts/:id/read", patch(dismiss_alert))
        .route("/alerts/:id/dismiss", patch(dismiss_alert).put(dismiss_alert))
        .route("/alerts/item/:item_id/dismiss", patch(dismiss_item_alerts))
        .with_auth(auth.clone());

    let admin_routes = Router::new()
        .route("/alerts/trigger/forecasting", post(trigger_forecasting))
        .route("/alerts/trigger/reorder-alerts", post(trigger_reorder_alerts))
        .with_guard(auth, ADMIN_ONLY.clone());

    user_routes.merge(admin_routes)
}
