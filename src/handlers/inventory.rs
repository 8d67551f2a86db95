use super::common::{created_response, no_content_response, parse_id, success_response};
use crate::{
    auth::{guards::ADMIN_ONLY, AuthService, GuardRouterExt},
    db::ListQuery,
    entities::InventoryItemView,
    errors::ServiceError,
    services::inventory::{CreateInventoryItemRequest, UpdateInventoryItemRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::IntoParams;

/// Query parameters of the low-stock listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LowStockParams {
    /// Use expected remaining stock after forecast usage instead of current stock
    #[serde(default)]
    pub forecast: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 201, description = "Inventory item created", body = InventoryItemView,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.create(payload).await?;
    Ok(created_response(item))
}

/// Lists items. Accepts the generic filter keys (`quantity[lt]=5`, `or[name][regex]=tape`,
/// `sort=name:asc`, `page`, `limit`, `fields`, `search`), `category` included.
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "Inventory list returned"),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let list = state
        .services
        .inventory
        .list(ListQuery::from_params(params))
        .await?;
    Ok(success_response(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(LowStockParams),
    responses(
        (status = 200, description = "Items below their reorder threshold", body = [InventoryItemView]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(params): Query<LowStockParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let inventory = &state.services.inventory;
    let items = if params.forecast {
        inventory.find_forecast_based_low_stock().await?
    } else {
        inventory.find_low_stock().await?
    };
    let items: Vec<InventoryItemView> = items.into_iter().map(Into::into).collect();
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Inventory item returned", body = InventoryItemView),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.inventory.find_one(parse_id(&id)?).await?;
    Ok(success_response(InventoryItemView::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Inventory item ID")),
    request_body = UpdateInventoryItemRequest,
    responses(
        (status = 200, description = "Inventory item updated", body = InventoryItemView),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInventoryItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .inventory
        .update(parse_id(&id)?, payload)
        .await?;
    Ok(success_response(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = String, Path, description = "Inventory item ID")),
    responses(
        (status = 204, description = "Inventory item deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.inventory.delete(parse_id(&id)?).await?;
    Ok(no_content_response())
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    let read = Router::new()
        .route("/inventory", get(list_items))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/:id", get(get_item))
        .with_auth(auth.clone());

    let write = Router::new()
        .route("/inventory", axum::routing::post(create_item))
        .route(
            "/inventory/:id",
            axum::routing::put(update_item).delete(delete_item),
        )
        .with_guard(auth, ADMIN_ONLY.clone());

    read.merge(write)
}
