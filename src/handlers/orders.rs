use super::common::{created_response, parse_id, success_response, take_param, take_parsed};
use crate::{
    auth::{AuthService, AuthUser, Guard, GuardRouterExt},
    db::ListQuery,
    errors::ServiceError,
    services::orders::{CreateOrderRequest, OrderFilter, OrderView, UpdateOrderRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created and stock adjusted", body = OrderView),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Referenced item not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Transaction aborted", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .create(payload, Some(user.user_id))
        .await?;
    Ok(created_response(order))
}

fn order_filter(params: &mut HashMap<String, String>) -> Result<OrderFilter, ServiceError> {
    Ok(OrderFilter {
        order_type: take_parsed(params, "type")?,
        status: take_parsed(params, "status")?,
        user_id: take_parsed(params, "userId")?,
        start_date: take_param(params, "startDate"),
        end_date: take_param(params, "endDate"),
    })
}

/// Lists orders newest first. `type`, `status`, `userId`, `startDate` and `endDate` narrow the
/// result; the generic filter keys are accepted as well.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Order list returned"),
        (status = 400, description = "Invalid filter value", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let filter = order_filter(&mut params)?;
    let list = state
        .services
        .orders
        .list(filter, ListQuery::from_params(params))
        .await?;
    Ok(success_response(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/history",
    responses((status = 200, description = "Completed orders, newest first")),
    tag = "orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let list = state
        .services
        .orders
        .history(ListQuery::from_params(params))
        .await?;
    Ok(success_response(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order returned", body = OrderView),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.find_one(parse_id(&id)?).await?;
    Ok(success_response(order))
}

/// Loads the order and checks that the caller is an admin or its creator.
async fn authorize_owner(state: &AppState, user: &AuthUser, id: &str) -> Result<uuid::Uuid, ServiceError> {
    let id = parse_id(id)?;
    let order = state.services.orders.find_model(id).await?;
    Guard::admin_or_owner(order.created_by).check(user)?;
    Ok(id)
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderView),
        (status = 400, description = "Status change not allowed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the creator of the order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = authorize_owner(&state, &user, &id).await?;
    let order = state.services.orders.update(id, payload).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderView),
        (status = 400, description = "Order can no longer be cancelled", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the creator of the order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = authorize_owner(&state, &user, &id).await?;
    let order = state.services.orders.cancel(id).await?;
    Ok(success_response(order))
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/history", get(order_history))
        .route("/orders/:id", get(get_order).put(update_order))
        .route("/orders/:id/cancel", patch(cancel_order))
        .with_auth(auth)
}
