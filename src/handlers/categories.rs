use super::common::{created_response, no_content_response, parse_id, success_response};
use crate::{
    auth::{guards::ADMIN_ONLY, AuthService, GuardRouterExt},
    entities::category,
    errors::ServiceError,
    services::categories::{CreateCategoryRequest, UpdateCategoryRequest},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListParams {
    /// Only return active categories
    #[serde(default)]
    pub active_only: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = category::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.create(payload).await?;
    Ok(created_response(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(CategoryListParams),
    responses((status = 200, description = "Categories sorted by name", body = [category::Model])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoryListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list(params.active_only).await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category returned", body = category::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.find_one(parse_id(&id)?).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = category::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .services
        .categories
        .update(parse_id(&id)?, payload)
        .await?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.delete(parse_id(&id)?).await?;
    Ok(no_content_response())
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    let read = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
        .with_auth(auth.clone());

    let write = Router::new()
        .route("/categories", post(create_category))
        .route("/categories/:id", put(update_category).delete(delete_category))
        .with_guard(auth, ADMIN_ONLY.clone());

    read.merge(write)
}
