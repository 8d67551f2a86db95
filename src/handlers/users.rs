use super::common::{created_response, no_content_response, parse_id, success_response};
use crate::{
    auth::{guards::ADMIN_ONLY, AuthService, GuardRouterExt},
    db::ListQuery,
    entities::{user, UserRole},
    errors::ServiceError,
    services::users::{CreateUserRequest, UpdateUserRequest},
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
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = user::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.create(payload).await?;
    Ok(created_response(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, description = "User list returned")),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ServiceError> {
    let list = state
        .services
        .users
        .list(ListQuery::from_params(params))
        .await?;
    Ok(success_response(list))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User returned", body = user::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get_by_id(parse_id(&id)?).await?;
    Ok(success_response(user))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/role/{role}",
    params(("role" = UserRole, Path, description = "admin or staff")),
    responses(
        (status = 200, description = "Users with the role", body = [user::Model]),
        (status = 400, description = "Unknown role", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn users_by_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| ServiceError::ValidationError(format!("Unknown role \"{role}\"")))?;
    let users = state.services.users.get_by_role(role).await?;
    Ok(success_response(users))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = user::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.update(parse_id(&id)?, payload).await?;
    Ok(success_response(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.users.delete(parse_id(&id)?).await?;
    Ok(no_content_response())
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    let read = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .route("/users/role/:role", get(users_by_role))
        .with_auth(auth.clone());

    let admin = Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .with_guard(auth, ADMIN_ONLY.clone());

    read.merge(admin)
}
