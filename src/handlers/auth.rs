use super::common::success_response;
use crate::{
    auth::{AuthService, AuthUser, GuardRouterExt},
    entities::{user, UserRole},
    errors::ServiceError,
    services::users::{ChangePasswordRequest, CreateUserRequest},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

/// Sign-in payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Self-service registration payload; always creates a staff account
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 400, description = "Wrong credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "User may not log in", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let user = state
        .services
        .users
        .verify_credentials(&payload.username, &payload.password)
        .await?;
    let access_token = state.auth.generate_token(&user)?;
    info!(user_id = %user.id, "user signed in");
    Ok(success_response(TokenResponse { access_token }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created", body = MessageResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .create(CreateUserRequest {
            name: payload.name,
            username: payload.username,
            password: Some(payload.password),
            role: Some(UserRole::Staff),
            is_active: Some(true),
        })
        .await?;
    Ok(success_response(MessageResponse::new(
        "The item was created successfully",
    )))
}

/// Server time in milliseconds since the epoch.
#[utoipa::path(
    get,
    path = "/api/v1/auth/time",
    responses((status = 200, description = "Current timestamp", body = i64)),
    tag = "auth"
)]
pub async fn server_time() -> impl IntoResponse {
    Json(Utc::now().timestamp_millis())
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/check-token",
    responses(
        (status = 200, description = "Token is valid", body = user::Model),
        (status = 401, description = "Invalid or expired token", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn check_token(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.users.get_by_id(user.user_id).await?;
    Ok(success_response(user))
}

#[utoipa::path(
    patch,
    path = "/api/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Old password is incorrect", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .change_password(user.user_id, payload)
        .await?;
    Ok(success_response(MessageResponse::new(
        "The password was updated successfully",
    )))
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/time", get(server_time));

    let authenticated = Router::new()
        .route("/auth/check-token", get(check_token))
        .route("/auth/change-password", patch(change_password))
        .with_auth(auth);

    public.merge(authenticated)
}
