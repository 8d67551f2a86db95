use super::common::success_response;
use crate::{
    auth::{AuthService, GuardRouterExt},
    errors::ServiceError,
    services::chatbot::{ChatbotQueryRequest, ChatbotResponse},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::sync::Arc;

/// Answers a natural-language inventory question.
#[utoipa::path(
    post,
    path = "/api/v1/chatbot/query",
    request_body = ChatbotQueryRequest,
    responses(
        (status = 200, description = "Chatbot answer", body = ChatbotResponse),
        (status = 400, description = "Query too short", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    tag = "chatbot"
)]
pub async fn query(
    State(state): State<AppState>,
    Json(payload): Json<ChatbotQueryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let answer = state.services.chatbot.query(payload).await?;
    Ok(success_response(answer))
}

pub fn routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route("/chatbot/query", post(query))
        .with_auth(auth)
}
