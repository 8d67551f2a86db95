use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "quantity")]
    pub field: String,
    #[schema(example = "must be greater than or equal to 0")]
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Inventory item with ID 550e8400-e29b-41d4-a716-446655440000 not found",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Offending fields for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

fn field_names(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation failed for: {}", field_names(.0))]
    InvalidFields(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                match unique_field_from_detail(&detail) {
                    Some(field) => ServiceError::Conflict(format!(
                        "The {field} is already registered. Please use a different {field}."
                    )),
                    None => ServiceError::Conflict("The record already exists".to_string()),
                }
            }
            _ => ServiceError::DatabaseError(err),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", e.code));
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::InvalidFields(fields)
    }
}

/// Extracts the column from a driver's unique-violation text.
///
/// SQLite reports `UNIQUE constraint failed: users.username`, Postgres reports
/// `Key (username)=(alice) already exists.` in the detail.
fn unique_field_from_detail(detail: &str) -> Option<String> {
    if let Some(rest) = detail.split("UNIQUE constraint failed:").nth(1) {
        let column = rest.trim().split(',').next()?.trim();
        return column.rsplit('.').next().map(|c| c.to_string());
    }
    if let Some(rest) = detail.split("Key (").nth(1) {
        return rest.split(')').next().map(|c| c.to_string());
    }
    None
}

impl ServiceError {
    /// Maps a unique-constraint failure on a known field into a sanitized `Conflict`.
    pub fn from_unique_violation(err: DbErr, field: &str, value: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                "The {field} \"{value}\" is already registered. Please use a different {field}."
            )),
            _ => ServiceError::from(err),
        }
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{entity} with ID {id} not found"))
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidFields(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_) | Self::TransactionAborted(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Storage and internal failures return generic messages.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::TransactionAborted(_) => {
                "The operation was aborted and no changes were saved".to_string()
            }
            Self::InternalError(_) => "Internal server error".to_string(),
            Self::ExternalServiceError(_) => "Upstream service unavailable".to_string(),
            Self::InvalidFields(_) => "Validation failed".to_string(),
            Self::NotFound(msg)
            | Self::ValidationError(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::Unauthorized(msg)
            | Self::InsufficientStock(msg) => msg.clone(),
        }
    }

    fn details(&self) -> Option<Vec<FieldError>> {
        match self {
            Self::InvalidFields(fields) => Some(fields.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result alias used throughout the services.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::Validate;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.message, "missing");
    }

    #[test]
    fn service_error_status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientStock("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::TransactionAborted("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::ExternalServiceError("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::InternalError("pool exhausted at 10.0.0.3".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("syntax error near".into()))
                .response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::NotFound("Inventory item with ID 1 not found".into())
                .response_message(),
            "Inventory item with ID 1 not found"
        );
    }

    #[test]
    fn unique_detail_parsing_handles_both_backends() {
        assert_eq!(
            unique_field_from_detail("UNIQUE constraint failed: users.username").as_deref(),
            Some("username")
        );
        assert_eq!(
            unique_field_from_detail(
                "duplicate key value violates unique constraint; Key (name)=(Tools) already exists."
            )
            .as_deref(),
            Some("name")
        );
        assert_eq!(unique_field_from_detail("something else"), None);
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        query: String,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[tokio::test]
    async fn validation_errors_enumerate_fields() {
        let err: ServiceError = Probe {
            query: "hi".into(),
            quantity: 0,
        }
        .validate()
        .unwrap_err()
        .into();

        let fields = match &err {
            ServiceError::InvalidFields(fields) => fields.clone(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], FieldError::new("quantity", "failed 'range' check"));
        assert_eq!(fields[1], FieldError::new("query", "too short"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["details"][1]["field"], "query");
    }
}
