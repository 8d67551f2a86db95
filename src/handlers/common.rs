use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Parses a path id, rejecting malformed values with a 400.
pub fn parse_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::ValidationError(format!("Invalid id \"{raw}\"")))
}

/// Removes a convenience key from raw list parameters so it is not treated as a column filter.
pub fn take_param(params: &mut HashMap<String, String>, key: &str) -> Option<String> {
    params
        .remove(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`take_param`], parsed into `T`.
pub fn take_parsed<T: FromStr>(
    params: &mut HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ServiceError> {
    take_param(params, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ServiceError::ValidationError(format!("Invalid value \"{raw}\" for {key}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderStatus;

    #[test]
    fn take_parsed_consumes_key() {
        let mut params = HashMap::from([
            ("status".to_string(), "completed".to_string()),
            ("page".to_string(), "2".to_string()),
        ]);
        let status: Option<OrderStatus> = take_parsed(&mut params, "status").unwrap();
        assert_eq!(status, Some(OrderStatus::Completed));
        assert!(!params.contains_key("status"));
        assert!(params.contains_key("page"));

        params.insert("status".into(), "shipped".into());
        assert!(take_parsed::<OrderStatus>(&mut params, "status").is_err());
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
