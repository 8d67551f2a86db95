/*!
 * # Authentication and Authorization
 *
 * - HS256 JWT access tokens issued at sign-in and validated by [`auth_middleware`]
 * - argon2 password hashing ([`password`])
 * - composable authorization predicates evaluated before handlers ([`guards`])
 */

use crate::entities::{user, UserRole};
use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub mod guards;
pub mod password;

pub use guards::{Guard, GuardRouterExt};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Caller identity extracted from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?,
            username: claims.username,
            role: claims.role,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, access_token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            access_token_expiration,
        }
    }
}

/// Issues and validates access tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn generate_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat: now,
            exp: now + self.config.access_token_expiration.as_secs() as i64,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.validate_token(token).and_then(AuthUser::try_from)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth => ServiceError::Unauthorized("Authentication required".into()),
            AuthError::InvalidToken => ServiceError::Unauthorized("Invalid token".into()),
            AuthError::TokenExpired => ServiceError::Unauthorized("Token has expired".into()),
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            AuthError::InsufficientPermissions => ServiceError::Forbidden(
                "You do not have permission to perform this action".into(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Reads the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validates the bearer token and stores the [`AuthUser`] in request extensions.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::MissingAuth)?;
    let user = auth_service.authenticate(token)?;
    debug!(user_id = %user.user_id, role = %user.role, "authenticated request");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service(expiration: Duration) -> AuthService {
        AuthService::new(AuthConfig::new(
            "a_long_enough_test_secret_with_variety_123456".into(),
            expiration,
        ))
    }

    fn user() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            name: "Staff".into(),
            username: "staff".into(),
            password_hash: None,
            role: UserRole::Staff,
            can_login: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trip_yields_caller() {
        let svc = service(Duration::from_secs(3600));
        let u = user();
        let token = svc.generate_token(&u).unwrap();
        let caller = svc.authenticate(&token).unwrap();
        assert_eq!(caller.user_id, u.id);
        assert_eq!(caller.role, UserRole::Staff);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = service(Duration::from_secs(3600));
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "old".into(),
            role: UserRole::Staff,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(svc.config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert_eq!(svc.validate_token(&token), Err(AuthError::TokenExpired));
        assert_eq!(
            ServiceError::from(AuthError::TokenExpired).response_message(),
            "Token has expired"
        );
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let token = service(Duration::from_secs(60)).generate_token(&user()).unwrap();
        let other = AuthService::new(AuthConfig::new(
            "another_secret_value_that_is_long_enough_987".into(),
            Duration::from_secs(60),
        ));
        assert_eq!(other.validate_token(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
