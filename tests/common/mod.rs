#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use stockroom_api::{
    config::{AiConfig, AppConfig},
    db,
    entities::{user, UserRole},
    events::{self, EventSender},
    realtime::RealtimeHub,
    services::users::CreateUserRequest,
    AppState,
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up the full application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin: user::Model,
    pub staff: user::Model,
    admin_token: String,
    staff_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_ai(AiConfig::default()).await
    }

    /// Construct a test application whose AI client talks to `ai`.
    pub async fn with_ai(ai: AiConfig) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.ai = ai;
        cfg.jobs.enabled = false;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let hub = RealtimeHub::new(64);
        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx, hub.clone()));

        let state = AppState::new(Arc::new(pool), cfg, event_sender, hub);

        let admin = create_user(&state, "admin", "admin123", UserRole::Admin).await;
        let staff = create_user(&state, "staff", "staff123", UserRole::Staff).await;
        let admin_token = state.auth.generate_token(&admin).expect("admin token");
        let staff_token = state.auth.generate_token(&staff).expect("staff token");

        let router = stockroom_api::build_router(state.clone());

        Self {
            router,
            state,
            admin,
            staff,
            admin_token,
            staff_token,
            _event_task: event_task,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn staff_token(&self) -> &str {
        &self.staff_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };
        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status together with the decoded JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(&self.admin_token)).await
    }

    pub async fn as_staff(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(&self.staff_token)).await
    }

    /// Creates an inventory item through the API and returns its JSON.
    pub async fn create_item(&self, name: &str, quantity: i32, reorder_threshold: i32) -> Value {
        let (status, body) = self
            .as_admin(
                Method::POST,
                "/api/v1/inventory",
                Some(json!({
                    "name": name,
                    "category": "Tools",
                    "quantity": quantity,
                    "reorderThreshold": reorder_threshold,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
        body
    }
}

async fn create_user(state: &AppState, username: &str, password: &str, role: UserRole) -> user::Model {
    state
        .services
        .users
        .create(CreateUserRequest {
            name: format!("{username} user"),
            username: username.to_string(),
            password: Some(password.to_string()),
            role: Some(role),
            is_active: Some(true),
        })
        .await
        .expect("seed test user")
}

/// Helper to read a JSON body from a response.
pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}

pub fn item_id(item: &Value) -> String {
    item["id"].as_str().expect("item id").to_string()
}
