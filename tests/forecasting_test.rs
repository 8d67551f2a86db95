mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use common::{item_id, TestApp};
use serde_json::{json, Value};
use stockroom_api::config::AiConfig;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ai_config(server: &MockServer, timeout_secs: u64) -> AiConfig {
    AiConfig {
        api_key: Some("test-key".into()),
        api_url: server.uri(),
        model: "test-model".into(),
        timeout_secs,
    }
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}

/// Ships `quantities` as separate outgoing orders so the item gains usage history for today.
async fn ship(app: &TestApp, item: &Value, quantities: &[i32]) {
    for quantity in quantities {
        let (status, body) = app
            .as_staff(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "type": "outgoing",
                    "items": [{"itemId": item_id(item), "quantity": quantity}],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
}

async fn predicted_usage(app: &TestApp, item: &Value) -> Value {
    let (_, body) = app
        .as_admin(Method::GET, &format!("/api/v1/inventory/{}", item_id(item)), None)
        .await;
    body["forecast"]["predictedUsage"].clone()
}

async fn trigger_forecasting(app: &TestApp) -> Value {
    let (status, body) = app
        .as_admin(Method::POST, "/api/v1/alerts/trigger/forecasting", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["summary"].clone()
}

#[tokio::test]
async fn forecast_uses_ai_prediction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(completion("{\"predictedUsage\": 12}"))
        .mount(&server)
        .await;

    let app = TestApp::with_ai(ai_config(&server, 5)).await;
    let busy = app.create_item("Sandpaper", 50, 20).await;
    let idle = app.create_item("Wood Planks", 100, 20).await;
    ship(&app, &busy, &[3, 4]).await;

    let summary = trigger_forecasting(&app).await;
    assert_eq!(summary["processed"], 2);
    assert_eq!(summary["updated"], 1);
    assert_eq!(summary["skipped"], 1);

    assert_eq!(predicted_usage(&app, &busy).await, 12);
    assert_eq!(predicted_usage(&app, &idle).await, Value::Null);
}

#[tokio::test]
async fn provider_error_falls_back_to_average() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = TestApp::with_ai(ai_config(&server, 5)).await;
    let item = app.create_item("Screws Box", 30, 5).await;
    ship(&app, &item, &[3, 4]).await;

    trigger_forecasting(&app).await;
    assert_eq!(predicted_usage(&app, &item).await, 7);
}

#[tokio::test]
async fn provider_timeout_falls_back_to_average() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("{\"predictedUsage\": 99}").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let app = TestApp::with_ai(ai_config(&server, 1)).await;
    let item = app.create_item("Paint (White)", 25, 10).await;
    ship(&app, &item, &[5]).await;

    trigger_forecasting(&app).await;
    assert_eq!(predicted_usage(&app, &item).await, 5);
}

#[tokio::test]
async fn unreadable_reply_falls_back_to_average() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("I think roughly a dozen."))
        .mount(&server)
        .await;

    let app = TestApp::with_ai(ai_config(&server, 5)).await;
    let item = app.create_item("Nails Box", 40, 5).await;
    ship(&app, &item, &[2]).await;

    trigger_forecasting(&app).await;
    assert_eq!(predicted_usage(&app, &item).await, 2);
}

#[tokio::test]
async fn forecast_feeds_the_reorder_sweep() {
    let app = TestApp::new().await;
    let item = app.create_item("Steel Pipe", 20, 6).await;
    ship(&app, &item, &[15]).await;

    // Without a provider the forecast is the plain daily average.
    trigger_forecasting(&app).await;
    assert_eq!(predicted_usage(&app, &item).await, 15);

    let (_, body) = app
        .as_admin(Method::POST, "/api/v1/alerts/trigger/reorder-alerts", None)
        .await;
    assert_eq!(body["summary"]["manualThreshold"], 1);
    assert_eq!(body["summary"]["forecastBased"], 1);

    let (_, alerts) = app
        .as_staff(Method::GET, "/api/v1/alerts?type=forecast_based", None)
        .await;
    assert_eq!(alerts["totalResults"], 1);
    assert_eq!(
        alerts["results"][0]["message"],
        "AI predicts stock shortage for 'Steel Pipe'. Current: 5, Predicted usage: 15, Expected remaining: -10."
    );
}

#[tokio::test]
async fn chatbot_answers_with_rules_without_provider() {
    let app = TestApp::new().await;
    app.create_item("10mm Wrench", 15, 5).await;
    app.create_item("Power Drill", 2, 2).await;

    let ask = |query: &'static str| {
        let app = &app;
        async move {
            let (status, body) = app
                .as_staff(Method::POST, "/api/v1/chatbot/query", Some(json!({"query": query})))
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["response"].as_str().unwrap_or_default().to_string()
        }
    };

    assert_eq!(
        ask("What is the stock level for 10mm wrench?").await,
        "We currently have 15 pcs of '10mm Wrench' in stock."
    );
    assert!(ask("stock level for Power Drill")
        .await
        .contains("Warning: Stock is below reorder threshold (2)"));
    assert!(ask("stock level for flux").await.starts_with("Item \"flux\" not found"));
    assert!(ask("list tools").await.starts_with("Items in Tools (showing 2 of 2):"));
    assert!(ask("hello there").await.contains("stock level"));

    let (status, _) = app
        .as_staff(Method::POST, "/api/v1/chatbot/query", Some(json!({"query": "hi"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chatbot_relays_provider_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(completion("You have 15 wrenches. 🔧"))
        .mount(&server)
        .await;

    let app = TestApp::with_ai(ai_config(&server, 5)).await;
    app.create_item("10mm Wrench", 15, 5).await;

    let (status, body) = app
        .as_staff(
            Method::POST,
            "/api/v1/chatbot/query",
            Some(json!({"query": "how many wrenches do we have?"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "You have 15 wrenches. 🔧");
}
