mod common;

use axum::http::{Method, StatusCode};
use common::{item_id, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn names(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .expect("results array")
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn create_and_fetch_item() {
    let app = TestApp::new().await;
    let created = app.create_item("10mm Wrench", 15, 5).await;

    assert_eq!(created["quantity"], 15);
    assert_eq!(created["unit"], "pcs");
    assert_eq!(created["version"], 0);

    let (status, fetched) = app
        .as_staff(Method::GET, &format!("/api/v1/inventory/{}", item_id(&created)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "10mm Wrench");
}

#[tokio::test]
async fn create_defaults_threshold_and_quantity() {
    let app = TestApp::new().await;
    let (status, body) = app
        .as_admin(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({"name": "Sandpaper", "category": "Consumables"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quantity"], 0);
    assert_eq!(body["reorderThreshold"], 5);
}

#[tokio::test]
async fn negative_quantity_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .as_admin(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({"name": "Bolt", "category": "Tools", "quantity": -1})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn staff_cannot_mutate_inventory() {
    let app = TestApp::new().await;
    let (status, _) = app
        .as_staff(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({"name": "Bolt", "category": "Tools"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn anonymous_requests_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, _) = app.send(Method::GET, "/api/v1/inventory", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/api/v1/inventory", None, Some("not-a-token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_item_is_not_found() {
    let app = TestApp::new().await;
    let id = Uuid::new_v4();
    let (status, body) = app
        .as_staff(Method::GET, &format!("/api/v1/inventory/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        format!("Inventory item with ID {id} not found")
    );

    let (status, _) = app
        .as_staff(Method::GET, "/api/v1/inventory/not-a-uuid", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_bumps_version_only_on_quantity_change() {
    let app = TestApp::new().await;
    let item = app.create_item("Steel Pipe", 50, 10).await;
    let uri = format!("/api/v1/inventory/{}", item_id(&item));

    let (status, renamed) = app
        .as_admin(Method::PUT, &uri, Some(json!({"description": "1 inch pipe"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["version"], 0);

    let (_, restocked) = app
        .as_admin(Method::PUT, &uri, Some(json!({"quantity": 60})))
        .await;
    assert_eq!(restocked["quantity"], 60);
    assert_eq!(restocked["version"], 1);
}

#[tokio::test]
async fn delete_removes_item() {
    let app = TestApp::new().await;
    let item = app.create_item("Nails Box", 4, 5).await;
    let uri = format!("/api/v1/inventory/{}", item_id(&item));

    let response = app
        .request(Method::DELETE, &uri, None, Some(app.admin_token()))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = app.as_admin(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_sorts_filters_and_paginates() {
    let app = TestApp::new().await;
    for (name, quantity) in [("Drill", 5), ("Anvil", 30), ("Chisel", 12), ("Brush", 2)] {
        app.create_item(name, quantity, 3).await;
    }

    let (_, body) = app
        .as_staff(Method::GET, "/api/v1/inventory?sort=name:asc", None)
        .await;
    assert_eq!(names(&body), ["Anvil", "Brush", "Chisel", "Drill"]);
    assert_eq!(body["totalResults"], 4);
    assert!(body.get("page").is_none());

    let (_, body) = app
        .as_staff(Method::GET, "/api/v1/inventory?sort=quantity:desc&page=2&limit=2", None)
        .await;
    assert_eq!(names(&body), ["Drill", "Brush"]);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["totalPages"], 2);

    let (_, body) = app
        .as_staff(Method::GET, "/api/v1/inventory?quantity[lt]=10&sort=name", None)
        .await;
    assert_eq!(names(&body), ["Brush", "Drill"]);

    let (_, body) = app
        .as_staff(
            Method::GET,
            "/api/v1/inventory?or[name][regex]=dri&or[quantity][gte]=30&sort=name",
            None,
        )
        .await;
    assert_eq!(names(&body), ["Anvil", "Drill"]);
}

#[tokio::test]
async fn list_projects_requested_fields() {
    let app = TestApp::new().await;
    app.create_item("Anvil", 30, 3).await;

    let (_, body) = app
        .as_staff(Method::GET, "/api/v1/inventory?fields=name,quantity", None)
        .await;
    let first = &body["results"][0];
    assert_eq!(first["name"], "Anvil");
    assert_eq!(first["quantity"], 30);
    assert!(first.get("category").is_none());
    assert!(first.get("id").is_some());
}

#[tokio::test]
async fn low_stock_is_strictly_below_threshold() {
    let app = TestApp::new().await;
    app.create_item("At Threshold", 5, 5).await;
    app.create_item("Below Threshold", 4, 5).await;

    let (status, body) = app
        .as_staff(Method::GET, "/api/v1/inventory/low-stock", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Below Threshold"]);
}

#[tokio::test]
async fn forecast_low_stock_uses_expected_remaining() {
    let app = TestApp::new().await;
    let busy = app.create_item("Busy Item", 20, 6).await;
    let quiet = app.create_item("Quiet Item", 20, 6).await;

    let inventory = &app.state.services.inventory;
    let busy_id = item_id(&busy).parse().unwrap();
    let quiet_id = item_id(&quiet).parse().unwrap();
    inventory.update_forecast(busy_id, 15).await.unwrap();
    inventory.update_forecast(quiet_id, 10).await.unwrap();

    let (_, plain) = app
        .as_staff(Method::GET, "/api/v1/inventory/low-stock", None)
        .await;
    assert_eq!(plain.as_array().unwrap().len(), 0);

    let (_, forecast) = app
        .as_staff(Method::GET, "/api/v1/inventory/low-stock?forecast=true", None)
        .await;
    let rows = forecast.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Busy Item");
    assert_eq!(rows[0]["forecast"]["predictedUsage"], 15);
}
