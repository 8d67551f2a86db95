mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn category_lifecycle() {
    let app = TestApp::new().await;
    let tools = json!({"name": "Tools", "description": "Hand tools and power tools", "icon": "🔧"});

    let (status, created) = app
        .as_admin(Method::POST, "/api/v1/categories", Some(tools.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["icon"], "🔧");
    let uri = format!("/api/v1/categories/{}", created["id"].as_str().unwrap());

    let (status, body) = app.as_admin(Method::POST, "/api/v1/categories", Some(tools)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Category 'Tools' already exists");

    let (status, _) = app
        .as_staff(Method::POST, "/api/v1/categories", Some(json!({"name": "Misc"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = app.as_staff(Method::GET, "/api/v1/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, updated) = app
        .as_admin(Method::PUT, &uri, Some(json!({"description": "Everything with a handle"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["description"], "Everything with a handle");
    assert_eq!(updated["name"], "Tools");

    let response = app
        .request(Method::DELETE, &uri, None, Some(app.admin_token()))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let (status, _) = app.as_staff(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
