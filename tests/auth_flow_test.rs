mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

async fn sign_in(app: &TestApp, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.send(
        Method::POST,
        "/api/v1/auth/sign-in",
        Some(json!({"username": username, "password": password})),
        None,
    )
    .await
}

#[tokio::test]
async fn sign_in_issues_a_usable_token() {
    let app = TestApp::new().await;
    let (status, body) = sign_in(&app, "admin", "admin123").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["accessToken"].as_str().expect("access token").to_string();

    let (status, me) = app
        .send(Method::GET, "/api/v1/auth/check-token", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert!(me.get("passwordHash").is_none());
}

#[tokio::test]
async fn sign_in_rejects_bad_credentials() {
    let app = TestApp::new().await;

    let (status, body) = sign_in(&app, "admin", "wrong-password").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username or Password is incorrect");

    let (status, body) = sign_in(&app, "nobody", "whatever1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "The user does not exist");
}

#[tokio::test]
async fn sign_up_creates_a_staff_account() {
    let app = TestApp::new().await;
    let request = json!({"name": "Jo Bench", "username": "jo", "password": "bench-pass"});

    let (status, body) = app
        .send(Method::POST, "/api/v1/auth/sign-up", Some(request.clone()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "The item was created successfully");

    let (status, body) = sign_in(&app, "jo", "bench-pass").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["accessToken"].as_str().unwrap().to_string();
    let (_, me) = app
        .send(Method::GET, "/api/v1/auth/check-token", None, Some(&token))
        .await;
    assert_eq!(me["role"], "staff");

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/sign-up", Some(request), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn change_password_requires_the_old_one() {
    let app = TestApp::new().await;

    let (status, _) = app
        .as_staff(
            Method::PATCH,
            "/api/v1/auth/change-password",
            Some(json!({"oldPassword": "not-it", "newPassword": "brand-new-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .as_staff(
            Method::PATCH,
            "/api/v1/auth/change-password",
            Some(json!({"oldPassword": "staff123", "newPassword": "brand-new-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "The password was updated successfully");

    let (status, _) = sign_in(&app, "staff", "staff123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = sign_in(&app, "staff", "brand-new-pass").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn server_time_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/v1/auth/time", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_i64().unwrap() > 0);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = TestApp::new().await;
    let new_user = json!({
        "name": "Sam Store",
        "username": "sam",
        "password": "store-pass",
        "role": "staff",
    });

    let (status, _) = app
        .as_staff(Method::POST, "/api/v1/users", Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.as_admin(Method::POST, "/api/v1/users", Some(new_user)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let (status, staff) = app.as_staff(Method::GET, "/api/v1/users/role/staff", None).await;
    assert_eq!(status, StatusCode::OK);
    let usernames: Vec<&str> = staff
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.contains(&"sam"));
    assert!(usernames.contains(&"staff"));
    assert!(!usernames.contains(&"admin"));

    let (status, _) = app.as_staff(Method::GET, "/api/v1/users/role/owner", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
