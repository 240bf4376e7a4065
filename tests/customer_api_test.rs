mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn missing_email_reports_the_field() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "first_name": "Ada", "last_name": "Lovelace", "phone": "+1 555 0101" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_array().expect("field details");
    assert!(details
        .iter()
        .any(|d| d.as_str().unwrap_or_default().starts_with("email")));
}

#[tokio::test]
async fn create_get_update_and_search() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "Grace@Example.COM",
                "phone": "+1 555 0103"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let customer = &body["data"];
    assert_eq!(customer["email"], "grace@example.com");
    assert_eq!(customer["sms_opt_in"], true);
    let id = customer["id"].as_str().unwrap();

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/customers/{id}"),
            Some(json!({ "notes": "Prefers text messages" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "Prefers text messages");
    assert_eq!(body["data"]["first_name"], "Grace");

    app.create_customer("Alan", "+1 555 0102").await;

    let (status, body) = app
        .admin(Method::GET, "/api/v1/customers?search=hopper", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], id);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let payload = json!({
        "first_name": "Linus",
        "last_name": "T",
        "email": "linus@example.com",
        "phone": "+1 555 0104"
    });
    let (status, _) = app
        .admin(Method::POST, "/api/v1/customers", Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .admin(Method::POST, "/api/v1/customers", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn customer_with_devices_cannot_be_deleted() {
    let app = TestApp::new().await;
    let customer = app.create_customer("Margaret", "+1 555 0105").await;
    let id = customer["id"].as_str().unwrap();
    app.register_device(id).await;

    let (status, body) = app
        .admin(Method::GET, &format!("/api/v1/customers/{id}/devices"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let lonely = app.create_customer("Solo", "+1 555 0199").await;
    let (status, _) = app
        .admin(
            Method::DELETE,
            &format!("/api/v1/customers/{}", lonely["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .admin(
            Method::GET,
            &format!("/api/v1/customers/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}
