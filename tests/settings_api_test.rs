mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::TestApp;
use repairdesk_api::entities::user::UserRole;
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn business_settings_default_then_merge() {
    let app = TestApp::new().await;

    let (status, body) = app.admin(Method::GET, "/api/v1/settings/business", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["business_name"], "RepairDesk");
    assert_eq!(body["data"]["receipt_prefix"], "RD");
    assert_eq!(body["data"]["prediction_window_days"], 30);

    let (status, body) = app
        .admin(
            Method::PUT,
            "/api/v1/settings/business",
            Some(json!({ "business_name": "Phone Doctor", "tax_rate": "0.0825" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["business_name"], "Phone Doctor");
    assert_eq!(
        Decimal::from_str(body["data"]["tax_rate"].as_str().unwrap()).unwrap(),
        Decimal::from_str("0.0825").unwrap()
    );
    // Untouched fields survive a partial update.
    assert_eq!(body["data"]["receipt_prefix"], "RD");
    assert_eq!(body["data"]["currency"], "USD");

    let (_, body) = app.admin(Method::GET, "/api/v1/settings/business", None).await;
    assert_eq!(body["data"]["business_name"], "Phone Doctor");
}

#[tokio::test]
async fn business_settings_are_validated() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin(
            Method::PUT,
            "/api/v1/settings/business",
            Some(json!({ "receipt_prefix": "lower" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .admin(
            Method::PUT,
            "/api/v1/settings/business",
            Some(json!({ "tax_rate": "1.5" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.admin(Method::GET, "/api/v1/settings/business", None).await;
    assert_eq!(body["data"]["receipt_prefix"], "RD");
}

#[tokio::test]
async fn advanced_settings_lifecycle() {
    let app = TestApp::new().await;

    let (status, body) = app
        .admin(
            Method::PUT,
            "/api/v1/settings/advanced/label.printer",
            Some(json!({ "model": "DYMO 450", "copies": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["key"], "label.printer");

    let (status, body) = app
        .admin(Method::GET, "/api/v1/settings/advanced/label.printer", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"]["copies"], 2);

    // Business keys never show up in the advanced listing.
    app.admin(
        Method::PUT,
        "/api/v1/settings/business",
        Some(json!({ "business_name": "Shop" })),
    )
    .await;
    let (_, body) = app.admin(Method::GET, "/api/v1/settings/advanced", None).await;
    let keys: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["label.printer"]);

    let (status, _) = app
        .admin(Method::DELETE, "/api/v1/settings/advanced/label.printer", None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .admin(Method::GET, "/api/v1/settings/advanced/label.printer", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn advanced_settings_cannot_shadow_business_keys() {
    let app = TestApp::new().await;

    let (status, _) = app
        .admin(
            Method::PUT,
            "/api/v1/settings/advanced/tax_rate",
            Some(json!("0.5")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .admin(Method::PUT, "/api/v1/settings/advanced/Bad%20Key", Some(json!(1)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn technicians_read_but_cannot_change_settings() {
    let app = TestApp::new().await;
    let (_, token) = app.worker(UserRole::Technician).await;

    let (status, _) = app
        .request(Method::GET, "/api/v1/settings/business", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::PUT,
            "/api/v1/settings/business",
            Some(json!({ "business_name": "Mine now" })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
