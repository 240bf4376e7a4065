mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use repairdesk_api::entities::user::UserRole;
use serde_json::json;

#[tokio::test]
async fn login_issues_a_token_that_opens_me() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let token = body["data"]["access_token"].as_str().unwrap().to_string();
    let (status, me) = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], ADMIN_EMAIL);
    assert_eq!(me["data"]["role"], "admin");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized: Invalid email or password");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/customers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/v1/customers", None, Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_gate_endpoints() {
    let app = TestApp::new().await;
    let (_, tech_token) = app.worker(UserRole::Technician).await;
    let (_, sales_token) = app.worker(UserRole::Sales).await;

    // Technicians work tickets but cannot sell or text customers.
    let (status, _) = app
        .request(Method::GET, "/api/v1/devices", None, Some(&tech_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .request(Method::GET, "/api/v1/sales", None, Some(&tech_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/sms/send",
            Some(json!({ "customer_id": uuid::Uuid::new_v4(), "message": "hi" })),
            Some(&tech_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Only admins manage workers.
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/workers",
            Some(json!({
                "full_name": "New Hire",
                "email": "hire@shop.test",
                "password": "long-enough",
                "role": "technician"
            })),
            Some(&sales_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivated_worker_cannot_log_in() {
    let app = TestApp::new().await;
    let (worker, _) = app.worker(UserRole::Sales).await;

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/workers/{}", worker.id), None)
        .await;
    assert!(status.is_success(), "deactivate returned {status}");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": worker.email, "password": "worker-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_cannot_deactivate_self() {
    let app = TestApp::new().await;
    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/workers/{}", app.admin.id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
