mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::TestApp;
use repairdesk_api::services::sms_gateway::HttpSmsGateway;
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn app_with_provider(server: &MockServer) -> TestApp {
    let gateway = HttpSmsGateway::new(
        format!("{}/messages", server.uri()),
        Some("provider-token".to_string()),
        "RepairDesk",
    )
    .expect("gateway");
    TestApp::with_gateway(Arc::new(gateway)).await
}

#[tokio::test]
async fn campaign_renders_sends_and_locks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("authorization", "Bearer provider-token"))
        .and(body_partial_json(json!({ "to": "+15550101", "body": "Hi Ada, we are open late" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg-ada" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "to": "+15550102" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message_id": "msg-alan" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    let ada = app.create_customer("Ada", "+1 555 0101").await;
    let alan = app.create_customer("Alan", "+1 555 0102").await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/sms/campaigns",
            Some(json!({
                "name": "Late opening",
                "message_template": "Hi {first_name}, we are open late"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "draft");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/sms/campaigns/{id}/preview?size=1"),
            Some(json!({ "customer_ids": [ada["id"], alan["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total_recipients"], 2);
    assert_eq!(body["data"]["segments"], 1);
    assert_eq!(body["data"]["samples"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/sms/campaigns/{id}/send"),
            Some(json!({ "customer_ids": [ada["id"], alan["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let campaign = &body["data"];
    assert_eq!(campaign["status"], "completed");
    assert_eq!(campaign["sent_count"], 2);
    assert_eq!(campaign["failed_count"], 0);
    assert!(campaign["sent_at"].is_string());
    let mut provider_ids: Vec<&str> = campaign["recipients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["provider_message_id"].as_str().unwrap())
        .collect();
    provider_ids.sort();
    assert_eq!(provider_ids, vec!["msg-ada", "msg-alan"]);

    // Sent campaigns are frozen.
    let (status, _) = app
        .admin(Method::POST, &format!("/api/v1/sms/campaigns/{id}/send"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .admin(
            Method::PUT,
            &format!("/api/v1/sms/campaigns/{id}"),
            Some(json!({ "name": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/v1/sms/campaigns/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn provider_failures_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    app.create_customer("Grace", "+1 555 0103").await;

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/sms/campaigns",
            Some(json!({ "name": "Promo", "message_template": "Hello" })),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // No selection: every opted-in customer.
    let (status, body) = app
        .admin(Method::POST, &format!("/api/v1/sms/campaigns/{id}/send"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "failed");
    assert_eq!(body["data"]["failed_count"], 1);
    assert_eq!(body["data"]["recipients"][0]["status"], "failed");
}

#[tokio::test]
async fn empty_audience_is_rejected() {
    let app = TestApp::new().await;
    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/sms/campaigns",
            Some(json!({ "name": "Nobody", "message_template": "Hello" })),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .admin(Method::POST, &format!("/api/v1/sms/campaigns/{id}/send"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/sms/campaigns/{id}"), None)
        .await;
    assert_eq!(body["data"]["status"], "draft");
}

#[tokio::test]
async fn group_members_are_the_audience() {
    let app = TestApp::new().await;
    let ada = app.create_customer("Ada", "+1 555 0101").await;
    app.create_customer("Alan", "+1 555 0102").await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/recipient-groups",
            Some(json!({ "name": "VIP" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/v1/recipient-groups/{group_id}/members"),
            Some(json!({ "customer_ids": [ada["id"]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/v1/recipient-groups/{group_id}/members"),
            Some(json!({ "customer_ids": [uuid::Uuid::new_v4()] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .admin(
            Method::POST,
            "/api/v1/sms/campaigns",
            Some(json!({
                "name": "VIP only",
                "message_template": "Hi {first_name}",
                "recipient_group_id": group_id
            })),
        )
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin(Method::POST, &format!("/api/v1/sms/campaigns/{id}/preview"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_recipients"], 1);
    assert_eq!(body["data"]["samples"][0]["message"], "Hi Ada");

    let (status, _) = app
        .admin(
            Method::DELETE,
            &format!(
                "/api/v1/recipient-groups/{group_id}/members/{}",
                ada["id"].as_str().unwrap()
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn single_message_reaches_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "to": "+15550104", "body": "Linus, your laptop is ready" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "single-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_provider(&server).await;
    let linus = app.create_customer("Linus", "+1 555 0104").await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/sms/send",
            Some(json!({
                "customer_id": linus["id"],
                "message": "{first_name}, your laptop is ready"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "sent");
    assert_eq!(body["data"]["provider_message_id"], "single-1");
    assert!(body["data"]["campaign_id"].is_null());
}
