mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

#[tokio::test]
async fn sale_deducts_stock_and_records_adjustments() {
    let app = TestApp::new().await;
    let part = app.create_part("scr-ip13", 10, "5.00").await;
    assert_eq!(part["sku"], "SCR-IP13");
    let part_id = part["id"].as_str().unwrap();

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "payment_method": "card",
                "items": [
                    { "inventory_item_id": part_id, "quantity": 9 },
                    { "description": "Labour", "quantity": 1, "unit_price": "20.00" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = &body["data"];
    assert_eq!(money(&sale["subtotal"]), dec!(65.00));
    assert_eq!(money(&sale["total"]), dec!(65.00));
    assert_eq!(sale["items"].as_array().unwrap().len(), 2);
    assert!(sale["receipt_number"].as_str().unwrap().starts_with("S-"));

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/inventory/{part_id}"), None)
        .await;
    assert_eq!(body["data"]["quantity"], 1);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/inventory/{part_id}/adjustments"), None)
        .await;
    let adjustments = body["data"].as_array().unwrap();
    assert!(adjustments.iter().any(|a| a["delta"] == -9));

    let (_, body) = app.admin(Method::GET, "/api/v1/inventory/low-stock", None).await;
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|item| item["id"] == part_id));
}

#[tokio::test]
async fn overselling_is_unprocessable_and_changes_nothing() {
    let app = TestApp::new().await;
    let part = app.create_part("BAT-IP13", 2, "59.00").await;
    let part_id = part["id"].as_str().unwrap();

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/sales",
            Some(json!({ "items": [{ "inventory_item_id": part_id, "quantity": 3 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/v1/inventory/{part_id}"), None)
        .await;
    assert_eq!(body["data"]["quantity"], 2);

    let (_, body) = app.admin(Method::GET, "/api/v1/sales", None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn tax_rate_applies_to_discounted_subtotal() {
    let app = TestApp::new().await;
    app.admin(
        Method::PUT,
        "/api/v1/settings/business",
        Some(json!({ "tax_rate": "0.10" })),
    )
    .await;

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "discount": "10.00",
                "items": [{ "description": "Data recovery", "quantity": 1, "unit_price": "110.00" }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(money(&body["data"]["tax"]), dec!(10.00));
    assert_eq!(money(&body["data"]["total"]), dec!(110.00));
}

#[tokio::test]
async fn manual_adjustment_cannot_go_negative() {
    let app = TestApp::new().await;
    let part = app.create_part("FAN-LT5", 4, "35.00").await;
    let uri = format!("/api/v1/inventory/{}/adjust", part["id"].as_str().unwrap());

    let (status, body) = app
        .admin(Method::POST, &uri, Some(json!({ "delta": 6, "reason": "Delivery" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["quantity"], 10);

    let (status, _) = app
        .admin(Method::POST, &uri, Some(json!({ "delta": -11, "reason": "Count" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .admin(Method::POST, &uri, Some(json!({ "delta": 0, "reason": "Nothing" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestApp::new().await;
    app.create_part("PRT-USBC", 5, "39.00").await;
    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "name": "Another port",
                "sku": "prt-usbc",
                "cost_price": "1.00",
                "selling_price": "2.00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn predictions_flag_fast_movers() {
    let app = TestApp::new().await;
    let fast = app.create_part("FAST-1", 10, "5.00").await;
    let slow = app.create_part("SLOW-1", 10, "5.00").await;

    let (status, _) = app
        .admin(
            Method::POST,
            "/api/v1/sales",
            Some(json!({
                "items": [{ "inventory_item_id": fast["id"], "quantity": 9 }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .admin(Method::GET, "/api/v1/inventory/predictions?window_days=30", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let report = &body["data"];
    assert_eq!(report["window_days"], 30);

    let find = |id: &Value| {
        report["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| &p["item_id"] == id)
            .cloned()
            .expect("prediction for item")
    };
    let fast_prediction = find(&fast["id"]);
    assert_eq!(fast_prediction["units_sold"], 9);
    assert_eq!(fast_prediction["status"], "critical");
    assert!(fast_prediction["suggested_reorder_quantity"].as_i64().unwrap() > 0);

    let slow_prediction = find(&slow["id"]);
    assert_eq!(slow_prediction["status"], "ok");
    assert_eq!(slow_prediction["suggested_reorder_quantity"], 0);
    assert!(report["summary"]["critical"].as_u64().unwrap() >= 1);

    let (status, body) = app
        .admin(
            Method::GET,
            &format!("/api/v1/inventory/{}/usage?months=3", fast["id"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let months = body["data"]["months"].as_array().unwrap();
    assert_eq!(months.len(), 3);
    assert_eq!(months.last().unwrap()["units_sold"], 9);
}
