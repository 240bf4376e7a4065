//! RepairDesk API Library
//!
//! REST backend for a computer-repair shop: customers, repair tickets,
//! inventory with reorder predictions, point of sale, workers, SMS campaigns
//! and business settings.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};
use crate::db::DbPool;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Normalizes caller supplied paging against the configured page size cap.
    pub fn page_params(&self, page: u64, limit: u64) -> (u64, u64) {
        (
            page.max(1),
            limit.clamp(1, self.config.api_max_page_size.max(1)),
        )
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!response.success);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`, each group behind its permission guard.
pub fn api_v1_routes() -> Router<AppState> {
    use handlers::*;

    // Public endpoints
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/track/:code", get(devices::track_device));

    // Any signed-in worker
    let authenticated = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_own_password))
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(notifications::unread_count),
        )
        .route("/notifications/:id/read", put(notifications::mark_read))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .with_auth();

    let notifications_create = Router::new()
        .route("/notifications", post(notifications::create_notification))
        .with_permission(perm::NOTIFICATIONS_CREATE);

    // Workers
    let workers_read = Router::new()
        .route("/workers", get(workers::list_workers))
        .route("/workers/:id", get(workers::get_worker))
        .with_permission(perm::USERS_READ);

    let workers_manage = Router::new()
        .route("/workers", post(workers::create_worker))
        .route(
            "/workers/:id",
            put(workers::update_worker).delete(workers::deactivate_worker),
        )
        .route("/workers/:id/password", put(workers::reset_password))
        .with_permission(perm::USERS_MANAGE);

    // Locations
    let locations_read = Router::new()
        .route("/locations", get(locations::list_locations))
        .route("/locations/:id", get(locations::get_location))
        .with_permission(perm::LOCATIONS_READ);

    let locations_manage = Router::new()
        .route("/locations", post(locations::create_location))
        .route(
            "/locations/:id",
            put(locations::update_location).delete(locations::delete_location),
        )
        .with_permission(perm::LOCATIONS_MANAGE);

    // Customers
    let customers_read = Router::new()
        .route("/customers", get(customers::list_customers))
        .route("/customers/:id", get(customers::get_customer))
        .route("/customers/:id/devices", get(customers::list_customer_devices))
        .with_permission(perm::CUSTOMERS_READ);

    let customers_create = Router::new()
        .route("/customers", post(customers::create_customer))
        .with_permission(perm::CUSTOMERS_CREATE);

    let customers_update = Router::new()
        .route("/customers/:id", put(customers::update_customer))
        .with_permission(perm::CUSTOMERS_UPDATE);

    let customers_delete = Router::new()
        .route("/customers/:id", delete(customers::delete_customer))
        .with_permission(perm::CUSTOMERS_DELETE);

    // Devices
    let devices_read = Router::new()
        .route("/devices", get(devices::list_devices))
        .route("/devices/tracking/:code", get(devices::get_device_by_tracking_code))
        .route("/devices/:id", get(devices::get_device))
        .route("/devices/:id/history", get(devices::get_device_history))
        .route("/devices/:id/receipt", get(devices::get_device_receipt))
        .with_permission(perm::DEVICES_READ);

    let devices_create = Router::new()
        .route("/devices", post(devices::register_device))
        .with_permission(perm::DEVICES_CREATE);

    let devices_update = Router::new()
        .route("/devices/:id", put(devices::update_device))
        .route("/devices/:id/status", put(devices::change_device_status))
        .route("/devices/:id/assign", put(devices::assign_technician))
        .with_permission(perm::DEVICES_UPDATE);

    let devices_delete = Router::new()
        .route("/devices/:id", delete(devices::delete_device))
        .with_permission(perm::DEVICES_DELETE);

    // Inventory
    let inventory_read = Router::new()
        .route("/inventory", get(inventory::list_inventory))
        .route("/inventory/low-stock", get(inventory::list_low_stock))
        .route("/inventory/predictions", get(inventory::get_predictions))
        .route("/inventory/:id", get(inventory::get_inventory_item))
        .route("/inventory/:id/usage", get(inventory::get_item_usage))
        .route("/inventory/:id/adjustments", get(inventory::list_adjustments))
        .with_permission(perm::INVENTORY_READ);

    let inventory_manage = Router::new()
        .route("/inventory", post(inventory::create_inventory_item))
        .route(
            "/inventory/:id",
            put(inventory::update_inventory_item).delete(inventory::delete_inventory_item),
        )
        .with_permission(perm::INVENTORY_MANAGE);

    let inventory_adjust = Router::new()
        .route("/inventory/:id/adjust", post(inventory::adjust_stock))
        .with_permission(perm::INVENTORY_ADJUST);

    // Sales
    let sales_read = Router::new()
        .route("/sales", get(sales::list_sales))
        .route("/sales/:id", get(sales::get_sale))
        .with_permission(perm::SALES_READ);

    let sales_create = Router::new()
        .route("/sales", post(sales::create_sale))
        .with_permission(perm::SALES_CREATE);

    // Appointments
    let appointments_read = Router::new()
        .route("/appointments", get(appointments::list_appointments))
        .route("/appointments/:id", get(appointments::get_appointment))
        .with_permission(perm::APPOINTMENTS_READ);

    let appointments_manage = Router::new()
        .route("/appointments", post(appointments::create_appointment))
        .route(
            "/appointments/:id",
            put(appointments::update_appointment).delete(appointments::delete_appointment),
        )
        .with_permission(perm::APPOINTMENTS_MANAGE);

    // Finance
    let finance_read = Router::new()
        .route("/expenses", get(finance::list_expenses))
        .route("/budgets", get(finance::list_budgets))
        .route("/budgets/summary", get(finance::budget_summary))
        .with_permission(perm::FINANCE_READ);

    let finance_manage = Router::new()
        .route("/expenses", post(finance::create_expense))
        .route(
            "/expenses/:id",
            put(finance::update_expense).delete(finance::delete_expense),
        )
        .route("/budgets", post(finance::create_budget))
        .route(
            "/budgets/:id",
            put(finance::update_budget).delete(finance::delete_budget),
        )
        .with_permission(perm::FINANCE_MANAGE);

    // Loans
    let loans_read = Router::new()
        .route("/loans", get(loans::list_loans))
        .route("/loans/:id", get(loans::get_loan))
        .with_permission(perm::LOANS_READ);

    let loans_manage = Router::new()
        .route("/loans", post(loans::create_loan))
        .route("/loans/:id", delete(loans::delete_loan))
        .route("/loans/:id/payments", post(loans::record_payment))
        .with_permission(perm::LOANS_MANAGE);

    // SMS campaigns and recipient groups
    let sms_read = Router::new()
        .route("/sms/campaigns", get(sms::list_campaigns))
        .route("/sms/campaigns/:id", get(sms::get_campaign))
        .route("/sms/campaigns/:id/preview", post(sms::preview_campaign))
        .route("/recipient-groups", get(recipient_groups::list_groups))
        .route("/recipient-groups/:id", get(recipient_groups::get_group))
        .with_permission(perm::SMS_READ);

    let sms_manage = Router::new()
        .route("/sms/campaigns", post(sms::create_campaign))
        .route(
            "/sms/campaigns/:id",
            put(sms::update_campaign).delete(sms::delete_campaign),
        )
        .route("/recipient-groups", post(recipient_groups::create_group))
        .route(
            "/recipient-groups/:id",
            put(recipient_groups::update_group).delete(recipient_groups::delete_group),
        )
        .route(
            "/recipient-groups/:id/members",
            post(recipient_groups::add_members),
        )
        .route(
            "/recipient-groups/:id/members/:customer_id",
            delete(recipient_groups::remove_member),
        )
        .with_permission(perm::SMS_MANAGE);

    let sms_send = Router::new()
        .route("/sms/campaigns/:id/send", post(sms::send_campaign))
        .route("/sms/send", post(sms::send_single))
        .with_permission(perm::SMS_SEND);

    // Settings
    let settings_read = Router::new()
        .route("/settings/business", get(settings::get_business_settings))
        .route("/settings/advanced", get(settings::list_advanced_settings))
        .route("/settings/advanced/:key", get(settings::get_advanced_setting))
        .with_permission(perm::SETTINGS_READ);

    let settings_update = Router::new()
        .route("/settings/business", put(settings::update_business_settings))
        .route(
            "/settings/advanced/:key",
            put(settings::put_advanced_setting).delete(settings::delete_advanced_setting),
        )
        .with_permission(perm::SETTINGS_UPDATE);

    // Dashboard
    let dashboard = Router::new()
        .route("/dashboard/stats", get(dashboard::get_stats))
        .with_permission(perm::DASHBOARD_READ);

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(notifications_create)
        .merge(workers_read)
        .merge(workers_manage)
        .merge(locations_read)
        .merge(locations_manage)
        .merge(customers_read)
        .merge(customers_create)
        .merge(customers_update)
        .merge(customers_delete)
        .merge(devices_read)
        .merge(devices_create)
        .merge(devices_update)
        .merge(devices_delete)
        .merge(inventory_read)
        .merge(inventory_manage)
        .merge(inventory_adjust)
        .merge(sales_read)
        .merge(sales_create)
        .merge(appointments_read)
        .merge(appointments_manage)
        .merge(finance_read)
        .merge(finance_manage)
        .merge(loans_read)
        .merge(loans_manage)
        .merge(sms_read)
        .merge(sms_manage)
        .merge(sms_send)
        .merge(settings_read)
        .merge(settings_update)
        .merge(dashboard)
}

/// Full application router: health, `/api/v1`, Swagger UI and the request
/// scoped layers. CORS and compression are added by the binary.
pub fn app_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;
    let auth_service = state.auth.clone();

    Router::new()
        .nest("/health", health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(Extension(auth_service))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
