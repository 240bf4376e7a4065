#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use repairdesk_api::{
    app_router,
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::user::{self, UserRole},
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        sms_gateway::{LogSmsGateway, SmsGateway},
        workers::CreateWorkerRequest,
    },
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration_test_secret_with_enough_entropy_42";
pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Full application router over a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin: user::Model,
    admin_token: String,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_gateway(Arc::new(LogSmsGateway)).await
    }

    pub async fn with_gateway(gateway: Arc<dyn SmsGateway>) -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir");
        let db_path = db_dir.path().join("repairdesk.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.api_max_page_size = 50;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database");
        db::run_migrations(&pool).await.expect("migrations");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            auth.clone(),
            gateway,
            &cfg,
        );

        let admin = services
            .workers
            .ensure_bootstrap_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("bootstrap admin")
            .expect("fresh database has no workers");
        let admin_token = auth
            .generate_token(&admin)
            .expect("admin token")
            .access_token;

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth,
        };

        Self {
            router: app_router(state.clone()),
            state,
            admin,
            admin_token,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Creates a worker with the given role and returns it with a bearer token.
    pub async fn worker(&self, role: UserRole) -> (user::Model, String) {
        let email = format!("{}-{}@shop.test", role, Uuid::new_v4().simple());
        let worker = self
            .state
            .services
            .workers
            .create(CreateWorkerRequest {
                full_name: format!("Test {}", role),
                email,
                password: "worker-password".to_string(),
                role,
                location_id: None,
                phone: None,
            })
            .await
            .expect("create worker");
        let token = self
            .state
            .auth
            .generate_token(&worker)
            .expect("worker token")
            .access_token;
        (worker, token)
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    /// Authenticated as the bootstrap admin.
    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(self.admin_token.as_str()))
            .await
    }

    pub async fn create_customer(&self, first_name: &str, phone: &str) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/customers",
                Some(json!({
                    "first_name": first_name,
                    "last_name": "Tester",
                    "email": format!("{}-{}@example.com", first_name.to_lowercase(), Uuid::new_v4().simple()),
                    "phone": phone,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create customer: {body}");
        body["data"].clone()
    }

    pub async fn create_part(&self, sku: &str, quantity: i32, price: &str) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/inventory",
                Some(json!({
                    "name": format!("Part {}", sku),
                    "sku": sku,
                    "quantity": quantity,
                    "reorder_level": 2,
                    "cost_price": "1.00",
                    "selling_price": price,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create part: {body}");
        body["data"].clone()
    }

    pub async fn register_device(&self, customer_id: &str) -> Value {
        let (status, body) = self
            .admin(
                Method::POST,
                "/api/v1/devices",
                Some(json!({
                    "customer_id": customer_id,
                    "device_type": "Phone",
                    "brand": "Apple",
                    "model": "iPhone 13",
                    "problem_description": "Cracked screen",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register device: {body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
