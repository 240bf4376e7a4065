/*!
 * # Health Check Module
 *
 * - Basic health check (`/health`) - process is up
 * - Liveness check (`/health/live`) - uptime
 * - Readiness check (`/health/ready`) - database answers a ping
 * - Version (`/health/version`) - build information
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, error};

use crate::AppState;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Up => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Seconds since the health module was first touched, which is router build time.
pub fn uptime_seconds() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
    }))
}

pub async fn health_check() -> impl IntoResponse {
    debug!("Health check endpoint called");
    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": uptime_seconds(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// 503 until the database answers.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.db.ping().await {
        Ok(()) => HealthStatus::Up,
        Err(e) => {
            error!(error = %e, "Database health check failed");
            HealthStatus::Down
        }
    };

    (
        database.status_code(),
        Json(json!({
            "ready": database == HealthStatus::Up,
            "checks": { "database": database },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Health endpoints, nested under `/health` by the application router.
pub fn health_routes() -> Router<AppState> {
    Lazy::force(&STARTED_AT);
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/version", get(version_info))
}
