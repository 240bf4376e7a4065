use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    entities::setting,
    errors::ServiceError,
    services::settings::{BusinessSettings, UpdateBusinessSettingsRequest},
    ApiResponse, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/settings/business",
    summary = "Get business settings",
    responses(
        (status = 200, description = "Business settings with defaults filled in", body = ApiResponse<BusinessSettings>),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn get_business_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BusinessSettings>>, ServiceError> {
    let settings = state.services.settings.business_settings().await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/business",
    summary = "Update business settings",
    request_body = UpdateBusinessSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<BusinessSettings>),
        (status = 400, description = "Invalid settings", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn update_business_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateBusinessSettingsRequest>,
) -> Result<Json<ApiResponse<BusinessSettings>>, ServiceError> {
    let settings = state
        .services
        .settings
        .update_business_settings(request)
        .await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/advanced",
    summary = "List advanced settings",
    responses(
        (status = 200, description = "Advanced settings ordered by key", body = ApiResponse<Vec<setting::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn list_advanced_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<setting::Model>>>, ServiceError> {
    let settings = state.services.settings.list_advanced().await?;
    Ok(Json(ApiResponse::success(settings)))
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/advanced/{key}",
    summary = "Get advanced setting",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Setting", body = ApiResponse<setting::Model>),
        (status = 404, description = "Setting not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn get_advanced_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<setting::Model>>, ServiceError> {
    let setting = state.services.settings.get_advanced(&key).await?;
    Ok(Json(ApiResponse::success(setting)))
}

/// The request body is stored as-is
#[utoipa::path(
    put,
    path = "/api/v1/settings/advanced/{key}",
    summary = "Store advanced setting",
    params(("key" = String, Path, description = "Setting key")),
    request_body(content = Object, description = "Any JSON value"),
    responses(
        (status = 200, description = "Setting stored", body = ApiResponse<setting::Model>),
        (status = 400, description = "Invalid key", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn put_advanced_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<setting::Model>>, ServiceError> {
    let setting = state.services.settings.put_advanced(&key, value).await?;
    Ok(Json(ApiResponse::success(setting)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/settings/advanced/{key}",
    summary = "Delete advanced setting",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 204, description = "Setting deleted"),
        (status = 404, description = "Setting not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "settings"
)]
pub async fn delete_advanced_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ServiceError> {
    state.services.settings.delete_advanced(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
