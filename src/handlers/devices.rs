use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::DeviceQuery;
use crate::{
    auth::AuthUser,
    entities::{device, device_status_history},
    errors::ServiceError,
    services::devices::{
        AssignTechnicianRequest, ChangeStatusRequest, DeviceReceipt, PublicTracking,
        RegisterDeviceRequest, UpdateDeviceRequest,
    },
    ApiResponse, AppState, PaginatedResponse,
};

/// Public repair status lookup by receipt code. No authentication.
#[utoipa::path(
    get,
    path = "/api/v1/track/{code}",
    summary = "Track a repair",
    params(("code" = String, Path, description = "Tracking code printed on the receipt")),
    responses(
        (status = 200, description = "Repair status", body = ApiResponse<PublicTracking>),
        (status = 404, description = "Unknown tracking code", body = crate::errors::ErrorResponse),
    ),
    tag = "tracking"
)]
pub async fn track_device(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<PublicTracking>>, ServiceError> {
    let tracking = state.services.devices.public_tracking(&code).await?;
    Ok(Json(ApiResponse::success(tracking)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices",
    summary = "List devices",
    params(DeviceQuery),
    responses(
        (status = 200, description = "Devices", body = ApiResponse<PaginatedResponse<device::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<device::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let devices = state.services.devices.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(devices)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/tracking/{code}",
    summary = "Get device by tracking code",
    params(("code" = String, Path, description = "Tracking code")),
    responses(
        (status = 200, description = "Device", body = ApiResponse<device::Model>),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn get_device_by_tracking_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<device::Model>>, ServiceError> {
    let device = state.services.devices.get_by_tracking_code(&code).await?;
    Ok(Json(ApiResponse::success(device)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}",
    summary = "Get device",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device", body = ApiResponse<device::Model>),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<device::Model>>, ServiceError> {
    let device = state.services.devices.get(id).await?;
    Ok(Json(ApiResponse::success(device)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}/history",
    summary = "Device status history",
    description = "Every status change, oldest first",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 200, description = "History", body = ApiResponse<Vec<device_status_history::Model>>),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn get_device_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<device_status_history::Model>>>, ServiceError> {
    let history = state.services.devices.history(id).await?;
    Ok(Json(ApiResponse::success(history)))
}

#[utoipa::path(
    get,
    path = "/api/v1/devices/{id}/receipt",
    summary = "Intake receipt",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Receipt data", body = ApiResponse<DeviceReceipt>),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn get_device_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeviceReceipt>>, ServiceError> {
    let receipt = state.services.devices.receipt(id).await?;
    Ok(Json(ApiResponse::success(receipt)))
}

#[utoipa::path(
    post,
    path = "/api/v1/devices",
    summary = "Register device",
    description = "Check a device in for repair and issue its tracking code",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = ApiResponse<device::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn register_device(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<device::Model>>), ServiceError> {
    let device = state.services.devices.register(&auth_user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(device, "Device registered")),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/{id}",
    summary = "Update device",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Device updated", body = ApiResponse<device::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDeviceRequest>,
) -> Result<Json<ApiResponse<device::Model>>, ServiceError> {
    let device = state.services.devices.update(id, request).await?;
    Ok(Json(ApiResponse::success(device)))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/{id}/status",
    summary = "Change repair status",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<device::Model>),
        (status = 400, description = "Status unchanged or invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn change_device_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<device::Model>>, ServiceError> {
    let device = state
        .services
        .devices
        .change_status(&auth_user, id, request)
        .await?;
    Ok(Json(ApiResponse::success(device)))
}

#[utoipa::path(
    put,
    path = "/api/v1/devices/{id}/assign",
    summary = "Assign technician",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = AssignTechnicianRequest,
    responses(
        (status = 200, description = "Technician assigned", body = ApiResponse<device::Model>),
        (status = 400, description = "Worker missing or inactive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn assign_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTechnicianRequest>,
) -> Result<Json<ApiResponse<device::Model>>, ServiceError> {
    let device = state.services.devices.assign(id, request).await?;
    Ok(Json(ApiResponse::success(device)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/devices/{id}",
    summary = "Delete device",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Device has sales or loans", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.devices.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
