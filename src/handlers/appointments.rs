use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::AppointmentQuery;
use crate::{
    entities::appointment,
    errors::ServiceError,
    services::appointments::{CreateAppointmentRequest, UpdateAppointmentRequest},
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    summary = "List appointments",
    params(AppointmentQuery),
    responses(
        (status = 200, description = "Appointments by start time", body = ApiResponse<PaginatedResponse<appointment::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<appointment::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let appointments = state
        .services
        .appointments
        .list(query.into(), page, limit)
        .await?;
    Ok(Json(ApiResponse::success(appointments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    summary = "Get appointment",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment", body = ApiResponse<appointment::Model>),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<appointment::Model>>, ServiceError> {
    let appointment = state.services.appointments.get(id).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    summary = "Book appointment",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = ApiResponse<appointment::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<appointment::Model>>), ServiceError> {
    let appointment = state.services.appointments.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(appointment))))
}

#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    summary = "Update appointment",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = ApiResponse<appointment::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<ApiResponse<appointment::Model>>, ServiceError> {
    let appointment = state.services.appointments.update(id, request).await?;
    Ok(Json(ApiResponse::success(appointment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    summary = "Delete appointment",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 204, description = "Appointment deleted"),
        (status = 404, description = "Appointment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "appointments"
)]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.appointments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
