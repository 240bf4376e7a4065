use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::LocationQuery;
use crate::{
    entities::location,
    errors::ServiceError,
    services::locations::{CreateLocationRequest, UpdateLocationRequest},
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    summary = "List shop locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Locations", body = ApiResponse<PaginatedResponse<location::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<location::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let locations = state
        .services
        .locations
        .list(query.active, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(locations)))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    summary = "Get location",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location", body = ApiResponse<location::Model>),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<location::Model>>, ServiceError> {
    let location = state.services.locations.get(id).await?;
    Ok(Json(ApiResponse::success(location)))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    summary = "Create location",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = ApiResponse<location::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    let location = state.services.locations.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    summary = "Update location",
    params(("id" = Uuid, Path, description = "Location ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = ApiResponse<location::Model>),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<location::Model>>, ServiceError> {
    let location = state.services.locations.update(id, request).await?;
    Ok(Json(ApiResponse::success(location)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    summary = "Delete location",
    params(("id" = Uuid, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Location still referenced", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.locations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
