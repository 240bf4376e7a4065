use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::WorkerQuery;
use crate::{
    auth::AuthUser,
    entities::user,
    errors::ServiceError,
    services::workers::{ChangePasswordRequest, CreateWorkerRequest, UpdateWorkerRequest},
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/workers",
    summary = "List workers",
    params(WorkerQuery),
    responses(
        (status = 200, description = "Workers", body = ApiResponse<PaginatedResponse<user::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn list_workers(
    State(state): State<AppState>,
    Query(query): Query<WorkerQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<user::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let workers = state.services.workers.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(workers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/workers/{id}",
    summary = "Get worker",
    params(("id" = Uuid, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker", body = ApiResponse<user::Model>),
        (status = 404, description = "Worker not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<user::Model>>, ServiceError> {
    let worker = state.services.workers.get(id).await?;
    Ok(Json(ApiResponse::success(worker)))
}

#[utoipa::path(
    post,
    path = "/api/v1/workers",
    summary = "Create worker",
    request_body = CreateWorkerRequest,
    responses(
        (status = 201, description = "Worker created", body = ApiResponse<user::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn create_worker(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<user::Model>>), ServiceError> {
    let worker = state.services.workers.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(worker))))
}

#[utoipa::path(
    put,
    path = "/api/v1/workers/{id}",
    summary = "Update worker",
    params(("id" = Uuid, Path, description = "Worker ID")),
    request_body = UpdateWorkerRequest,
    responses(
        (status = 200, description = "Worker updated", body = ApiResponse<user::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Role changes need an admin", body = crate::errors::ErrorResponse),
        (status = 404, description = "Worker not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn update_worker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateWorkerRequest>,
) -> Result<Json<ApiResponse<user::Model>>, ServiceError> {
    let worker = state.services.workers.update(&auth_user, id, request).await?;
    Ok(Json(ApiResponse::success(worker)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/workers/{id}",
    summary = "Deactivate worker",
    description = "Workers are never hard deleted; they lose the ability to log in",
    params(("id" = Uuid, Path, description = "Worker ID")),
    responses(
        (status = 200, description = "Worker deactivated", body = ApiResponse<user::Model>),
        (status = 400, description = "Cannot deactivate yourself", body = crate::errors::ErrorResponse),
        (status = 404, description = "Worker not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn deactivate_worker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<user::Model>>, ServiceError> {
    let worker = state.services.workers.deactivate(&auth_user, id).await?;
    Ok(Json(ApiResponse::success_with_message(worker, "Worker deactivated")))
}

#[utoipa::path(
    put,
    path = "/api/v1/workers/{id}/password",
    summary = "Reset worker password",
    params(("id" = Uuid, Path, description = "Worker ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Worker not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "workers"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state
        .services
        .workers
        .change_password(&auth_user, id, request)
        .await?;
    Ok(Json(ApiResponse::success_with_message((), "Password reset")))
}
