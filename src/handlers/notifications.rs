use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::NotificationQuery;
use crate::{
    auth::AuthUser,
    entities::notification,
    errors::ServiceError,
    services::notifications::{CreateNotificationRequest, UnreadCount},
    ApiResponse, AppState, PaginatedResponse,
};

/// Own and broadcast notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    summary = "List notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications", body = ApiResponse<PaginatedResponse<notification::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<notification::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let items = state
        .services
        .notifications
        .list_for_user(auth_user.user_id, query.unread_only, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    summary = "Unread notification count",
    responses(
        (status = 200, description = "Count", body = ApiResponse<UnreadCount>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "notifications"
)]
pub async fn unread_count(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UnreadCount>>, ServiceError> {
    let unread = state
        .services
        .notifications
        .unread_count(auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(UnreadCount { unread })))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    summary = "Mark notification read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = ApiResponse<notification::Model>),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<notification::Model>>, ServiceError> {
    let updated = state
        .services
        .notifications
        .mark_read(auth_user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    summary = "Mark all notifications read",
    responses(
        (status = 200, description = "Number of notifications marked", body = ApiResponse<u64>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "notifications"
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let marked = state
        .services
        .notifications
        .mark_all_read(auth_user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(marked)))
}

/// Post a notice to one worker, or to everyone when `user_id` is omitted
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    summary = "Create notification",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<notification::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "notifications"
)]
pub async fn create_notification(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<notification::Model>>), ServiceError> {
    let created = state.services.notifications.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}
