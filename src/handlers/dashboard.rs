use axum::{extract::State, Json};

use crate::{
    auth::AuthUser, errors::ServiceError, services::dashboard::DashboardStats, ApiResponse,
    AppState,
};

/// Shop overview; the unread count is for the caller
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    summary = "Dashboard statistics",
    responses(
        (status = 200, description = "Counts and sales totals", body = ApiResponse<DashboardStats>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dashboard"
)]
pub async fn get_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<DashboardStats>>, ServiceError> {
    let stats = state.services.dashboard.stats(&auth_user).await?;
    Ok(Json(ApiResponse::success(stats)))
}
