use axum::{extract::State, Json};
use tracing::info;

use crate::{
    auth::AuthUser,
    entities::user,
    errors::ServiceError,
    services::workers::{ChangePasswordRequest, LoginRequest, LoginResponse},
    ApiResponse, AppState,
};

/// Exchange worker credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ServiceError> {
    let response = state.services.workers.login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// The signed-in worker's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    summary = "Current worker",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<user::Model>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<user::Model>>, ServiceError> {
    let worker = state.services.workers.get(auth_user.user_id).await?;
    Ok(Json(ApiResponse::success(worker)))
}

/// Change the signed-in worker's password; the current password is required
#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    summary = "Change own password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Current password incorrect", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn change_own_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state
        .services
        .workers
        .change_password(&auth_user, auth_user.user_id, request)
        .await?;
    info!(user_id = %auth_user.user_id, "Password changed");
    Ok(Json(ApiResponse::success_with_message((), "Password changed")))
}
