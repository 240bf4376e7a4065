use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::{CampaignQuery, PreviewQuery};
use crate::{
    auth::AuthUser,
    entities::{sms_campaign, sms_recipient},
    errors::ServiceError,
    services::sms::{
        CampaignPreview, CampaignWithRecipients, CreateCampaignRequest, RecipientSelection,
        SendSingleRequest, UpdateCampaignRequest,
    },
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/sms/campaigns",
    summary = "List SMS campaigns",
    params(CampaignQuery),
    responses(
        (status = 200, description = "Campaigns, newest first", body = ApiResponse<PaginatedResponse<sms_campaign::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<CampaignQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<sms_campaign::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let campaigns = state.services.sms.list(query.status, page, limit).await?;
    Ok(Json(ApiResponse::success(campaigns)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sms/campaigns/{id}",
    summary = "Get campaign with recipients",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign", body = ApiResponse<CampaignWithRecipients>),
        (status = 404, description = "Campaign not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CampaignWithRecipients>>, ServiceError> {
    let campaign = state.services.sms.get(id).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Render the template for the first few selected recipients without sending
#[utoipa::path(
    post,
    path = "/api/v1/sms/campaigns/{id}/preview",
    summary = "Preview campaign",
    params(("id" = Uuid, Path, description = "Campaign ID"), PreviewQuery),
    request_body(content = Option<RecipientSelection>, description = "Optional audience override"),
    responses(
        (status = 200, description = "Rendered samples", body = ApiResponse<CampaignPreview>),
        (status = 404, description = "Campaign not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn preview_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
    selection: Option<Json<RecipientSelection>>,
) -> Result<Json<ApiResponse<CampaignPreview>>, ServiceError> {
    let selection = selection.map(|Json(s)| s).unwrap_or_default();
    let preview = state
        .services
        .sms
        .preview(id, selection, query.size)
        .await?;
    Ok(Json(ApiResponse::success(preview)))
}

#[utoipa::path(
    post,
    path = "/api/v1/sms/campaigns",
    summary = "Draft campaign",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign drafted", body = ApiResponse<sms_campaign::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<sms_campaign::Model>>), ServiceError> {
    let campaign = state.services.sms.create(&auth_user, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(campaign))))
}

#[utoipa::path(
    put,
    path = "/api/v1/sms/campaigns/{id}",
    summary = "Update draft campaign",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = ApiResponse<sms_campaign::Model>),
        (status = 404, description = "Campaign not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Campaign already sent", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCampaignRequest>,
) -> Result<Json<ApiResponse<sms_campaign::Model>>, ServiceError> {
    let campaign = state.services.sms.update(id, request).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sms/campaigns/{id}",
    summary = "Delete draft campaign",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 204, description = "Campaign deleted"),
        (status = 404, description = "Campaign not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Campaign already sent", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.sms.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/sms/campaigns/{id}/send",
    summary = "Send campaign",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body(content = Option<RecipientSelection>, description = "Optional audience override"),
    responses(
        (status = 200, description = "Campaign delivered", body = ApiResponse<CampaignWithRecipients>),
        (status = 400, description = "No eligible recipients", body = crate::errors::ErrorResponse),
        (status = 404, description = "Campaign not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Campaign is not a draft", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn send_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    selection: Option<Json<RecipientSelection>>,
) -> Result<Json<ApiResponse<CampaignWithRecipients>>, ServiceError> {
    let selection = selection.map(|Json(s)| s).unwrap_or_default();
    let campaign = state.services.sms.send(&auth_user, id, selection).await?;
    Ok(Json(ApiResponse::success(campaign)))
}

/// Send one message to one customer, outside any campaign
#[utoipa::path(
    post,
    path = "/api/v1/sms/send",
    summary = "Send single SMS",
    request_body = SendSingleRequest,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<sms_recipient::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway rejected the message", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn send_single(
    State(state): State<AppState>,
    Json(request): Json<SendSingleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<sms_recipient::Model>>), ServiceError> {
    let message = state.services.sms.send_single(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message))))
}
