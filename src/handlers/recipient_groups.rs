use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::PageQuery;
use crate::{
    entities::recipient_group,
    errors::ServiceError,
    services::recipient_groups::{
        AddMembersRequest, CreateGroupRequest, GroupSummary, GroupWithMembers, UpdateGroupRequest,
    },
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/recipient-groups",
    summary = "List recipient groups",
    params(PageQuery),
    responses(
        (status = 200, description = "Groups with member counts", body = ApiResponse<PaginatedResponse<GroupSummary>>),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<GroupSummary>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let groups = state.services.recipient_groups.list(page, limit).await?;
    Ok(Json(ApiResponse::success(groups)))
}

#[utoipa::path(
    get,
    path = "/api/v1/recipient-groups/{id}",
    summary = "Get group with members",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group", body = ApiResponse<GroupWithMembers>),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GroupWithMembers>>, ServiceError> {
    let group = state.services.recipient_groups.get(id).await?;
    Ok(Json(ApiResponse::success(group)))
}

#[utoipa::path(
    post,
    path = "/api/v1/recipient-groups",
    summary = "Create recipient group",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = ApiResponse<recipient_group::Model>),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<recipient_group::Model>>), ServiceError> {
    let group = state.services.recipient_groups.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

#[utoipa::path(
    put,
    path = "/api/v1/recipient-groups/{id}",
    summary = "Update recipient group",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = ApiResponse<recipient_group::Model>),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<ApiResponse<recipient_group::Model>>, ServiceError> {
    let group = state.services.recipient_groups.update(id, request).await?;
    Ok(Json(ApiResponse::success(group)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/recipient-groups/{id}",
    summary = "Delete recipient group",
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.recipient_groups.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/recipient-groups/{id}/members",
    summary = "Add group members",
    params(("id" = Uuid, Path, description = "Group ID")),
    request_body = AddMembersRequest,
    responses(
        (status = 200, description = "Members added", body = ApiResponse<GroupWithMembers>),
        (status = 400, description = "Unknown customer ids", body = crate::errors::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn add_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddMembersRequest>,
) -> Result<Json<ApiResponse<GroupWithMembers>>, ServiceError> {
    let group = state
        .services
        .recipient_groups
        .add_members(id, request)
        .await?;
    Ok(Json(ApiResponse::success(group)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/recipient-groups/{id}/members/{customer_id}",
    summary = "Remove group member",
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        ("customer_id" = Uuid, Path, description = "Customer ID"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 404, description = "Not a member", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sms"
)]
pub async fn remove_member(
    State(state): State<AppState>,
    Path((id, customer_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .recipient_groups
        .remove_member(id, customer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
