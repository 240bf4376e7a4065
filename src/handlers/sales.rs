use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::SaleQuery;
use crate::{
    auth::AuthUser,
    entities::sale,
    errors::ServiceError,
    services::sales::{CreateSaleRequest, SaleWithItems},
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/sales",
    summary = "List sales",
    params(SaleQuery),
    responses(
        (status = 200, description = "Sales, newest first", body = ApiResponse<PaginatedResponse<sale::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SaleQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<sale::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let sales = state.services.sales.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(sales)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    summary = "Get sale with line items",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale", body = ApiResponse<SaleWithItems>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SaleWithItems>>, ServiceError> {
    let sale = state.services.sales.get(id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Ring up a sale. Stock lines decrement inventory in the same transaction.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    summary = "Create sale",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale completed", body = ApiResponse<SaleWithItems>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SaleWithItems>>), ServiceError> {
    let sale = state.services.sales.create(&auth_user, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sale))))
}
