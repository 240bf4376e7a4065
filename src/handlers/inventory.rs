use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::{InventoryQuery, PredictionQuery, UsageQuery};
use crate::{
    auth::AuthUser,
    entities::{inventory_item, stock_adjustment},
    errors::ServiceError,
    services::{
        inventory::{AdjustStockRequest, CreateInventoryItemRequest, UpdateInventoryItemRequest},
        predictions::{ItemUsage, PredictionReport},
    },
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    summary = "List inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory items", body = ApiResponse<PaginatedResponse<inventory_item::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<inventory_item::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let items = state.services.inventory.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(items)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    summary = "Items at or below reorder level",
    responses(
        (status = 200, description = "Low stock items", body = ApiResponse<Vec<inventory_item::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<inventory_item::Model>>>, ServiceError> {
    let items = state.services.inventory.low_stock().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Stock-out and reorder predictions from recent sales velocity
#[utoipa::path(
    get,
    path = "/api/v1/inventory/predictions",
    summary = "Inventory predictions",
    params(PredictionQuery),
    responses(
        (status = 200, description = "Prediction report", body = ApiResponse<PredictionReport>),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn get_predictions(
    State(state): State<AppState>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<ApiResponse<PredictionReport>>, ServiceError> {
    let report = state.services.predictions.report(query.window_days).await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    summary = "Get inventory item",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = ApiResponse<inventory_item::Model>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn get_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<inventory_item::Model>>, ServiceError> {
    let item = state.services.inventory.get(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/usage",
    summary = "Monthly units sold",
    params(("id" = Uuid, Path, description = "Item ID"), UsageQuery),
    responses(
        (status = 200, description = "Usage history", body = ApiResponse<ItemUsage>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn get_item_usage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<ApiResponse<ItemUsage>>, ServiceError> {
    let usage = state.services.predictions.usage(id, query.months).await?;
    Ok(Json(ApiResponse::success(usage)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/adjustments",
    summary = "Stock movement audit trail",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Adjustments, newest first", body = ApiResponse<Vec<stock_adjustment::Model>>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn list_adjustments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<stock_adjustment::Model>>>, ServiceError> {
    let adjustments = state.services.inventory.adjustments(id).await?;
    Ok(Json(ApiResponse::success(adjustments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    summary = "Create inventory item",
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<inventory_item::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn create_inventory_item(
    State(state): State<AppState>,
    Json(request): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<inventory_item::Model>>), ServiceError> {
    let item = state.services.inventory.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    summary = "Update inventory item",
    description = "Quantity is not editable here; use the adjust endpoint",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateInventoryItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<inventory_item::Model>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInventoryItemRequest>,
) -> Result<Json<ApiResponse<inventory_item::Model>>, ServiceError> {
    let item = state.services.inventory.update(id, request).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    summary = "Delete inventory item",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Item has been sold; deactivate it instead", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/{id}/adjust",
    summary = "Adjust stock",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<inventory_item::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 422, description = "Adjustment would make stock negative", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<ApiResponse<inventory_item::Model>>, ServiceError> {
    let item = state.services.inventory.adjust(&auth_user, id, request).await?;
    Ok(Json(ApiResponse::success(item)))
}
