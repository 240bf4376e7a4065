use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::CustomerQuery;
use crate::{
    entities::{customer, device},
    errors::ServiceError,
    services::customers::{CreateCustomerRequest, UpdateCustomerRequest},
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    summary = "List customers",
    params(CustomerQuery),
    responses(
        (status = 200, description = "Customers", body = ApiResponse<PaginatedResponse<customer::Model>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<customer::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let customers = state.services.customers.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(customers)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    summary = "Get customer",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = ApiResponse<customer::Model>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<customer::Model>>, ServiceError> {
    let customer = state.services.customers.get(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/devices",
    summary = "Customer's devices",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Devices, newest first", body = ApiResponse<Vec<device::Model>>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn list_customer_devices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<device::Model>>>, ServiceError> {
    let devices = state.services.customers.devices(id).await?;
    Ok(Json(ApiResponse::success(devices)))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    summary = "Create customer",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<customer::Model>>), ServiceError> {
    let customer = state.services.customers.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}",
    summary = "Update customer",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = ApiResponse<customer::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<customer::Model>>, ServiceError> {
    let customer = state.services.customers.update(id, request).await?;
    Ok(Json(ApiResponse::success(customer)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    summary = "Delete customer",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Customer has devices, sales, loans or appointments", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.customers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
