use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::LoanQuery;
use crate::{
    entities::loan_invoice,
    errors::ServiceError,
    services::loans::{CreateLoanRequest, LoanWithPayments, RecordPaymentRequest},
    ApiResponse, AppState, PaginatedResponse,
};

/// Credit invoices; unpaid ones past due read as `overdue`
#[utoipa::path(
    get,
    path = "/api/v1/loans",
    summary = "List loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Loan invoices", body = ApiResponse<PaginatedResponse<loan_invoice::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "loans"
)]
pub async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<LoanQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<loan_invoice::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let loans = state.services.loans.list(query.into(), page, limit).await?;
    Ok(Json(ApiResponse::success(loans)))
}

#[utoipa::path(
    get,
    path = "/api/v1/loans/{id}",
    summary = "Get loan with payments",
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = ApiResponse<LoanWithPayments>),
        (status = 404, description = "Loan not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "loans"
)]
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoanWithPayments>>, ServiceError> {
    let loan = state.services.loans.get(id).await?;
    Ok(Json(ApiResponse::success(loan)))
}

#[utoipa::path(
    post,
    path = "/api/v1/loans",
    summary = "Create loan",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = ApiResponse<loan_invoice::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "loans"
)]
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<loan_invoice::Model>>), ServiceError> {
    let loan = state.services.loans.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(loan))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/loans/{id}",
    summary = "Delete loan",
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Loan has payments", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "loans"
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.loans.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/loans/{id}/payments",
    summary = "Record loan payment",
    params(("id" = Uuid, Path, description = "Loan ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<LoanWithPayments>),
        (status = 400, description = "Amount not positive or above outstanding balance", body = crate::errors::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "loans"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LoanWithPayments>>), ServiceError> {
    let loan = state.services.loans.record_payment(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(loan))))
}
