use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::common::{BudgetSummaryQuery, ExpenseQuery};
use crate::{
    auth::AuthUser,
    entities::{budget, expense},
    errors::ServiceError,
    services::finance::{
        BudgetStatus, CreateBudgetRequest, CreateExpenseRequest, UpdateBudgetRequest,
        UpdateExpenseRequest,
    },
    ApiResponse, AppState, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    summary = "List expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Expenses, newest first", body = ApiResponse<PaginatedResponse<expense::Model>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<expense::Model>>>, ServiceError> {
    let (page, limit) = state.page_params(query.page, query.limit);
    let expenses = state
        .services
        .finance
        .list_expenses(query.into(), page, limit)
        .await?;
    Ok(Json(ApiResponse::success(expenses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    summary = "Record expense",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = ApiResponse<expense::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<expense::Model>>), ServiceError> {
    let expense = state
        .services
        .finance
        .create_expense(&auth_user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(expense))))
}

#[utoipa::path(
    put,
    path = "/api/v1/expenses/{id}",
    summary = "Update expense",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<expense::Model>),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<ApiResponse<expense::Model>>, ServiceError> {
    let expense = state.services.finance.update_expense(id, request).await?;
    Ok(Json(ApiResponse::success(expense)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    summary = "Delete expense",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.finance.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/budgets",
    summary = "List budgets",
    responses(
        (status = 200, description = "Budgets", body = ApiResponse<Vec<budget::Model>>),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn list_budgets(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<budget::Model>>>, ServiceError> {
    let budgets = state.services.finance.list_budgets().await?;
    Ok(Json(ApiResponse::success(budgets)))
}

/// Spending against each budget for its period
#[utoipa::path(
    get,
    path = "/api/v1/budgets/summary",
    summary = "Budget summary",
    params(BudgetSummaryQuery),
    responses(
        (status = 200, description = "Budget status", body = ApiResponse<Vec<BudgetStatus>>),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn budget_summary(
    State(state): State<AppState>,
    Query(query): Query<BudgetSummaryQuery>,
) -> Result<Json<ApiResponse<Vec<BudgetStatus>>>, ServiceError> {
    let summary = state.services.finance.budget_summary(query.on).await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[utoipa::path(
    post,
    path = "/api/v1/budgets",
    summary = "Create budget",
    request_body = CreateBudgetRequest,
    responses(
        (status = 201, description = "Budget created", body = ApiResponse<budget::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn create_budget(
    State(state): State<AppState>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<budget::Model>>), ServiceError> {
    let budget = state.services.finance.create_budget(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(budget))))
}

#[utoipa::path(
    put,
    path = "/api/v1/budgets/{id}",
    summary = "Update budget",
    params(("id" = Uuid, Path, description = "Budget ID")),
    request_body = UpdateBudgetRequest,
    responses(
        (status = 200, description = "Budget updated", body = ApiResponse<budget::Model>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Budget not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn update_budget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<Json<ApiResponse<budget::Model>>, ServiceError> {
    let budget = state.services.finance.update_budget(id, request).await?;
    Ok(Json(ApiResponse::success(budget)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/budgets/{id}",
    summary = "Delete budget",
    params(("id" = Uuid, Path, description = "Budget ID")),
    responses(
        (status = 204, description = "Budget deleted"),
        (status = 404, description = "Budget not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "finance"
)]
pub async fn delete_budget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.finance.delete_budget(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
