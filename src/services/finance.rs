use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{budget, expense, location},
    errors::ServiceError,
    services::{positive_money, round_money, validate_positive_amount},
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateExpenseRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub spent_on: NaiveDate,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub spent_on: Option<NaiveDate>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateBudgetRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateBudgetRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Option<Decimal>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
    pub location_id: Option<Uuid>,
}

/// Budget with spending to date.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BudgetStatus {
    #[serde(flatten)]
    pub budget: budget::Model,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub over_budget: bool,
}

impl BudgetStatus {
    pub fn compute(budget: budget::Model, spent: Decimal) -> Self {
        let percent_used = if budget.amount > Decimal::ZERO {
            round_money(spent / budget.amount * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
        Self {
            remaining: budget.amount - spent,
            over_budget: spent > budget.amount,
            percent_used,
            spent,
            budget,
        }
    }
}

fn check_period(start: NaiveDate, end: NaiveDate) -> Result<(), ServiceError> {
    if end < start {
        return Err(ServiceError::FieldValidation(vec![
            "period_end: Budget period must not end before it starts".to_string(),
        ]));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FinanceService {
    db_pool: Arc<DbPool>,
}

impl FinanceService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_expenses(
        &self,
        filter: ExpenseFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<expense::Model>, ServiceError> {
        let mut query = expense::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(expense::Column::SpentOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(expense::Column::SpentOn.lte(to));
        }
        if let Some(category) = filter.category {
            query = query.filter(expense::Column::Category.eq(category));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(expense::Column::LocationId.eq(location_id));
        }

        let paginator = query
            .order_by_desc(expense::Column::SpentOn)
            .order_by_desc(expense::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self, actor, request), fields(category = %request.category))]
    pub async fn create_expense(
        &self,
        actor: &AuthUser,
        request: CreateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
        }

        let created = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(request.category.trim().to_string()),
            amount: Set(positive_money("amount", request.amount)?),
            description: Set(request.description),
            spent_on: Set(request.spent_on),
            location_id: Set(request.location_id),
            created_by: Set(Some(actor.user_id)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(expense_id = %created.id, amount = %created.amount, "Expense recorded");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_expense(
        &self,
        id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let existing = expense::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Expense", id))?;

        let mut active: expense::ActiveModel = existing.into();
        if let Some(category) = request.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(amount) = request.amount {
            active.amount = Set(positive_money("amount", amount)?);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(spent_on) = request.spent_on {
            active.spent_on = Set(spent_on);
        }
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
            active.location_id = Set(Some(location_id));
        }

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = expense::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Expense", id));
        }
        info!(expense_id = %id, "Expense deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_budgets(&self) -> Result<Vec<budget::Model>, ServiceError> {
        Ok(budget::Entity::find()
            .order_by_desc(budget::Column::PeriodStart)
            .order_by_asc(budget::Column::Category)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(category = %request.category))]
    pub async fn create_budget(&self, request: CreateBudgetRequest) -> Result<budget::Model, ServiceError> {
        request.validate()?;
        check_period(request.period_start, request.period_end)?;
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
        }

        let created = budget::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(request.category.trim().to_string()),
            amount: Set(positive_money("amount", request.amount)?),
            period_start: Set(request.period_start),
            period_end: Set(request.period_end),
            location_id: Set(request.location_id),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(budget_id = %created.id, "Budget created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_budget(
        &self,
        id: Uuid,
        request: UpdateBudgetRequest,
    ) -> Result<budget::Model, ServiceError> {
        request.validate()?;
        let existing = budget::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Budget", id))?;
        check_period(
            request.period_start.unwrap_or(existing.period_start),
            request.period_end.unwrap_or(existing.period_end),
        )?;

        let mut active: budget::ActiveModel = existing.into();
        if let Some(category) = request.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(amount) = request.amount {
            active.amount = Set(positive_money("amount", amount)?);
        }
        if let Some(start) = request.period_start {
            active.period_start = Set(start);
        }
        if let Some(end) = request.period_end {
            active.period_end = Set(end);
        }
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
            active.location_id = Set(Some(location_id));
        }

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_budget(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = budget::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Budget", id));
        }
        info!(budget_id = %id, "Budget deleted");
        Ok(())
    }

    /// Spending against every budget, optionally only those covering `on`.
    #[instrument(skip(self))]
    pub async fn budget_summary(&self, on: Option<NaiveDate>) -> Result<Vec<BudgetStatus>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = budget::Entity::find();
        if let Some(date) = on {
            query = query
                .filter(budget::Column::PeriodStart.lte(date))
                .filter(budget::Column::PeriodEnd.gte(date));
        }
        let budgets = query
            .order_by_asc(budget::Column::Category)
            .all(db)
            .await?;

        let mut statuses = Vec::with_capacity(budgets.len());
        for budget in budgets {
            let mut expenses = expense::Entity::find()
                .filter(expense::Column::Category.eq(budget.category.as_str()))
                .filter(expense::Column::SpentOn.gte(budget.period_start))
                .filter(expense::Column::SpentOn.lte(budget.period_end));
            if let Some(location_id) = budget.location_id {
                expenses = expenses.filter(expense::Column::LocationId.eq(location_id));
            }
            let spent: Decimal = expenses
                .all(db)
                .await?
                .iter()
                .map(|e| e.amount)
                .sum();
            statuses.push(BudgetStatus::compute(budget, spent));
        }
        Ok(statuses)
    }

    async fn ensure_location(&self, id: Uuid) -> Result<(), ServiceError> {
        if location::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Location {} does not exist",
                id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::entities::user::UserRole;
    use crate::services::devices::tests::{actor, seed_worker};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(category: &str, amount: Decimal, spent_on: NaiveDate) -> CreateExpenseRequest {
        CreateExpenseRequest {
            category: category.into(),
            amount,
            description: None,
            spent_on,
            location_id: None,
        }
    }

    #[test]
    fn budget_status_math() {
        let now = Utc::now();
        let budget = budget::Model {
            id: Uuid::new_v4(),
            category: "parts".into(),
            amount: dec!(300.00),
            period_start: date(2024, 1, 1),
            period_end: date(2024, 1, 31),
            location_id: None,
            created_at: now,
        };
        let status = BudgetStatus::compute(budget, dec!(100.00));
        assert_eq!(status.remaining, dec!(200.00));
        assert_eq!(status.percent_used, dec!(33.33));
        assert!(!status.over_budget);
    }

    #[tokio::test]
    async fn summary_counts_matching_expenses_only() {
        let pool = migrated_memory_pool().await;
        let worker = seed_worker(&pool, UserRole::Manager).await;
        let who = actor(&worker);
        let svc = FinanceService::new(pool);

        svc.create_budget(CreateBudgetRequest {
            category: "parts".into(),
            amount: dec!(500),
            period_start: date(2024, 3, 1),
            period_end: date(2024, 3, 31),
            location_id: None,
        })
        .await
        .unwrap();

        svc.create_expense(&who, expense("parts", dec!(400), date(2024, 3, 5))).await.unwrap();
        svc.create_expense(&who, expense("parts", dec!(150), date(2024, 3, 31))).await.unwrap();
        svc.create_expense(&who, expense("parts", dec!(999), date(2024, 4, 1))).await.unwrap();
        svc.create_expense(&who, expense("rent", dec!(999), date(2024, 3, 10))).await.unwrap();

        let summary = svc.budget_summary(Some(date(2024, 3, 15))).await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].spent, dec!(550));
        assert_eq!(summary[0].remaining, dec!(-50));
        assert_eq!(summary[0].percent_used, dec!(110.00));
        assert!(summary[0].over_budget);

        assert!(svc.budget_summary(Some(date(2024, 5, 1))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_rules() {
        let pool = migrated_memory_pool().await;
        let worker = seed_worker(&pool, UserRole::Manager).await;
        let svc = FinanceService::new(pool);

        assert_matches!(
            svc.create_expense(&actor(&worker), expense("parts", dec!(0), date(2024, 1, 1)))
                .await,
            Err(ServiceError::FieldValidation(_))
        );
        assert_matches!(
            svc.create_budget(CreateBudgetRequest {
                category: "parts".into(),
                amount: dec!(10),
                period_start: date(2024, 2, 1),
                period_end: date(2024, 1, 1),
                location_id: None,
            })
            .await,
            Err(ServiceError::FieldValidation(_))
        );
    }

    #[tokio::test]
    async fn expenses_filter_by_date_range() {
        let pool = migrated_memory_pool().await;
        let worker = seed_worker(&pool, UserRole::Manager).await;
        let who = actor(&worker);
        let svc = FinanceService::new(pool);
        svc.create_expense(&who, expense("tools", dec!(20), date(2024, 6, 1))).await.unwrap();
        svc.create_expense(&who, expense("tools", dec!(30), date(2024, 6, 20))).await.unwrap();

        let june_first_half = svc
            .list_expenses(
                ExpenseFilter {
                    from: Some(date(2024, 6, 1)),
                    to: Some(date(2024, 6, 15)),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(june_first_half.total, 1);
        assert_eq!(june_first_half.items[0].amount, dec!(20));
    }
}
