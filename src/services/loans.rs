use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        customer, device,
        loan_invoice::{self, LoanStatus},
        loan_payment,
        sale::PaymentMethod,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        codes::{unique_code, LOAN_PREFIX},
        positive_money, validate_positive_amount,
    },
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLoanRequest {
    pub customer_id: Uuid,
    pub device_id: Option<Uuid>,
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RecordPaymentRequest {
    #[validate(custom = "validate_positive_amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub method: PaymentMethod,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub status: Option<LoanStatus>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanWithPayments {
    #[serde(flatten)]
    pub invoice: loan_invoice::Model,
    pub outstanding: Decimal,
    pub payments: Vec<loan_payment::Model>,
}

/// Replaces the stored status with the one callers should see today.
fn as_reported(mut invoice: loan_invoice::Model, today: NaiveDate) -> loan_invoice::Model {
    invoice.status = invoice.effective_status(today);
    invoice
}

fn status_condition(status: LoanStatus, today: NaiveDate) -> Condition {
    match status {
        LoanStatus::Overdue => Condition::all()
            .add(loan_invoice::Column::Status.ne(LoanStatus::Paid))
            .add(loan_invoice::Column::DueDate.lt(today)),
        LoanStatus::Paid => Condition::all().add(loan_invoice::Column::Status.eq(LoanStatus::Paid)),
        open => Condition::all()
            .add(loan_invoice::Column::Status.eq(open))
            .add(loan_invoice::Column::DueDate.gte(today)),
    }
}

#[derive(Clone)]
pub struct LoanService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LoanService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: LoanFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<loan_invoice::Model>, ServiceError> {
        let today = Utc::now().date_naive();
        let mut query = loan_invoice::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(status_condition(status, today));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(loan_invoice::Column::CustomerId.eq(customer_id));
        }

        let paginator = query
            .order_by_asc(loan_invoice::Column::DueDate)
            .order_by_desc(loan_invoice::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(|invoice| as_reported(invoice, today))
            .collect();
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<LoanWithPayments, ServiceError> {
        let invoice = loan_invoice::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Loan", id))?;
        let payments = invoice
            .find_related(loan_payment::Entity)
            .order_by_asc(loan_payment::Column::PaidAt)
            .all(&*self.db_pool)
            .await?;

        let invoice = as_reported(invoice, Utc::now().date_naive());
        Ok(LoanWithPayments {
            outstanding: invoice.outstanding(),
            invoice,
            payments,
        })
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(&self, request: CreateLoanRequest) -> Result<loan_invoice::Model, ServiceError> {
        request.validate()?;
        let amount = positive_money("amount", request.amount)?;
        let db = &*self.db_pool;

        if customer::Entity::find_by_id(request.customer_id).one(db).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "Customer {} does not exist",
                request.customer_id
            )));
        }
        if let Some(device_id) = request.device_id {
            if device::Entity::find_by_id(device_id).one(db).await?.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Device {} does not exist",
                    device_id
                )));
            }
        }

        let invoice_number = unique_code(LOAN_PREFIX, |code| async move {
            let taken = loan_invoice::Entity::find()
                .filter(loan_invoice::Column::InvoiceNumber.eq(code))
                .count(db)
                .await?;
            Ok::<_, ServiceError>(taken > 0)
        })
        .await?;

        let now = Utc::now();
        let created = loan_invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(invoice_number),
            customer_id: Set(request.customer_id),
            device_id: Set(request.device_id),
            amount: Set(amount),
            paid_amount: Set(Decimal::ZERO),
            due_date: Set(request.due_date),
            status: Set(LoanStatus::Pending),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(loan_id = %created.id, invoice = %created.invoice_number, amount = %created.amount, "Loan invoice created");
        Ok(as_reported(created, now.date_naive()))
    }

    /// Applies a payment. Overpaying is rejected rather than credited.
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn record_payment(
        &self,
        id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<LoanWithPayments, ServiceError> {
        request.validate()?;
        let amount = positive_money("amount", request.amount)?;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for loan payment");
            ServiceError::DatabaseError(e)
        })?;

        let invoice = loan_invoice::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Loan", id))?;

        let outstanding = invoice.outstanding();
        if amount > outstanding {
            return Err(ServiceError::InvalidInput(format!(
                "Payment of {} exceeds outstanding balance of {}",
                amount, outstanding
            )));
        }

        let now = Utc::now();
        let paid_amount = invoice.paid_amount + amount;
        let status = if paid_amount >= invoice.amount {
            LoanStatus::Paid
        } else {
            LoanStatus::Partial
        };

        // Compare-and-set on the balance read above; a payment committed in
        // between makes this match nothing.
        let result = loan_invoice::Entity::update_many()
            .col_expr(loan_invoice::Column::PaidAmount, Expr::value(paid_amount))
            .col_expr(loan_invoice::Column::Status, Expr::value(status))
            .col_expr(loan_invoice::Column::UpdatedAt, Expr::value(now))
            .filter(loan_invoice::Column::Id.eq(id))
            .filter(loan_invoice::Column::PaidAmount.eq(invoice.paid_amount))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Loan {} balance changed while recording the payment; retry",
                id
            )));
        }

        loan_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(id),
            amount: Set(amount),
            method: Set(request.method),
            note: Set(request.note),
            paid_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, loan_id = %id, "Failed to commit loan payment");
            ServiceError::DatabaseError(e)
        })?;

        info!(loan_id = %id, status = %status, "Loan payment recorded");
        self.event_sender
            .send_or_log(Event::LoanPaymentRecorded {
                invoice_id: id,
                amount,
            })
            .await;

        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let invoice = loan_invoice::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Loan", id))?;

        let payments = invoice.find_related(loan_payment::Entity).count(db).await?;
        if payments > 0 {
            return Err(ServiceError::Conflict(format!(
                "Loan {} has {} recorded payment(s) and cannot be deleted",
                invoice.invoice_number, payments
            )));
        }

        invoice.delete(db).await?;
        info!(loan_id = %id, "Loan invoice deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::events::detached_sender;
    use crate::services::customers::{tests::customer_request, CustomerService};
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn fixture() -> (LoanService, customer::Model) {
        let pool = migrated_memory_pool().await;
        let events = detached_sender();
        let customer = CustomerService::new(pool.clone(), events.clone())
            .create(customer_request("Ada", "ada@example.com", "555-0100"))
            .await
            .unwrap();
        (LoanService::new(pool, events), customer)
    }

    fn loan(customer_id: Uuid, amount: Decimal, due_date: NaiveDate) -> CreateLoanRequest {
        CreateLoanRequest {
            customer_id,
            device_id: None,
            amount,
            due_date,
            notes: None,
        }
    }

    fn payment(amount: Decimal) -> RecordPaymentRequest {
        RecordPaymentRequest {
            amount,
            method: PaymentMethod::Cash,
            note: None,
        }
    }

    fn next_week() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(7)
    }

    #[tokio::test]
    async fn payments_move_status_to_partial_then_paid() {
        let (svc, customer) = fixture().await;
        let invoice = svc.create(loan(customer.id, dec!(100), next_week())).await.unwrap();
        assert!(invoice.invoice_number.starts_with("L-"));
        assert_eq!(invoice.status, LoanStatus::Pending);

        let after_first = svc.record_payment(invoice.id, payment(dec!(40))).await.unwrap();
        assert_eq!(after_first.invoice.status, LoanStatus::Partial);
        assert_eq!(after_first.outstanding, dec!(60));

        let after_second = svc.record_payment(invoice.id, payment(dec!(60))).await.unwrap();
        assert_eq!(after_second.invoice.status, LoanStatus::Paid);
        assert_eq!(after_second.payments.len(), 2);
    }

    #[tokio::test]
    async fn overpayment_is_rejected_and_nothing_written() {
        let (svc, customer) = fixture().await;
        let invoice = svc.create(loan(customer.id, dec!(50), next_week())).await.unwrap();

        assert_matches!(
            svc.record_payment(invoice.id, payment(dec!(50.01))).await,
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            svc.record_payment(invoice.id, payment(dec!(0))).await,
            Err(ServiceError::FieldValidation(_))
        );
        let loaded = svc.get(invoice.id).await.unwrap();
        assert!(loaded.payments.is_empty());
        assert_eq!(loaded.invoice.paid_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn sub_cent_amounts_round_to_nothing_and_are_rejected() {
        let (svc, customer) = fixture().await;
        assert_matches!(
            svc.create(loan(customer.id, dec!(0.004), next_week())).await,
            Err(ServiceError::FieldValidation(_))
        );

        let invoice = svc.create(loan(customer.id, dec!(100), next_week())).await.unwrap();
        assert_matches!(
            svc.record_payment(invoice.id, payment(dec!(0.004))).await,
            Err(ServiceError::FieldValidation(_))
        );
        let loaded = svc.get(invoice.id).await.unwrap();
        assert_eq!(loaded.invoice.status, LoanStatus::Pending);
        assert!(loaded.payments.is_empty());

        let rounded_up = svc.record_payment(invoice.id, payment(dec!(0.005))).await.unwrap();
        assert_eq!(rounded_up.payments[0].amount, dec!(0.01));
        assert_eq!(rounded_up.outstanding, dec!(99.99));
    }

    #[tokio::test]
    async fn past_due_reads_overdue_and_filters() {
        let (svc, customer) = fixture().await;
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let late = svc.create(loan(customer.id, dec!(80), yesterday)).await.unwrap();
        svc.create(loan(customer.id, dec!(20), next_week())).await.unwrap();
        assert_eq!(late.status, LoanStatus::Overdue);

        let overdue = svc
            .list(
                LoanFilter {
                    status: Some(LoanStatus::Overdue),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(overdue.total, 1);
        assert_eq!(overdue.items[0].id, late.id);

        let pending = svc
            .list(
                LoanFilter {
                    status: Some(LoanStatus::Pending),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(pending.total, 1);
    }

    #[tokio::test]
    async fn delete_refused_once_paid_into() {
        let (svc, customer) = fixture().await;
        let untouched = svc.create(loan(customer.id, dec!(10), next_week())).await.unwrap();
        svc.delete(untouched.id).await.unwrap();

        let paid_into = svc.create(loan(customer.id, dec!(10), next_week())).await.unwrap();
        svc.record_payment(paid_into.id, payment(dec!(5))).await.unwrap();
        assert_matches!(svc.delete(paid_into.id).await, Err(ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_customer_is_bad_input() {
        let (svc, _) = fixture().await;
        assert_matches!(
            svc.create(loan(Uuid::new_v4(), dec!(10), next_week())).await,
            Err(ServiceError::InvalidInput(_))
        );
    }
}
