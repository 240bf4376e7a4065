use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    db::DbPool,
    entities::{appointment, customer, device, loan_invoice, location, sale},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{normalize_search, search_condition},
    PaginatedResponse,
};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9 +\-()]{7,20}$").expect("valid phone regex"));

pub(crate) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(phone) {
        let mut err = ValidationError::new("phone_format");
        err.message =
            Some("Phone must be 7-20 characters of digits, spaces, +, -, ( or )".into());
        return Err(err);
    }
    Ok(())
}

/// New customer. Required fields are `Option` so a missing value surfaces
/// as a field error instead of a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    #[validate(required, length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(required, email(message = "A valid email address is required"))]
    pub email: Option<String>,
    #[validate(required, custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub location_id: Option<Uuid>,
    pub sms_opt_in: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub location_id: Option<Uuid>,
    pub sms_opt_in: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub location_id: Option<Uuid>,
    pub sms_opt_in: Option<bool>,
}

#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: CustomerFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<customer::Model>, ServiceError> {
        let mut query = customer::Entity::find();
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &term,
                &[
                    customer::Column::FirstName,
                    customer::Column::LastName,
                    customer::Column::Email,
                    customer::Column::Phone,
                ],
            ));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(customer::Column::LocationId.eq(location_id));
        }
        if let Some(opt_in) = filter.sms_opt_in {
            query = query.filter(customer::Column::SmsOptIn.eq(opt_in));
        }

        let paginator = query
            .order_by_asc(customer::Column::LastName)
            .order_by_asc(customer::Column::FirstName)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, request: CreateCustomerRequest) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let (first_name, last_name, email, phone) = match (
            request.first_name,
            request.last_name,
            request.email,
            request.phone,
        ) {
            (Some(f), Some(l), Some(e), Some(p)) => (f, l, e, p),
            _ => {
                return Err(ServiceError::ValidationError(
                    "first_name, last_name, email and phone are required".to_string(),
                ))
            }
        };
        let email = email.trim().to_lowercase();

        self.ensure_email_free(&email, None).await?;
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
        }

        let now = Utc::now();
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(first_name.trim().to_string()),
            last_name: Set(last_name.trim().to_string()),
            email: Set(email),
            phone: Set(phone.trim().to_string()),
            address: Set(request.address),
            notes: Set(request.notes),
            location_id: Set(request.location_id),
            sms_opt_in: Set(request.sms_opt_in.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(customer_id = %created.id, "Customer created");
        self.event_sender
            .send_or_log(Event::CustomerCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;

        let mut active: customer::ActiveModel = existing.into();
        if let Some(first_name) = request.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = request.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            self.ensure_email_free(&email, Some(id)).await?;
            active.email = Set(email);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone.trim().to_string());
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
            active.location_id = Set(Some(location_id));
        }
        if let Some(opt_in) = request.sms_opt_in {
            active.sms_opt_in = Set(opt_in);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        info!(customer_id = %id, "Customer updated");
        Ok(updated)
    }

    /// Refused while repair tickets, sales, loans or appointments point at
    /// the customer. Group memberships go with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let devices = device::Entity::find()
            .filter(device::Column::CustomerId.eq(id))
            .count(db)
            .await?;
        let sales = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(id))
            .count(db)
            .await?;
        let loans = loan_invoice::Entity::find()
            .filter(loan_invoice::Column::CustomerId.eq(id))
            .count(db)
            .await?;
        let appointments = appointment::Entity::find()
            .filter(appointment::Column::CustomerId.eq(id))
            .count(db)
            .await?;

        if devices + sales + loans + appointments > 0 {
            warn!(customer_id = %id, devices, sales, loans, appointments, "Customer still referenced");
            return Err(ServiceError::Conflict(format!(
                "Customer has {} devices, {} sales, {} loan invoices and {} appointments on record",
                devices, sales, loans, appointments
            )));
        }

        customer::Entity::delete_by_id(id).exec(db).await?;
        info!(customer_id = %id, "Customer deleted");
        self.event_sender
            .send_or_log(Event::CustomerDeleted(id))
            .await;
        Ok(())
    }

    /// Repair tickets for one customer, newest first.
    #[instrument(skip(self))]
    pub async fn devices(&self, id: Uuid) -> Result<Vec<device::Model>, ServiceError> {
        self.get(id).await?;
        Ok(device::Entity::find()
            .filter(device::Column::CustomerId.eq(id))
            .order_by_desc(device::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = customer::Entity::find().filter(customer::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(customer::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "A customer with email {} already exists",
                email
            )));
        }
        Ok(())
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
pub(crate) mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::events::detached_sender;
    use assert_matches::assert_matches;
    use rstest::rstest;

    pub(crate) fn customer_request(first: &str, email: &str, phone: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            first_name: Some(first.into()),
            last_name: Some("Rivera".into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("555-0100", true)]
    #[case("+1 (555) 010-0200", true)]
    #[case("12345", false)]
    #[case("555-CALL-NOW", false)]
    fn phone_rules(#[case] phone: &str, #[case] ok: bool) {
        assert_eq!(validate_phone(phone).is_ok(), ok);
    }

    #[tokio::test]
    async fn missing_email_is_a_field_error() {
        let svc = CustomerService::new(migrated_memory_pool().await, detached_sender());
        let mut request = customer_request("Lee", "unused@example.com", "555-0100");
        request.email = None;

        match svc.create(request).await {
            Err(ServiceError::FieldValidation(details)) => {
                assert!(details.iter().any(|d| d.starts_with("email")), "{:?}", details);
            }
            other => panic!("expected field validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn email_is_unique_case_insensitively() {
        let svc = CustomerService::new(migrated_memory_pool().await, detached_sender());
        svc.create(customer_request("Lee", "lee@example.com", "555-0100"))
            .await
            .unwrap();
        assert_matches!(
            svc.create(customer_request("Lee", "LEE@example.com", "555-0101"))
                .await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn search_matches_name_email_and_phone() {
        let svc = CustomerService::new(migrated_memory_pool().await, detached_sender());
        svc.create(customer_request("Maya", "maya@example.com", "555-0199"))
            .await
            .unwrap();
        svc.create(customer_request("Omar", "omar@example.com", "555-0111"))
            .await
            .unwrap();

        let by_name = svc
            .list(
                CustomerFilter {
                    search: Some("Maya".into()),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(by_name.total, 1);

        let by_phone = svc
            .list(
                CustomerFilter {
                    search: Some("0111".into()),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(by_phone.items[0].first_name, "Omar");
    }

    #[tokio::test]
    async fn partial_update_and_delete() {
        let svc = CustomerService::new(migrated_memory_pool().await, detached_sender());
        let created = svc
            .create(customer_request("Ivy", "ivy@example.com", "555-0100"))
            .await
            .unwrap();
        assert!(created.sms_opt_in);

        let updated = svc
            .update(
                created.id,
                UpdateCustomerRequest {
                    sms_opt_in: Some(false),
                    notes: Some("Prefers email".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.sms_opt_in);
        assert_eq!(updated.email, "ivy@example.com");

        svc.delete(created.id).await.unwrap();
        assert_matches!(svc.get(created.id).await, Err(ServiceError::NotFound(_)));
    }
}
