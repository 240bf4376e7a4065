use chrono::{DateTime, NaiveDate, Utc};
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
    db::DbPool,
    entities::{
        appointment::{self, AppointmentStatus},
        customer, device, user,
    },
    errors::ServiceError,
    services::{day_end_exclusive, day_start},
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateAppointmentRequest {
    pub customer_id: Uuid,
    pub device_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateAppointmentRequest {
    pub device_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub assigned_to: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), ServiceError> {
    if ends_at <= starts_at {
        return Err(ServiceError::FieldValidation(vec![
            "ends_at: Appointment must end after it starts".to_string(),
        ]));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AppointmentService {
    db_pool: Arc<DbPool>,
}

impl AppointmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: AppointmentFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<appointment::Model>, ServiceError> {
        let mut query = appointment::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(appointment::Column::StartsAt.gte(day_start(from)));
        }
        if let Some(to) = filter.to {
            query = query.filter(appointment::Column::StartsAt.lt(day_end_exclusive(to)));
        }
        if let Some(status) = filter.status {
            query = query.filter(appointment::Column::Status.eq(status));
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.filter(appointment::Column::AssignedTo.eq(assigned_to));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(appointment::Column::CustomerId.eq(customer_id));
        }

        let paginator = query
            .order_by_asc(appointment::Column::StartsAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<appointment::Model, ServiceError> {
        appointment::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        check_window(request.starts_at, request.ends_at)?;
        let db = &*self.db_pool;

        if customer::Entity::find_by_id(request.customer_id).one(db).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "Customer {} does not exist",
                request.customer_id
            )));
        }
        if let Some(device_id) = request.device_id {
            self.ensure_device(device_id).await?;
        }
        if let Some(worker_id) = request.assigned_to {
            self.ensure_worker(worker_id).await?;
        }

        let now = Utc::now();
        let created = appointment::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(request.customer_id),
            device_id: Set(request.device_id),
            assigned_to: Set(request.assigned_to),
            title: Set(request.title.trim().to_string()),
            notes: Set(request.notes),
            starts_at: Set(request.starts_at),
            ends_at: Set(request.ends_at),
            status: Set(AppointmentStatus::Scheduled),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(appointment_id = %created.id, "Appointment booked");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<appointment::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;
        check_window(
            request.starts_at.unwrap_or(existing.starts_at),
            request.ends_at.unwrap_or(existing.ends_at),
        )?;

        let mut active: appointment::ActiveModel = existing.into();
        if let Some(device_id) = request.device_id {
            self.ensure_device(device_id).await?;
            active.device_id = Set(Some(device_id));
        }
        if let Some(worker_id) = request.assigned_to {
            self.ensure_worker(worker_id).await?;
            active.assigned_to = Set(Some(worker_id));
        }
        if let Some(title) = request.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(starts_at) = request.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = request.ends_at {
            active.ends_at = Set(ends_at);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        info!(appointment_id = %id, status = %updated.status, "Appointment updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = appointment::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Appointment", id));
        }
        info!(appointment_id = %id, "Appointment deleted");
        Ok(())
    }

    async fn ensure_device(&self, id: Uuid) -> Result<(), ServiceError> {
        if device::Entity::find_by_id(id).one(&*self.db_pool).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!("Device {} does not exist", id)));
        }
        Ok(())
    }

    async fn ensure_worker(&self, id: Uuid) -> Result<(), ServiceError> {
        if user::Entity::find_by_id(id).one(&*self.db_pool).await?.is_none() {
            return Err(ServiceError::InvalidInput(format!("Worker {} does not exist", id)));
        }
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

    async fn fixture() -> (AppointmentService, Uuid) {
        let pool = migrated_memory_pool().await;
        let customer = CustomerService::new(pool.clone(), detached_sender())
            .create(customer_request("Noor", "noor@example.com", "555-0100"))
            .await
            .unwrap();
        (AppointmentService::new(pool), customer.id)
    }

    fn booking(customer_id: Uuid, starts_in_hours: i64, hours: i64) -> CreateAppointmentRequest {
        let starts_at = Utc::now() + Duration::hours(starts_in_hours);
        CreateAppointmentRequest {
            customer_id,
            device_id: None,
            assigned_to: None,
            title: "Battery swap".into(),
            notes: None,
            starts_at,
            ends_at: starts_at + Duration::hours(hours),
        }
    }

    #[tokio::test]
    async fn end_must_follow_start() {
        let (svc, customer_id) = fixture().await;
        assert_matches!(
            svc.create(booking(customer_id, 2, 0)).await,
            Err(ServiceError::FieldValidation(_))
        );

        let booked = svc.create(booking(customer_id, 2, 1)).await.unwrap();
        let moved_start = booked.ends_at + Duration::minutes(5);
        assert_matches!(
            svc.update(
                booked.id,
                UpdateAppointmentRequest {
                    starts_at: Some(moved_start),
                    ..Default::default()
                }
            )
            .await,
            Err(ServiceError::FieldValidation(_))
        );
    }

    #[tokio::test]
    async fn status_update_and_filtering() {
        let (svc, customer_id) = fixture().await;
        let first = svc.create(booking(customer_id, 1, 1)).await.unwrap();
        svc.create(booking(customer_id, 3, 1)).await.unwrap();

        let done = svc
            .update(
                first.id,
                UpdateAppointmentRequest {
                    status: Some(AppointmentStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);

        let scheduled = svc
            .list(
                AppointmentFilter {
                    status: Some(AppointmentStatus::Scheduled),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(scheduled.total, 1);

        svc.delete(first.id).await.unwrap();
        assert_matches!(svc.delete(first.id).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_customer_is_rejected() {
        let (svc, _) = fixture().await;
        assert_matches!(
            svc.create(booking(Uuid::new_v4(), 1, 1)).await,
            Err(ServiceError::InvalidInput(_))
        );
    }
}
