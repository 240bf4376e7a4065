use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{
        appointment, customer,
        device::{self, DevicePriority, DeviceStatus},
        device_status_history, loan_invoice, location,
        notification::NotificationKind,
        sale, user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        codes::unique_code,
        normalize_search, notifications::notify, search_condition,
        settings::{BusinessSettings, SettingsService},
        validate_non_negative_amount,
    },
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterDeviceRequest {
    pub customer_id: Uuid,
    pub location_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    #[validate(length(min = 1, max = 50))]
    pub device_type: String,
    #[validate(length(min = 1, max = 50))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    #[validate(length(max = 20))]
    pub imei: Option<String>,
    #[validate(length(max = 100))]
    pub password_hint: Option<String>,
    #[validate(length(max = 500))]
    pub accessories: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub problem_description: String,
    pub priority: Option<DevicePriority>,
    #[validate(custom = "validate_non_negative_amount")]
    pub estimated_cost: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub deposit: Option<Decimal>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeviceRequest {
    pub location_id: Option<Uuid>,
    #[validate(length(min = 1, max = 50))]
    pub device_type: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(length(max = 100))]
    pub serial_number: Option<String>,
    #[validate(length(max = 20))]
    pub imei: Option<String>,
    #[validate(length(max = 100))]
    pub password_hint: Option<String>,
    #[validate(length(max = 500))]
    pub accessories: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub problem_description: Option<String>,
    #[validate(length(max = 4000))]
    pub diagnosis: Option<String>,
    pub priority: Option<DevicePriority>,
    #[validate(custom = "validate_non_negative_amount")]
    pub estimated_cost: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub final_cost: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub deposit: Option<Decimal>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ChangeStatusRequest {
    pub status: DeviceStatus,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignTechnicianRequest {
    pub technician_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
    pub customer_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub priority: Option<DevicePriority>,
    pub search: Option<String>,
}

/// Everything needed to print an intake receipt.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceReceipt {
    pub tracking_code: String,
    pub issued_at: DateTime<Utc>,
    pub business: BusinessSettings,
    pub customer: customer::Model,
    pub device: device::Model,
}

/// What an anonymous visitor may learn from a tracking code.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicTracking {
    pub tracking_code: String,
    pub device_type: String,
    pub brand: String,
    pub model: String,
    pub status: DeviceStatus,
    pub status_label: String,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl From<device::Model> for PublicTracking {
    fn from(device: device::Model) -> Self {
        Self {
            status_label: device.status.label().to_string(),
            tracking_code: device.tracking_code,
            device_type: device.device_type,
            brand: device.brand,
            model: device.model,
            status: device.status,
            estimated_completion: device.estimated_completion,
            last_updated: device.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct DeviceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    settings: SettingsService,
}

impl DeviceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, settings: SettingsService) -> Self {
        Self {
            db_pool,
            event_sender,
            settings,
        }
    }

    /// Books a device in: tracking code, first history row, `registered`.
    #[instrument(skip(self, actor, request), fields(customer_id = %request.customer_id))]
    pub async fn register(
        &self,
        actor: &AuthUser,
        request: RegisterDeviceRequest,
    ) -> Result<device::Model, ServiceError> {
        request.validate()?;
        let prefix = self.settings.business_settings().await?.receipt_prefix;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for device registration");
            ServiceError::DatabaseError(e)
        })?;

        if customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Customer {} does not exist",
                request.customer_id
            )));
        }
        if let Some(location_id) = request.location_id {
            ensure_location(&txn, location_id).await?;
        }
        if let Some(technician_id) = request.assigned_to {
            ensure_active_worker(&txn, technician_id).await?;
        }

        let tracking_code = unique_code(&prefix, |code| {
            let txn = &txn;
            async move {
                let taken = device::Entity::find()
                    .filter(device::Column::TrackingCode.eq(code))
                    .count(txn)
                    .await?;
                Ok::<_, ServiceError>(taken > 0)
            }
        })
        .await?;

        let now = Utc::now();
        let device_id = Uuid::new_v4();
        let created = device::ActiveModel {
            id: Set(device_id),
            customer_id: Set(request.customer_id),
            location_id: Set(request.location_id),
            assigned_to: Set(request.assigned_to),
            device_type: Set(request.device_type.trim().to_string()),
            brand: Set(request.brand.trim().to_string()),
            model: Set(request.model.trim().to_string()),
            serial_number: Set(request.serial_number),
            imei: Set(request.imei),
            password_hint: Set(request.password_hint),
            accessories: Set(request.accessories),
            problem_description: Set(request.problem_description),
            diagnosis: Set(None),
            status: Set(DeviceStatus::Registered),
            priority: Set(request.priority.unwrap_or_default()),
            tracking_code: Set(tracking_code.clone()),
            estimated_cost: Set(request.estimated_cost),
            final_cost: Set(None),
            deposit: Set(request.deposit.unwrap_or(Decimal::ZERO)),
            estimated_completion: Set(request.estimated_completion),
            completed_at: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        record_history(&txn, device_id, None, DeviceStatus::Registered, None, Some(actor.user_id)).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, device_id = %device_id, "Failed to commit device registration");
            ServiceError::DatabaseError(e)
        })?;

        info!(device_id = %device_id, tracking_code = %tracking_code, "Device registered");
        self.event_sender
            .send_or_log(Event::DeviceRegistered {
                device_id,
                tracking_code,
            })
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<device::Model, ServiceError> {
        device::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Device", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_tracking_code(&self, code: &str) -> Result<device::Model, ServiceError> {
        let code = code.trim().to_uppercase();
        device::Entity::find()
            .filter(device::Column::TrackingCode.eq(code.as_str()))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No device with tracking code {}", code)))
    }

    /// Anonymous status lookup.
    #[instrument(skip(self))]
    pub async fn public_tracking(&self, code: &str) -> Result<PublicTracking, ServiceError> {
        Ok(self.get_by_tracking_code(code).await?.into())
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: DeviceFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<device::Model>, ServiceError> {
        let mut query = device::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(device::Column::Status.eq(status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(device::Column::CustomerId.eq(customer_id));
        }
        if let Some(assigned_to) = filter.assigned_to {
            query = query.filter(device::Column::AssignedTo.eq(assigned_to));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(device::Column::LocationId.eq(location_id));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(device::Column::Priority.eq(priority));
        }
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &term,
                &[
                    device::Column::Brand,
                    device::Column::Model,
                    device::Column::SerialNumber,
                    device::Column::TrackingCode,
                ],
            ));
        }

        let paginator = query
            .order_by_desc(device::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDeviceRequest,
    ) -> Result<device::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let existing = self.get(id).await?;

        let mut active: device::ActiveModel = existing.into();
        if let Some(location_id) = request.location_id {
            ensure_location(db, location_id).await?;
            active.location_id = Set(Some(location_id));
        }
        if let Some(v) = request.device_type {
            active.device_type = Set(v.trim().to_string());
        }
        if let Some(v) = request.brand {
            active.brand = Set(v.trim().to_string());
        }
        if let Some(v) = request.model {
            active.model = Set(v.trim().to_string());
        }
        if let Some(v) = request.serial_number {
            active.serial_number = Set(Some(v));
        }
        if let Some(v) = request.imei {
            active.imei = Set(Some(v));
        }
        if let Some(v) = request.password_hint {
            active.password_hint = Set(Some(v));
        }
        if let Some(v) = request.accessories {
            active.accessories = Set(Some(v));
        }
        if let Some(v) = request.problem_description {
            active.problem_description = Set(v);
        }
        if let Some(v) = request.diagnosis {
            active.diagnosis = Set(Some(v));
        }
        if let Some(v) = request.priority {
            active.priority = Set(v);
        }
        if let Some(v) = request.estimated_cost {
            active.estimated_cost = Set(Some(v));
        }
        if let Some(v) = request.final_cost {
            active.final_cost = Set(Some(v));
        }
        if let Some(v) = request.deposit {
            active.deposit = Set(v);
        }
        if let Some(v) = request.estimated_completion {
            active.estimated_completion = Set(Some(v));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        info!(device_id = %id, "Device updated");
        Ok(updated)
    }

    /// Moves a ticket to any other status, recording who did it.
    #[instrument(skip(self, actor, request), fields(to = %request.status))]
    pub async fn change_status(
        &self,
        actor: &AuthUser,
        id: Uuid,
        request: ChangeStatusRequest,
    ) -> Result<device::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, device_id = %id, "Failed to start transaction for status change");
            ServiceError::DatabaseError(e)
        })?;

        let existing = device::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Device", id))?;

        let from = existing.status;
        let to = request.status;
        if from == to {
            return Err(ServiceError::InvalidInput(format!(
                "Device is already {}",
                to
            )));
        }

        let now = Utc::now();
        let assigned_to = existing.assigned_to;
        let label = format!("{} {} ({})", existing.brand, existing.model, existing.tracking_code);

        let mut active: device::ActiveModel = existing.into();
        active.status = Set(to);
        match to {
            DeviceStatus::Completed => active.completed_at = Set(Some(now)),
            DeviceStatus::Delivered => active.delivered_at = Set(Some(now)),
            _ => {}
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        record_history(&txn, id, Some(from), to, request.note, Some(actor.user_id)).await?;

        if to == DeviceStatus::ReadyForPickup {
            notify(
                &txn,
                assigned_to,
                "Device ready for pickup",
                format!("{} is ready for pickup", label),
                NotificationKind::Device,
            )
            .await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, device_id = %id, "Failed to commit status change");
            ServiceError::DatabaseError(e)
        })?;

        info!(device_id = %id, from = %from, to = %to, "Device status changed");
        self.event_sender
            .send_or_log(Event::DeviceStatusChanged {
                device_id: id,
                from,
                to,
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, request), fields(technician_id = %request.technician_id))]
    pub async fn assign(
        &self,
        id: Uuid,
        request: AssignTechnicianRequest,
    ) -> Result<device::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;
        ensure_active_worker(db, request.technician_id).await?;

        let mut active: device::ActiveModel = existing.into();
        active.assigned_to = Set(Some(request.technician_id));
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        notify(
            db,
            Some(request.technician_id),
            "New repair assigned",
            format!(
                "{} {} ({}) was assigned to you",
                updated.brand, updated.model, updated.tracking_code
            ),
            NotificationKind::Device,
        )
        .await?;

        info!(device_id = %id, "Technician assigned");
        self.event_sender
            .send_or_log(Event::DeviceAssigned {
                device_id: id,
                technician_id: request.technician_id,
            })
            .await;
        Ok(updated)
    }

    /// Status history, oldest first.
    #[instrument(skip(self))]
    pub async fn history(&self, id: Uuid) -> Result<Vec<device_status_history::Model>, ServiceError> {
        self.get(id).await?;
        Ok(device_status_history::Entity::find()
            .filter(device_status_history::Column::DeviceId.eq(id))
            .order_by_asc(device_status_history::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn receipt(&self, id: Uuid) -> Result<DeviceReceipt, ServiceError> {
        let device = self.get(id).await?;
        let customer = customer::Entity::find_by_id(device.customer_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", device.customer_id))?;
        let business = self.settings.business_settings().await?;

        Ok(DeviceReceipt {
            tracking_code: device.tracking_code.clone(),
            issued_at: Utc::now(),
            business,
            customer,
            device,
        })
    }

    /// Refused once money is attached to the ticket; history goes with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        if device::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Device", id));
        }

        let sales = sale::Entity::find()
            .filter(sale::Column::DeviceId.eq(id))
            .count(&txn)
            .await?;
        let loans = loan_invoice::Entity::find()
            .filter(loan_invoice::Column::DeviceId.eq(id))
            .count(&txn)
            .await?;
        if sales + loans > 0 {
            warn!(device_id = %id, sales, loans, "Device still referenced");
            return Err(ServiceError::Conflict(format!(
                "Device is referenced by {} sales and {} loan invoices",
                sales, loans
            )));
        }

        appointment::Entity::update_many()
            .col_expr(appointment::Column::DeviceId, Expr::value(Option::<Uuid>::None))
            .filter(appointment::Column::DeviceId.eq(id))
            .exec(&txn)
            .await?;
        device_status_history::Entity::delete_many()
            .filter(device_status_history::Column::DeviceId.eq(id))
            .exec(&txn)
            .await?;
        device::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(device_id = %id, "Device deleted");
        Ok(())
    }
}

async fn record_history<C: ConnectionTrait>(
    conn: &C,
    device_id: Uuid,
    from: Option<DeviceStatus>,
    to: DeviceStatus,
    note: Option<String>,
    changed_by: Option<Uuid>,
) -> Result<(), ServiceError> {
    device_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        device_id: Set(device_id),
        from_status: Set(from),
        to_status: Set(to),
        note: Set(note),
        changed_by: Set(changed_by),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn ensure_location<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), ServiceError> {
    if location::Entity::find_by_id(id).one(conn).await?.is_none() {
        return Err(ServiceError::InvalidInput(format!(
            "Location {} does not exist",
            id
        )));
    }
    Ok(())
}

async fn ensure_active_worker<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), ServiceError> {
    match user::Entity::find_by_id(id).one(conn).await? {
        Some(worker) if worker.is_active => Ok(()),
        Some(_) => Err(ServiceError::InvalidInput(format!(
            "Worker {} is inactive",
            id
        ))),
        None => Err(ServiceError::InvalidInput(format!(
            "Worker {} does not exist",
            id
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::entities::{notification, user::UserRole};
    use crate::events::detached_sender;
    use crate::services::customers::{tests::customer_request, CustomerService};
    use assert_matches::assert_matches;
    use std::time::Duration;

    pub(crate) async fn seed_worker(db: &DbPool, role: UserRole) -> user::Model {
        let now = Utc::now();
        let id = Uuid::new_v4();
        user::ActiveModel {
            id: Set(id),
            full_name: Set("Robin Solder".into()),
            email: Set(format!("{}@shop.test", id)),
            password_hash: Set("x".into()),
            role: Set(role),
            location_id: Set(None),
            phone: Set(None),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .unwrap()
    }

    pub(crate) fn actor(worker: &user::Model) -> AuthUser {
        AuthUser::for_worker(worker)
    }

    pub(crate) fn register_request(customer_id: Uuid) -> RegisterDeviceRequest {
        RegisterDeviceRequest {
            customer_id,
            location_id: None,
            assigned_to: None,
            device_type: "Laptop".into(),
            brand: "Lenovo".into(),
            model: "ThinkPad T14".into(),
            serial_number: Some("PF-1234".into()),
            imei: None,
            password_hint: None,
            accessories: Some("Charger".into()),
            problem_description: "Does not power on".into(),
            priority: None,
            estimated_cost: None,
            deposit: None,
            estimated_completion: None,
        }
    }

    struct Fixture {
        pool: Arc<DbPool>,
        svc: DeviceService,
        staff: user::Model,
        customer_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let pool = migrated_memory_pool().await;
        let events = detached_sender();
        let settings = SettingsService::new(pool.clone(), events.clone(), Duration::from_secs(60));
        let svc = DeviceService::new(pool.clone(), events.clone(), settings);
        let customers = CustomerService::new(pool.clone(), events);
        let customer = customers
            .create(customer_request("Kim", "kim@example.com", "555-0100"))
            .await
            .unwrap();
        let staff = seed_worker(&pool, UserRole::Technician).await;
        Fixture {
            pool,
            svc,
            staff,
            customer_id: customer.id,
        }
    }

    #[tokio::test]
    async fn register_sets_code_status_and_history() {
        let f = fixture().await;
        let device = f
            .svc
            .register(&actor(&f.staff), register_request(f.customer_id))
            .await
            .unwrap();

        assert_eq!(device.status, DeviceStatus::Registered);
        assert_eq!(device.priority, DevicePriority::Normal);
        assert!(device.tracking_code.starts_with("RD-"));
        assert_eq!(device.tracking_code.len(), "RD-240101-ABCDEF".len());

        let history = f.svc.history(device.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_status, None);
        assert_eq!(history[0].to_status, DeviceStatus::Registered);
    }

    #[tokio::test]
    async fn unknown_customer_is_rejected() {
        let f = fixture().await;
        assert_matches!(
            f.svc
                .register(&actor(&f.staff), register_request(Uuid::new_v4()))
                .await,
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn status_changes_are_recorded_and_visible() {
        let f = fixture().await;
        let who = actor(&f.staff);
        let device = f.svc.register(&who, register_request(f.customer_id)).await.unwrap();

        // Skipping ahead is allowed.
        let completed = f
            .svc
            .change_status(
                &who,
                device.id,
                ChangeStatusRequest {
                    status: DeviceStatus::Completed,
                    note: Some("Replaced DC jack".into()),
                },
            )
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());

        let delivered = f
            .svc
            .change_status(
                &who,
                device.id,
                ChangeStatusRequest {
                    status: DeviceStatus::Delivered,
                    note: None,
                },
            )
            .await
            .unwrap();
        assert!(delivered.delivered_at.is_some());

        assert_eq!(f.svc.get(device.id).await.unwrap().status, DeviceStatus::Delivered);
        let history = f.svc.history(device.id).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].from_status, Some(DeviceStatus::Registered));
        assert_eq!(history[1].note.as_deref(), Some("Replaced DC jack"));
        assert_eq!(history[2].changed_by, Some(f.staff.id));
    }

    #[tokio::test]
    async fn same_status_is_rejected() {
        let f = fixture().await;
        let who = actor(&f.staff);
        let device = f.svc.register(&who, register_request(f.customer_id)).await.unwrap();
        assert_matches!(
            f.svc
                .change_status(
                    &who,
                    device.id,
                    ChangeStatusRequest {
                        status: DeviceStatus::Registered,
                        note: None,
                    },
                )
                .await,
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn ready_for_pickup_notifies_assignee() {
        let f = fixture().await;
        let who = actor(&f.staff);
        let device = f.svc.register(&who, register_request(f.customer_id)).await.unwrap();
        f.svc
            .assign(
                device.id,
                AssignTechnicianRequest {
                    technician_id: f.staff.id,
                },
            )
            .await
            .unwrap();
        f.svc
            .change_status(
                &who,
                device.id,
                ChangeStatusRequest {
                    status: DeviceStatus::ReadyForPickup,
                    note: None,
                },
            )
            .await
            .unwrap();

        let notes = notification::Entity::find()
            .filter(notification::Column::UserId.eq(f.staff.id))
            .all(&*f.pool)
            .await
            .unwrap();
        assert!(notes.iter().any(|n| n.title == "Device ready for pickup"));
    }

    #[tokio::test]
    async fn tracking_lookup_is_case_insensitive_and_public_view_is_narrow() {
        let f = fixture().await;
        let device = f
            .svc
            .register(&actor(&f.staff), register_request(f.customer_id))
            .await
            .unwrap();

        let public = f
            .svc
            .public_tracking(&device.tracking_code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(public.tracking_code, device.tracking_code);
        assert_eq!(public.status_label, "Received");

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("customer_id").is_none());
        assert!(json.get("password_hint").is_none());
    }

    #[tokio::test]
    async fn assigning_inactive_worker_fails() {
        let f = fixture().await;
        let device = f
            .svc
            .register(&actor(&f.staff), register_request(f.customer_id))
            .await
            .unwrap();
        let gone = seed_worker(&f.pool, UserRole::Technician).await;
        let mut active: user::ActiveModel = gone.clone().into();
        active.is_active = Set(false);
        active.update(&*f.pool).await.unwrap();

        assert_matches!(
            f.svc
                .assign(device.id, AssignTechnicianRequest { technician_id: gone.id })
                .await,
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn receipt_and_delete() {
        let f = fixture().await;
        let device = f
            .svc
            .register(&actor(&f.staff), register_request(f.customer_id))
            .await
            .unwrap();
        let receipt = f.svc.receipt(device.id).await.unwrap();
        assert_eq!(receipt.business.business_name, "RepairDesk");
        assert_eq!(receipt.customer.id, f.customer_id);

        f.svc.delete(device.id).await.unwrap();
        assert_matches!(f.svc.get(device.id).await, Err(ServiceError::NotFound(_)));
    }
}
