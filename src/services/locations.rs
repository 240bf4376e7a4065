use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{customer, device, location, user},
    errors::ServiceError,
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct LocationService {
    db_pool: Arc<DbPool>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        active: Option<bool>,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<location::Model>, ServiceError> {
        let mut query = location::Entity::find();
        if let Some(active) = active {
            query = query.filter(location::Column::IsActive.eq(active));
        }
        let paginator = query
            .order_by_asc(location::Column::Name)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Location", id))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateLocationRequest) -> Result<location::Model, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let created = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            address: Set(request.address),
            phone: Set(request.phone),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(location_id = %created.id, "Location created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateLocationRequest,
    ) -> Result<location::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;

        let mut active: location::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Hard delete, refused while workers, customers or devices point here.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let workers = user::Entity::find()
            .filter(user::Column::LocationId.eq(id))
            .count(db)
            .await?;
        let customers = customer::Entity::find()
            .filter(customer::Column::LocationId.eq(id))
            .count(db)
            .await?;
        let devices = device::Entity::find()
            .filter(device::Column::LocationId.eq(id))
            .count(db)
            .await?;

        if workers + customers + devices > 0 {
            warn!(location_id = %id, workers, customers, devices, "Location still referenced");
            return Err(ServiceError::Conflict(format!(
                "Location is still used by {} workers, {} customers and {} devices",
                workers, customers, devices
            )));
        }

        location::Entity::delete_by_id(id).exec(db).await?;
        info!(location_id = %id, "Location deleted");
        Ok(())
    }
}
