use chrono::Utc;
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
use validator::{Validate, ValidationError};

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{inventory_item, location, notification::NotificationKind, sale_item, stock_adjustment},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        normalize_search, notifications::notify, search_condition, settings::SettingsService,
        validate_non_negative_amount,
    },
    PaginatedResponse,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateInventoryItemRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    /// Defaults to the `default_reorder_level` business setting.
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
    #[validate(range(min = 0))]
    pub reorder_quantity: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[validate(custom = "validate_non_negative_amount")]
    pub cost_price: Decimal,
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Decimal,
    #[validate(length(max = 150))]
    pub supplier: Option<String>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateInventoryItemRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub reorder_level: Option<i32>,
    #[validate(range(min = 0))]
    pub reorder_quantity: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[validate(custom = "validate_non_negative_amount")]
    pub cost_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_amount")]
    pub selling_price: Option<Decimal>,
    #[validate(length(max = 150))]
    pub supplier: Option<String>,
    pub location_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Signed stock movement. Quantity itself is only changed through here.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AdjustStockRequest {
    #[validate(custom = "validate_delta")]
    pub delta: i32,
    #[validate(length(min = 1, max = 255))]
    pub reason: String,
}

fn validate_delta(delta: i32) -> Result<(), ValidationError> {
    if delta == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("Adjustment must change the quantity".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub low_stock: Option<bool>,
    pub active: Option<bool>,
}

pub(crate) fn low_stock_condition() -> sea_orm::sea_query::SimpleExpr {
    Expr::col(inventory_item::Column::Quantity).lte(Expr::col(inventory_item::Column::ReorderLevel))
}

/// Applies a stock delta on `conn`, writing the audit row. Fails with
/// `InsufficientStock` instead of going negative.
/// The quantity changes in place (`quantity = quantity + delta`) guarded by
/// `quantity + delta >= 0`; `item` is only used for identity.
pub(crate) async fn apply_stock_delta<C: ConnectionTrait>(
    conn: &C,
    item: inventory_item::Model,
    delta: i32,
    reason: String,
    adjusted_by: Option<Uuid>,
) -> Result<inventory_item::Model, ServiceError> {
    if item.quantity.checked_add(delta).is_none() {
        return Err(ServiceError::InvalidInput(
            "Stock adjustment overflows the quantity".to_string(),
        ));
    }

    let result = inventory_item::Entity::update_many()
        .col_expr(
            inventory_item::Column::Quantity,
            Expr::col(inventory_item::Column::Quantity).add(delta),
        )
        .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(inventory_item::Column::Id.eq(item.id))
        .filter(Expr::expr(Expr::col(inventory_item::Column::Quantity).add(delta)).gte(0))
        .exec(conn)
        .await?;

    let current = inventory_item::Entity::find_by_id(item.id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Inventory item", item.id))?;

    if result.rows_affected == 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "{} ({}) has {} in stock, {} requested",
            current.name, current.sku, current.quantity, -delta
        )));
    }

    stock_adjustment::ActiveModel {
        id: Set(Uuid::new_v4()),
        item_id: Set(current.id),
        delta: Set(delta),
        quantity_after: Set(current.quantity),
        reason: Set(reason),
        adjusted_by: Set(adjusted_by),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    Ok(current)
}

#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    settings: SettingsService,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, settings: SettingsService) -> Self {
        Self {
            db_pool,
            event_sender,
            settings,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: InventoryFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<inventory_item::Model>, ServiceError> {
        let mut query = inventory_item::Entity::find();
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(search_condition(
                &term,
                &[inventory_item::Column::Name, inventory_item::Column::Sku],
            ));
        }
        if let Some(category) = normalize_search(filter.category.as_deref()) {
            query = query.filter(inventory_item::Column::Category.eq(category));
        }
        if filter.low_stock == Some(true) {
            query = query.filter(low_stock_condition());
        }
        if let Some(active) = filter.active {
            query = query.filter(inventory_item::Column::IsActive.eq(active));
        }

        let paginator = query
            .order_by_asc(inventory_item::Column::Name)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    /// Active items at or below their reorder level, emptiest first.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::IsActive.eq(true))
            .filter(low_stock_condition())
            .order_by_asc(inventory_item::Column::Quantity)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<inventory_item::Model, ServiceError> {
        inventory_item::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", id))
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create(
        &self,
        request: CreateInventoryItemRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        request.validate()?;
        let sku = request.sku.trim().to_uppercase();
        self.ensure_sku_free(&sku, None).await?;
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
        }

        let reorder_level = match request.reorder_level {
            Some(level) => level,
            None => self.settings.business_settings().await?.default_reorder_level,
        };

        let now = Utc::now();
        let created = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            sku: Set(sku),
            category: Set(request.category),
            description: Set(request.description),
            quantity: Set(request.quantity.unwrap_or(0)),
            reorder_level: Set(reorder_level),
            reorder_quantity: Set(request.reorder_quantity.unwrap_or(0)),
            lead_time_days: Set(request.lead_time_days.unwrap_or(7)),
            cost_price: Set(request.cost_price),
            selling_price: Set(request.selling_price),
            supplier: Set(request.supplier),
            location_id: Set(request.location_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(item_id = %created.id, sku = %created.sku, "Inventory item created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateInventoryItemRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        request.validate()?;
        let existing = self.get(id).await?;

        let mut active: inventory_item::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(sku) = request.sku {
            let sku = sku.trim().to_uppercase();
            self.ensure_sku_free(&sku, Some(id)).await?;
            active.sku = Set(sku);
        }
        if let Some(v) = request.category {
            active.category = Set(Some(v));
        }
        if let Some(v) = request.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = request.reorder_level {
            active.reorder_level = Set(v);
        }
        if let Some(v) = request.reorder_quantity {
            active.reorder_quantity = Set(v);
        }
        if let Some(v) = request.lead_time_days {
            active.lead_time_days = Set(v);
        }
        if let Some(v) = request.cost_price {
            active.cost_price = Set(v);
        }
        if let Some(v) = request.selling_price {
            active.selling_price = Set(v);
        }
        if let Some(v) = request.supplier {
            active.supplier = Set(Some(v));
        }
        if let Some(location_id) = request.location_id {
            self.ensure_location(location_id).await?;
            active.location_id = Set(Some(location_id));
        }
        if let Some(v) = request.is_active {
            active.is_active = Set(v);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        info!(item_id = %id, "Inventory item updated");
        Ok(updated)
    }

    /// Hard delete unless the item appears on a sale.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get(id).await?;

        let sold = sale_item::Entity::find()
            .filter(sale_item::Column::InventoryItemId.eq(id))
            .count(db)
            .await?;
        if sold > 0 {
            return Err(ServiceError::Conflict(format!(
                "Item appears on {} sale lines; deactivate it instead",
                sold
            )));
        }

        let txn = db.begin().await?;
        stock_adjustment::Entity::delete_many()
            .filter(stock_adjustment::Column::ItemId.eq(id))
            .exec(&txn)
            .await?;
        inventory_item::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(item_id = %id, "Inventory item deleted");
        Ok(())
    }

    #[instrument(skip(self, actor, request), fields(delta = request.delta))]
    pub async fn adjust(
        &self,
        actor: &AuthUser,
        id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<inventory_item::Model, ServiceError> {
        request.validate()?;
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, item_id = %id, "Failed to start stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        let item = inventory_item::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", id))?;
        let was_low = item.is_low_stock();

        let updated = apply_stock_delta(
            &txn,
            item,
            request.delta,
            request.reason.trim().to_string(),
            Some(actor.user_id),
        )
        .await?;

        let became_low = updated.is_low_stock() && !was_low;
        if became_low {
            notify(
                &txn,
                None,
                "Low stock",
                format!(
                    "{} ({}) is down to {} units",
                    updated.name, updated.sku, updated.quantity
                ),
                NotificationKind::Inventory,
            )
            .await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, item_id = %id, "Failed to commit stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %id, quantity = updated.quantity, "Stock adjusted");
        self.event_sender
            .send_or_log(Event::StockAdjusted {
                item_id: id,
                delta: request.delta,
                quantity: updated.quantity,
            })
            .await;
        if updated.is_low_stock() {
            warn!(item_id = %id, quantity = updated.quantity, "Item at or below reorder level");
            self.event_sender
                .send_or_log(Event::StockLow {
                    item_id: id,
                    quantity: updated.quantity,
                    reorder_level: updated.reorder_level,
                })
                .await;
        }
        Ok(updated)
    }

    /// Stock movements for one item, newest first.
    #[instrument(skip(self))]
    pub async fn adjustments(&self, id: Uuid) -> Result<Vec<stock_adjustment::Model>, ServiceError> {
        self.get(id).await?;
        Ok(stock_adjustment::Entity::find()
            .filter(stock_adjustment::Column::ItemId.eq(id))
            .order_by_desc(stock_adjustment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    async fn ensure_sku_free(&self, sku: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = inventory_item::Entity::find().filter(inventory_item::Column::Sku.eq(sku));
        if let Some(id) = except {
            query = query.filter(inventory_item::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
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
    use crate::entities::user::UserRole;
    use crate::events::detached_sender;
    use crate::services::devices::tests::{actor, seed_worker};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    pub(crate) fn item_request(sku: &str, quantity: i32) -> CreateInventoryItemRequest {
        CreateInventoryItemRequest {
            name: format!("Part {}", sku),
            sku: sku.into(),
            category: Some("screens".into()),
            description: None,
            quantity: Some(quantity),
            reorder_level: Some(3),
            reorder_quantity: Some(10),
            lead_time_days: Some(5),
            cost_price: dec!(20.00),
            selling_price: dec!(45.00),
            supplier: None,
            location_id: None,
        }
    }

    async fn service() -> (Arc<DbPool>, InventoryService) {
        let pool = migrated_memory_pool().await;
        let events = detached_sender();
        let settings = SettingsService::new(pool.clone(), events.clone(), Duration::from_secs(60));
        (pool.clone(), InventoryService::new(pool, events, settings))
    }

    #[tokio::test]
    async fn sku_is_unique_and_normalized() {
        let (_, svc) = service().await;
        let item = svc.create(item_request("scr-101", 4)).await.unwrap();
        assert_eq!(item.sku, "SCR-101");
        assert_matches!(
            svc.create(item_request("SCR-101", 1)).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn reorder_level_defaults_from_settings() {
        let (_, svc) = service().await;
        let mut request = item_request("BAT-1", 10);
        request.reorder_level = None;
        let item = svc.create(request).await.unwrap();
        assert_eq!(item.reorder_level, 5);
    }

    #[tokio::test]
    async fn negative_prices_are_rejected() {
        let (_, svc) = service().await;
        let mut request = item_request("BAD-1", 1);
        request.cost_price = dec!(-1);
        assert_matches!(svc.create(request).await, Err(ServiceError::FieldValidation(_)));
    }

    #[tokio::test]
    async fn adjust_records_audit_and_refuses_negative() {
        let (pool, svc) = service().await;
        let worker = seed_worker(&pool, UserRole::Technician).await;
        let who = actor(&worker);
        let item = svc.create(item_request("KB-1", 5)).await.unwrap();

        let after = svc
            .adjust(
                &who,
                item.id,
                AdjustStockRequest {
                    delta: -3,
                    reason: "Used in repair".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(after.quantity, 2);
        assert!(after.is_low_stock());

        let result = svc
            .adjust(
                &who,
                item.id,
                AdjustStockRequest {
                    delta: -5,
                    reason: "Oops".into(),
                },
            )
            .await;
        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
        assert_eq!(svc.get(item.id).await.unwrap().quantity, 2);

        let audit = svc.adjustments(item.id).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].delta, -3);
        assert_eq!(audit[0].quantity_after, 2);
        assert_eq!(audit[0].adjusted_by, Some(worker.id));
    }

    #[tokio::test]
    async fn zero_delta_is_invalid() {
        let (pool, svc) = service().await;
        let worker = seed_worker(&pool, UserRole::Technician).await;
        let item = svc.create(item_request("Z-1", 5)).await.unwrap();
        assert_matches!(
            svc.adjust(
                &actor(&worker),
                item.id,
                AdjustStockRequest {
                    delta: 0,
                    reason: "nothing".into()
                }
            )
            .await,
            Err(ServiceError::FieldValidation(_))
        );
    }

    #[tokio::test]
    async fn low_stock_lists_items_at_or_below_level() {
        let (_, svc) = service().await;
        svc.create(item_request("A-1", 3)).await.unwrap();
        svc.create(item_request("A-2", 10)).await.unwrap();
        svc.create(item_request("A-3", 0)).await.unwrap();

        let low = svc.low_stock().await.unwrap();
        let skus: Vec<&str> = low.iter().map(|i| i.sku.as_str()).collect();
        assert_eq!(skus, vec!["A-3", "A-1"]);

        let filtered = svc
            .list(
                InventoryFilter {
                    low_stock: Some(true),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(filtered.total, 2);
    }

    #[tokio::test]
    async fn delete_removes_unsold_item() {
        let (_, svc) = service().await;
        let item = svc.create(item_request("DEL-1", 1)).await.unwrap();
        svc.delete(item.id).await.unwrap();
        assert_matches!(svc.get(item.id).await, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn stock_deltas_apply_to_current_quantity() {
        let (pool, svc) = service().await;
        let item = svc.create(item_request("LCD-9", 10)).await.unwrap();
        let stale = item.clone();

        let first = apply_stock_delta(&*pool, item, -4, "Sale A".into(), None)
            .await
            .unwrap();
        assert_eq!(first.quantity, 6);

        // A second writer still holding the quantity-10 snapshot.
        let second = apply_stock_delta(&*pool, stale.clone(), -4, "Sale B".into(), None)
            .await
            .unwrap();
        assert_eq!(second.quantity, 2);

        assert_matches!(
            apply_stock_delta(&*pool, stale, -4, "Sale C".into(), None).await,
            Err(ServiceError::InsufficientStock(msg)) if msg.contains("has 2 in stock")
        );
        assert_eq!(svc.get(second.id).await.unwrap().quantity, 2);
    }
}
