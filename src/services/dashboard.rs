use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, Iterable, PaginatorTrait, QueryFilter};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    auth::AuthUser,
    db::DbPool,
    entities::{
        customer,
        device::{self, DeviceStatus},
        inventory_item, sale,
    },
    errors::ServiceError,
    services::{day_start, inventory::low_stock_condition, notifications::NotificationService},
};

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SalesTotals {
    pub count: u64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub customers: u64,
    /// Every status is present, zero when unused.
    pub devices_by_status: BTreeMap<String, u64>,
    pub open_repairs: u64,
    pub ready_for_pickup: u64,
    pub sales_today: SalesTotals,
    pub sales_this_month: SalesTotals,
    pub low_stock_items: u64,
    pub unread_notifications: u64,
}

fn is_open(status: DeviceStatus) -> bool {
    !matches!(status, DeviceStatus::Delivered | DeviceStatus::Cancelled)
}

#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    notifications: NotificationService,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            notifications: NotificationService::new(db_pool.clone()),
            db_pool,
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn stats(&self, user: &AuthUser) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db_pool;
        let customers = customer::Entity::find().count(db).await?;

        let mut devices_by_status = BTreeMap::new();
        let mut open_repairs = 0;
        for status in DeviceStatus::iter() {
            let count = device::Entity::find()
                .filter(device::Column::Status.eq(status))
                .count(db)
                .await?;
            if is_open(status) {
                open_repairs += count;
            }
            devices_by_status.insert(status.to_string(), count);
        }
        let ready_for_pickup = devices_by_status
            .get(&DeviceStatus::ReadyForPickup.to_string())
            .copied()
            .unwrap_or_default();

        let today = Utc::now().date_naive();
        let month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
        let month_sales = sale::Entity::find()
            .filter(sale::Column::CreatedAt.gte(day_start(month_start)))
            .all(db)
            .await?;
        let today_start = day_start(today);
        let mut sales_today = SalesTotals::default();
        let mut sales_this_month = SalesTotals::default();
        for s in &month_sales {
            sales_this_month.count += 1;
            sales_this_month.total += s.total;
            if s.created_at >= today_start {
                sales_today.count += 1;
                sales_today.total += s.total;
            }
        }

        let low_stock_items = inventory_item::Entity::find()
            .filter(inventory_item::Column::IsActive.eq(true))
            .filter(low_stock_condition())
            .count(db)
            .await?;

        Ok(DashboardStats {
            customers,
            devices_by_status,
            open_repairs,
            ready_for_pickup,
            sales_today,
            sales_this_month,
            low_stock_items,
            unread_notifications: self.notifications.unread_count(user.user_id).await?,
        })
    }
}
