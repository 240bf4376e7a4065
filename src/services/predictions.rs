//! Reorder predictions computed on read from recent sales.
//!
//! Usage is a plain average over the window; status comes from comparing the
//! projected days of stock left against the supplier lead time.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{inventory_item, sale, sale_item},
    errors::ServiceError,
    services::settings::SettingsService,
};

pub const MIN_WINDOW_DAYS: i64 = 7;
pub const MAX_WINDOW_DAYS: i64 = 365;
pub const DEFAULT_USAGE_MONTHS: u32 = 6;
pub const MAX_USAGE_MONTHS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Ok,
    Low,
    Critical,
    OutOfStock,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemPrediction {
    pub item_id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub reorder_level: i32,
    pub lead_time_days: i32,
    pub units_sold: i64,
    pub avg_daily_usage: Decimal,
    pub days_until_stockout: Option<Decimal>,
    pub status: StockStatus,
    pub suggested_reorder_quantity: i64,
    pub estimated_reorder_cost: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PredictionSummary {
    pub ok: u64,
    pub low: u64,
    pub critical: u64,
    pub out_of_stock: u64,
    pub total_estimated_reorder_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionReport {
    pub window_days: i64,
    pub generated_at: DateTime<Utc>,
    pub summary: PredictionSummary,
    pub items: Vec<ItemPrediction>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageBucket {
    /// `YYYY-MM`
    pub month: String,
    pub units_sold: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemUsage {
    pub item_id: Uuid,
    pub months: Vec<UsageBucket>,
}

pub fn clamp_window(days: i64) -> i64 {
    days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)
}

/// Prediction for one item given the units sold over `window_days`.
pub fn predict(item: &inventory_item::Model, units_sold: i64, window_days: i64) -> ItemPrediction {
    let window = Decimal::from(window_days.max(1));
    let raw_usage = Decimal::from(units_sold) / window;
    let quantity = Decimal::from(item.quantity);

    let days_until_stockout = if raw_usage > Decimal::ZERO {
        Some(quantity / raw_usage)
    } else {
        None
    };

    let status = if item.quantity <= 0 {
        StockStatus::OutOfStock
    } else if matches!(days_until_stockout, Some(days) if days <= Decimal::from(item.lead_time_days))
    {
        StockStatus::Critical
    } else if item.quantity <= item.reorder_level {
        StockStatus::Low
    } else {
        StockStatus::Ok
    };

    let suggested = if status == StockStatus::Ok {
        0
    } else {
        let horizon = Decimal::from(item.lead_time_days) + window / Decimal::TWO;
        let projected = (raw_usage * horizon).ceil().to_i64().unwrap_or(i64::MAX);
        let shortfall = projected.saturating_sub(i64::from(item.quantity));
        i64::from(item.reorder_quantity).max(shortfall).max(0)
    };

    ItemPrediction {
        item_id: item.id,
        name: item.name.clone(),
        sku: item.sku.clone(),
        quantity: item.quantity,
        reorder_level: item.reorder_level,
        lead_time_days: item.lead_time_days,
        units_sold,
        avg_daily_usage: raw_usage.round_dp(2),
        days_until_stockout: days_until_stockout.map(|d| d.round_dp(1)),
        status,
        suggested_reorder_quantity: suggested,
        estimated_reorder_cost: (Decimal::from(suggested) * item.cost_price).round_dp(2),
    }
}

pub fn summarize(items: &[ItemPrediction]) -> PredictionSummary {
    items.iter().fold(PredictionSummary::default(), |mut acc, p| {
        match p.status {
            StockStatus::Ok => acc.ok += 1,
            StockStatus::Low => acc.low += 1,
            StockStatus::Critical => acc.critical += 1,
            StockStatus::OutOfStock => acc.out_of_stock += 1,
        }
        acc.total_estimated_reorder_cost += p.estimated_reorder_cost;
        acc
    })
}

/// First day of the month `back` months before the month containing `date`.
fn month_start(date: NaiveDate, back: u32) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 - back as i32;
    let (year, month0) = (index.div_euclid(12), index.rem_euclid(12) as u32);
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(date)
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[derive(Clone)]
pub struct PredictionService {
    db_pool: Arc<DbPool>,
    settings: SettingsService,
}

impl PredictionService {
    pub fn new(db_pool: Arc<DbPool>, settings: SettingsService) -> Self {
        Self { db_pool, settings }
    }

    /// Predictions for every active item, most urgent first.
    #[instrument(skip(self))]
    pub async fn report(&self, window_days: Option<i64>) -> Result<PredictionReport, ServiceError> {
        let window_days = match window_days {
            Some(days) => clamp_window(days),
            None => clamp_window(i64::from(
                self.settings.business_settings().await?.prediction_window_days,
            )),
        };
        let now = Utc::now();
        let since = now - ChronoDuration::days(window_days);

        let sold = self.units_sold_since(since, None).await?;
        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for (item_id, quantity, _) in sold {
            *totals.entry(item_id).or_default() += quantity;
        }

        let items = inventory_item::Entity::find()
            .filter(inventory_item::Column::IsActive.eq(true))
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?;

        let mut predictions: Vec<ItemPrediction> = items
            .iter()
            .map(|item| predict(item, totals.get(&item.id).copied().unwrap_or(0), window_days))
            .collect();
        predictions.sort_by_key(|p| match p.status {
            StockStatus::OutOfStock => 0,
            StockStatus::Critical => 1,
            StockStatus::Low => 2,
            StockStatus::Ok => 3,
        });

        let summary = summarize(&predictions);
        debug!(items = predictions.len(), window_days, "Computed reorder predictions");
        Ok(PredictionReport {
            window_days,
            generated_at: now,
            summary,
            items: predictions,
        })
    }

    /// Monthly units sold for one item, oldest month first.
    #[instrument(skip(self))]
    pub async fn usage(&self, item_id: Uuid, months: Option<u32>) -> Result<ItemUsage, ServiceError> {
        if inventory_item::Entity::find_by_id(item_id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Inventory item", item_id));
        }

        let months = months.unwrap_or(DEFAULT_USAGE_MONTHS).clamp(1, MAX_USAGE_MONTHS);
        let today = Utc::now().date_naive();
        let first = month_start(today, months - 1);
        let since = first
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .ok_or_else(|| ServiceError::InternalError("Invalid usage window".to_string()))?;

        let mut buckets: Vec<UsageBucket> = (0..months)
            .rev()
            .map(|back| UsageBucket {
                month: month_key(month_start(today, back)),
                units_sold: 0,
            })
            .collect();

        for (_, quantity, sold_at) in self.units_sold_since(since, Some(item_id)).await? {
            let key = month_key(sold_at.date_naive());
            if let Some(bucket) = buckets.iter_mut().find(|b| b.month == key) {
                bucket.units_sold += quantity;
            }
        }

        Ok(ItemUsage {
            item_id,
            months: buckets,
        })
    }

    /// `(item_id, quantity, sold_at)` for inventory sale lines since `since`.
    async fn units_sold_since(
        &self,
        since: DateTime<Utc>,
        item_id: Option<Uuid>,
    ) -> Result<Vec<(Uuid, i64, DateTime<Utc>)>, ServiceError> {
        let mut query = sale_item::Entity::find()
            .find_also_related(sale::Entity)
            .filter(sale::Column::CreatedAt.gte(since));
        query = match item_id {
            Some(id) => query.filter(sale_item::Column::InventoryItemId.eq(id)),
            None => query.filter(sale_item::Column::InventoryItemId.is_not_null()),
        };

        let rows = query.all(&*self.db_pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(line, sale)| {
                let item_id = line.inventory_item_id?;
                let sale = sale?;
                Some((item_id, i64::from(line.quantity), sale.created_at))
            })
            .collect())
    }
}
