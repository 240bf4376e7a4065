use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
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
        customer, device, inventory_item, location,
        sale::{self, PaymentMethod},
        sale_item,
    },
    errors::{flatten_validation_errors, ServiceError},
    events::{Event, EventSender},
    services::{
        codes::{unique_code, SALE_PREFIX},
        day_end_exclusive, day_start,
        inventory::apply_stock_delta,
        round_money,
        settings::SettingsService,
        validate_non_negative_amount,
    },
    PaginatedResponse,
};

/// One line of a sale. Stock lines name an inventory item and may omit the
/// description and price; service lines must supply both.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SaleLineRequest {
    pub inventory_item_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative_amount")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSaleRequest {
    pub customer_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(custom = "validate_non_negative_amount")]
    pub discount: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
}

/// `(subtotal, tax, total)` for the given line totals.
pub fn sale_totals(
    line_totals: &[Decimal],
    discount: Decimal,
    tax_rate: Decimal,
) -> Result<(Decimal, Decimal, Decimal), ServiceError> {
    let subtotal: Decimal = line_totals.iter().copied().sum();
    if discount > subtotal {
        return Err(ServiceError::InvalidInput(format!(
            "Discount {} exceeds subtotal {}",
            discount, subtotal
        )));
    }
    let tax = round_money((subtotal - discount) * tax_rate);
    Ok((subtotal, tax, subtotal - discount + tax))
}

#[derive(Clone)]
pub struct SaleService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    settings: SettingsService,
}

impl SaleService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, settings: SettingsService) -> Self {
        Self {
            db_pool,
            event_sender,
            settings,
        }
    }

    /// Records a sale and takes its stock lines out of inventory. Either the
    /// whole sale is written or nothing is.
    #[instrument(skip(self, actor, request), fields(lines = request.items.len()))]
    pub async fn create(
        &self,
        actor: &AuthUser,
        request: CreateSaleRequest,
    ) -> Result<SaleWithItems, ServiceError> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(ServiceError::FieldValidation(vec![
                "items: A sale needs at least one line".to_string(),
            ]));
        }
        for (index, line) in request.items.iter().enumerate() {
            line.validate().map_err(|e| {
                ServiceError::FieldValidation(
                    flatten_validation_errors(&e)
                        .into_iter()
                        .map(|msg| format!("items[{}].{}", index, msg))
                        .collect(),
                )
            })?;
        }

        let tax_rate = self.settings.business_settings().await?.tax_rate;

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for sale");
            ServiceError::DatabaseError(e)
        })?;

        if let Some(customer_id) = request.customer_id {
            if customer::Entity::find_by_id(customer_id).one(&txn).await?.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Customer {} does not exist",
                    customer_id
                )));
            }
        }
        if let Some(device_id) = request.device_id {
            if device::Entity::find_by_id(device_id).one(&txn).await?.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Device {} does not exist",
                    device_id
                )));
            }
        }
        if let Some(location_id) = request.location_id {
            if location::Entity::find_by_id(location_id).one(&txn).await?.is_none() {
                return Err(ServiceError::InvalidInput(format!(
                    "Location {} does not exist",
                    location_id
                )));
            }
        }

        let receipt_number = unique_code(SALE_PREFIX, |code| {
            let txn = &txn;
            async move {
                let taken = sale::Entity::find()
                    .filter(sale::Column::ReceiptNumber.eq(code))
                    .count(txn)
                    .await?;
                Ok::<_, ServiceError>(taken > 0)
            }
        })
        .await?;

        let sale_id = Uuid::new_v4();
        let mut lines: Vec<sale_item::ActiveModel> = Vec::with_capacity(request.items.len());
        let mut line_totals = Vec::with_capacity(request.items.len());
        let mut low_stock: Vec<inventory_item::Model> = Vec::new();

        for (index, line) in request.items.into_iter().enumerate() {
            let (description, unit_price) = match line.inventory_item_id {
                Some(item_id) => {
                    let item = inventory_item::Entity::find_by_id(item_id)
                        .one(&txn)
                        .await?
                        .filter(|item| item.is_active)
                        .ok_or_else(|| {
                            ServiceError::InvalidInput(format!(
                                "items[{}]: inventory item {} does not exist or is inactive",
                                index, item_id
                            ))
                        })?;
                    let description = line.description.unwrap_or_else(|| item.name.clone());
                    let unit_price = line.unit_price.unwrap_or(item.selling_price);

                    let updated = apply_stock_delta(
                        &txn,
                        item,
                        -line.quantity,
                        format!("Sale {}", receipt_number),
                        Some(actor.user_id),
                    )
                    .await?;
                    if updated.is_low_stock() {
                        low_stock.push(updated);
                    }
                    (description, unit_price)
                }
                None => match (line.description, line.unit_price) {
                    (Some(description), Some(unit_price)) => (description, unit_price),
                    _ => {
                        return Err(ServiceError::InvalidInput(format!(
                            "items[{}]: service lines need a description and unit_price",
                            index
                        )))
                    }
                },
            };

            let total = round_money(unit_price * Decimal::from(line.quantity));
            line_totals.push(total);
            lines.push(sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                inventory_item_id: Set(line.inventory_item_id),
                description: Set(description),
                quantity: Set(line.quantity),
                unit_price: Set(unit_price),
                total: Set(total),
            });
        }

        let discount = request.discount.unwrap_or(Decimal::ZERO);
        let (subtotal, tax, total) = sale_totals(&line_totals, discount, tax_rate)?;

        let created = sale::ActiveModel {
            id: Set(sale_id),
            receipt_number: Set(receipt_number.clone()),
            customer_id: Set(request.customer_id),
            device_id: Set(request.device_id),
            sold_by: Set(Some(actor.user_id)),
            location_id: Set(request.location_id),
            subtotal: Set(subtotal),
            discount: Set(discount),
            tax: Set(tax),
            total: Set(total),
            payment_method: Set(request.payment_method),
            notes: Set(request.notes),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(line.insert(&txn).await?);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, sale_id = %sale_id, "Failed to commit sale");
            ServiceError::DatabaseError(e)
        })?;

        info!(sale_id = %sale_id, receipt = %receipt_number, total = %total, "Sale completed");
        self.event_sender
            .send_or_log(Event::SaleCompleted { sale_id, total })
            .await;
        for item in low_stock {
            warn!(item_id = %item.id, quantity = item.quantity, "Sale left item at or below reorder level");
            self.event_sender
                .send_or_log(Event::StockLow {
                    item_id: item.id,
                    quantity: item.quantity,
                    reorder_level: item.reorder_level,
                })
                .await;
        }

        Ok(SaleWithItems {
            sale: created,
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<SaleWithItems, ServiceError> {
        let db = &*self.db_pool;
        let sale = sale::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", id))?;
        let items = sale
            .find_related(sale_item::Entity)
            .all(db)
            .await?;
        Ok(SaleWithItems { sale, items })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: SaleFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<sale::Model>, ServiceError> {
        let mut query = sale::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(sale::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = filter.to {
            query = query.filter(sale::Column::CreatedAt.lt(day_end_exclusive(to)));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(sale::Column::CustomerId.eq(customer_id));
        }
        if let Some(method) = filter.payment_method {
            query = query.filter(sale::Column::PaymentMethod.eq(method));
        }

        let paginator = query
            .order_by_desc(sale::Column::CreatedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;
        Ok(PaginatedResponse::new(items, total, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrated_memory_pool;
    use crate::entities::{stock_adjustment, user::UserRole};
    use crate::events::detached_sender;
    use crate::services::devices::tests::{actor, seed_worker};
    use crate::services::inventory::{tests::item_request, InventoryService};
    use crate::services::settings::UpdateBusinessSettingsRequest;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct Fixture {
        pool: Arc<DbPool>,
        sales: SaleService,
        inventory: InventoryService,
        settings: SettingsService,
        cashier: AuthUser,
    }

    async fn fixture() -> Fixture {
        let pool = migrated_memory_pool().await;
        let events = detached_sender();
        let settings = SettingsService::new(pool.clone(), events.clone(), Duration::from_secs(60));
        let worker = seed_worker(&pool, UserRole::Sales).await;
        Fixture {
            sales: SaleService::new(pool.clone(), events.clone(), settings.clone()),
            inventory: InventoryService::new(pool.clone(), events, settings.clone()),
            settings,
            cashier: actor(&worker),
            pool,
        }
    }

    fn stock_line(item_id: Uuid, quantity: i32) -> SaleLineRequest {
        SaleLineRequest {
            inventory_item_id: Some(item_id),
            description: None,
            quantity,
            unit_price: None,
        }
    }

    fn sale_request(items: Vec<SaleLineRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            customer_id: None,
            device_id: None,
            location_id: None,
            payment_method: PaymentMethod::Card,
            discount: None,
            notes: None,
            items,
        }
    }

    #[test]
    fn totals_apply_discount_before_tax() {
        let (subtotal, tax, total) =
            sale_totals(&[dec!(45.00), dec!(60.00)], dec!(5.00), dec!(0.0825)).unwrap();
        assert_eq!(subtotal, dec!(105.00));
        assert_eq!(tax, dec!(8.25));
        assert_eq!(total, dec!(108.25));
    }

    #[test]
    fn discount_cannot_exceed_subtotal() {
        assert_matches!(
            sale_totals(&[dec!(10)], dec!(10.01), Decimal::ZERO),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn sale_decrements_stock_and_prices_from_item() {
        let f = fixture().await;
        f.settings
            .update_business_settings(UpdateBusinessSettingsRequest {
                tax_rate: Some(dec!(0.10)),
                ..Default::default()
            })
            .await
            .unwrap();
        let item = f.inventory.create(item_request("SCR-1", 5)).await.unwrap();

        let labour = SaleLineRequest {
            inventory_item_id: None,
            description: Some("Screen replacement labour".into()),
            quantity: 1,
            unit_price: Some(dec!(30.00)),
        };
        let sale = f
            .sales
            .create(&f.cashier, sale_request(vec![stock_line(item.id, 2), labour]))
            .await
            .unwrap();

        assert!(sale.sale.receipt_number.starts_with("S-"));
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].description, "Part SCR-1");
        assert_eq!(sale.items[0].total, dec!(90.00));
        assert_eq!(sale.sale.subtotal, dec!(120.00));
        assert_eq!(sale.sale.tax, dec!(12.00));
        assert_eq!(sale.sale.total, dec!(132.00));

        assert_eq!(f.inventory.get(item.id).await.unwrap().quantity, 3);
        let fetched = f.sales.get(sale.sale.id).await.unwrap();
        assert_eq!(fetched.items.len(), 2);
    }

    #[tokio::test]
    async fn insufficient_stock_writes_nothing() {
        let f = fixture().await;
        let plenty = f.inventory.create(item_request("OK-1", 10)).await.unwrap();
        let scarce = f.inventory.create(item_request("LOW-1", 1)).await.unwrap();

        let result = f
            .sales
            .create(
                &f.cashier,
                sale_request(vec![stock_line(plenty.id, 3), stock_line(scarce.id, 2)]),
            )
            .await;
        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

        assert_eq!(f.inventory.get(plenty.id).await.unwrap().quantity, 10);
        assert_eq!(sale::Entity::find().count(&*f.pool).await.unwrap(), 0);
        assert_eq!(stock_adjustment::Entity::find().count(&*f.pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn service_line_needs_price_and_empty_sale_is_rejected() {
        let f = fixture().await;
        let bad_line = SaleLineRequest {
            inventory_item_id: None,
            description: Some("Diagnostics".into()),
            quantity: 1,
            unit_price: None,
        };
        assert_matches!(
            f.sales.create(&f.cashier, sale_request(vec![bad_line])).await,
            Err(ServiceError::InvalidInput(_))
        );
        assert_matches!(
            f.sales.create(&f.cashier, sale_request(vec![])).await,
            Err(ServiceError::FieldValidation(_))
        );
    }

    #[tokio::test]
    async fn list_filters_by_payment_method() {
        let f = fixture().await;
        let labour = |price| SaleLineRequest {
            inventory_item_id: None,
            description: Some("Labour".into()),
            quantity: 1,
            unit_price: Some(price),
        };
        f.sales
            .create(&f.cashier, sale_request(vec![labour(dec!(10))]))
            .await
            .unwrap();
        let mut cash = sale_request(vec![labour(dec!(20))]);
        cash.payment_method = PaymentMethod::Cash;
        f.sales.create(&f.cashier, cash).await.unwrap();

        let card_only = f
            .sales
            .list(
                SaleFilter {
                    payment_method: Some(PaymentMethod::Card),
                    from: Some(Utc::now().date_naive()),
                    ..Default::default()
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(card_only.total, 1);
        assert_eq!(card_only.items[0].total, dec!(10));
    }
}
