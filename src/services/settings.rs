use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    cache::InMemoryCache,
    db::DbPool,
    entities::setting,
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Keys owned by the typed business settings document.
pub const BUSINESS_KEYS: &[&str] = &[
    "business_name",
    "business_phone",
    "business_email",
    "business_address",
    "currency",
    "tax_rate",
    "receipt_prefix",
    "receipt_footer",
    "sms_sender_name",
    "prediction_window_days",
    "default_reorder_level",
];

static ADVANCED_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.\-]{1,64}$").expect("valid settings key regex"));
static RECEIPT_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{1,6}$").expect("valid receipt prefix regex"));

const BUSINESS_CACHE_KEY: &str = "business";

/// Shop identity and defaults used by receipts, sales tax and predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BusinessSettings {
    pub business_name: String,
    pub business_phone: Option<String>,
    pub business_email: Option<String>,
    pub business_address: Option<String>,
    pub currency: String,
    /// Fraction between 0 and 1, e.g. `0.08` for 8%.
    pub tax_rate: Decimal,
    pub receipt_prefix: String,
    pub receipt_footer: Option<String>,
    pub sms_sender_name: Option<String>,
    pub prediction_window_days: i32,
    pub default_reorder_level: i32,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            business_name: "RepairDesk".to_string(),
            business_phone: None,
            business_email: None,
            business_address: None,
            currency: "USD".to_string(),
            tax_rate: Decimal::ZERO,
            receipt_prefix: "RD".to_string(),
            receipt_footer: None,
            sms_sender_name: None,
            prediction_window_days: 30,
            default_reorder_level: 5,
        }
    }
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateBusinessSettingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 30))]
    pub business_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub business_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(equal = 3, message = "Currency must be a 3 letter code"))]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_tax_rate")]
    pub tax_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_receipt_prefix")]
    pub receipt_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub receipt_footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 11))]
    pub sms_sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 7, max = 365))]
    pub prediction_window_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 100000))]
    pub default_reorder_level: Option<i32>,
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE {
        let mut err = ValidationError::new("tax_rate_range");
        err.message = Some("Tax rate must be between 0 and 1".into());
        return Err(err);
    }
    Ok(())
}

fn validate_receipt_prefix(prefix: &str) -> Result<(), ValidationError> {
    if !RECEIPT_PREFIX_RE.is_match(prefix) {
        let mut err = ValidationError::new("receipt_prefix_format");
        err.message = Some("Receipt prefix must be 1-6 uppercase letters or digits".into());
        return Err(err);
    }
    Ok(())
}

/// Advanced keys are free-form but must not shadow business settings.
pub fn validate_advanced_key(key: &str) -> Result<(), ServiceError> {
    if !ADVANCED_KEY_RE.is_match(key) {
        return Err(ServiceError::InvalidInput(format!(
            "Setting key '{}' must match [a-z0-9_.-]{{1,64}}",
            key
        )));
    }
    if BUSINESS_KEYS.contains(&key) {
        return Err(ServiceError::InvalidInput(format!(
            "'{}' is a business setting; update it through the business settings endpoint",
            key
        )));
    }
    Ok(())
}

/// Key/value settings store with a cached view of the business document.
#[derive(Clone)]
pub struct SettingsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    cache: InMemoryCache<&'static str, BusinessSettings>,
}

impl SettingsService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, cache_ttl: Duration) -> Self {
        Self {
            db_pool,
            event_sender,
            cache: InMemoryCache::new(cache_ttl),
        }
    }

    /// Business settings with defaults for anything never stored.
    #[instrument(skip(self))]
    pub async fn business_settings(&self) -> Result<BusinessSettings, ServiceError> {
        if let Some(cached) = self.cache.get(&BUSINESS_CACHE_KEY) {
            return Ok(cached);
        }

        let rows = setting::Entity::find()
            .filter(setting::Column::Key.is_in(BUSINESS_KEYS.iter().copied()))
            .all(&*self.db_pool)
            .await?;

        let settings = merge_business_settings(rows);
        self.cache.insert(BUSINESS_CACHE_KEY, settings.clone());
        Ok(settings)
    }

    #[instrument(skip(self, request))]
    pub async fn update_business_settings(
        &self,
        request: UpdateBusinessSettingsRequest,
    ) -> Result<BusinessSettings, ServiceError> {
        request.validate()?;

        let changes = match serde_json::to_value(&request)? {
            Value::Object(map) => map,
            _ => return Err(ServiceError::InternalError("Unexpected settings shape".into())),
        };

        if !changes.is_empty() {
            let keys: Vec<String> = changes.keys().cloned().collect();
            let written = self.write_all(changes).await;
            self.cache.invalidate(&BUSINESS_CACHE_KEY);
            written?;
            info!(keys = ?keys, "Business settings updated");
            self.event_sender.send_or_log(Event::SettingsUpdated).await;
        }

        self.business_settings().await
    }

    /// Every stored key outside the business document.
    #[instrument(skip(self))]
    pub async fn list_advanced(&self) -> Result<Vec<setting::Model>, ServiceError> {
        let rows = setting::Entity::find()
            .filter(setting::Column::Key.is_not_in(BUSINESS_KEYS.iter().copied()))
            .order_by_asc(setting::Column::Key)
            .all(&*self.db_pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn get_advanced(&self, key: &str) -> Result<setting::Model, ServiceError> {
        validate_advanced_key(key)?;
        setting::Entity::find_by_id(key.to_string())
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Setting '{}' not found", key)))
    }

    #[instrument(skip(self, value))]
    pub async fn put_advanced(&self, key: &str, value: Value) -> Result<setting::Model, ServiceError> {
        validate_advanced_key(key)?;
        upsert(&*self.db_pool, key.to_string(), value).await?;
        info!(key, "Advanced setting stored");
        self.event_sender.send_or_log(Event::SettingsUpdated).await;
        self.get_advanced(key).await
    }

    #[instrument(skip(self))]
    pub async fn delete_advanced(&self, key: &str) -> Result<(), ServiceError> {
        validate_advanced_key(key)?;
        let result = setting::Entity::delete_by_id(key.to_string())
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Setting '{}' not found", key)));
        }
        info!(key, "Advanced setting deleted");
        self.event_sender.send_or_log(Event::SettingsUpdated).await;
        Ok(())
    }

    /// Stores every key or none of them.
    async fn write_all(&self, changes: serde_json::Map<String, Value>) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for settings update");
            ServiceError::DatabaseError(e)
        })?;
        for (key, value) in changes {
            upsert(&txn, key, value).await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

async fn upsert<C: ConnectionTrait>(conn: &C, key: String, value: Value) -> Result<(), ServiceError> {
    let model = setting::ActiveModel {
        key: Set(key),
        value: Set(value),
        updated_at: Set(Utc::now()),
    };
    setting::Entity::insert(model)
        .on_conflict(
            OnConflict::column(setting::Column::Key)
                .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Overlays stored values on the defaults. A stored value of the wrong type
/// is ignored so a bad row never takes the shop offline.
fn merge_business_settings(rows: Vec<setting::Model>) -> BusinessSettings {
    let defaults = BusinessSettings::default();
    let mut document = match serde_json::to_value(&defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults,
    };

    for row in rows {
        let mut candidate = document.clone();
        candidate.insert(row.key.clone(), row.value);
        if serde_json::from_value::<BusinessSettings>(Value::Object(candidate.clone())).is_ok() {
            document = candidate;
        } else {
            warn!(key = %row.key, "Ignoring malformed business setting");
        }
    }

    serde_json::from_value(Value::Object(document)).unwrap_or(defaults)
}
