use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Repair progress of a device. Listed in workflow order, but any status may
/// follow any other.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    #[sea_orm(string_value = "registered")]
    Registered,
    #[sea_orm(string_value = "diagnosed")]
    Diagnosed,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "waiting_parts")]
    WaitingParts,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "ready_for_pickup")]
    ReadyForPickup,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl DeviceStatus {
    /// Label shown to customers on the public tracking page.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Registered => "Received",
            DeviceStatus::Diagnosed => "Diagnosed",
            DeviceStatus::InProgress => "Repair in progress",
            DeviceStatus::WaitingParts => "Waiting for parts",
            DeviceStatus::Completed => "Repair completed",
            DeviceStatus::ReadyForPickup => "Ready for pickup",
            DeviceStatus::Delivered => "Delivered",
            DeviceStatus::Cancelled => "Cancelled",
        }
    }

    /// Delivered and cancelled tickets are closed.
    pub fn is_open(&self) -> bool {
        !matches!(self, DeviceStatus::Delivered | DeviceStatus::Cancelled)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DevicePriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// A repair ticket for one customer item.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "devices")]
#[schema(as = Device)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub location_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub device_type: String,
    pub brand: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub imei: Option<String>,
    pub password_hint: Option<String>,
    pub accessories: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub problem_description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub diagnosis: Option<String>,
    pub status: DeviceStatus,
    pub priority: DevicePriority,
    #[sea_orm(unique)]
    pub tracking_code: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub estimated_cost: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub final_cost: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub deposit: Decimal,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedTo",
        to = "super::user::Column::Id"
    )]
    Technician,
    #[sea_orm(has_many = "super::device_status_history::Entity")]
    StatusHistory,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::device_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_strings_are_snake_case() {
        assert_eq!(DeviceStatus::ReadyForPickup.to_string(), "ready_for_pickup");
        assert_eq!(
            DeviceStatus::from_str("waiting_parts").unwrap(),
            DeviceStatus::WaitingParts
        );
        assert_eq!(
            serde_json::to_value(DeviceStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
    }

    #[test]
    fn closed_statuses() {
        assert!(DeviceStatus::Completed.is_open());
        assert!(!DeviceStatus::Delivered.is_open());
        assert!(!DeviceStatus::Cancelled.is_open());
    }
}
