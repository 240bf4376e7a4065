//! Query-string parameters shared by the list endpoints.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    entities::{
        appointment::AppointmentStatus,
        device::{DevicePriority, DeviceStatus},
        loan_invoice::LoanStatus,
        sale::PaymentMethod,
        sms_campaign::CampaignStatus,
        user::UserRole,
    },
    services::{
        appointments::AppointmentFilter, customers::CustomerFilter, devices::DeviceFilter,
        finance::ExpenseFilter, inventory::InventoryFilter, loans::LoanFilter,
        sales::SaleFilter, workers::WorkerFilter,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkerQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub location_id: Option<Uuid>,
    pub active: Option<bool>,
}

impl From<WorkerQuery> for WorkerFilter {
    fn from(q: WorkerQuery) -> Self {
        Self {
            role: q.role,
            location_id: q.location_id,
            active: q.active,
            search: q.search,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    /// Matches first name, last name, email or phone.
    pub search: Option<String>,
    pub location_id: Option<Uuid>,
    pub sms_opt_in: Option<bool>,
}

impl From<CustomerQuery> for CustomerFilter {
    fn from(q: CustomerQuery) -> Self {
        Self {
            search: q.search,
            location_id: q.location_id,
            sms_opt_in: q.sms_opt_in,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub status: Option<DeviceStatus>,
    pub priority: Option<DevicePriority>,
    pub customer_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

impl From<DeviceQuery> for DeviceFilter {
    fn from(q: DeviceQuery) -> Self {
        Self {
            status: q.status,
            customer_id: q.customer_id,
            assigned_to: q.assigned_to,
            location_id: q.location_id,
            priority: q.priority,
            search: q.search,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub category: Option<String>,
    pub low_stock: Option<bool>,
    pub active: Option<bool>,
}

impl From<InventoryQuery> for InventoryFilter {
    fn from(q: InventoryQuery) -> Self {
        Self {
            search: q.search,
            category: q.category,
            low_stock: q.low_stock,
            active: q.active,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictionQuery {
    /// Days of sales history to average over (7 to 365).
    pub window_days: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsageQuery {
    /// Months of history, 1 to 24 (default 6).
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
}

impl From<SaleQuery> for SaleFilter {
    fn from(q: SaleQuery) -> Self {
        Self {
            from: q.from,
            to: q.to,
            customer_id: q.customer_id,
            payment_method: q.payment_method,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub assigned_to: Option<Uuid>,
    pub customer_id: Option<Uuid>,
}

impl From<AppointmentQuery> for AppointmentFilter {
    fn from(q: AppointmentQuery) -> Self {
        Self {
            from: q.from,
            to: q.to,
            status: q.status,
            assigned_to: q.assigned_to,
            customer_id: q.customer_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
    pub location_id: Option<Uuid>,
}

impl From<ExpenseQuery> for ExpenseFilter {
    fn from(q: ExpenseQuery) -> Self {
        Self {
            from: q.from,
            to: q.to,
            category: q.category,
            location_id: q.location_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BudgetSummaryQuery {
    /// Only budgets whose period covers this date.
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub status: Option<LoanStatus>,
    pub customer_id: Option<Uuid>,
}

impl From<LoanQuery> for LoanFilter {
    fn from(q: LoanQuery) -> Self {
        Self {
            status: q.status,
            customer_id: q.customer_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CampaignQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
    pub status: Option<CampaignStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PreviewQuery {
    /// Number of rendered samples (default 5).
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default = "crate::default_page")]
    pub page: u64,
    #[serde(default = "crate::default_limit")]
    pub limit: u64,
}
