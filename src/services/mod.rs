// Shared helpers
pub mod codes;

// Shop structure and staff
pub mod locations;
pub mod settings;
pub mod workers;

// Customers and repair tickets
pub mod appointments;
pub mod customers;
pub mod devices;

// Stock and point of sale
pub mod inventory;
pub mod predictions;
pub mod sales;

// Money owed and spent
pub mod finance;
pub mod loans;

// Messaging
pub mod notifications;
pub mod recipient_groups;
pub mod sms;
pub mod sms_gateway;

// Reporting
pub mod dashboard;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ColumnTrait, Condition};
use validator::ValidationError;

use crate::errors::ServiceError;

/// Builds an OR condition matching `term` as a substring of any of `columns`.
pub(crate) fn search_condition<C>(term: &str, columns: &[C]) -> Condition
where
    C: ColumnTrait,
{
    columns
        .iter()
        .fold(Condition::any(), |cond, col| cond.add(col.contains(term)))
}

/// Trims a free-text search parameter, dropping it when blank.
pub(crate) fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Money is rounded half away from zero to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to cents, rejecting amounts that round to zero or below.
pub(crate) fn positive_money(field: &str, amount: Decimal) -> Result<Decimal, ServiceError> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO {
        return Err(ServiceError::FieldValidation(vec![format!(
            "{}: Amount must be at least 0.01",
            field
        )]));
    }
    Ok(rounded)
}

/// Start of `date` in UTC.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Start of the day after `date` in UTC, for inclusive `to` filters.
pub(crate) fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date))
}

pub(crate) fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Amount must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}
