//! SeaORM entities, one module per table.

pub mod appointment;
pub mod budget;
pub mod customer;
pub mod device;
pub mod device_status_history;
pub mod expense;
pub mod inventory_item;
pub mod loan_invoice;
pub mod loan_payment;
pub mod location;
pub mod notification;
pub mod recipient_group;
pub mod recipient_group_member;
pub mod sale;
pub mod sale_item;
pub mod setting;
pub mod sms_campaign;
pub mod sms_recipient;
pub mod stock_adjustment;
pub mod user;
