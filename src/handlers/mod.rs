pub mod appointments;
pub mod auth;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod devices;
pub mod finance;
pub mod inventory;
pub mod loans;
pub mod locations;
pub mod notifications;
pub mod recipient_groups;
pub mod sales;
pub mod settings;
pub mod sms;
pub mod workers;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        appointments::AppointmentService, customers::CustomerService,
        dashboard::DashboardService, devices::DeviceService, finance::FinanceService,
        inventory::InventoryService, loans::LoanService, locations::LocationService,
        notifications::NotificationService, predictions::PredictionService,
        recipient_groups::RecipientGroupService, sales::SaleService, settings::SettingsService,
        sms::SmsService, sms_gateway::SmsGateway, workers::WorkerService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub settings: SettingsService,
    pub workers: Arc<WorkerService>,
    pub locations: Arc<LocationService>,
    pub customers: Arc<CustomerService>,
    pub devices: Arc<DeviceService>,
    pub inventory: Arc<InventoryService>,
    pub predictions: Arc<PredictionService>,
    pub sales: Arc<SaleService>,
    pub appointments: Arc<AppointmentService>,
    pub finance: Arc<FinanceService>,
    pub loans: Arc<LoanService>,
    pub notifications: Arc<NotificationService>,
    pub sms: Arc<SmsService>,
    pub recipient_groups: Arc<RecipientGroupService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Wires every service against one pool, event channel and SMS gateway.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
        sms_gateway: Arc<dyn SmsGateway>,
        config: &AppConfig,
    ) -> Self {
        let settings = SettingsService::new(
            db_pool.clone(),
            event_sender.clone(),
            Duration::from_secs(config.settings_cache_ttl_secs),
        );

        Self {
            workers: Arc::new(WorkerService::new(
                db_pool.clone(),
                event_sender.clone(),
                auth_service,
            )),
            locations: Arc::new(LocationService::new(db_pool.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone(), event_sender.clone())),
            devices: Arc::new(DeviceService::new(
                db_pool.clone(),
                event_sender.clone(),
                settings.clone(),
            )),
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
                settings.clone(),
            )),
            predictions: Arc::new(PredictionService::new(db_pool.clone(), settings.clone())),
            sales: Arc::new(SaleService::new(
                db_pool.clone(),
                event_sender.clone(),
                settings.clone(),
            )),
            appointments: Arc::new(AppointmentService::new(db_pool.clone())),
            finance: Arc::new(FinanceService::new(db_pool.clone())),
            loans: Arc::new(LoanService::new(db_pool.clone(), event_sender.clone())),
            notifications: Arc::new(NotificationService::new(db_pool.clone())),
            sms: Arc::new(SmsService::new(
                db_pool.clone(),
                event_sender,
                settings.clone(),
                sms_gateway,
            )),
            recipient_groups: Arc::new(RecipientGroupService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool)),
            settings,
        }
    }
}
