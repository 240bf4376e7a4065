//! Seed data script - populates the database with demo shop data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - one location and three workers (admin, technician, sales)
//! - 5 customers
//! - 8 inventory parts
//! - 6 repair tickets in various states
//! - a few sales and an appointment
//!
//! Every record goes through the service layer, so codes, history rows and
//! stock adjustments match what the API would produce.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use repairdesk_api::{
    auth::{AuthConfig, AuthService, AuthUser},
    config, db,
    entities::{
        device::{DevicePriority, DeviceStatus},
        sale::PaymentMethod,
        user::{self, UserRole},
    },
    events::{process_events, EventSender},
    handlers::AppServices,
    services::{
        appointments::CreateAppointmentRequest,
        customers::CreateCustomerRequest,
        devices::{ChangeStatusRequest, RegisterDeviceRequest},
        inventory::CreateInventoryItemRequest,
        locations::CreateLocationRequest,
        sales::{CreateSaleRequest, SaleLineRequest},
        sms_gateway::LogSmsGateway,
        workers::CreateWorkerRequest,
    },
};

const CUSTOMERS: [(&str, &str, &str, &str); 5] = [
    ("Ada", "Lovelace", "ada@example.com", "+1 555 0101"),
    ("Alan", "Turing", "alan@example.com", "+1 555 0102"),
    ("Grace", "Hopper", "grace@example.com", "+1 555 0103"),
    ("Linus", "Torvalds", "linus@example.com", "+1 555 0104"),
    ("Margaret", "Hamilton", "margaret@example.com", "+1 555 0105"),
];

const PARTS: [(&str, &str, &str, i32, Decimal, Decimal); 8] = [
    ("iPhone 13 Screen", "SCR-IP13", "Screens", 6, Decimal::from_parts(4500, 0, 0, false, 2), Decimal::from_parts(12900, 0, 0, false, 2)),
    ("Galaxy S22 Screen", "SCR-S22", "Screens", 3, Decimal::from_parts(5200, 0, 0, false, 2), Decimal::from_parts(13900, 0, 0, false, 2)),
    ("iPhone 13 Battery", "BAT-IP13", "Batteries", 12, Decimal::from_parts(1450, 0, 0, false, 2), Decimal::from_parts(5900, 0, 0, false, 2)),
    ("MacBook Air Battery", "BAT-MBA", "Batteries", 2, Decimal::from_parts(4800, 0, 0, false, 2), Decimal::from_parts(14900, 0, 0, false, 2)),
    ("USB-C Charging Port", "PRT-USBC", "Ports", 20, Decimal::from_parts(320, 0, 0, false, 2), Decimal::from_parts(3900, 0, 0, false, 2)),
    ("Laptop Fan 5V", "FAN-LT5", "Cooling", 4, Decimal::from_parts(790, 0, 0, false, 2), Decimal::from_parts(3500, 0, 0, false, 2)),
    ("Thermal Paste 4g", "TP-4G", "Consumables", 30, Decimal::from_parts(210, 0, 0, false, 2), Decimal::from_parts(900, 0, 0, false, 2)),
    ("Tempered Glass Protector", "ACC-GLASS", "Accessories", 50, Decimal::from_parts(80, 0, 0, false, 2), Decimal::from_parts(1499, 0, 0, false, 2)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== RepairDesk Seed Data ===");
    info!("Connecting to database: {}", cfg.database_url);
    let pool = Arc::new(db::establish_connection_from_app_config(&cfg).await?);
    db::run_migrations(&pool).await?;

    let (tx, rx) = mpsc::channel(cfg.event_channel_capacity);
    let events = tokio::spawn(process_events(rx));
    let auth = Arc::new(AuthService::new(AuthConfig::new(
        cfg.jwt_secret.clone(),
        std::time::Duration::from_secs(cfg.jwt_expiration),
    )));
    let services = AppServices::new(
        pool.clone(),
        Arc::new(EventSender::new(tx)),
        auth,
        Arc::new(LogSmsGateway),
        &cfg,
    );

    info!("Creating location and workers...");
    let location = services
        .locations
        .create(CreateLocationRequest {
            name: "Main Street".into(),
            address: Some("1 Main Street".into()),
            phone: Some("+1 555 0100".into()),
        })
        .await?;
    let admin = create_worker(&services, "Avery Admin", "admin@repairdesk.local", UserRole::Admin, location.id).await?;
    let technician = create_worker(&services, "Toni Tech", "tech@repairdesk.local", UserRole::Technician, location.id).await?;
    let clerk = create_worker(&services, "Sam Sales", "sales@repairdesk.local", UserRole::Sales, location.id).await?;
    let admin_actor = AuthUser::for_worker(&admin);
    let clerk_actor = AuthUser::for_worker(&clerk);
    info!("  Workers use the password 'repairdesk-demo'");

    info!("Creating customers...");
    let mut customers = Vec::with_capacity(CUSTOMERS.len());
    for (first, last, email, phone) in CUSTOMERS {
        let customer = services
            .customers
            .create(CreateCustomerRequest {
                first_name: Some(first.into()),
                last_name: Some(last.into()),
                email: Some(email.into()),
                phone: Some(phone.into()),
                location_id: Some(location.id),
                ..Default::default()
            })
            .await?;
        customers.push(customer);
    }
    info!("  Created {} customers", customers.len());

    info!("Creating inventory...");
    let mut parts = Vec::with_capacity(PARTS.len());
    for (name, sku, category, quantity, cost, price) in PARTS {
        let item = services
            .inventory
            .create(CreateInventoryItemRequest {
                name: name.into(),
                sku: sku.into(),
                category: Some(category.into()),
                description: None,
                quantity: Some(quantity),
                reorder_level: None,
                reorder_quantity: Some(10),
                lead_time_days: Some(5),
                cost_price: cost,
                selling_price: price,
                supplier: Some("Parts Direct".into()),
                location_id: Some(location.id),
            })
            .await?;
        parts.push(item);
    }
    info!("  Created {} inventory items", parts.len());

    info!("Creating repair tickets...");
    let tickets = [
        ("Phone", "Apple", "iPhone 13", "Cracked screen", DeviceStatus::Registered),
        ("Phone", "Samsung", "Galaxy S22", "Display flickers", DeviceStatus::Diagnosed),
        ("Laptop", "Apple", "MacBook Air", "Battery drains in an hour", DeviceStatus::WaitingParts),
        ("Laptop", "Lenovo", "ThinkPad T14", "Fan noise and overheating", DeviceStatus::InProgress),
        ("Phone", "Google", "Pixel 7", "Will not charge", DeviceStatus::ReadyForPickup),
        ("Tablet", "Apple", "iPad Air", "Home button stuck", DeviceStatus::Delivered),
    ];
    let mut devices = Vec::with_capacity(tickets.len());
    for (i, (device_type, brand, model, problem, target)) in tickets.into_iter().enumerate() {
        let customer = &customers[i % customers.len()];
        let device = services
            .devices
            .register(
                &admin_actor,
                RegisterDeviceRequest {
                    customer_id: customer.id,
                    location_id: Some(location.id),
                    assigned_to: Some(technician.id),
                    device_type: device_type.into(),
                    brand: brand.into(),
                    model: model.into(),
                    serial_number: None,
                    imei: None,
                    password_hint: None,
                    accessories: None,
                    problem_description: problem.into(),
                    priority: Some(if i == 0 { DevicePriority::High } else { DevicePriority::Normal }),
                    estimated_cost: Some(Decimal::new(8900, 2)),
                    deposit: None,
                    estimated_completion: Some(Utc::now() + Duration::days(3)),
                },
            )
            .await?;
        let device = if target == DeviceStatus::Registered {
            device
        } else {
            services
                .devices
                .change_status(
                    &admin_actor,
                    device.id,
                    ChangeStatusRequest {
                        status: target,
                        note: Some("Seeded".into()),
                    },
                )
                .await?
        };
        info!("  {} {} {} -> {}", device.tracking_code, brand, model, target);
        devices.push(device);
    }

    info!("Creating sales...");
    let sale = services
        .sales
        .create(
            &clerk_actor,
            CreateSaleRequest {
                customer_id: Some(customers[4].id),
                device_id: Some(devices[4].id),
                location_id: Some(location.id),
                payment_method: PaymentMethod::Card,
                discount: None,
                notes: None,
                items: vec![
                    SaleLineRequest {
                        inventory_item_id: Some(parts[4].id),
                        description: None,
                        quantity: 1,
                        unit_price: None,
                    },
                    SaleLineRequest {
                        inventory_item_id: None,
                        description: Some("Charging port replacement labour".into()),
                        quantity: 1,
                        unit_price: Some(Decimal::new(4000, 2)),
                    },
                ],
            },
        )
        .await?;
    info!("  Sale {} total {}", sale.sale.receipt_number, sale.sale.total);

    let walk_in = services
        .sales
        .create(
            &clerk_actor,
            CreateSaleRequest {
                customer_id: None,
                device_id: None,
                location_id: Some(location.id),
                payment_method: PaymentMethod::Cash,
                discount: Some(Decimal::new(200, 2)),
                notes: None,
                items: vec![SaleLineRequest {
                    inventory_item_id: Some(parts[7].id),
                    description: None,
                    quantity: 2,
                    unit_price: None,
                }],
            },
        )
        .await?;
    info!("  Sale {} total {}", walk_in.sale.receipt_number, walk_in.sale.total);

    info!("Creating appointments...");
    let starts_at = Utc::now() + Duration::days(1);
    services
        .appointments
        .create(CreateAppointmentRequest {
            customer_id: customers[2].id,
            device_id: Some(devices[2].id),
            assigned_to: Some(technician.id),
            title: "Battery install".into(),
            notes: None,
            starts_at,
            ends_at: starts_at + Duration::hours(1),
        })
        .await?;

    // Let the event loop drain what the services emitted.
    drop(services);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), events).await;

    info!("=== Seed Data Complete ===");
    info!("Sign in with admin@repairdesk.local / repairdesk-demo");
    info!("Or explore interactively at: http://localhost:{}/swagger-ui", cfg.port);
    Ok(())
}

async fn create_worker(
    services: &AppServices,
    full_name: &str,
    email: &str,
    role: UserRole,
    location_id: uuid::Uuid,
) -> anyhow::Result<user::Model> {
    let worker = services
        .workers
        .create(CreateWorkerRequest {
            full_name: full_name.into(),
            email: email.into(),
            password: "repairdesk-demo".into(),
            role,
            location_id: Some(location_id),
            phone: None,
        })
        .await?;
    Ok(worker)
}
