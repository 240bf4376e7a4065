use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::device::DeviceStatus;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Dropping domain event");
        }
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CustomerCreated(Uuid),
    CustomerDeleted(Uuid),
    UserCreated(Uuid),
    DeviceRegistered {
        device_id: Uuid,
        tracking_code: String,
    },
    DeviceStatusChanged {
        device_id: Uuid,
        from: DeviceStatus,
        to: DeviceStatus,
    },
    DeviceAssigned {
        device_id: Uuid,
        technician_id: Uuid,
    },
    StockAdjusted {
        item_id: Uuid,
        delta: i32,
        quantity: i32,
    },
    StockLow {
        item_id: Uuid,
        quantity: i32,
        reorder_level: i32,
    },
    SaleCompleted {
        sale_id: Uuid,
        total: Decimal,
    },
    LoanPaymentRecorded {
        invoice_id: Uuid,
        amount: Decimal,
    },
    CampaignSent {
        campaign_id: Uuid,
        sent: i32,
        failed: i32,
        at: DateTime<Utc>,
    },
    SettingsUpdated,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CustomerCreated(_) => "customer_created",
            Event::CustomerDeleted(_) => "customer_deleted",
            Event::UserCreated(_) => "user_created",
            Event::DeviceRegistered { .. } => "device_registered",
            Event::DeviceStatusChanged { .. } => "device_status_changed",
            Event::DeviceAssigned { .. } => "device_assigned",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::StockLow { .. } => "stock_low",
            Event::SaleCompleted { .. } => "sale_completed",
            Event::LoanPaymentRecorded { .. } => "loan_payment_recorded",
            Event::CampaignSent { .. } => "campaign_sent",
            Event::SettingsUpdated => "settings_updated",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockLow {
                item_id,
                quantity,
                reorder_level,
            } => {
                warn!(
                    %item_id,
                    quantity,
                    reorder_level,
                    "Inventory item at or below reorder level"
                );
            }
            Event::DeviceStatusChanged {
                device_id,
                from,
                to,
            } => {
                info!(%device_id, from = %from, to = %to, "Device status changed");
            }
            Event::CampaignSent {
                campaign_id,
                sent,
                failed,
                ..
            } => {
                info!(%campaign_id, sent, failed, "SMS campaign finished");
            }
            other => {
                info!(event = other.name(), payload = ?other, "Domain event");
            }
        }
    }

    info!("Event processing loop stopped");
}

/// Sender whose receiver is already gone; every event is logged and dropped.
#[cfg(test)]
pub(crate) fn detached_sender() -> std::sync::Arc<EventSender> {
    let (tx, _rx) = mpsc::channel(1);
    std::sync::Arc::new(EventSender::new(tx))
}
