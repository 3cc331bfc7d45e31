use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the inventory subsystem after a successful commit.
///
/// Publication is best-effort: a failed send is logged and never fails the
/// operation that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    InventoryRecordCreated {
        product_id: Uuid,
    },
    InventoryRecordDeleted {
        product_id: Uuid,
    },
    InventoryAdjusted {
        product_id: Uuid,
        movement_id: i64,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
        related_order_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
    },
    MinStockLevelSet {
        product_id: Uuid,
        min_stock_level: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("failed to send event: {}", e)))
    }
}

/// Background worker draining the event channel. Runs until every sender
/// has been dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::InventoryAdjusted {
                product_id,
                movement_id,
                old_quantity,
                new_quantity,
                reason,
                ..
            } => {
                info!(
                    %product_id,
                    movement_id,
                    old_quantity,
                    new_quantity,
                    reason,
                    "inventory adjusted"
                );
            }
            Event::MinStockLevelSet {
                product_id,
                min_stock_level,
            } => {
                info!(%product_id, min_stock_level, "minimum stock level set");
            }
            Event::InventoryRecordCreated { product_id } => {
                info!(%product_id, "inventory record created");
            }
            Event::InventoryRecordDeleted { product_id } => {
                info!(%product_id, "inventory record deleted");
            }
        }
    }
    warn!("Event channel closed; event worker exiting");
}
