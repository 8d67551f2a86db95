//! Domain events raised by the services.
//!
//! Services push [`Event`]s through an [`EventSender`] (an mpsc channel). A single
//! [`process_events`] loop drains the channel and fans each event out to the realtime hub.
//! Delivery is best effort: a full or closed channel is logged and never fails the request.

use crate::entities::alert;
use crate::realtime::{RealtimeHub, ServerMessage};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An item was created, changed or removed. `data` is the item view, or null after deletion.
    InventoryUpdated { item_id: Uuid, data: Value },
    AlertCreated(alert::Model),
    /// Full order view including line snapshots.
    OrderCreated(Value),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::InventoryUpdated { .. } => "inventory-update",
            Event::AlertCreated(_) => "new-alert",
            Event::OrderCreated(_) => "order-created",
        }
    }

    pub fn into_message(self) -> ServerMessage {
        let event = self.name();
        let data = match self {
            Event::InventoryUpdated { item_id, data } => json!({ "itemId": item_id, "data": data }),
            Event::AlertCreated(alert) => serde_json::to_value(alert).unwrap_or(Value::Null),
            Event::OrderCreated(order) => order,
        };
        ServerMessage::new(event, data)
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget variant of [`send`](Self::send).
    pub fn notify(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.sender.try_send(event) {
            warn!(event = name, error = %e, "dropping realtime event");
        }
    }
}

/// Forwards every event to connected realtime clients until all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, hub: RealtimeHub) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        let name = event.name();
        let delivered = hub.publish(event.into_message());
        debug!(event = name, receivers = delivered, "event published");
    }

    warn!("Event processing loop has ended");
}
