//! Lifecycle event publication.
//!
//! Services push [`Event`]s into an mpsc channel through [`EventSender`];
//! a background task logs each one and fans it out to broadcast
//! subscribers (the live-observer transport attaches there). Publication is
//! fire-and-forget: a full or closed channel is logged and swallowed, it
//! never blocks or fails the transition that produced the event.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::auth::Role;

/// One order/PO line as carried in event payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLine {
    pub item_id: String,
    pub qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated {
        order_id: i64,
        from_id: Option<i64>,
        to_id: i64,
        auto: bool,
        items: Vec<EventLine>,
    },
    OrderSent {
        order_id: i64,
        from_id: Option<i64>,
        to_id: i64,
    },
    OrderFinished {
        order_id: i64,
        from_id: Option<i64>,
    },
    PurchaseOrderCreated {
        po_id: i64,
        branch_id: Option<i64>,
        supplier_id: Option<i64>,
        to_branch: Option<i64>,
        items: Vec<EventLine>,
    },
    /// Counter-PO spawned by the receiver of a waiting order.
    PurchaseOrderBackCreated {
        po_id: i64,
        created_by_branch: Option<i64>,
        to_branch: Option<i64>,
        orig_order_id: i64,
        items: Vec<EventLine>,
    },
    PurchaseOrderApproved {
        po_id: i64,
        orig_order_id: i64,
    },
    /// Legacy order-as-PO acceptance.
    PurchaseOrderAccepted {
        po_order_id: i64,
        orig_order_id: Option<i64>,
    },
    PurchaseOrderShipped {
        po_id: i64,
        orig_order_id: Option<i64>,
    },
    PurchaseOrderDelivered {
        po_id: i64,
    },
    PurchaseOrderReceived {
        po_id: i64,
        target_branch: i64,
    },
    InventoryUpdated {
        branch_id: i64,
        item_id: String,
        qty: i32,
    },
    /// Catch-all for collaborator-defined events.
    Generic {
        name: String,
        actor_role: Option<Role>,
        payload: Value,
    },
}

impl Event {
    /// Wire name matching what existing observers subscribe to.
    pub fn wire_name(&self) -> &str {
        match self {
            Self::OrderCreated { .. } => "order_created",
            Self::OrderSent { .. } => "order_kirim",
            Self::OrderFinished { .. } => "order_finished_by_creator",
            Self::PurchaseOrderCreated { .. } => "po_created",
            Self::PurchaseOrderBackCreated { .. } => "po_back_created",
            Self::PurchaseOrderApproved { .. } => "po_approved",
            Self::PurchaseOrderAccepted { .. } => "po_accepted",
            Self::PurchaseOrderShipped { .. } => "po_shipped",
            Self::PurchaseOrderDelivered { .. } => "po_delivered",
            Self::PurchaseOrderReceived { .. } => "po_received",
            Self::InventoryUpdated { .. } => "inventory_updated",
            Self::Generic { name, .. } => name,
        }
    }

    /// Envelope pushed to observers.
    pub fn envelope(&self) -> Value {
        json!({
            "event": self.wire_name(),
            "payload": self,
            "ts": chrono::Utc::now().timestamp_millis(),
        })
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

    /// Best-effort publish. Errors are returned so callers can log them,
    /// but callers must never fail a lifecycle transition over one.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to publish event: {}", e))
    }

    /// Publish and log on failure; the common call pattern in services.
    pub async fn publish(&self, event: Event) {
        let name = event.wire_name().to_string();
        if let Err(e) = self.send(event).await {
            warn!(event = %name, error = %e, "event publication failed");
        }
    }
}

/// Consumes the event channel, logging each event and fanning it out to
/// broadcast subscribers. Runs for the lifetime of the process; a lagging
/// or absent subscriber never blocks the loop.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, fanout: broadcast::Sender<Value>) {
    info!("starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(event = event.wire_name(), "event received");
        // send() only fails when there are no subscribers; that is fine.
        let _ = fanout.send(event.envelope());
    }

    info!("event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_fan_out_to_subscribers() {
        let (tx, rx) = mpsc::channel(16);
        let (fanout_tx, mut fanout_rx) = broadcast::channel(16);
        let sender = EventSender::new(tx);
        let task = tokio::spawn(process_events(rx, fanout_tx));

        sender
            .publish(Event::InventoryUpdated {
                branch_id: 1,
                item_id: "BERAS-01".into(),
                qty: 4,
            })
            .await;

        let envelope = fanout_rx.recv().await.unwrap();
        assert_eq!(envelope["event"], "inventory_updated");
        assert_eq!(envelope["payload"]["InventoryUpdated"]["qty"], 4);

        drop(sender);
        task.await.unwrap();
    }

    #[test]
    fn wire_names_are_stable() {
        let event = Event::OrderSent {
            order_id: 9,
            from_id: Some(1),
            to_id: 2,
        };
        assert_eq!(event.wire_name(), "order_kirim");
        assert_eq!(
            Event::PurchaseOrderDelivered { po_id: 3 }.wire_name(),
            "po_delivered"
        );
    }
}
