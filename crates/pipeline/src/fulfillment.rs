//! Fulfillment stage: `payment.completed` → ERP update → `fulfillment.ready`.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use dentiva_erp::OrderService;
use dentiva_events::{
    EventEnvelope, MessageBus, NotificationKind, OrderFacts, StorefrontEvent, Topic,
};

use crate::runner::{ConsumerRunner, WorkerHandle};

/// Simulated warehouse latencies. Inventory decrement and label purchase are
/// stubs until the warehouse integration lands; the delays keep the stage's
/// timing realistic in dev.
#[derive(Debug, Clone)]
pub struct FulfillmentConfig {
    pub inventory_delay: Duration,
    pub shipping_delay: Duration,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            inventory_delay: Duration::from_millis(500),
            shipping_delay: Duration::from_millis(800),
        }
    }
}

impl FulfillmentConfig {
    /// No delays; for tests.
    pub fn immediate() -> Self {
        Self {
            inventory_delay: Duration::ZERO,
            shipping_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Erp(#[from] dentiva_erp::ErpError),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Prepares shipment for each completed payment.
///
/// Steps: decrement inventory (stub), buy a shipping label (stub), mark the
/// ERP order fulfilled with the tracking number, then publish
/// `fulfillment.ready` and a payment-receipt notification. On failure a
/// fulfillment-error notification is published and the input event is still
/// consumed; there is no retry at this stage.
pub struct FulfillmentOrchestrator<S, B> {
    orders: S,
    bus: B,
    config: FulfillmentConfig,
}

impl<S, B> FulfillmentOrchestrator<S, B>
where
    S: OrderService,
    B: MessageBus<StorefrontEvent>,
{
    pub fn new(orders: S, bus: B, config: FulfillmentConfig) -> Self {
        Self {
            orders,
            bus,
            config,
        }
    }

    /// Process one `payment.completed` event. Other topics are ignored.
    pub fn handle(
        &self,
        envelope: EventEnvelope<StorefrontEvent>,
    ) -> Result<(), FulfillmentError> {
        let StorefrontEvent::PaymentCompleted { order, .. } = envelope.into_payload() else {
            return Ok(());
        };

        match self.fulfill(&order) {
            Ok(tracking_number) => {
                info!(order_id = %order.order_id, tracking = %tracking_number, "fulfillment ready");
                self.publish(StorefrontEvent::FulfillmentReady {
                    order: order.clone(),
                    tracking_number,
                })?;
                self.publish(StorefrontEvent::NotificationSend {
                    order,
                    kind: NotificationKind::PaymentReceipt,
                    reason: None,
                })
            }
            Err(e) => {
                warn!(order_id = %order.order_id, error = %e, "fulfillment failed");
                let reason = e.to_string();
                self.publish(StorefrontEvent::NotificationSend {
                    order,
                    kind: NotificationKind::FulfillmentError,
                    reason: Some(reason),
                })
            }
        }
    }

    fn fulfill(&self, order: &OrderFacts) -> Result<String, FulfillmentError> {
        self.decrement_inventory(order);
        let tracking_number = self.buy_shipping_label(order);
        self.orders
            .mark_order_fulfilled(&order.order_id, &tracking_number)?;
        Ok(tracking_number)
    }

    // Stub: warehouse decrement happens in the ERP today.
    fn decrement_inventory(&self, order: &OrderFacts) {
        thread::sleep(self.config.inventory_delay);
        info!(order_id = %order.order_id, "inventory reserved");
    }

    // Stub: carrier integration pending.
    fn buy_shipping_label(&self, order: &OrderFacts) -> String {
        thread::sleep(self.config.shipping_delay);
        let tracking_number = format!("TRK-{}", Uuid::now_v7().simple());
        info!(order_id = %order.order_id, tracking = %tracking_number, "shipping label created");
        tracking_number
    }

    fn publish(&self, event: StorefrontEvent) -> Result<(), FulfillmentError> {
        self.bus
            .publish(EventEnvelope::for_event(event))
            .map_err(|e| FulfillmentError::Publish(format!("{e:?}")))
    }
}

impl<S, B> FulfillmentOrchestrator<S, B>
where
    S: OrderService + Send + Sync + 'static,
    B: MessageBus<StorefrontEvent> + Send + Sync + 'static,
{
    /// Spawn the stage as a bus consumer on `payment.completed`.
    pub fn spawn(self, bus: &impl MessageBus<StorefrontEvent>) -> WorkerHandle {
        ConsumerRunner::spawn(
            "fulfillment-orchestrator",
            bus,
            &[Topic::PaymentCompleted],
            move |envelope| self.handle(envelope),
        )
    }
}
