//! Payment stage: `order.created` → gateway → `payment.created`.

use chrono::Utc;
use tracing::{info, warn};

use dentiva_events::{
    EventEnvelope, MessageBus, NotificationKind, OrderFacts, PaymentFacts, StorefrontEvent, Topic,
};
use dentiva_gateway::PaymentGateway;

use crate::runner::{ConsumerRunner, WorkerHandle};

/// Payment stage error; carried into the failure notification's reason.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error(transparent)]
    Gateway(#[from] dentiva_gateway::GatewayError),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Drives the payment gateway for each created order.
///
/// Three sequential gateway calls per order: ensure customer, create
/// invoice, create transaction. Any step failing abandons the operation and
/// publishes a payment-failed notification instead; partially created
/// gateway records (customer without invoice, invoice without transaction)
/// are left behind, there is no compensation.
pub struct PaymentOrchestrator<G, B> {
    gateway: G,
    bus: B,
}

impl<G, B> PaymentOrchestrator<G, B>
where
    G: PaymentGateway,
    B: MessageBus<StorefrontEvent>,
{
    pub fn new(gateway: G, bus: B) -> Self {
        Self { gateway, bus }
    }

    /// Process one `order.created` event.
    ///
    /// Exactly one outcome event is published per input: `payment.created`
    /// on success, or a payment-failed `notification.send` on any gateway
    /// error. Events on other topics are ignored.
    pub fn handle(&self, envelope: EventEnvelope<StorefrontEvent>) -> Result<(), PaymentError> {
        let StorefrontEvent::OrderCreated { order } = envelope.into_payload() else {
            return Ok(());
        };

        match self.drive_gateway(&order) {
            Ok(payment) => {
                info!(
                    order_id = %order.order_id,
                    transaction_id = %payment.transaction_id,
                    "payment created"
                );
                self.publish(StorefrontEvent::PaymentCreated { order, payment })
            }
            Err(e) => {
                warn!(order_id = %order.order_id, error = %e, "payment failed");
                let reason = e.to_string();
                self.publish(StorefrontEvent::NotificationSend {
                    order,
                    kind: NotificationKind::PaymentFailed,
                    reason: Some(reason),
                })
            }
        }
    }

    fn drive_gateway(&self, order: &OrderFacts) -> Result<PaymentFacts, PaymentError> {
        let customer = self
            .gateway
            .ensure_customer(&order.customer_id, &order.customer_email)?;
        let invoice = self
            .gateway
            .create_invoice(&customer, &order.order_id, order.amount)?;
        let transaction = self.gateway.create_transaction(&invoice)?;

        Ok(PaymentFacts {
            gateway_customer_id: customer.0,
            invoice_id: invoice.0,
            transaction_id: transaction.transaction_id,
            payment_url: transaction.payment_url,
        })
    }

    fn publish(&self, event: StorefrontEvent) -> Result<(), PaymentError> {
        self.bus
            .publish(EventEnvelope::for_event(event))
            .map_err(|e| PaymentError::Publish(format!("{e:?}")))
    }
}

impl<G, B> PaymentOrchestrator<G, B>
where
    G: PaymentGateway + Send + Sync + 'static,
    B: MessageBus<StorefrontEvent> + Send + Sync + 'static,
{
    /// Spawn the stage as a bus consumer on `order.created`.
    pub fn spawn(self, bus: &impl MessageBus<StorefrontEvent>) -> WorkerHandle {
        ConsumerRunner::spawn("payment-orchestrator", bus, &[Topic::OrderCreated], {
            move |envelope| self.handle(envelope)
        })
    }
}

/// Order facts for an order entering the pipeline now.
pub fn order_facts_now(
    order_id: dentiva_core::OrderId,
    customer_id: dentiva_core::CustomerId,
    customer_email: String,
    amount: dentiva_core::Money,
) -> OrderFacts {
    OrderFacts {
        order_id,
        customer_id,
        customer_email,
        amount,
        occurred_at: Utc::now(),
    }
}
