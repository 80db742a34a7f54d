//! The one order processor behind every submission path.
//!
//! Storefront checkouts, queued jobs, and the queue's synchronous fallback
//! all create orders through this type, so the create-then-publish sequence
//! exists exactly once. (The system this replaces had two near-duplicate
//! processors that disagreed on defaults.)

use std::sync::Arc;

use tracing::info;

use dentiva_core::OrderId;
use dentiva_erp::{OrderService, SalesOrderDraft};
use dentiva_events::{EventEnvelope, MessageBus, OrderFacts, StorefrontEvent};
use dentiva_jobs::{Job, JobResult};

/// Order-processing error.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("invalid order payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Erp(#[from] dentiva_erp::ErpError),
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Creates a sales order in the ERP and publishes `order.created`.
///
/// Not transactional: a crash between the ERP call and the publish leaves
/// an order with no pipeline events. At-least-once submission paths can
/// also call this twice for the same draft, creating duplicate sales
/// orders; nothing here dedupes.
pub struct OrderProcessor<S, B> {
    orders: S,
    bus: B,
}

impl<S, B> OrderProcessor<S, B>
where
    S: OrderService,
    B: MessageBus<StorefrontEvent>,
{
    pub fn new(orders: S, bus: B) -> Self {
        Self { orders, bus }
    }

    /// Create the order and announce it on the bus.
    pub fn process(&self, draft: &SalesOrderDraft) -> Result<OrderId, ProcessError> {
        let order_id = self.orders.create_sales_order(draft)?;
        info!(order_id = %order_id, customer_id = %draft.customer_id, source = ?draft.source, "sales order created");

        let event = StorefrontEvent::OrderCreated {
            order: OrderFacts {
                order_id: order_id.clone(),
                customer_id: draft.customer_id.clone(),
                customer_email: draft.customer_email.clone(),
                amount: draft.amount,
                occurred_at: chrono::Utc::now(),
            },
        };
        self.bus
            .publish(EventEnvelope::for_event(event))
            .map_err(|e| ProcessError::Publish(format!("{e:?}")))?;

        Ok(order_id)
    }

    /// Process a JSON payload (job or fallback form of the draft).
    pub fn process_payload(&self, payload: &serde_json::Value) -> Result<OrderId, ProcessError> {
        let draft: SalesOrderDraft = serde_json::from_value(payload.clone())
            .map_err(|e| ProcessError::Payload(e.to_string()))?;
        self.process(&draft)
    }
}

impl<S, B> OrderProcessor<S, B>
where
    S: OrderService + Send + Sync + 'static,
    B: MessageBus<StorefrontEvent> + Send + Sync + 'static,
{
    /// Adapter for [`dentiva_jobs::OrderQueue`]'s inline fallback.
    pub fn into_fallback(self: Arc<Self>) -> dentiva_jobs::queue::FallbackProcessor {
        Arc::new(move |payload| {
            self.process_payload(payload)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
    }

    /// Adapter for a [`dentiva_jobs::JobExecutor`] handler registration.
    pub fn job_handler(self: Arc<Self>) -> impl Fn(&Job) -> JobResult + Send + Sync + 'static {
        move |job: &Job| match self.process_payload(&job.payload) {
            Ok(_) => JobResult::Success,
            Err(e) => JobResult::Failure(e.to_string()),
        }
    }
}
