//! Lifecycle event payloads.
//!
//! Events are immutable facts, published once per stage transition. There is
//! no idempotency key at the message level: redelivery of the same fact is
//! possible and consumers do not currently dedupe (known gap, see DESIGN.md).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dentiva_core::{CustomerId, Money, OrderId};

use crate::topic::Topic;

/// Facts about the order that every lifecycle event carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFacts {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_email: String,
    pub amount: Money,
    /// Business time of the originating stage transition.
    pub occurred_at: DateTime<Utc>,
}

/// Gateway identifiers produced by the payment stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFacts {
    pub gateway_customer_id: String,
    pub invoice_id: String,
    pub transaction_id: String,
    /// Hosted payment page URL constructed from the transaction.
    pub payment_url: String,
}

/// Which email template a `notification.send` event asks for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderConfirmation,
    PaymentReceipt,
    PaymentFailed,
    FulfillmentError,
    ShipmentNotice,
}

/// A storefront lifecycle event, one variant per topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StorefrontEvent {
    OrderCreated {
        order: OrderFacts,
    },
    PaymentCreated {
        order: OrderFacts,
        payment: PaymentFacts,
    },
    PaymentCompleted {
        order: OrderFacts,
        payment: PaymentFacts,
    },
    FulfillmentReady {
        order: OrderFacts,
        tracking_number: String,
    },
    NotificationSend {
        order: OrderFacts,
        kind: NotificationKind,
        /// Human-readable failure reason for error notifications.
        reason: Option<String>,
    },
}

impl StorefrontEvent {
    /// The topic this event is published on.
    pub fn topic(&self) -> Topic {
        match self {
            StorefrontEvent::OrderCreated { .. } => Topic::OrderCreated,
            StorefrontEvent::PaymentCreated { .. } => Topic::PaymentCreated,
            StorefrontEvent::PaymentCompleted { .. } => Topic::PaymentCompleted,
            StorefrontEvent::FulfillmentReady { .. } => Topic::FulfillmentReady,
            StorefrontEvent::NotificationSend { .. } => Topic::NotificationSend,
        }
    }

    /// The order facts common to all variants.
    pub fn order(&self) -> &OrderFacts {
        match self {
            StorefrontEvent::OrderCreated { order }
            | StorefrontEvent::PaymentCreated { order, .. }
            | StorefrontEvent::PaymentCompleted { order, .. }
            | StorefrontEvent::FulfillmentReady { order, .. }
            | StorefrontEvent::NotificationSend { order, .. } => order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiva_core::Currency;

    fn facts() -> OrderFacts {
        OrderFacts {
            order_id: OrderId::new("SO-1").unwrap(),
            customer_id: CustomerId::new("C-9").unwrap(),
            customer_email: "dr.molar@example.com".to_string(),
            amount: Money::new(4_500, Currency::Usd).unwrap(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn topic_matches_variant() {
        let ev = StorefrontEvent::OrderCreated { order: facts() };
        assert_eq!(ev.topic(), Topic::OrderCreated);

        let ev = StorefrontEvent::NotificationSend {
            order: facts(),
            kind: NotificationKind::PaymentFailed,
            reason: Some("card declined".to_string()),
        };
        assert_eq!(ev.topic(), Topic::NotificationSend);
    }

    #[test]
    fn serde_tags_event_type() {
        let ev = StorefrontEvent::OrderCreated { order: facts() };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event_type"], "order_created");
        let back: StorefrontEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }
}
