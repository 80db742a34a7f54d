//! `dentiva-events` — lifecycle events and the message-bus abstraction.
//!
//! The storefront pipeline is choreographed over five topics
//! (`order.created`, `payment.created`, `payment.completed`,
//! `fulfillment.ready`, `notification.send`). This crate defines the event
//! payloads, the envelope they travel in, and the transport-agnostic
//! [`MessageBus`] trait with an in-memory implementation for dev/test.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod topic;

pub use bus::{MessageBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::{NotificationKind, OrderFacts, PaymentFacts, StorefrontEvent};
pub use in_memory_bus::{InMemoryBusError, InMemoryMessageBus};
pub use topic::Topic;
