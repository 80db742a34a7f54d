//! `dentiva-pipeline` — the event-driven order pipeline.
//!
//! Three consumers choreograph an order over the message bus:
//!
//! 1. [`PaymentOrchestrator`] — `order.created` → drive the payment gateway,
//!    emit `payment.created` or a payment-failed notification
//! 2. [`FulfillmentOrchestrator`] — `payment.completed` → stub inventory and
//!    shipping, update the ERP, emit `fulfillment.ready` plus a receipt
//! 3. [`NotificationDispatcher`] — every topic → render and send an email
//!
//! No step is transactional with the publish that follows it, and consumers
//! do not dedupe redelivered events; both gaps are documented in DESIGN.md.

pub mod fulfillment;
pub mod notification;
pub mod payment;
pub mod runner;

pub use fulfillment::{FulfillmentConfig, FulfillmentOrchestrator};
pub use notification::{EmailMessage, EmailSender, LoggingEmailSender, NotificationDispatcher};
pub use payment::PaymentOrchestrator;
pub use runner::{ConsumerRunner, WorkerHandle};
