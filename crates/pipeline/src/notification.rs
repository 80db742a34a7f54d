//! Notification stage: every topic → rendered email.

use tracing::info;

use dentiva_events::{
    EventEnvelope, MessageBus, NotificationKind, OrderFacts, StorefrontEvent, Topic,
};

use crate::runner::{ConsumerRunner, WorkerHandle};

/// A rendered email ready for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email seam. The production SMTP/provider adapter lives outside
/// this repository.
pub trait EmailSender: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn send(&self, message: EmailMessage) -> Result<(), Self::Error>;
}

impl<T> EmailSender for std::sync::Arc<T>
where
    T: EmailSender + ?Sized,
{
    type Error = T::Error;

    fn send(&self, message: EmailMessage) -> Result<(), Self::Error> {
        (**self).send(message)
    }
}

/// Email sender that only logs; the dev/default sink.
#[derive(Debug, Default)]
pub struct LoggingEmailSender;

impl EmailSender for LoggingEmailSender {
    type Error = std::convert::Infallible;

    fn send(&self, message: EmailMessage) -> Result<(), Self::Error> {
        info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Renders one email per lifecycle event and hands it to the sender.
///
/// Subscribed to all five topics. Redelivered events produce duplicate
/// emails; there is no dedupe at this stage.
pub struct NotificationDispatcher<S> {
    sender: S,
}

impl<S: EmailSender> NotificationDispatcher<S> {
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    /// Render and send the email for one event.
    pub fn handle(&self, envelope: EventEnvelope<StorefrontEvent>) -> Result<(), S::Error> {
        let message = render(&envelope.into_payload());
        self.sender.send(message)
    }
}

impl<S: EmailSender + Send + Sync + 'static> NotificationDispatcher<S> {
    /// Spawn the dispatcher as a bus consumer on every topic.
    pub fn spawn(self, bus: &impl MessageBus<StorefrontEvent>) -> WorkerHandle {
        ConsumerRunner::spawn("notification-dispatcher", bus, &Topic::ALL, {
            move |envelope| self.handle(envelope)
        })
    }
}

/// Render the email for an event.
pub fn render(event: &StorefrontEvent) -> EmailMessage {
    let order = event.order();
    match event {
        StorefrontEvent::OrderCreated { .. } => EmailMessage {
            to: order.customer_email.clone(),
            subject: format!("Order {} received", order.order_id),
            body: format!(
                "Thanks for your order. We received order {} for {} and will \
                 start processing it right away.",
                order.order_id, order.amount
            ),
        },
        StorefrontEvent::PaymentCreated { payment, .. } => EmailMessage {
            to: order.customer_email.clone(),
            subject: format!("Payment for order {}", order.order_id),
            body: format!(
                "Your invoice for {} is ready. Complete payment here: {}",
                order.amount, payment.payment_url
            ),
        },
        StorefrontEvent::PaymentCompleted { payment, .. } => EmailMessage {
            to: order.customer_email.clone(),
            subject: format!("Payment received for order {}", order.order_id),
            body: format!(
                "We received your payment of {} (transaction {}).",
                order.amount, payment.transaction_id
            ),
        },
        StorefrontEvent::FulfillmentReady {
            tracking_number, ..
        } => EmailMessage {
            to: order.customer_email.clone(),
            subject: format!("Order {} has shipped", order.order_id),
            body: format!(
                "Your order is on its way. Track your shipment with {tracking_number}."
            ),
        },
        StorefrontEvent::NotificationSend { kind, reason, .. } => {
            render_requested(order, *kind, reason.as_deref())
        }
    }
}

fn render_requested(
    order: &OrderFacts,
    kind: NotificationKind,
    reason: Option<&str>,
) -> EmailMessage {
    let to = order.customer_email.clone();
    match kind {
        NotificationKind::OrderConfirmation => EmailMessage {
            to,
            subject: format!("Order {} confirmed", order.order_id),
            body: format!("Your order {} is confirmed.", order.order_id),
        },
        NotificationKind::PaymentReceipt => EmailMessage {
            to,
            subject: format!("Receipt for order {}", order.order_id),
            body: format!(
                "This is your receipt for order {}: {}.",
                order.order_id, order.amount
            ),
        },
        NotificationKind::PaymentFailed => EmailMessage {
            to,
            subject: format!("Payment problem with order {}", order.order_id),
            body: format!(
                "We could not process payment for order {}. {}",
                order.order_id,
                reason.unwrap_or("Please check your payment details and try again.")
            ),
        },
        NotificationKind::FulfillmentError => EmailMessage {
            to,
            subject: format!("Delay with order {}", order.order_id),
            body: format!(
                "There was a problem preparing order {} for shipment. {}",
                order.order_id,
                reason.unwrap_or("Our team is looking into it.")
            ),
        },
        NotificationKind::ShipmentNotice => EmailMessage {
            to,
            subject: format!("Order {} has shipped", order.order_id),
            body: format!("Your order {} has shipped.", order.order_id),
        },
    }
}
