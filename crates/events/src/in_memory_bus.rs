//! In-memory message bus for tests/dev.

use std::sync::{Mutex, mpsc};

use crate::bus::{MessageBus, Subscription};
use crate::envelope::EventEnvelope;
use crate::topic::Topic;

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

struct TopicSubscriber<E> {
    topics: Vec<Topic>,
    tx: mpsc::Sender<EventEnvelope<E>>,
}

/// In-memory topic-filtered pub/sub bus.
///
/// - No IO / no async
/// - Best-effort fan-out to every subscription matching the topic
/// - At-least-once acceptable (subscribers must tolerate duplicates)
pub struct InMemoryMessageBus<E> {
    subscribers: Mutex<Vec<TopicSubscriber<E>>>,
}

impl<E> InMemoryMessageBus<E> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E> Default for InMemoryMessageBus<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> MessageBus<E> for InMemoryMessageBus<E>
where
    E: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, envelope: EventEnvelope<E>) -> Result<(), Self::Error> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| InMemoryBusError::Poisoned)?;

        let topic = envelope.topic();

        // Drop dead subscribers while publishing.
        subs.retain(|sub| {
            if !sub.topics.contains(&topic) {
                return true;
            }
            sub.tx.send(envelope.clone()).is_ok()
        });

        Ok(())
    }

    fn subscribe(&self, topics: &[Topic]) -> Subscription<E> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned we still return a subscription; it just
        // never receives messages until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(TopicSubscriber {
                topics: topics.to_vec(),
                tx,
            });
        }

        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn routes_by_topic() {
        let bus: InMemoryMessageBus<u32> = InMemoryMessageBus::new();
        let orders = bus.subscribe(&[Topic::OrderCreated]);
        let payments = bus.subscribe(&[Topic::PaymentCreated]);

        bus.publish(EventEnvelope::new(Topic::OrderCreated, 1)).unwrap();
        bus.publish(EventEnvelope::new(Topic::PaymentCreated, 2)).unwrap();

        assert_eq!(*orders.recv().unwrap().payload(), 1);
        assert_eq!(*payments.recv().unwrap().payload(), 2);
        assert!(orders.try_recv().is_err());
    }

    #[test]
    fn multi_topic_subscription_sees_all_matching() {
        let bus: InMemoryMessageBus<u32> = InMemoryMessageBus::new();
        let all = bus.subscribe(&Topic::ALL);

        for (i, topic) in Topic::ALL.into_iter().enumerate() {
            bus.publish(EventEnvelope::new(topic, i as u32)).unwrap();
        }

        for i in 0..Topic::ALL.len() as u32 {
            assert_eq!(*all.recv().unwrap().payload(), i);
        }
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let bus: InMemoryMessageBus<u32> = InMemoryMessageBus::new();
        let sub = bus.subscribe(&[Topic::OrderCreated]);
        drop(sub);

        // Publishing after the receiver is gone must not error.
        bus.publish(EventEnvelope::new(Topic::OrderCreated, 7)).unwrap();
    }

    #[test]
    fn recv_timeout_expires_when_idle() {
        let bus: InMemoryMessageBus<u32> = InMemoryMessageBus::new();
        let sub = bus.subscribe(&[Topic::FulfillmentReady]);

        let err = sub.recv_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, std::sync::mpsc::RecvTimeoutError::Timeout));
    }
}
