//! Message-bus abstraction (mechanics only).
//!
//! A thin pub/sub contract over a topic-partitioned log. The bus is for
//! distribution, not storage: delivery is at-least-once, subscribers must
//! tolerate duplicates, and a subscriber that crashes mid-handler simply
//! drops the message (there is no replay log here).
//!
//! Work stays sequential within a subscription: each subscription is
//! consumed by exactly one thread, which processes one message at a time.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::envelope::EventEnvelope;
use crate::topic::Topic;

/// A subscription to one or more topics.
///
/// Each subscription receives a copy of every envelope published on a topic
/// it was registered for, in publication order per topic.
#[derive(Debug)]
pub struct Subscription<E> {
    receiver: Receiver<EventEnvelope<E>>,
}

impl<E> Subscription<E> {
    pub fn new(receiver: Receiver<EventEnvelope<E>>) -> Self {
        Self { receiver }
    }

    /// Block until the next envelope is available.
    pub fn recv(&self) -> Result<EventEnvelope<E>, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an envelope without blocking.
    pub fn try_recv(&self) -> Result<EventEnvelope<E>, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for an envelope.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<EventEnvelope<E>, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Transport-agnostic message bus.
///
/// `connect`/`disconnect` bracket the broker session where the transport has
/// one (a broker-backed implementation opens/closes its client there); the
/// in-memory bus treats both as no-ops, which the default implementations
/// provide.
///
/// `publish` can fail (broker unavailable, serialization error). Callers at
/// orchestration boundaries decide whether to surface or swallow-and-log.
pub trait MessageBus<E>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Open the transport session. Default: no-op.
    fn connect(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Close the transport session. Default: no-op.
    fn disconnect(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Publish an envelope on its topic.
    fn publish(&self, envelope: EventEnvelope<E>) -> Result<(), Self::Error>;

    /// Subscribe to the given topics. An empty slice subscribes to nothing.
    fn subscribe(&self, topics: &[Topic]) -> Subscription<E>;
}

impl<E, B> MessageBus<E> for Arc<B>
where
    B: MessageBus<E> + ?Sized,
{
    type Error = B::Error;

    fn connect(&self) -> Result<(), Self::Error> {
        (**self).connect()
    }

    fn disconnect(&self) -> Result<(), Self::Error> {
        (**self).disconnect()
    }

    fn publish(&self, envelope: EventEnvelope<E>) -> Result<(), Self::Error> {
        (**self).publish(envelope)
    }

    fn subscribe(&self, topics: &[Topic]) -> Subscription<E> {
        (**self).subscribe(topics)
    }
}
