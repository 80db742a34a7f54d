//! Generic bus-consumer loop.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use dentiva_events::{EventEnvelope, MessageBus, Subscription, Topic};

/// Handle to control and join a background consumer.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the consumer to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Generic consumer loop over a bus subscription.
///
/// One thread per subscription, one message at a time, so work stays
/// sequential within a consumer. A handler error is logged and the message
/// is considered consumed; there is no requeue.
#[derive(Debug)]
pub struct ConsumerRunner;

impl ConsumerRunner {
    /// Spawn a consumer thread processing envelopes from the given topics.
    ///
    /// The handler must tolerate redelivered messages (at-least-once bus).
    pub fn spawn<E, B, H, Err>(
        name: &'static str,
        bus: &B,
        topics: &[Topic],
        mut handler: H,
    ) -> WorkerHandle
    where
        E: Send + 'static,
        B: MessageBus<E>,
        H: FnMut(EventEnvelope<E>) -> Result<(), Err> + Send + 'static,
        Err: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<E> = bus.subscribe(topics);

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || consumer_loop(name, sub, shutdown_rx, &mut handler))
            .expect("failed to spawn consumer thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

fn consumer_loop<E, H, Err>(
    name: &'static str,
    sub: Subscription<E>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) where
    H: FnMut(EventEnvelope<E>) -> Result<(), Err>,
    Err: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                if let Err(err) = handler(envelope) {
                    warn!(consumer = name, error = ?err, "consumer handler failed");
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentiva_events::InMemoryMessageBus;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn consumer_sees_only_subscribed_topics() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        let handle = ConsumerRunner::spawn(
            "test-consumer",
            &bus,
            &[Topic::OrderCreated],
            move |_envelope: EventEnvelope<String>| -> Result<(), String> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        bus.publish(EventEnvelope::new(Topic::OrderCreated, "a".to_string()))
            .unwrap();
        bus.publish(EventEnvelope::new(Topic::PaymentCreated, "b".to_string()))
            .unwrap();
        bus.publish(EventEnvelope::new(Topic::OrderCreated, "c".to_string()))
            .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while seen.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
