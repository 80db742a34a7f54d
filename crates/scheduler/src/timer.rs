//! Daily trigger for the scheduling cycle.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use dentiva_erp::OrderService;

use crate::cycle::RecurringOrderScheduler;

/// Handle to stop the timer thread.
#[derive(Debug)]
pub struct TimerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl TimerHandle {
    /// Request shutdown and wait for the timer to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Fires the scheduler once per period (daily in production).
///
/// The first cycle runs immediately on spawn so a restarted process does
/// not wait a full day to catch up on due templates.
#[derive(Debug)]
pub struct DailyTimer;

impl DailyTimer {
    pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Spawn the timer thread with the given period. The first cycle runs
    /// right away.
    pub fn spawn<S>(scheduler: RecurringOrderScheduler<S>, period: Duration) -> TimerHandle
    where
        S: OrderService + Send + 'static,
    {
        Self::spawn_after(scheduler, Duration::ZERO, period)
    }

    /// Spawn the timer thread, waiting `initial_delay` before the first
    /// cycle.
    pub fn spawn_after<S>(
        scheduler: RecurringOrderScheduler<S>,
        initial_delay: Duration,
        period: Duration,
    ) -> TimerHandle
    where
        S: OrderService + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("recurring-order-timer".to_string())
            .spawn(move || {
                if !initial_delay.is_zero() {
                    match shutdown_rx.recv_timeout(initial_delay) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => return,
                        Err(mpsc::RecvTimeoutError::Timeout) => {}
                    }
                }

                loop {
                    let today = Utc::now().date_naive();
                    match scheduler.run_cycle(today) {
                        Ok(report) => {
                            info!(
                                due = report.due,
                                processed = report.processed,
                                failed = report.failed,
                                "scheduled cycle complete"
                            );
                        }
                        Err(e) => error!(error = %e, "scheduled cycle failed"),
                    }

                    // The sleep doubles as the shutdown wait.
                    match shutdown_rx.recv_timeout(period) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    }
                }
            })
            .expect("failed to spawn recurring-order timer thread");

        TimerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::OrderProcessor;
    use dentiva_core::{Currency, CustomerId, ItemId, Money, RecurringOrderId};
    use dentiva_erp::{InMemoryOrderService, IntervalUnit, RecurringOrder, RecurringStatus};
    use dentiva_events::InMemoryMessageBus;
    use dentiva_jobs::{OrderQueue, OrderQueueConfig};
    use std::sync::Arc;

    fn due_template() -> RecurringOrder {
        RecurringOrder {
            id: RecurringOrderId::new("R-1").unwrap(),
            customer_id: CustomerId::new("C-1").unwrap(),
            customer_email: "clinic@example.com".to_string(),
            item_id: ItemId::new("MASKS-50").unwrap(),
            quantity: 1,
            amount: Money::new(1_999, Currency::Usd).unwrap(),
            interval: 1,
            interval_unit: IntervalUnit::Weeks,
            next_run: Utc::now().date_naive(),
            status: RecurringStatus::Active,
        }
    }

    fn scheduler_for(erp: Arc<InMemoryOrderService>) -> RecurringOrderScheduler<Arc<InMemoryOrderService>> {
        let bus = Arc::new(InMemoryMessageBus::new());
        let processor = Arc::new(OrderProcessor::new(erp.clone(), bus));
        let queue = OrderQueue::new(None, processor.into_fallback(), OrderQueueConfig::default());
        RecurringOrderScheduler::new(erp, queue)
    }

    #[test]
    fn first_cycle_runs_on_spawn() {
        let erp = Arc::new(InMemoryOrderService::new());
        erp.seed_recurring(due_template());

        let handle = DailyTimer::spawn(scheduler_for(erp.clone()), Duration::from_secs(3600));

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while erp.created_orders().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();

        assert_eq!(erp.created_orders().len(), 1);
    }

    #[test]
    fn initial_delay_defers_the_first_cycle() {
        let erp = Arc::new(InMemoryOrderService::new());

        let handle = DailyTimer::spawn_after(
            scheduler_for(erp.clone()),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        // A due template seeded after spawn must not be picked up while the
        // timer is still in its initial delay.
        erp.seed_recurring(due_template());
        thread::sleep(Duration::from_millis(100));
        handle.shutdown();

        assert!(erp.created_orders().is_empty());
        let r1 = erp
            .recurring_order(&RecurringOrderId::new("R-1").unwrap())
            .unwrap();
        assert_eq!(r1.next_run, Utc::now().date_naive());
    }
}
