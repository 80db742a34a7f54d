//! One scheduling cycle over the due recurring orders.

use chrono::NaiveDate;
use tracing::{error, info, warn};

use dentiva_erp::{OrderService, OrderSource, RecurringOrder, SalesOrderDraft};
use dentiva_jobs::{EnqueueOutcome, OrderQueue};

/// Cycle-level error: the due query itself failed, nothing was processed.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Erp(#[from] dentiva_erp::ErpError),
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    /// Templates due at the start of the cycle.
    pub due: usize,
    /// Templates whose order submission succeeded.
    pub processed: usize,
    /// Of the processed, how many went through the durable queue.
    pub queued: usize,
    /// Of the processed, how many ran through the synchronous fallback.
    pub ran_inline: usize,
    /// Templates whose order submission failed; they stay due.
    pub failed: usize,
    /// Processed templates whose next-run PATCH failed; they also stay due
    /// and will be recreated next cycle.
    pub next_run_update_failures: usize,
}

/// Turns due recurring-order templates into sales-order submissions.
///
/// Templates are processed sequentially in id order. Each one is submitted
/// through the [`OrderQueue`]; on success the template's `next_run` is
/// advanced by its interval. The next-run update is deliberately not a
/// precondition for success (see crate docs for the consequences).
pub struct RecurringOrderScheduler<S> {
    orders: S,
    queue: OrderQueue,
}

impl<S: OrderService> RecurringOrderScheduler<S> {
    pub fn new(orders: S, queue: OrderQueue) -> Self {
        Self { orders, queue }
    }

    /// Run one cycle as of `today`.
    pub fn run_cycle(&self, today: NaiveDate) -> Result<CycleReport, SchedulerError> {
        let due = self.orders.due_recurring_orders(today)?;
        let mut report = CycleReport {
            due: due.len(),
            ..Default::default()
        };

        info!(due = due.len(), %today, "recurring-order cycle started");

        for template in &due {
            self.process_template(template, &mut report);
        }

        info!(
            processed = report.processed,
            failed = report.failed,
            update_failures = report.next_run_update_failures,
            "recurring-order cycle finished"
        );
        Ok(report)
    }

    fn process_template(&self, template: &RecurringOrder, report: &mut CycleReport) {
        let draft = draft_from_template(template);
        let payload = match serde_json::to_value(&draft) {
            Ok(v) => v,
            Err(e) => {
                error!(recurring_id = %template.id, error = %e, "could not serialize order payload");
                report.failed += 1;
                return;
            }
        };

        match self.queue.submit(payload) {
            Ok(outcome) => {
                report.processed += 1;
                match outcome {
                    EnqueueOutcome::Queued(job_id) => {
                        report.queued += 1;
                        info!(recurring_id = %template.id, job_id = %job_id, "recurring order queued");
                    }
                    EnqueueOutcome::RanInline => {
                        report.ran_inline += 1;
                        info!(recurring_id = %template.id, "recurring order processed inline");
                    }
                }

                // Advance the cadence. A failure here is logged, not fatal:
                // the template stays due and the order will be recreated
                // tomorrow.
                let next = template.advanced_next_run();
                if let Err(e) = self.orders.set_next_run(&template.id, next) {
                    report.next_run_update_failures += 1;
                    warn!(
                        recurring_id = %template.id,
                        next_run = %next,
                        error = %e,
                        "order created but next-run update failed; template will rerun"
                    );
                }
            }
            Err(e) => {
                report.failed += 1;
                warn!(recurring_id = %template.id, error = %e, "recurring order submission failed");
            }
        }
    }
}

/// Build the sales-order draft for one template cycle.
pub fn draft_from_template(template: &RecurringOrder) -> SalesOrderDraft {
    SalesOrderDraft {
        customer_id: template.customer_id.clone(),
        customer_email: template.customer_email.clone(),
        item_id: template.item_id.clone(),
        quantity: template.quantity,
        amount: template.amount,
        source: OrderSource::RecurringSchedule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::OrderProcessor;
    use chrono::Duration;
    use dentiva_core::{Currency, CustomerId, ItemId, Money, RecurringOrderId};
    use dentiva_erp::{InMemoryOrderService, IntervalUnit, RecurringStatus};
    use dentiva_events::InMemoryMessageBus;
    use dentiva_jobs::{InMemoryJobStore, JobExecutor, JobStore, OrderQueueConfig};
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template(id: &str, next_run: chrono::NaiveDate, unit: IntervalUnit) -> RecurringOrder {
        RecurringOrder {
            id: RecurringOrderId::new(id).unwrap(),
            customer_id: CustomerId::new("C-1").unwrap(),
            customer_email: "clinic@example.com".to_string(),
            item_id: ItemId::new("GLOVES-M").unwrap(),
            quantity: 4,
            amount: Money::new(5_600, Currency::Usd).unwrap(),
            interval: 2,
            interval_unit: unit,
            next_run,
            status: RecurringStatus::Active,
        }
    }

    /// Scheduler wired for inline processing (no job store).
    fn inline_scheduler(
        erp: Arc<InMemoryOrderService>,
    ) -> RecurringOrderScheduler<Arc<InMemoryOrderService>> {
        let bus = Arc::new(InMemoryMessageBus::new());
        let processor = Arc::new(OrderProcessor::new(erp.clone(), bus));
        let queue = OrderQueue::new(None, processor.into_fallback(), OrderQueueConfig::default());
        RecurringOrderScheduler::new(erp, queue)
    }

    #[test]
    fn due_templates_are_processed_and_advanced() {
        let erp = Arc::new(InMemoryOrderService::new());
        let today = date(2025, 8, 25);
        erp.seed_recurring(template("R-1", today, IntervalUnit::Weeks));
        erp.seed_recurring(template("R-2", today - Duration::days(3), IntervalUnit::Months));
        erp.seed_recurring(template("R-3", today + Duration::days(1), IntervalUnit::Weeks));

        let scheduler = inline_scheduler(erp.clone());
        let report = scheduler.run_cycle(today).unwrap();

        assert_eq!(report.due, 2);
        assert_eq!(report.processed, 2);
        assert_eq!(report.ran_inline, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(erp.created_orders().len(), 2);

        // Advanced from the stored next_run, not from today.
        let r1 = erp.recurring_order(&RecurringOrderId::new("R-1").unwrap()).unwrap();
        assert_eq!(r1.next_run, today + Duration::weeks(2));
        let r2 = erp.recurring_order(&RecurringOrderId::new("R-2").unwrap()).unwrap();
        assert_eq!(r2.next_run, date(2025, 10, 22));

        // Not due, untouched.
        let r3 = erp.recurring_order(&RecurringOrderId::new("R-3").unwrap()).unwrap();
        assert_eq!(r3.next_run, today + Duration::days(1));
    }

    #[test]
    fn failed_creation_leaves_next_run_unchanged() {
        let erp = Arc::new(InMemoryOrderService::new());
        let today = date(2025, 8, 25);
        erp.seed_recurring(template("R-1", today, IntervalUnit::Weeks));

        erp.fail_next_create();
        let scheduler = inline_scheduler(erp.clone());
        let report = scheduler.run_cycle(today).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 0);

        // Still due tomorrow.
        let r1 = erp.recurring_order(&RecurringOrderId::new("R-1").unwrap()).unwrap();
        assert_eq!(r1.next_run, today);
    }

    #[test]
    fn failed_next_run_update_still_counts_as_processed() {
        // Documented-but-buggy behavior: the order exists, the template
        // stays due, and tomorrow's cycle will create a duplicate.
        let erp = Arc::new(InMemoryOrderService::new());
        let today = date(2025, 8, 25);
        erp.seed_recurring(template("R-1", today, IntervalUnit::Weeks));

        erp.set_fail_next_run_updates(true);
        let scheduler = inline_scheduler(erp.clone());
        let report = scheduler.run_cycle(today).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.next_run_update_failures, 1);
        assert_eq!(erp.created_orders().len(), 1);

        let r1 = erp.recurring_order(&RecurringOrderId::new("R-1").unwrap()).unwrap();
        assert_eq!(r1.next_run, today);

        // Next day: the same template is processed again, duplicating the
        // order.
        erp.set_fail_next_run_updates(false);
        let report = scheduler.run_cycle(today + Duration::days(1)).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(erp.created_orders().len(), 2);
    }

    #[test]
    fn queued_submissions_are_processed_by_the_executor() {
        let erp = Arc::new(InMemoryOrderService::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let today = date(2025, 8, 25);
        erp.seed_recurring(template("R-1", today, IntervalUnit::Weeks));

        let store = InMemoryJobStore::arc();
        let processor = Arc::new(OrderProcessor::new(erp.clone(), bus));
        let queue = OrderQueue::new(
            Some(store.clone()),
            processor.clone().into_fallback(),
            OrderQueueConfig::default(),
        );
        let scheduler = RecurringOrderScheduler::new(erp.clone(), queue);

        let report = scheduler.run_cycle(today).unwrap();
        assert_eq!(report.queued, 1);
        assert!(erp.created_orders().is_empty());

        // Drain the queue by hand.
        let mut executor = JobExecutor::new(store.clone());
        executor.register_handler("process-order", processor.job_handler());
        let mut job = store.claim_next().unwrap().unwrap();
        executor.execute_one(&mut job).unwrap();

        assert_eq!(erp.created_orders().len(), 1);
    }
}
