//! In-memory order service for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDate;
use tracing::debug;

use dentiva_core::{OrderId, RecurringOrderId};

use crate::order::{ErpError, OrderService, SalesOrderDraft};
use crate::recurring::RecurringOrder;

/// In-memory stand-in for the ERP.
///
/// Failure toggles let tests steer the partial-failure paths the pipeline
/// has to survive:
/// - [`fail_next_create`](Self::fail_next_create) makes exactly the next
///   `create_sales_order` call fail;
/// - [`set_fail_next_run_updates`](Self::set_fail_next_run_updates) makes
///   every `set_next_run` call fail until cleared.
#[derive(Debug, Default)]
pub struct InMemoryOrderService {
    orders: RwLock<Vec<(OrderId, SalesOrderDraft)>>,
    fulfilled: RwLock<HashMap<OrderId, String>>,
    recurring: RwLock<HashMap<RecurringOrderId, RecurringOrder>>,
    order_seq: AtomicU64,
    fail_next_create: AtomicBool,
    fail_next_run_updates: AtomicBool,
}

impl InMemoryOrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a recurring-order template.
    pub fn seed_recurring(&self, order: RecurringOrder) {
        self.recurring
            .write()
            .unwrap()
            .insert(order.id.clone(), order);
    }

    /// All sales orders created so far, in creation order.
    pub fn created_orders(&self) -> Vec<(OrderId, SalesOrderDraft)> {
        self.orders.read().unwrap().clone()
    }

    /// Tracking number recorded for an order, if fulfilled.
    pub fn tracking_for(&self, order_id: &OrderId) -> Option<String> {
        self.fulfilled.read().unwrap().get(order_id).cloned()
    }

    /// Current state of a recurring template.
    pub fn recurring_order(&self, id: &RecurringOrderId) -> Option<RecurringOrder> {
        self.recurring.read().unwrap().get(id).cloned()
    }

    /// Make the next `create_sales_order` call fail (one-shot).
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Toggle failure of all `set_next_run` calls.
    pub fn set_fail_next_run_updates(&self, fail: bool) {
        self.fail_next_run_updates.store(fail, Ordering::SeqCst);
    }
}

impl OrderService for InMemoryOrderService {
    fn create_sales_order(&self, draft: &SalesOrderDraft) -> Result<OrderId, ErpError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(ErpError::Upstream("simulated create failure".to_string()));
        }

        let n = self.order_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let order_id = OrderId::new(format!("SO-{n}"))
            .map_err(|e| ErpError::InvalidRecord(e.to_string()))?;

        self.orders
            .write()
            .unwrap()
            .push((order_id.clone(), draft.clone()));

        debug!(order_id = %order_id, customer_id = %draft.customer_id, "sales order created");
        Ok(order_id)
    }

    fn mark_order_fulfilled(
        &self,
        order_id: &OrderId,
        tracking_number: &str,
    ) -> Result<(), ErpError> {
        let exists = self
            .orders
            .read()
            .unwrap()
            .iter()
            .any(|(id, _)| id == order_id);
        if !exists {
            return Err(ErpError::NotFound(order_id.to_string()));
        }

        self.fulfilled
            .write()
            .unwrap()
            .insert(order_id.clone(), tracking_number.to_string());
        Ok(())
    }

    fn due_recurring_orders(&self, as_of: NaiveDate) -> Result<Vec<RecurringOrder>, ErpError> {
        let mut due: Vec<RecurringOrder> = self
            .recurring
            .read()
            .unwrap()
            .values()
            .filter(|r| r.is_due(as_of))
            .cloned()
            .collect();

        // Stable order keeps cycles deterministic.
        due.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(due)
    }

    fn set_next_run(&self, id: &RecurringOrderId, next_run: NaiveDate) -> Result<(), ErpError> {
        if self.fail_next_run_updates.load(Ordering::SeqCst) {
            return Err(ErpError::Upstream(
                "simulated next-run update failure".to_string(),
            ));
        }

        let mut recurring = self.recurring.write().unwrap();
        let record = recurring
            .get_mut(id)
            .ok_or_else(|| ErpError::NotFound(id.to_string()))?;
        record.next_run = next_run;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderSource;
    use crate::recurring::{IntervalUnit, RecurringStatus};
    use dentiva_core::{Currency, CustomerId, ItemId, Money};

    fn draft() -> SalesOrderDraft {
        SalesOrderDraft {
            customer_id: CustomerId::new("C-1").unwrap(),
            customer_email: "clinic@example.com".to_string(),
            item_id: ItemId::new("BURS-5").unwrap(),
            quantity: 3,
            amount: Money::new(7_500, Currency::Usd).unwrap(),
            source: OrderSource::Storefront,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn creates_sequential_order_ids() {
        let erp = InMemoryOrderService::new();
        let a = erp.create_sales_order(&draft()).unwrap();
        let b = erp.create_sales_order(&draft()).unwrap();
        assert_eq!(a.as_str(), "SO-1");
        assert_eq!(b.as_str(), "SO-2");
    }

    #[test]
    fn one_shot_create_failure() {
        let erp = InMemoryOrderService::new();
        erp.fail_next_create();
        assert!(erp.create_sales_order(&draft()).is_err());
        assert!(erp.create_sales_order(&draft()).is_ok());
    }

    #[test]
    fn fulfillment_requires_existing_order() {
        let erp = InMemoryOrderService::new();
        let missing = OrderId::new("SO-404").unwrap();
        assert!(matches!(
            erp.mark_order_fulfilled(&missing, "TRK-1"),
            Err(ErpError::NotFound(_))
        ));

        let id = erp.create_sales_order(&draft()).unwrap();
        erp.mark_order_fulfilled(&id, "TRK-1").unwrap();
        assert_eq!(erp.tracking_for(&id).as_deref(), Some("TRK-1"));
    }

    #[test]
    fn due_query_filters_paused_and_future() {
        let erp = InMemoryOrderService::new();
        let today = date(2025, 8, 25);

        let mut due = recurring("R-1", today);
        due.status = RecurringStatus::Active;
        erp.seed_recurring(due);

        let mut paused = recurring("R-2", today);
        paused.status = RecurringStatus::Paused;
        erp.seed_recurring(paused);

        erp.seed_recurring(recurring("R-3", date(2025, 9, 1)));

        let found = erp.due_recurring_orders(today).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "R-1");
    }

    fn recurring(id: &str, next_run: NaiveDate) -> RecurringOrder {
        RecurringOrder {
            id: RecurringOrderId::new(id).unwrap(),
            customer_id: CustomerId::new("C-1").unwrap(),
            customer_email: "clinic@example.com".to_string(),
            item_id: ItemId::new("GLOVES-M").unwrap(),
            quantity: 2,
            amount: Money::new(4_000, Currency::Usd).unwrap(),
            interval: 1,
            interval_unit: IntervalUnit::Weeks,
            next_run,
            status: RecurringStatus::Active,
        }
    }
}
