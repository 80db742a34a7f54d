//! Sales-order operations against the ERP.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dentiva_core::{CustomerId, ItemId, Money, OrderId, RecurringOrderId};

use crate::recurring::RecurringOrder;

/// Where an order-creation request originated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    Storefront,
    RecurringSchedule,
}

/// Payload for creating a sales order in the ERP.
///
/// Serializable because it doubles as the job-queue payload for scheduled
/// order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderDraft {
    pub customer_id: CustomerId,
    pub customer_email: String,
    pub item_id: ItemId,
    pub quantity: u32,
    pub amount: Money,
    pub source: OrderSource,
}

/// ERP boundary error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErpError {
    /// The upstream system rejected or failed the call.
    #[error("erp upstream error: {0}")]
    Upstream(String),

    /// The referenced record does not exist.
    #[error("erp record not found: {0}")]
    NotFound(String),

    /// A record came back in a shape we cannot use.
    #[error("invalid erp record: {0}")]
    InvalidRecord(String),
}

/// Order-system contract the pipeline depends on.
///
/// No call here is transactional with anything else in the process; a crash
/// after a successful call but before the follow-up publish leaves the
/// systems unreconciled (documented in DESIGN.md).
pub trait OrderService: Send + Sync {
    /// Create a sales order and return its ERP id.
    fn create_sales_order(&self, draft: &SalesOrderDraft) -> Result<OrderId, ErpError>;

    /// Mark an order fulfilled, attaching the shipping tracking number.
    fn mark_order_fulfilled(&self, order_id: &OrderId, tracking_number: &str)
    -> Result<(), ErpError>;

    /// Active recurring orders whose `next_run` is on or before `as_of`.
    fn due_recurring_orders(&self, as_of: NaiveDate) -> Result<Vec<RecurringOrder>, ErpError>;

    /// PATCH the next-run date of a recurring order.
    fn set_next_run(&self, id: &RecurringOrderId, next_run: NaiveDate) -> Result<(), ErpError>;
}

impl<T> OrderService for std::sync::Arc<T>
where
    T: OrderService + ?Sized,
{
    fn create_sales_order(&self, draft: &SalesOrderDraft) -> Result<OrderId, ErpError> {
        (**self).create_sales_order(draft)
    }

    fn mark_order_fulfilled(
        &self,
        order_id: &OrderId,
        tracking_number: &str,
    ) -> Result<(), ErpError> {
        (**self).mark_order_fulfilled(order_id, tracking_number)
    }

    fn due_recurring_orders(&self, as_of: NaiveDate) -> Result<Vec<RecurringOrder>, ErpError> {
        (**self).due_recurring_orders(as_of)
    }

    fn set_next_run(&self, id: &RecurringOrderId, next_run: NaiveDate) -> Result<(), ErpError> {
        (**self).set_next_run(id, next_run)
    }
}
